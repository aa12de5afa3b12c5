//! Resource generation module.
//!
//! Builds the Kubernetes objects the dashboard submits on behalf of users.
//!
//! ## Resources Generated
//!
//! | Resource | Purpose |
//! |----------|---------|
//! | PersistentVolumeClaim | Durable storage attached to workbenches |

pub mod common;
pub mod pvc;

pub use common::{
    dashboard_label_selector, dashboard_labels, get_description, get_display_name,
    translate_display_name_for_k8s,
};
pub use pvc::{CreatingStorageObject, NameDescription, assemble_pvc, is_multi_use};
