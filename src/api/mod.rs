//! Typed resource accessors built on the generic client.

pub mod pvcs;

pub use pvcs::{
    create_pvc, delete_pvc, get_available_multi_use_pvcs, get_dashboard_pvcs, get_pvc,
    update_pvc, update_pvc_size,
};
