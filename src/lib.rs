//! dashboard-storage library crate
//!
//! PersistentVolumeClaim accessors for the data science dashboard, built on a
//! mockable generic resource client.

pub mod api;
pub mod cli;
pub mod client;
pub mod error;
pub mod resources;

pub use client::{KubeClientConfig, KubeResourceClient, ResourceClient};
pub use error::{Error, Result};
pub use resources::pvc::{CreatingStorageObject, assemble_pvc};
