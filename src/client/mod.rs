//! Generic Kubernetes resource client.
//!
//! ## Architecture
//!
//! - `types`: Call descriptors (resource model, query options, bodies, patches)
//! - `resource_client`: The `ResourceClient` trait and its kube-backed implementation
//!
//! ## Example
//!
//! ```rust,ignore
//! use dashboard_storage::client::{KubeClientConfig, KubeResourceClient};
//!
//! let client = KubeResourceClient::new(kube::Client::try_default().await?, KubeClientConfig::default());
//! let claim = dashboard_storage::api::get_pvc(&client, "my-project", "data").await?;
//! ```

pub mod resource_client;
pub mod types;

#[cfg(test)]
pub use resource_client::MockResourceClient;
pub use resource_client::{FIELD_MANAGER, KubeClientConfig, KubeResourceClient, ResourceClient};
pub use types::{
    CreateResource, DeleteResource, GetResource, K8sApiOptions, K8sModel, ListResourceItems,
    PVC_MODEL, PatchResource, QueryOptions, UpdateResource,
};
