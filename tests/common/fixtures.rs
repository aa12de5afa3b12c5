//! Test fixtures and builder patterns for PersistentVolumeClaims.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, PersistentVolumeClaimStatus,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Builder for creating PersistentVolumeClaim test fixtures.
///
/// # Example
/// ```ignore
/// let pvc = PvcBuilder::new("data")
///     .namespace("my-project")
///     .access_modes(&["ReadWriteMany"])
///     .size("10Gi")
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct PvcBuilder {
    name: String,
    namespace: Option<String>,
    access_modes: Vec<String>,
    size: String,
    storage_class: Option<String>,
    phase: Option<String>,
    labels: BTreeMap<String, String>,
    annotations: BTreeMap<String, String>,
}

impl PvcBuilder {
    /// Create a new builder with the given claim name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            access_modes: vec!["ReadWriteOnce".to_string()],
            size: "5Gi".to_string(),
            storage_class: None,
            phase: None,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    /// Set the namespace for the claim.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Replace the access modes.
    pub fn access_modes(mut self, modes: &[&str]) -> Self {
        self.access_modes = modes.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Set the requested size.
    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    /// Set the storage class.
    pub fn storage_class(mut self, class: impl Into<String>) -> Self {
        self.storage_class = Some(class.into());
        self
    }

    /// Set the status phase.
    pub fn phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    /// Add a label to the claim.
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add an annotation to the claim.
    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Mark the claim as dashboard-owned.
    pub fn dashboard(self) -> Self {
        self.label("opendatahub.io/dashboard", "true")
    }

    /// Build the PersistentVolumeClaim.
    pub fn build(self) -> PersistentVolumeClaim {
        PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: self.namespace,
                labels: if self.labels.is_empty() {
                    None
                } else {
                    Some(self.labels)
                },
                annotations: if self.annotations.is_empty() {
                    None
                } else {
                    Some(self.annotations)
                },
                ..Default::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(self.access_modes),
                resources: Some(VolumeResourceRequirements {
                    requests: Some(BTreeMap::from([(
                        "storage".to_string(),
                        Quantity(self.size),
                    )])),
                    ..Default::default()
                }),
                storage_class_name: self.storage_class,
                volume_mode: Some("Filesystem".to_string()),
                ..Default::default()
            }),
            status: self.phase.map(|phase| PersistentVolumeClaimStatus {
                phase: Some(phase),
                ..Default::default()
            }),
        }
    }
}

impl Default for PvcBuilder {
    fn default() -> Self {
        Self::new("test-storage")
    }
}

/// Create a dashboard claim with common test defaults.
pub fn dashboard_pvc(name: &str, namespace: &str) -> PersistentVolumeClaim {
    PvcBuilder::new(name)
        .namespace(namespace)
        .dashboard()
        .annotation("openshift.io/display-name", name)
        .phase("Bound")
        .build()
}
