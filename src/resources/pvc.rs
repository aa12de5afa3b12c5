//! PersistentVolumeClaim assembly for dashboard storage.
//!
//! Claims created from the dashboard always request a single-node filesystem
//! volume and carry the dashboard label plus display annotations.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, PersistentVolumeClaimStatus,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use crate::resources::common::{
    dashboard_labels, display_annotations, translate_display_name_for_k8s,
};

/// Access mode for volumes mounted read-write by a single node
pub const READ_WRITE_ONCE: &str = "ReadWriteOnce";
/// Access mode for volumes mounted read-write by many nodes
pub const READ_WRITE_MANY: &str = "ReadWriteMany";
/// Access mode for volumes mounted read-only by many nodes
pub const READ_ONLY_MANY: &str = "ReadOnlyMany";
/// Volume mode for claims backed by a mounted filesystem
pub const FILESYSTEM_VOLUME_MODE: &str = "Filesystem";
/// Phase reported by a claim that has not been bound yet
pub const PENDING_PHASE: &str = "Pending";

/// Name and description as entered by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameDescription {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// User input for a new or edited storage claim.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatingStorageObject {
    pub name_desc: NameDescription,
    /// Requested size as a quantity string, e.g. `5Gi`.
    pub size: String,
    /// Storage class; the cluster default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
}

impl CreatingStorageObject {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        size: impl Into<String>,
    ) -> Self {
        Self {
            name_desc: NameDescription {
                name: name.into(),
                description: description.into(),
            },
            size: size.into(),
            storage_class_name: None,
        }
    }

    /// Set the storage class.
    pub fn with_storage_class(mut self, storage_class_name: impl Into<String>) -> Self {
        self.storage_class_name = Some(storage_class_name.into());
        self
    }
}

/// Build the claim the dashboard submits for `data`.
///
/// `edit_name` keeps the object name of an existing claim; otherwise the name
/// is derived from the display name.
pub fn assemble_pvc(
    data: &CreatingStorageObject,
    namespace: &str,
    edit_name: Option<&str>,
) -> PersistentVolumeClaim {
    let display_name = &data.name_desc.name;
    let name = match edit_name {
        Some(name) => name.to_string(),
        None => translate_display_name_for_k8s(display_name),
    };

    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(namespace.to_string()),
            labels: Some(dashboard_labels()),
            annotations: Some(display_annotations(
                display_name,
                &data.name_desc.description,
            )),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec![READ_WRITE_ONCE.to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(storage_request(&data.size)),
                ..Default::default()
            }),
            storage_class_name: data.storage_class_name.clone(),
            volume_mode: Some(FILESYSTEM_VOLUME_MODE.to_string()),
            ..Default::default()
        }),
        status: Some(PersistentVolumeClaimStatus {
            phase: Some(PENDING_PHASE.to_string()),
            ..Default::default()
        }),
    }
}

/// Resource requests map asking for `size` of storage
pub fn storage_request(size: &str) -> BTreeMap<String, Quantity> {
    BTreeMap::from([("storage".to_string(), Quantity(size.to_string()))])
}

/// Access modes declared on a claim
pub fn access_modes(pvc: &PersistentVolumeClaim) -> &[String] {
    pvc.spec
        .as_ref()
        .and_then(|spec| spec.access_modes.as_deref())
        .unwrap_or_default()
}

/// Whether a claim can be mounted by more than one node at once
pub fn is_multi_use(pvc: &PersistentVolumeClaim) -> bool {
    access_modes(pvc)
        .iter()
        .any(|mode| mode == READ_WRITE_MANY || mode == READ_ONLY_MANY)
}

/// Requested storage size of a claim
pub fn requested_size(pvc: &PersistentVolumeClaim) -> Option<&str> {
    pvc.spec
        .as_ref()?
        .resources
        .as_ref()?
        .requests
        .as_ref()?
        .get("storage")
        .map(|quantity| quantity.0.as_str())
}
