// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Unit tests for dashboard-storage.
//!
//! These tests run without a Kubernetes cluster and cover claim assembly and
//! the pure helpers around it.

#[allow(dead_code)]
#[path = "../common/mod.rs"]
mod common;

mod assemble_tests {
    use dashboard_storage::resources::pvc::{CreatingStorageObject, assemble_pvc};
    use serde_json::json;

    fn data() -> CreatingStorageObject {
        CreatingStorageObject::new("pvc", "Test Storage", "5Gi")
    }

    fn expected() -> serde_json::Value {
        json!({
            "apiVersion": "v1",
            "kind": "PersistentVolumeClaim",
            "metadata": {
                "annotations": {
                    "openshift.io/description": "Test Storage",
                    "openshift.io/display-name": "pvc",
                },
                "labels": { "opendatahub.io/dashboard": "true" },
                "name": "pvc",
                "namespace": "namespace",
            },
            "spec": {
                "accessModes": ["ReadWriteOnce"],
                "resources": { "requests": { "storage": "5Gi" } },
                "volumeMode": "Filesystem",
            },
            "status": { "phase": "Pending" },
        })
    }

    #[test]
    fn test_assemble_pvc_without_edit_name() {
        let pvc = assemble_pvc(&data(), "namespace", None);
        assert_eq!(serde_json::to_value(&pvc).unwrap(), expected());
    }

    #[test]
    fn test_assemble_pvc_with_edit_name() {
        let pvc = assemble_pvc(&data(), "namespace", Some("editName"));
        let mut expected = expected();
        expected["metadata"]["name"] = json!("editName");
        assert_eq!(serde_json::to_value(&pvc).unwrap(), expected);
    }

    #[test]
    fn test_assemble_pvc_translates_display_name() {
        let data = CreatingStorageObject::new("  My Training Data ", "", "1Gi");
        let pvc = assemble_pvc(&data, "proj", None);
        assert_eq!(pvc.metadata.name.as_deref(), Some("my-training-data"));
        let annotations = pvc.metadata.annotations.unwrap();
        assert_eq!(annotations["openshift.io/display-name"], "My Training Data");
        assert_eq!(annotations["openshift.io/description"], "");
    }

    #[test]
    fn test_assemble_pvc_storage_class() {
        let data = data().with_storage_class("gp3-csi");
        let value = serde_json::to_value(assemble_pvc(&data, "namespace", None)).unwrap();
        assert_eq!(value["spec"]["storageClassName"], "gp3-csi");
    }
}

mod access_mode_tests {
    use dashboard_storage::resources::pvc::{access_modes, is_multi_use, requested_size};

    use crate::common::fixtures::{PvcBuilder, dashboard_pvc};

    #[test]
    fn test_single_node_claim_is_not_multi_use() {
        let pvc = dashboard_pvc("data", "proj");
        assert_eq!(access_modes(&pvc), ["ReadWriteOnce".to_string()]);
        assert!(!is_multi_use(&pvc));
    }

    #[test]
    fn test_read_only_many_is_multi_use() {
        let pvc = PvcBuilder::new("shared").access_modes(&["ReadOnlyMany"]).build();
        assert!(is_multi_use(&pvc));
    }

    #[test]
    fn test_read_write_many_is_multi_use() {
        let pvc = PvcBuilder::new("shared")
            .access_modes(&["ReadWriteOnce", "ReadWriteMany"])
            .build();
        assert!(is_multi_use(&pvc));
    }

    #[test]
    fn test_no_access_modes() {
        let pvc = PvcBuilder::new("empty").access_modes(&[]).build();
        assert!(access_modes(&pvc).is_empty());
        assert!(!is_multi_use(&pvc));
    }

    #[test]
    fn test_requested_size() {
        let pvc = PvcBuilder::new("data")
            .size("20Gi")
            .storage_class("standard")
            .build();
        assert_eq!(requested_size(&pvc), Some("20Gi"));
    }
}

mod display_tests {
    use dashboard_storage::resources::{get_description, get_display_name};

    use crate::common::fixtures::PvcBuilder;

    #[test]
    fn test_display_name_from_annotation() {
        let pvc = PvcBuilder::new("data")
            .annotation("openshift.io/display-name", "Training Data")
            .annotation("openshift.io/description", "Images for the model")
            .build();
        assert_eq!(get_display_name(&pvc), "Training Data");
        assert_eq!(get_description(&pvc), "Images for the model");
    }

    #[test]
    fn test_display_name_falls_back_to_name() {
        let pvc = PvcBuilder::default().build();
        assert_eq!(get_display_name(&pvc), "test-storage");
        assert_eq!(get_description(&pvc), "");
    }
}

mod query_option_tests {
    use dashboard_storage::client::{K8sApiOptions, PVC_MODEL, QueryOptions};
    use dashboard_storage::resources::dashboard_label_selector;
    use serde_json::json;

    #[test]
    fn test_pvc_model() {
        assert_eq!(PVC_MODEL.api_version, "v1");
        assert_eq!(PVC_MODEL.kind, "PersistentVolumeClaim");
        assert_eq!(PVC_MODEL.plural, "persistentvolumeclaims");
    }

    #[test]
    fn test_list_options_shape() {
        let opts = QueryOptions::selected("projectName", &dashboard_label_selector());
        assert_eq!(
            serde_json::to_value(&opts).unwrap(),
            json!({
                "ns": "projectName",
                "queryParams": { "labelSelector": "opendatahub.io/dashboard=true" },
            })
        );
    }

    #[test]
    fn test_patch_options_shape() {
        let opts = QueryOptions::named("namespace", "pvcName")
            .with_api_options(&K8sApiOptions::default());
        assert_eq!(
            serde_json::to_value(&opts).unwrap(),
            json!({ "name": "pvcName", "ns": "namespace", "queryParams": {} })
        );
    }
}
