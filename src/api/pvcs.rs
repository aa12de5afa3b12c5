//! PersistentVolumeClaim accessors.
//!
//! Each accessor builds one call descriptor, hands it to the resource client
//! and decodes the answer. Client failures are returned exactly as received.

use json_patch::{PatchOperation, ReplaceOperation};
use jsonptr::PointerBuf;
use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::client::{
    CreateResource, DeleteResource, GetResource, K8sApiOptions, ListResourceItems, PVC_MODEL,
    PatchResource, QueryOptions, ResourceClient, UpdateResource,
};
use crate::error::{Error, Result};
use crate::resources::common::{dashboard_label_selector, merge_json};
use crate::resources::pvc::{CreatingStorageObject, assemble_pvc, is_multi_use};

/// Fetch a single claim.
pub async fn get_pvc<C>(
    client: &C,
    project_name: &str,
    pvc_name: &str,
) -> Result<PersistentVolumeClaim>
where
    C: ResourceClient + ?Sized,
{
    let value = client
        .get_resource(GetResource {
            model: PVC_MODEL,
            query_options: QueryOptions::named(project_name, pvc_name),
        })
        .await?;
    decode(value)
}

/// List the claims in a project that carry the dashboard label.
pub async fn get_dashboard_pvcs<C>(
    client: &C,
    project_name: &str,
) -> Result<Vec<PersistentVolumeClaim>>
where
    C: ResourceClient + ?Sized,
{
    let items = client
        .list_resource_items(ListResourceItems {
            model: PVC_MODEL,
            query_options: QueryOptions::selected(project_name, &dashboard_label_selector()),
        })
        .await?;
    items.into_iter().map(decode).collect()
}

/// Dashboard claims in a project that more than one workbench can mount.
pub async fn get_available_multi_use_pvcs<C>(
    client: &C,
    project_name: &str,
) -> Result<Vec<PersistentVolumeClaim>>
where
    C: ResourceClient + ?Sized,
{
    let pvcs = get_dashboard_pvcs(client, project_name).await?;
    let total = pvcs.len();
    let multi_use: Vec<_> = pvcs.into_iter().filter(|pvc| is_multi_use(pvc)).collect();
    debug!(
        project = %project_name,
        total,
        multi_use = multi_use.len(),
        "Filtered multi-use claims"
    );
    Ok(multi_use)
}

/// Create a claim from user input.
#[instrument(skip_all, fields(namespace = %namespace, name = %data.name_desc.name))]
pub async fn create_pvc<C>(
    client: &C,
    data: &CreatingStorageObject,
    namespace: &str,
    opts: &K8sApiOptions,
) -> Result<PersistentVolumeClaim>
where
    C: ResourceClient + ?Sized,
{
    let pvc = assemble_pvc(data, namespace, None);
    let value = client
        .create_resource(CreateResource {
            model: PVC_MODEL,
            query_options: QueryOptions::default().with_api_options(opts),
            resource: serde_json::to_value(&pvc)?,
        })
        .await?;
    decode(value)
}

/// Replace an existing claim with edited user input.
///
/// The existing object is kept as the base so server-managed fields such as
/// `resourceVersion` and `volumeName` survive; the freshly assembled claim is
/// merged over it under the existing object name. Arrays such as
/// `accessModes` are replaced whole, not merged element by element.
#[instrument(skip_all, fields(namespace = %namespace, name = ?existing.metadata.name))]
pub async fn update_pvc<C>(
    client: &C,
    data: &CreatingStorageObject,
    existing: &PersistentVolumeClaim,
    namespace: &str,
    opts: &K8sApiOptions,
) -> Result<PersistentVolumeClaim>
where
    C: ResourceClient + ?Sized,
{
    let pvc = assemble_pvc(data, namespace, existing.metadata.name.as_deref());
    let mut resource = serde_json::to_value(existing)?;
    merge_json(&mut resource, serde_json::to_value(&pvc)?);

    let value = client
        .update_resource(UpdateResource {
            model: PVC_MODEL,
            query_options: QueryOptions::default().with_api_options(opts),
            resource,
        })
        .await?;
    decode(value)
}

/// Change the requested storage of a claim.
#[instrument(skip_all, fields(namespace = %namespace, name = %pvc_name, size = %size))]
pub async fn update_pvc_size<C>(
    client: &C,
    pvc_name: &str,
    namespace: &str,
    size: &str,
    opts: &K8sApiOptions,
) -> Result<PersistentVolumeClaim>
where
    C: ResourceClient + ?Sized,
{
    let patches = json_patch::Patch(vec![PatchOperation::Replace(ReplaceOperation {
        path: PointerBuf::from_tokens(["spec", "resources", "requests"]),
        value: json!({ "storage": size }),
    })]);

    let value = client
        .patch_resource(PatchResource {
            model: PVC_MODEL,
            query_options: QueryOptions::named(namespace, pvc_name).with_api_options(opts),
            patches,
        })
        .await?;
    decode(value)
}

/// Delete a claim.
///
/// The server's `Status` is returned whether it reports success or failure.
#[instrument(skip_all, fields(namespace = %namespace, name = %pvc_name))]
pub async fn delete_pvc<C>(client: &C, pvc_name: &str, namespace: &str) -> Result<Status>
where
    C: ResourceClient + ?Sized,
{
    client
        .delete_resource(DeleteResource {
            model: PVC_MODEL,
            query_options: QueryOptions::named(namespace, pvc_name),
        })
        .await
}

fn decode(value: Value) -> Result<PersistentVolumeClaim> {
    serde_json::from_value(value).map_err(Error::from)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::api::core::v1::{PersistentVolumeClaimSpec, PersistentVolumeClaimStatus};
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, StatusDetails};
    use mockall::predicate::eq;

    use super::*;
    use crate::client::MockResourceClient;
    use crate::resources::pvc::{
        READ_ONLY_MANY, READ_WRITE_MANY, READ_WRITE_ONCE, storage_request,
    };

    fn data() -> CreatingStorageObject {
        CreatingStorageObject::new("pvc", "Test Storage", "5Gi")
    }

    fn assembled_with_modes(modes: &[&str]) -> PersistentVolumeClaim {
        let mut pvc = assemble_pvc(&data(), "namespace", None);
        if let Some(spec) = pvc.spec.as_mut() {
            spec.access_modes = Some(modes.iter().map(|m| m.to_string()).collect());
        }
        pvc
    }

    /// A bound claim as the API server returns it.
    fn pvc_mock() -> PersistentVolumeClaim {
        PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some("test-storage".to_string()),
                namespace: Some("test-project".to_string()),
                labels: Some(BTreeMap::from([(
                    "opendatahub.io/dashboard".to_string(),
                    "true".to_string(),
                )])),
                annotations: Some(BTreeMap::from([
                    (
                        "openshift.io/display-name".to_string(),
                        "Test Storage".to_string(),
                    ),
                    ("openshift.io/description".to_string(), String::new()),
                ])),
                resource_version: Some("1309350".to_string()),
                uid: Some("d39f16a4-c6b2-4d3a-a5b2-6e6f1f6a1a21".to_string()),
                ..Default::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec![READ_WRITE_ONCE.to_string()]),
                resources: Some(k8s_openapi::api::core::v1::VolumeResourceRequirements {
                    requests: Some(storage_request("5Gi")),
                    ..Default::default()
                }),
                storage_class_name: Some("gp3".to_string()),
                volume_mode: Some("Filesystem".to_string()),
                volume_name: Some("pvc-8644e33b-3c4c-4b6a-9c1a-8a2f4b7c2d10".to_string()),
                ..Default::default()
            }),
            status: Some(PersistentVolumeClaimStatus {
                phase: Some("Bound".to_string()),
                access_modes: Some(vec![READ_WRITE_ONCE.to_string()]),
                capacity: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity("5Gi".to_string()),
                )])),
                ..Default::default()
            }),
        }
    }

    fn mock_value() -> Value {
        serde_json::to_value(pvc_mock()).unwrap()
    }

    fn client_error() -> Error {
        Error::Kube(kube::Error::Service("error1".into()))
    }

    fn assert_client_error(err: Error) {
        match err {
            Error::Kube(kube::Error::Service(source)) => assert_eq!(source.to_string(), "error1"),
            other => panic!("expected the client error back, got {other:?}"),
        }
    }

    fn get_call() -> GetResource {
        GetResource {
            model: PVC_MODEL,
            query_options: QueryOptions::named("projectName", "pvcName"),
        }
    }

    fn list_call() -> ListResourceItems {
        ListResourceItems {
            model: PVC_MODEL,
            query_options: QueryOptions {
                ns: Some("projectName".to_string()),
                name: None,
                query_params: Some(BTreeMap::from([(
                    "labelSelector".to_string(),
                    "opendatahub.io/dashboard=true".to_string(),
                )])),
            },
        }
    }

    fn empty_params() -> Option<BTreeMap<String, String>> {
        Some(BTreeMap::new())
    }

    fn create_call() -> CreateResource {
        CreateResource {
            model: PVC_MODEL,
            query_options: QueryOptions {
                query_params: empty_params(),
                ..Default::default()
            },
            resource: serde_json::to_value(assembled_with_modes(&[READ_WRITE_ONCE])).unwrap(),
        }
    }

    fn update_call() -> UpdateResource {
        UpdateResource {
            model: PVC_MODEL,
            query_options: QueryOptions {
                query_params: empty_params(),
                ..Default::default()
            },
            resource: serde_json::to_value(assembled_with_modes(&[READ_WRITE_ONCE])).unwrap(),
        }
    }

    fn patch_call() -> PatchResource {
        PatchResource {
            model: PVC_MODEL,
            query_options: QueryOptions {
                ns: Some("namespace".to_string()),
                name: Some("pvcName".to_string()),
                query_params: empty_params(),
            },
            patches: serde_json::from_value(json!([
                { "op": "replace", "path": "/spec/resources/requests", "value": { "storage": "size" } }
            ]))
            .unwrap(),
        }
    }

    fn delete_call() -> DeleteResource {
        DeleteResource {
            model: PVC_MODEL,
            query_options: QueryOptions::named("namespace", "pvcName"),
        }
    }

    #[test]
    fn test_assemble_pvc_without_edit_name() {
        let pvc = assemble_pvc(&data(), "namespace", None);
        assert_eq!(pvc, assembled_with_modes(&[READ_WRITE_ONCE]));
        assert_eq!(pvc.metadata.name.as_deref(), Some("pvc"));
    }

    #[test]
    fn test_assemble_pvc_with_edit_name() {
        let pvc = assemble_pvc(&data(), "namespace", Some("editName"));
        let mut expected = assembled_with_modes(&[READ_WRITE_ONCE]);
        expected.metadata.name = Some("editName".to_string());
        assert_eq!(pvc, expected);
    }

    #[tokio::test]
    async fn test_get_pvc() {
        let mut client = MockResourceClient::new();
        let value = mock_value();
        client
            .expect_get_resource()
            .with(eq(get_call()))
            .times(1)
            .returning(move |_| Ok(value.clone()));

        let result = get_pvc(&client, "projectName", "pvcName").await.unwrap();
        assert_eq!(result, pvc_mock());
    }

    #[tokio::test]
    async fn test_get_pvc_error() {
        let mut client = MockResourceClient::new();
        client
            .expect_get_resource()
            .with(eq(get_call()))
            .times(1)
            .returning(|_| Err(client_error()));

        let err = get_pvc(&client, "projectName", "pvcName").await.unwrap_err();
        assert_client_error(err);
    }

    #[tokio::test]
    async fn test_get_dashboard_pvcs() {
        let mut client = MockResourceClient::new();
        let value = mock_value();
        client
            .expect_list_resource_items()
            .with(eq(list_call()))
            .times(1)
            .returning(move |_| Ok(vec![value.clone()]));

        let result = get_dashboard_pvcs(&client, "projectName").await.unwrap();
        assert_eq!(result, vec![pvc_mock()]);
    }

    #[tokio::test]
    async fn test_get_dashboard_pvcs_error() {
        let mut client = MockResourceClient::new();
        client
            .expect_list_resource_items()
            .with(eq(list_call()))
            .times(1)
            .returning(|_| Err(client_error()));

        let err = get_dashboard_pvcs(&client, "projectName").await.unwrap_err();
        assert_client_error(err);
    }

    #[tokio::test]
    async fn test_multi_use_read_only_many() {
        let mut client = MockResourceClient::new();
        let listed = serde_json::to_value(assembled_with_modes(&[READ_ONLY_MANY])).unwrap();
        client
            .expect_list_resource_items()
            .with(eq(list_call()))
            .times(1)
            .returning(move |_| Ok(vec![listed.clone()]));

        let result = get_available_multi_use_pvcs(&client, "projectName")
            .await
            .unwrap();
        assert_eq!(result, vec![assembled_with_modes(&[READ_ONLY_MANY])]);
    }

    #[tokio::test]
    async fn test_multi_use_read_write_many() {
        let mut client = MockResourceClient::new();
        let listed = serde_json::to_value(assembled_with_modes(&[READ_WRITE_MANY])).unwrap();
        client
            .expect_list_resource_items()
            .with(eq(list_call()))
            .times(1)
            .returning(move |_| Ok(vec![listed.clone()]));

        let result = get_available_multi_use_pvcs(&client, "projectName")
            .await
            .unwrap();
        assert_eq!(result, vec![assembled_with_modes(&[READ_WRITE_MANY])]);
    }

    #[tokio::test]
    async fn test_multi_use_filters_single_node_claims() {
        let mut client = MockResourceClient::new();
        let listed = vec![
            serde_json::to_value(assembled_with_modes(&[READ_WRITE_ONCE])).unwrap(),
            serde_json::to_value(assembled_with_modes(&[READ_WRITE_ONCE, READ_ONLY_MANY]))
                .unwrap(),
            mock_value(),
            serde_json::to_value(assembled_with_modes(&[READ_WRITE_MANY])).unwrap(),
        ];
        client
            .expect_list_resource_items()
            .with(eq(list_call()))
            .times(1)
            .returning(move |_| Ok(listed.clone()));

        let result = get_available_multi_use_pvcs(&client, "projectName")
            .await
            .unwrap();
        assert_eq!(
            result,
            vec![
                assembled_with_modes(&[READ_WRITE_ONCE, READ_ONLY_MANY]),
                assembled_with_modes(&[READ_WRITE_MANY]),
            ]
        );
    }

    #[tokio::test]
    async fn test_multi_use_error() {
        let mut client = MockResourceClient::new();
        client
            .expect_list_resource_items()
            .with(eq(list_call()))
            .times(1)
            .returning(|_| Err(client_error()));

        let err = get_available_multi_use_pvcs(&client, "projectName")
            .await
            .unwrap_err();
        assert_client_error(err);
    }

    #[tokio::test]
    async fn test_create_pvc() {
        let mut client = MockResourceClient::new();
        let value = mock_value();
        client
            .expect_create_resource()
            .with(eq(create_call()))
            .times(1)
            .returning(move |_| Ok(value.clone()));

        let result = create_pvc(&client, &data(), "namespace", &K8sApiOptions::default())
            .await
            .unwrap();
        assert_eq!(result, pvc_mock());
    }

    #[tokio::test]
    async fn test_create_pvc_dry_run() {
        let mut expected = create_call();
        expected.query_options.query_params = Some(BTreeMap::from([(
            "dryRun".to_string(),
            "All".to_string(),
        )]));

        let mut client = MockResourceClient::new();
        let value = mock_value();
        client
            .expect_create_resource()
            .with(eq(expected))
            .times(1)
            .returning(move |_| Ok(value.clone()));

        create_pvc(&client, &data(), "namespace", &K8sApiOptions::dry_run())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_pvc_error() {
        let mut client = MockResourceClient::new();
        client
            .expect_create_resource()
            .with(eq(create_call()))
            .times(1)
            .returning(|_| Err(client_error()));

        let err = create_pvc(&client, &data(), "namespace", &K8sApiOptions::default())
            .await
            .unwrap_err();
        assert_client_error(err);
    }

    #[tokio::test]
    async fn test_update_pvc() {
        let mut client = MockResourceClient::new();
        let value = mock_value();
        client
            .expect_update_resource()
            .with(eq(update_call()))
            .times(1)
            .returning(move |_| Ok(value.clone()));

        let existing = assembled_with_modes(&[READ_WRITE_ONCE]);
        let result = update_pvc(
            &client,
            &data(),
            &existing,
            "namespace",
            &K8sApiOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(result, pvc_mock());
    }

    #[tokio::test]
    async fn test_update_pvc_keeps_server_fields() {
        let existing = pvc_mock();
        let edited = CreatingStorageObject::new("Renamed Storage", "now described", "10Gi");

        let mut client = MockResourceClient::new();
        client
            .expect_update_resource()
            .times(1)
            .returning(|call| Ok(call.resource));

        let result = update_pvc(
            &client,
            &edited,
            &existing,
            "test-project",
            &K8sApiOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.metadata.name.as_deref(), Some("test-storage"));
        assert_eq!(result.metadata.resource_version.as_deref(), Some("1309350"));
        assert_eq!(
            result.metadata.annotations.as_ref().unwrap()["openshift.io/display-name"],
            "Renamed Storage"
        );
        let spec = result.spec.unwrap();
        assert_eq!(spec.storage_class_name.as_deref(), Some("gp3"));
        assert!(spec.volume_name.is_some());
        assert_eq!(
            spec.resources.unwrap().requests.unwrap()["storage"],
            Quantity("10Gi".to_string())
        );
    }

    #[tokio::test]
    async fn test_update_pvc_replaces_access_modes() {
        let existing = assembled_with_modes(&[READ_WRITE_MANY, READ_ONLY_MANY]);

        let mut client = MockResourceClient::new();
        client
            .expect_update_resource()
            .times(1)
            .returning(|call| Ok(call.resource));

        let result = update_pvc(
            &client,
            &data(),
            &existing,
            "namespace",
            &K8sApiOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(
            result.spec.unwrap().access_modes,
            Some(vec![READ_WRITE_ONCE.to_string()])
        );
    }

    #[tokio::test]
    async fn test_update_pvc_error() {
        let mut client = MockResourceClient::new();
        client
            .expect_update_resource()
            .with(eq(update_call()))
            .times(1)
            .returning(|_| Err(client_error()));

        let existing = assembled_with_modes(&[READ_WRITE_ONCE]);
        let err = update_pvc(
            &client,
            &data(),
            &existing,
            "namespace",
            &K8sApiOptions::default(),
        )
        .await
        .unwrap_err();
        assert_client_error(err);
    }

    #[tokio::test]
    async fn test_delete_pvc_success_status() {
        let status = Status {
            status: Some("Success".to_string()),
            code: Some(200),
            details: Some(StatusDetails {
                name: Some("pvcName".to_string()),
                kind: Some("persistentvolumeclaims".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut client = MockResourceClient::new();
        let returned = status.clone();
        client
            .expect_delete_resource()
            .with(eq(delete_call()))
            .times(1)
            .returning(move |_| Ok(returned.clone()));

        let result = delete_pvc(&client, "pvcName", "namespace").await.unwrap();
        assert_eq!(result, status);
    }

    #[tokio::test]
    async fn test_delete_pvc_failure_status() {
        let status = Status {
            status: Some("Failure".to_string()),
            code: Some(404),
            reason: Some("NotFound".to_string()),
            message: Some("persistentvolumeclaims \"pvcName\" not found".to_string()),
            ..Default::default()
        };
        let mut client = MockResourceClient::new();
        let returned = status.clone();
        client
            .expect_delete_resource()
            .with(eq(delete_call()))
            .times(1)
            .returning(move |_| Ok(returned.clone()));

        let result = delete_pvc(&client, "pvcName", "namespace").await.unwrap();
        assert_eq!(result, status);
    }

    #[tokio::test]
    async fn test_delete_pvc_error() {
        let mut client = MockResourceClient::new();
        client
            .expect_delete_resource()
            .with(eq(delete_call()))
            .times(1)
            .returning(|_| Err(client_error()));

        let err = delete_pvc(&client, "pvcName", "namespace").await.unwrap_err();
        assert_client_error(err);
    }

    #[tokio::test]
    async fn test_update_pvc_size() {
        let mut client = MockResourceClient::new();
        let value = mock_value();
        client
            .expect_patch_resource()
            .with(eq(patch_call()))
            .times(1)
            .returning(move |_| Ok(value.clone()));

        let result = update_pvc_size(
            &client,
            "pvcName",
            "namespace",
            "size",
            &K8sApiOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(result, pvc_mock());
    }

    #[tokio::test]
    async fn test_update_pvc_size_error() {
        let mut client = MockResourceClient::new();
        client
            .expect_patch_resource()
            .with(eq(patch_call()))
            .times(1)
            .returning(|_| Err(client_error()));

        let err = update_pvc_size(
            &client,
            "pvcName",
            "namespace",
            "size",
            &K8sApiOptions::default(),
        )
        .await
        .unwrap_err();
        assert_client_error(err);
    }

    #[tokio::test]
    async fn test_decode_error_is_serialization() {
        let mut client = MockResourceClient::new();
        client
            .expect_get_resource()
            .times(1)
            .returning(|_| {
                Ok(json!({
                    "apiVersion": "v1",
                    "kind": "PersistentVolumeClaim",
                    "spec": "bogus",
                }))
            });

        let err = get_pvc(&client, "projectName", "pvcName").await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
