//! Generic cluster resource client.
//!
//! Provides a trait-based seam over the Kubernetes API so resource accessors can
//! be tested against mocks while production code talks to the API server
//! through `kube::Client`.

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Status, StatusDetails};
use kube::Client;
use kube::api::{
    Api, ApiResource, DeleteParams, DynamicObject, ListParams, Patch, PatchParams, PostParams,
};
use serde_json::Value;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::client::types::{
    CreateResource, DeleteResource, GetResource, K8sModel, ListResourceItems, PatchResource,
    QueryOptions, UpdateResource,
};
use crate::error::{Error, Result};

/// Default field manager recorded on objects this crate writes.
pub const FIELD_MANAGER: &str = "dashboard-storage";

/// Trait abstracting generic resource operations.
///
/// Payloads are untyped JSON; callers decode them into the concrete resource
/// type. Every failure is returned as-is so callers can propagate it unchanged.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetch a single object by name
    async fn get_resource(&self, call: GetResource) -> Result<Value>;

    /// List objects, optionally filtered by label selector
    async fn list_resource_items(&self, call: ListResourceItems) -> Result<Vec<Value>>;

    /// Create an object
    async fn create_resource(&self, call: CreateResource) -> Result<Value>;

    /// Replace an existing object
    async fn update_resource(&self, call: UpdateResource) -> Result<Value>;

    /// Apply a JSON patch to a named object
    async fn patch_resource(&self, call: PatchResource) -> Result<Value>;

    /// Delete a named object
    ///
    /// A delete that the server answers with a failure status still resolves
    /// successfully; only transport and API errors are returned as `Err`.
    async fn delete_resource(&self, call: DeleteResource) -> Result<Status>;
}

/// Configuration for the kube-backed client.
#[derive(Clone, Debug)]
pub struct KubeClientConfig {
    /// Field manager sent with create, replace and patch requests.
    pub field_manager: String,
}

impl Default for KubeClientConfig {
    fn default() -> Self {
        Self {
            field_manager: FIELD_MANAGER.to_string(),
        }
    }
}

/// Resource client backed by a live `kube::Client`.
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
    config: KubeClientConfig,
}

impl KubeResourceClient {
    pub fn new(client: Client, config: KubeClientConfig) -> Self {
        Self { client, config }
    }

    /// Build a dynamic API handle for a model, scoped to a namespace when given.
    fn api(&self, model: &K8sModel, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = api_resource(model);
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        }
    }

    fn post_params(&self, opts: &QueryOptions) -> PostParams {
        PostParams {
            dry_run: opts.is_dry_run(),
            field_manager: Some(self.config.field_manager.clone()),
        }
    }
}

#[async_trait]
impl ResourceClient for KubeResourceClient {
    async fn get_resource(&self, call: GetResource) -> Result<Value> {
        let opts = call.query_options;
        let name = required(opts.name.as_deref(), "queryOptions.name")?;
        debug!(kind = call.model.kind, namespace = ?opts.ns, name = %name, "Getting resource");

        let obj = self.api(&call.model, opts.ns.as_deref()).get(name).await?;
        Ok(serde_json::to_value(obj)?)
    }

    async fn list_resource_items(&self, call: ListResourceItems) -> Result<Vec<Value>> {
        let opts = call.query_options;
        let mut lp = ListParams::default();
        if let Some(selector) = opts.label_selector() {
            lp = lp.labels(selector);
        }
        debug!(
            kind = call.model.kind,
            namespace = ?opts.ns,
            selector = ?opts.label_selector(),
            "Listing resources"
        );

        let list = self.api(&call.model, opts.ns.as_deref()).list(&lp).await?;
        list.items
            .into_iter()
            .map(|obj| serde_json::to_value(obj).map_err(Error::from))
            .collect()
    }

    async fn create_resource(&self, call: CreateResource) -> Result<Value> {
        let obj: DynamicObject = serde_json::from_value(call.resource)?;
        let namespace = call
            .query_options
            .ns
            .clone()
            .or_else(|| obj.metadata.namespace.clone());
        debug!(
            kind = call.model.kind,
            namespace = ?namespace,
            name = ?obj.metadata.name,
            dry_run = call.query_options.is_dry_run(),
            "Creating resource"
        );

        let pp = self.post_params(&call.query_options);
        let created = self
            .api(&call.model, namespace.as_deref())
            .create(&pp, &obj)
            .await?;
        Ok(serde_json::to_value(created)?)
    }

    async fn update_resource(&self, call: UpdateResource) -> Result<Value> {
        let obj: DynamicObject = serde_json::from_value(call.resource)?;
        let name = required(obj.metadata.name.as_deref(), "metadata.name")?.to_string();
        let namespace = call
            .query_options
            .ns
            .clone()
            .or_else(|| obj.metadata.namespace.clone());
        debug!(
            kind = call.model.kind,
            namespace = ?namespace,
            name = %name,
            dry_run = call.query_options.is_dry_run(),
            "Replacing resource"
        );

        let pp = self.post_params(&call.query_options);
        let replaced = self
            .api(&call.model, namespace.as_deref())
            .replace(&name, &pp, &obj)
            .await?;
        Ok(serde_json::to_value(replaced)?)
    }

    async fn patch_resource(&self, call: PatchResource) -> Result<Value> {
        let opts = call.query_options;
        let name = required(opts.name.as_deref(), "queryOptions.name")?;
        debug!(
            kind = call.model.kind,
            namespace = ?opts.ns,
            name = %name,
            operations = call.patches.0.len(),
            "Patching resource"
        );

        let pp = PatchParams {
            dry_run: opts.is_dry_run(),
            field_manager: Some(self.config.field_manager.clone()),
            ..Default::default()
        };
        let patched = self
            .api(&call.model, opts.ns.as_deref())
            .patch(name, &pp, &Patch::<()>::Json(call.patches))
            .await?;
        Ok(serde_json::to_value(patched)?)
    }

    async fn delete_resource(&self, call: DeleteResource) -> Result<Status> {
        let opts = call.query_options;
        let name = required(opts.name.as_deref(), "queryOptions.name")?;
        debug!(kind = call.model.kind, namespace = ?opts.ns, name = %name, "Deleting resource");

        let dp = DeleteParams {
            dry_run: opts.is_dry_run(),
            ..Default::default()
        };
        let response = self
            .api(&call.model, opts.ns.as_deref())
            .delete(name, &dp)
            .await?;

        // Left: deletion accepted but the object lingers (finalizers).
        // Right: the server answered with a Status body.
        response.either(
            |obj| Ok(deletion_in_progress(&call.model, &obj)),
            convert_status,
        )
    }
}

/// Split a model's apiVersion into an `ApiResource`.
pub fn api_resource(model: &K8sModel) -> ApiResource {
    let (group, version) = match model.api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", model.api_version),
    };
    ApiResource {
        group: group.to_string(),
        version: version.to_string(),
        api_version: model.api_version.to_string(),
        kind: model.kind.to_string(),
        plural: model.plural.to_string(),
    }
}

fn deletion_in_progress(model: &K8sModel, obj: &DynamicObject) -> Status {
    Status {
        status: Some("Success".to_string()),
        details: Some(StatusDetails {
            name: obj.metadata.name.clone(),
            kind: Some(model.plural.to_string()),
            uid: obj.metadata.uid.clone(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Re-encode the client's status body as the API machinery `Status`.
fn convert_status<S: serde::Serialize>(status: S) -> Result<Status> {
    Ok(serde_json::from_value(serde_json::to_value(status)?)?)
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    value.ok_or_else(|| Error::MissingField(field.to_string()))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use http::{Method, Request, Response, header};
    use json_patch::{PatchOperation, ReplaceOperation};
    use jsonptr::PointerBuf;
    use kube::client::Body;
    use serde_json::json;
    use tower_test::mock::{self, Handle};

    use super::*;
    use crate::client::types::{K8sApiOptions, PVC_MODEL};

    type ApiServer = Handle<Request<Body>, Response<Body>>;

    fn mock_client() -> (KubeResourceClient, ApiServer) {
        let (service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(service, "default");
        (
            KubeResourceClient::new(client, KubeClientConfig::default()),
            handle,
        )
    }

    /// Answer the next request with `body` and hand the request back.
    fn serve_once(mut server: ApiServer, body: Value) -> tokio::task::JoinHandle<Request<Body>> {
        tokio::spawn(async move {
            let (request, send) = server.next_request().await.expect("no request sent");
            send.send_response(
                Response::builder()
                    .status(200)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            );
            request
        })
    }

    fn claim_json() -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "PersistentVolumeClaim",
            "metadata": {
                "name": "data",
                "namespace": "proj",
                "uid": "0b7c6a5e-1f2d-4c3b-9a8e-7d6c5b4a3f21",
                "labels": { "opendatahub.io/dashboard": "true" },
            },
            "spec": {
                "accessModes": ["ReadWriteOnce"],
                "resources": { "requests": { "storage": "5Gi" } },
            },
        })
    }

    fn query(request: &Request<Body>) -> String {
        request.uri().query().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_get_sends_named_path() {
        let (client, server) = mock_client();
        let served = serve_once(server, claim_json());

        let value = client
            .get_resource(GetResource {
                model: PVC_MODEL,
                query_options: QueryOptions::named("proj", "data"),
            })
            .await
            .unwrap();

        let request = served.await.unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(
            request.uri().path(),
            "/api/v1/namespaces/proj/persistentvolumeclaims/data"
        );
        assert_eq!(value["metadata"]["name"], "data");
    }

    #[tokio::test]
    async fn test_list_sends_label_selector() {
        let (client, server) = mock_client();
        let served = serve_once(
            server,
            json!({
                "apiVersion": "v1",
                "kind": "PersistentVolumeClaimList",
                "metadata": {},
                "items": [claim_json()],
            }),
        );

        let items = client
            .list_resource_items(ListResourceItems {
                model: PVC_MODEL,
                query_options: QueryOptions::selected("proj", "opendatahub.io/dashboard=true"),
            })
            .await
            .unwrap();

        let request = served.await.unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(
            request.uri().path(),
            "/api/v1/namespaces/proj/persistentvolumeclaims"
        );
        assert!(query(&request).contains("labelSelector=opendatahub.io%2Fdashboard%3Dtrue"));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["metadata"]["name"], "data");
    }

    #[tokio::test]
    async fn test_create_dry_run_sends_field_manager() {
        let (client, server) = mock_client();
        let served = serve_once(server, claim_json());

        client
            .create_resource(CreateResource {
                model: PVC_MODEL,
                query_options: QueryOptions::default().with_api_options(&K8sApiOptions::dry_run()),
                resource: claim_json(),
            })
            .await
            .unwrap();

        let request = served.await.unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(
            request.uri().path(),
            "/api/v1/namespaces/proj/persistentvolumeclaims"
        );
        let query = query(&request);
        assert!(query.contains("dryRun=All"));
        assert!(query.contains("fieldManager=dashboard-storage"));
    }

    #[tokio::test]
    async fn test_create_without_dry_run() {
        let (client, server) = mock_client();
        let served = serve_once(server, claim_json());

        client
            .create_resource(CreateResource {
                model: PVC_MODEL,
                query_options: QueryOptions::default(),
                resource: claim_json(),
            })
            .await
            .unwrap();

        let query = query(&served.await.unwrap());
        assert!(!query.contains("dryRun"));
        assert!(query.contains("fieldManager=dashboard-storage"));
    }

    #[tokio::test]
    async fn test_update_dry_run_replaces_by_name() {
        let (client, server) = mock_client();
        let served = serve_once(server, claim_json());

        client
            .update_resource(UpdateResource {
                model: PVC_MODEL,
                query_options: QueryOptions::default().with_api_options(&K8sApiOptions::dry_run()),
                resource: claim_json(),
            })
            .await
            .unwrap();

        let request = served.await.unwrap();
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(
            request.uri().path(),
            "/api/v1/namespaces/proj/persistentvolumeclaims/data"
        );
        let query = query(&request);
        assert!(query.contains("dryRun=All"));
        assert!(query.contains("fieldManager=dashboard-storage"));
    }

    #[tokio::test]
    async fn test_update_without_name_is_rejected_locally() {
        let (client, _server) = mock_client();
        let mut resource = claim_json();
        resource["metadata"] = json!({ "namespace": "proj" });

        let err = client
            .update_resource(UpdateResource {
                model: PVC_MODEL,
                query_options: QueryOptions::default(),
                resource,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingField(field) if field == "metadata.name"));
    }

    #[tokio::test]
    async fn test_patch_sends_json_patch() {
        let (client, server) = mock_client();
        let served = serve_once(server, claim_json());

        client
            .patch_resource(PatchResource {
                model: PVC_MODEL,
                query_options: QueryOptions::named("proj", "data"),
                patches: json_patch::Patch(vec![PatchOperation::Replace(ReplaceOperation {
                    path: PointerBuf::from_tokens(["spec", "resources", "requests"]),
                    value: json!({ "storage": "10Gi" }),
                })]),
            })
            .await
            .unwrap();

        let request = served.await.unwrap();
        assert_eq!(request.method(), Method::PATCH);
        assert_eq!(
            request.uri().path(),
            "/api/v1/namespaces/proj/persistentvolumeclaims/data"
        );
        assert_eq!(
            request.headers()[header::CONTENT_TYPE],
            "application/json-patch+json"
        );
        let query = query(&request);
        assert!(query.contains("fieldManager=dashboard-storage"));
        assert!(!query.contains("dryRun"));
    }

    #[tokio::test]
    async fn test_delete_pending_object_is_success() {
        let (client, server) = mock_client();
        let served = serve_once(server, claim_json());

        let status = client
            .delete_resource(DeleteResource {
                model: PVC_MODEL,
                query_options: QueryOptions::named("proj", "data"),
            })
            .await
            .unwrap();

        let request = served.await.unwrap();
        assert_eq!(request.method(), Method::DELETE);
        assert_eq!(
            request.uri().path(),
            "/api/v1/namespaces/proj/persistentvolumeclaims/data"
        );
        assert_eq!(status.status.as_deref(), Some("Success"));
        let details = status.details.unwrap();
        assert_eq!(details.name.as_deref(), Some("data"));
        assert_eq!(details.kind.as_deref(), Some("persistentvolumeclaims"));
        assert_eq!(
            details.uid.as_deref(),
            Some("0b7c6a5e-1f2d-4c3b-9a8e-7d6c5b4a3f21")
        );
    }

    #[tokio::test]
    async fn test_delete_status_body_is_converted() {
        let (client, server) = mock_client();
        let served = serve_once(
            server,
            json!({
                "apiVersion": "v1",
                "kind": "Status",
                "metadata": {},
                "status": "Success",
                "message": "",
                "reason": "",
                "code": 200,
                "details": { "name": "data", "kind": "persistentvolumeclaims" },
            }),
        );

        let status = client
            .delete_resource(DeleteResource {
                model: PVC_MODEL,
                query_options: QueryOptions::named("proj", "data"),
            })
            .await
            .unwrap();

        served.await.unwrap();
        assert_eq!(status.status.as_deref(), Some("Success"));
        assert_eq!(status.details.unwrap().name.as_deref(), Some("data"));
    }

    #[test]
    fn test_core_group_api_resource() {
        let ar = api_resource(&PVC_MODEL);
        assert_eq!(ar.group, "");
        assert_eq!(ar.version, "v1");
        assert_eq!(ar.api_version, "v1");
        assert_eq!(ar.kind, "PersistentVolumeClaim");
        assert_eq!(ar.plural, "persistentvolumeclaims");
    }

    #[test]
    fn test_grouped_api_resource() {
        let model = K8sModel {
            api_version: "storage.k8s.io/v1",
            kind: "StorageClass",
            plural: "storageclasses",
        };
        let ar = api_resource(&model);
        assert_eq!(ar.group, "storage.k8s.io");
        assert_eq!(ar.version, "v1");
        assert_eq!(ar.api_version, "storage.k8s.io/v1");
    }

    #[test]
    fn test_required_field_missing() {
        let err = required(None, "queryOptions.name").unwrap_err();
        assert!(matches!(err, Error::MissingField(field) if field == "queryOptions.name"));
        assert_eq!(required(Some("pvc"), "queryOptions.name").unwrap(), "pvc");
    }

    #[test]
    fn test_default_field_manager() {
        assert_eq!(KubeClientConfig::default().field_manager, FIELD_MANAGER);
    }
}
