//! Call descriptors for the generic resource client.
//!
//! Every client operation is described by a plain value: the resource model,
//! the query options, and the body or patch when the operation has one. Keeping
//! calls as data lets tests assert on the exact shape that reached the client.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query parameter key for label selectors.
pub const LABEL_SELECTOR_PARAM: &str = "labelSelector";
/// Query parameter key for server-side dry runs.
pub const DRY_RUN_PARAM: &str = "dryRun";
/// The only dry-run value the API server accepts.
pub const DRY_RUN_ALL: &str = "All";

/// Identity of a resource type as the API server addresses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct K8sModel {
    /// `group/version`, or just `version` for the core group.
    pub api_version: &'static str,
    pub kind: &'static str,
    /// Lowercase plural used in request paths.
    pub plural: &'static str,
}

/// Model for core/v1 PersistentVolumeClaims.
pub const PVC_MODEL: K8sModel = K8sModel {
    api_version: "v1",
    kind: "PersistentVolumeClaim",
    plural: "persistentvolumeclaims",
};

/// Where a call is addressed and which query parameters it carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_params: Option<BTreeMap<String, String>>,
}

impl QueryOptions {
    /// Options addressing a single named object.
    pub fn named(namespace: &str, name: &str) -> Self {
        Self {
            ns: Some(namespace.to_string()),
            name: Some(name.to_string()),
            query_params: None,
        }
    }

    /// Options listing a namespace filtered by a label selector.
    pub fn selected(namespace: &str, label_selector: &str) -> Self {
        Self {
            ns: Some(namespace.to_string()),
            name: None,
            query_params: Some(BTreeMap::from([(
                LABEL_SELECTOR_PARAM.to_string(),
                label_selector.to_string(),
            )])),
        }
    }

    /// Apply caller request options.
    ///
    /// Always materializes `query_params` so mutating calls carry a
    /// (possibly empty) parameter map.
    pub fn with_api_options(mut self, opts: &K8sApiOptions) -> Self {
        let params = self.query_params.get_or_insert_with(BTreeMap::new);
        if opts.dry_run {
            params.insert(DRY_RUN_PARAM.to_string(), DRY_RUN_ALL.to_string());
        }
        self
    }

    /// Label selector carried in the query parameters, if any.
    pub fn label_selector(&self) -> Option<&str> {
        self.param(LABEL_SELECTOR_PARAM)
    }

    /// Whether the call asks for a server-side dry run.
    pub fn is_dry_run(&self) -> bool {
        self.param(DRY_RUN_PARAM) == Some(DRY_RUN_ALL)
    }

    fn param(&self, key: &str) -> Option<&str> {
        self.query_params
            .as_ref()
            .and_then(|params| params.get(key))
            .map(String::as_str)
    }
}

/// Per-request options for mutating calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct K8sApiOptions {
    /// Validate the request on the server without persisting it.
    pub dry_run: bool,
}

impl K8sApiOptions {
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

/// Fetch a single object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResource {
    pub model: K8sModel,
    pub query_options: QueryOptions,
}

/// List objects in a namespace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourceItems {
    pub model: K8sModel,
    pub query_options: QueryOptions,
}

/// Create an object. The namespace is taken from the resource metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResource {
    pub model: K8sModel,
    pub query_options: QueryOptions,
    pub resource: Value,
}

/// Replace an object. Name and namespace are taken from the resource metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResource {
    pub model: K8sModel,
    pub query_options: QueryOptions,
    pub resource: Value,
}

/// Apply an RFC 6902 JSON patch to a named object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchResource {
    pub model: K8sModel,
    pub query_options: QueryOptions,
    pub patches: json_patch::Patch,
}

/// Delete a named object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResource {
    pub model: K8sModel,
    pub query_options: QueryOptions,
}
