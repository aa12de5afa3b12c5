//! Common resource utilities.
//!
//! Label and annotation keys shared by every object the dashboard manages,
//! plus helpers for deriving Kubernetes names from user-facing display names.

use std::collections::BTreeMap;

use kube::ResourceExt;
use serde_json::Value;

/// Label marking objects created and owned by the dashboard
pub const DASHBOARD_LABEL: &str = "opendatahub.io/dashboard";
/// Annotation holding the human-readable name
pub const DISPLAY_NAME_ANNOTATION: &str = "openshift.io/display-name";
/// Annotation holding the free-text description
pub const DESCRIPTION_ANNOTATION: &str = "openshift.io/description";

/// Longest name the API server accepts for DNS-subdomain named objects
pub const MAX_NAME_LENGTH: usize = 253;

/// Labels applied to all dashboard-managed resources
pub fn dashboard_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(DASHBOARD_LABEL.to_string(), "true".to_string())])
}

/// Label selector matching dashboard-managed resources
pub fn dashboard_label_selector() -> String {
    format!("{}=true", DASHBOARD_LABEL)
}

/// Display and description annotations for a user-named resource
pub fn display_annotations(display_name: &str, description: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            DISPLAY_NAME_ANNOTATION.to_string(),
            display_name.trim().to_string(),
        ),
        (DESCRIPTION_ANNOTATION.to_string(), description.to_string()),
    ])
}

/// Derive a Kubernetes object name from a display name.
///
/// Lowercases, turns whitespace into `-`, drops anything outside `[a-z0-9-]`
/// and strips dashes from both ends so the result starts and ends alphanumeric.
pub fn translate_display_name_for_k8s(display_name: &str) -> String {
    let translated: String = display_name
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('-'),
            'a'..='z' | '0'..='9' | '-' => Some(c),
            _ => None,
        })
        .collect();

    let truncated: String = translated
        .trim_matches('-')
        .chars()
        .take(MAX_NAME_LENGTH)
        .collect();
    truncated.trim_end_matches('-').to_string()
}

/// Display name of a resource, falling back to its object name
pub fn get_display_name<K: ResourceExt>(resource: &K) -> String {
    resource
        .annotations()
        .get(DISPLAY_NAME_ANNOTATION)
        .cloned()
        .unwrap_or_else(|| resource.name_any())
}

/// Description of a resource, empty when unset
pub fn get_description<K: ResourceExt>(resource: &K) -> String {
    resource
        .annotations()
        .get(DESCRIPTION_ANNOTATION)
        .cloned()
        .unwrap_or_default()
}

/// Deep-merge `overlay` into `base`.
///
/// Objects merge key by key; every other value in `overlay` (arrays included)
/// replaces what `base` held. `null` in `overlay` leaves `base` untouched.
pub fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None if value.is_null() => {}
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::PersistentVolumeClaim;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use serde_json::json;

    #[test]
    fn test_dashboard_label_selector() {
        assert_eq!(dashboard_label_selector(), "opendatahub.io/dashboard=true");
        assert_eq!(
            dashboard_labels().get(DASHBOARD_LABEL),
            Some(&"true".to_string())
        );
    }

    #[test]
    fn test_translate_simple_name() {
        assert_eq!(translate_display_name_for_k8s("pvc"), "pvc");
    }

    #[test]
    fn test_translate_spaces_and_case() {
        assert_eq!(
            translate_display_name_for_k8s("  My Data Volume "),
            "my-data-volume"
        );
    }

    #[test]
    fn test_translate_drops_invalid_characters() {
        assert_eq!(translate_display_name_for_k8s("Data_Set #1!"), "dataset-1");
        assert_eq!(translate_display_name_for_k8s("--scratch--"), "scratch");
        assert_eq!(translate_display_name_for_k8s("!!!"), "");
    }

    #[test]
    fn test_translate_truncates() {
        let long = "a".repeat(400);
        assert_eq!(translate_display_name_for_k8s(&long).len(), MAX_NAME_LENGTH);
    }

    #[test]
    fn test_display_annotations_trim_name_only() {
        let annotations = display_annotations(" pvc ", " keep spacing ");
        assert_eq!(annotations.get(DISPLAY_NAME_ANNOTATION).unwrap(), "pvc");
        assert_eq!(
            annotations.get(DESCRIPTION_ANNOTATION).unwrap(),
            " keep spacing "
        );
    }

    #[test]
    fn test_display_name_fallback() {
        let pvc = PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some("data".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(get_display_name(&pvc), "data");
        assert_eq!(get_description(&pvc), "");
    }

    #[test]
    fn test_merge_json_objects_and_arrays() {
        let mut base = json!({
            "metadata": { "name": "old", "resourceVersion": "7", "labels": { "a": "1" } },
            "spec": { "accessModes": ["ReadWriteMany", "ReadOnlyMany"], "volumeName": "pv-1" },
        });
        merge_json(
            &mut base,
            json!({
                "metadata": { "name": "new", "labels": { "b": "2" } },
                "spec": { "accessModes": ["ReadWriteOnce"], "storageClassName": null },
            }),
        );
        assert_eq!(
            base,
            json!({
                "metadata": { "name": "new", "resourceVersion": "7", "labels": { "a": "1", "b": "2" } },
                "spec": { "accessModes": ["ReadWriteOnce"], "volumeName": "pv-1" },
            })
        );
    }
}
