// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Property-based tests for dashboard-storage.
//!
//! Uses proptest to generate random inputs and verify invariants.

use proptest::prelude::*;

use dashboard_storage::resources::common::{
    DESCRIPTION_ANNOTATION, DISPLAY_NAME_ANNOTATION, MAX_NAME_LENGTH, merge_json,
    translate_display_name_for_k8s,
};
use dashboard_storage::resources::pvc::{
    CreatingStorageObject, assemble_pvc, is_multi_use, requested_size,
};

/// Strategy for display names, including whitespace and punctuation.
fn display_name() -> impl Strategy<Value = String> {
    "[ A-Za-z0-9_.#!-]{0,80}"
}

/// Strategy for quantity strings.
fn size() -> impl Strategy<Value = String> {
    (1u32..=4096, prop_oneof![Just("Mi"), Just("Gi"), Just("Ti")])
        .prop_map(|(n, unit)| format!("{}{}", n, unit))
}

/// Strategy for namespace names.
fn namespace() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,30}[a-z0-9]"
}

proptest! {
    #[test]
    fn translated_names_are_valid(name in ".{0,300}") {
        let translated = translate_display_name_for_k8s(&name);
        prop_assert!(translated.len() <= MAX_NAME_LENGTH);
        prop_assert!(translated
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!translated.starts_with('-'));
        prop_assert!(!translated.ends_with('-'));
    }

    #[test]
    fn translation_is_idempotent(name in display_name()) {
        let once = translate_display_name_for_k8s(&name);
        prop_assert_eq!(translate_display_name_for_k8s(&once), once);
    }

    #[test]
    fn assembled_claim_mirrors_input(
        name in display_name(),
        description in ".{0,60}",
        size in size(),
        ns in namespace(),
    ) {
        let data = CreatingStorageObject::new(name.clone(), description.clone(), size.clone());
        let pvc = assemble_pvc(&data, &ns, None);
        let expected_name = translate_display_name_for_k8s(&name);

        let annotations = pvc.metadata.annotations.clone().unwrap();
        prop_assert_eq!(&annotations[DISPLAY_NAME_ANNOTATION], name.trim());
        prop_assert_eq!(&annotations[DESCRIPTION_ANNOTATION], &description);
        prop_assert_eq!(pvc.metadata.namespace.as_deref(), Some(ns.as_str()));
        prop_assert_eq!(pvc.metadata.name.as_deref(), Some(expected_name.as_str()));
        prop_assert_eq!(requested_size(&pvc), Some(size.as_str()));
        prop_assert!(!is_multi_use(&pvc));
    }

    #[test]
    fn edit_name_always_wins(name in display_name(), edit in namespace()) {
        let data = CreatingStorageObject::new(name, "", "1Gi");
        let pvc = assemble_pvc(&data, "proj", Some(&edit));
        prop_assert_eq!(pvc.metadata.name, Some(edit));
    }

    #[test]
    fn merging_a_claim_into_itself_is_identity(name in display_name(), size in size()) {
        let data = CreatingStorageObject::new(name, "", size);
        let value = serde_json::to_value(assemble_pvc(&data, "proj", None)).unwrap();
        let mut merged = value.clone();
        merge_json(&mut merged, value.clone());
        prop_assert_eq!(merged, value);
    }
}
