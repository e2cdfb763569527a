use super::*;
use crate::session_store::types::ContentType;
use proptest::prelude::*;

#[test]
fn accepts_plain_ids() {
    assert!(validate_id("WFS-A").is_ok());
    assert!(validate_id("IMPL_001.v2").is_ok());
}

#[test]
fn rejects_empty_and_dot_segments() {
    assert!(validate_id("").is_err());
    assert!(validate_id(".").is_err());
    assert!(validate_id("..").is_err());
    assert!(validate_id("...").is_err());
}

#[test]
fn rejects_path_separators_and_traversal() {
    assert!(validate_id("a/b").is_err());
    assert!(validate_id("a\\b").is_err());
    assert!(validate_id("../evil").is_err());
    assert!(validate_id("/evil").is_err());
}

#[test]
fn content_path_for_task_lands_under_task_dir() {
    let root = Path::new("/state/active/WFS-A");
    let path = content_path(
        root,
        &ContentType::Task {
            task_id: "IMPL-001".to_string(),
        },
    )
    .unwrap();
    assert_eq!(path, root.join(".task").join("IMPL-001.json"));
}

#[test]
fn content_path_rejects_traversal_task_id() {
    let root = Path::new("/state/active/WFS-A");
    let err = content_path(
        root,
        &ContentType::Task {
            task_id: "../../../etc/passwd".to_string(),
        },
    )
    .unwrap_err();
    assert_eq!(err.kind(), "InvalidPath");
}

#[test]
fn content_path_rejects_non_traversing_invalid_charset_id() {
    let root = Path::new("/state/active/WFS-A");
    let err = content_path(
        root,
        &ContentType::Task {
            task_id: "bad id!".to_string(),
        },
    )
    .unwrap_err();
    assert_eq!(err.kind(), "InvalidId");
}

proptest! {
    #[test]
    fn validate_id_rejects_any_string_containing_a_slash(id in ".{0,10}/.{0,10}") {
        prop_assert!(validate_id(&id).is_err());
    }

    #[test]
    fn validate_id_accepts_exactly_the_whitelisted_charset(id in "[A-Za-z0-9._-]{1,20}") {
        if id.chars().all(|c| c == '.') {
            prop_assert!(validate_id(&id).is_err());
        } else {
            prop_assert!(validate_id(&id).is_ok());
        }
    }
}

#[test]
fn contain_rejects_escaping_path() {
    let root = Path::new("/state/active/WFS-A");
    let escaping = root.join("..").join("..").join("etc").join("passwd");
    assert!(contain(root, &escaping).is_err());
}

#[test]
fn contain_accepts_path_inside_root() {
    let root = Path::new("/state/active/WFS-A");
    let inside = root.join(".task").join("IMPL-001.json");
    assert!(contain(root, &inside).is_ok());
}
