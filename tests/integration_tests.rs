//! Integration tests for the complete protomix pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - descriptor loading → extraction → mixin expansion → `.proto` emission
//! - descriptor loading → declaration-order visitation with comments
//!
//! Run with: cargo test --test integration_tests

use std::path::PathBuf;
use tempfile::tempdir;

// ============================================================================
// Mixin expansion (load → extract → expand → write)
// ============================================================================

fn write_descriptor(dir: &std::path::Path, name: &str, value: serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    path
}

#[test]
fn test_expand_across_two_descriptor_sets() {
    use protomix_expand::expand_proto_files;

    let dir = tempdir().expect("tempdir");
    let common = write_descriptor(
        dir.path(),
        "common.json",
        serde_json::json!({
            "file": [{
                "name": "acme/common.proto",
                "package": "acme.common",
                "messageType": [{
                    "name": "Audited",
                    "field": [
                        { "name": "actor", "number": 100, "type": "TYPE_STRING" },
                        { "name": "at", "number": 101, "type": "TYPE_INT64" }
                    ]
                }]
            }]
        }),
    );
    let wallet = write_descriptor(
        dir.path(),
        "wallet.json",
        serde_json::json!({
            "file": [{
                "name": "acme/wallet.proto",
                "package": "acme",
                "messageType": [{
                    "name": "Wallet",
                    "field": [{ "name": "balance", "number": 1, "type": "TYPE_INT64" }],
                    "options": { "[protomix.mixins]": ["acme.common.Audited"] }
                }]
            }]
        }),
    );

    let out_dir = dir.path().join("gen");
    let result = expand_proto_files(&[common, wallet], &out_dir).expect("expansion succeeds");

    assert_eq!(result.stats.files, 2);
    assert_eq!(result.stats.messages, 2);
    assert_eq!(result.stats.expanded, 1);
    assert_eq!(result.written, vec![out_dir.join("wallet.proto")]);

    let text = std::fs::read_to_string(&result.written[0]).expect("read output");
    assert_eq!(
        text,
        "syntax = \"proto3\";\n\n\
         message Wallet {\n\
         \x20 string actor = 100;\n\
         \x20 int64 at = 101;\n\
         \x20 int64 balance = 1;\n\
         }"
    );
}

#[test]
fn test_expand_aborts_on_field_number_conflict_without_output() {
    use protomix_expand::{expand_proto_files, ExpandError};

    let dir = tempdir().expect("tempdir");
    let input = write_descriptor(
        dir.path(),
        "conflict.json",
        serde_json::json!({
            "file": [{
                "name": "conflict.proto",
                "messageType": [
                    { "name": "A", "field": [{ "name": "x", "number": 1, "type": "TYPE_INT32" }] },
                    {
                        "name": "B",
                        "field": [{ "name": "x", "number": 1, "type": "TYPE_INT32" }],
                        "options": { "[protomix.mixins]": "A" }
                    }
                ]
            }]
        }),
    );

    let out_dir = dir.path().join("gen");
    let err = expand_proto_files(&[input], &out_dir).expect_err("conflict must abort");
    match err {
        ExpandError::FieldIdConflict { field, tag, message } => {
            assert_eq!((field.as_str(), tag, message.as_str()), ("x", 1, "B"));
        }
        other => panic!("expected FieldIdConflict, got {other:?}"),
    }
    assert!(!out_dir.exists(), "no partial output before the failure");
}

#[test]
fn test_expand_aborts_on_missing_mixin() {
    use protomix_expand::{expand_proto_files, ExpandError};

    let dir = tempdir().expect("tempdir");
    let input = write_descriptor(
        dir.path(),
        "missing.json",
        serde_json::json!({
            "file": [{
                "name": "missing.proto",
                "messageType": [
                    { "name": "Host", "options": { "[protomix.mixins]": "acme.Nowhere" } }
                ]
            }]
        }),
    );

    let err = expand_proto_files(&[input], &dir.path().join("gen")).expect_err("must fail");
    assert!(matches!(err, ExpandError::MixinNotFound { name } if name == "acme.Nowhere"));
}

// ============================================================================
// Visitation over a loaded file (comments + naming)
// ============================================================================

#[test]
fn test_visit_loaded_file_pairs_names_with_comments() {
    use protomix_descriptor::load_descriptor_set;
    use protomix_visit::{visit, Node, SourceInfo, VisitOptions};

    let dir = tempdir().expect("tempdir");
    let input = write_descriptor(
        dir.path(),
        "api.json",
        serde_json::json!({
            "file": [{
                "name": "acme/api.proto",
                "package": "acme",
                "messageType": [{
                    "name": "payment_request",
                    "nestedType": [{ "name": "line_item" }]
                }],
                "sourceCodeInfo": {
                    "location": [
                        { "path": [4, 0], "leadingComments": " One payment.\n" },
                        { "path": [4, 0, 3, 0], "leadingComments": " One line.\n" }
                    ]
                }
            }]
        }),
    );

    let set = load_descriptor_set(&input).expect("loads");
    let file = &set.file[0];
    let options = VisitOptions {
        snake_to_camel: true,
        ..VisitOptions::default()
    };

    let mut seen: Vec<(String, String, Option<String>)> = Vec::new();
    let source_info = SourceInfo::root(file);
    visit(
        Node::File(file),
        &source_info,
        &options,
        &mut |name, _, cursor, qualified| {
            seen.push((
                name.to_string(),
                qualified.to_string(),
                cursor.comment().map(str::to_string),
            ));
            Ok(())
        },
        &mut |_, _, _, _| Ok(()),
        "",
        "",
    )
    .expect("walk succeeds");

    assert_eq!(
        seen,
        vec![
            (
                "PaymentRequest".to_string(),
                "payment_request".to_string(),
                Some("One payment.".to_string())
            ),
            (
                "PaymentRequestLineItem".to_string(),
                "payment_request.line_item".to_string(),
                Some("One line.".to_string())
            ),
        ]
    );
}
