#![cfg(feature = "binary-cache")]

use pathrules::serial::{inspect, source_digest};
use pathrules::{Compiler, DeserializeError, Directives, PathSegment, RuleCategory, RuleNode};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn chat_rules() -> RuleNode {
    Compiler::new()
        .compile(|root| {
            root.at("rooms/$room", |room| {
                room.add(RuleCategory::Read, "auth != null");
                room.authorize(
                    Directives::new()
                        .rule(RuleCategory::Write, "auth.uid == data.child('owner').val()")
                        .child(
                            "messages",
                            Directives::new().child(
                                "$msg",
                                Directives::new()
                                    .rule(RuleCategory::Create, "auth != null")
                                    .rule(RuleCategory::Validate, "newData.hasChildren(['text'])"),
                            ),
                        ),
                )
            });
            root.at("users/$uid", |user| {
                user.add(RuleCategory::Read, "auth.uid == $uid")
                    .add(RuleCategory::Write, "auth.uid == $uid");
                Ok(())
            });
            Ok(())
        })
        .into_result()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Round-trip
// ---------------------------------------------------------------------------

#[test]
fn round_trip_preserves_tree() {
    let original = chat_rules();
    let bytes = original.to_bytes(None).unwrap();
    let restored = RuleNode::from_bytes(&bytes).unwrap();

    assert_eq!(restored, original);
    assert_eq!(restored.to_string(), original.to_string());
}

#[test]
fn round_trip_preserves_variable_names() {
    let original = chat_rules();
    let restored = RuleNode::from_bytes(&original.to_bytes(None).unwrap()).unwrap();

    let rooms = restored.child(&PathSegment::literal("rooms")).unwrap();
    let (key, room) = rooms.children().iter().next().unwrap();
    assert_eq!(key.name(), "room");
    let messages = room.child(&PathSegment::literal("messages")).unwrap();
    assert_eq!(messages.children().keys().next().unwrap().name(), "msg");
}

#[test]
fn round_trip_empty_tree() {
    let bytes = RuleNode::new().to_bytes(None).unwrap();
    let restored = RuleNode::from_bytes(&bytes).unwrap();
    assert!(restored.is_empty());
}

#[test]
fn hollow_branches_are_dropped_on_write() {
    let tree = RuleNode::new()
        .with_rule(RuleCategory::Read, "p")
        .with_child(PathSegment::literal("hollow"), RuleNode::new())
        .with_child(
            PathSegment::literal("outer"),
            RuleNode::new().with_child(PathSegment::variable("id"), RuleNode::new()),
        );
    let bytes = tree.to_bytes(None).unwrap();

    let info = inspect(&bytes).unwrap();
    assert_eq!(info.node_count, 1);
    assert_eq!(info.predicate_count, 1);

    let restored = RuleNode::from_bytes(&bytes).unwrap();
    assert!(restored.children().is_empty());
    assert_eq!(restored, pathrules::prune_empty(tree));
}

#[test]
fn file_round_trip() {
    let original = chat_rules();
    let path = std::env::temp_dir().join(format!("pathrules-cache-{}.bin", std::process::id()));

    original.to_binary_file(&path, Some("rules source")).unwrap();
    let restored = RuleNode::from_binary_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(restored, original);
}

// ---------------------------------------------------------------------------
// Inspect
// ---------------------------------------------------------------------------

#[test]
fn inspect_reports_counts_and_digest() {
    let original = chat_rules();
    let source = "rooms/$room: read auth != null";
    let bytes = original.to_bytes(Some(source)).unwrap();

    let info = inspect(&bytes).unwrap();
    assert_eq!(info.node_count, original.len());
    assert_eq!(info.predicate_count, original.predicate_count());
    assert_eq!(info.source_digest, Some(source_digest(source)));
}

#[test]
fn inspect_without_source_has_no_digest() {
    let bytes = chat_rules().to_bytes(None).unwrap();
    assert_eq!(inspect(&bytes).unwrap().source_digest, None);
}

// ---------------------------------------------------------------------------
// Corruption
// ---------------------------------------------------------------------------

#[test]
fn bad_magic_rejected() {
    let mut bytes = chat_rules().to_bytes(None).unwrap();
    bytes[0] = b'X';
    assert!(matches!(
        RuleNode::from_bytes(&bytes),
        Err(DeserializeError::BadMagic)
    ));
}

#[test]
fn wrong_format_version_rejected() {
    let mut bytes = chat_rules().to_bytes(None).unwrap();
    bytes[4] = 0xFF;
    assert!(matches!(
        RuleNode::from_bytes(&bytes),
        Err(DeserializeError::IncompatibleVersion { blob: 0xFF, .. })
    ));
}

#[test]
fn flipped_payload_byte_fails_checksum() {
    let mut bytes = chat_rules().to_bytes(None).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    assert!(matches!(
        RuleNode::from_bytes(&bytes),
        Err(DeserializeError::ChecksumMismatch)
    ));
}

#[test]
fn truncated_blob_rejected() {
    let bytes = chat_rules().to_bytes(None).unwrap();
    assert!(matches!(
        RuleNode::from_bytes(&bytes[..bytes.len() - 3]),
        Err(DeserializeError::LengthMismatch { .. })
    ));
    assert!(matches!(
        RuleNode::from_bytes(&bytes[..10]),
        Err(DeserializeError::LengthMismatch { .. })
    ));
}

#[test]
fn missing_file_is_io_error() {
    let result = RuleNode::from_binary_file("/nonexistent/pathrules.bin");
    assert!(matches!(result, Err(DeserializeError::Io(_))));
}
