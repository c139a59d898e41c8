//! Binary serialization and deserialization of compiled rule trees.
//!
//! Compiling a large declaration set is cheap but not free; build tools that
//! run often can cache the finished [`RuleNode`](crate::RuleNode) and reload
//! it. The format consists of a 32-byte fixed header followed by a
//! bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"PRUL"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! The payload stores the tree as a flat, pre-order node list in which every
//! node names its parent by index.
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! deserialization fails immediately with [`DeserializeError::IncompatibleVersion`].
//! The engine version is informational only.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{prune_empty, PathSegment, Predicate, RuleCategory, RuleNode};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"PRUL";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`RuleNode`](crate::RuleNode) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode rule tree: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`RuleNode`](crate::RuleNode) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a pathrules binary: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedTree {
    metadata: TreeMetadata,
    nodes: Vec<SerializedNode>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TreeMetadata {
    node_count: usize,
    predicate_count: usize,
    source_digest: Option<[u8; 32]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerializedNode {
    parent: Option<usize>,
    edge: Option<SerializedSegment>,
    rules: Vec<SerializedRules>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
enum SerializedSegment {
    Literal(String),
    Variable(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerializedRules {
    category: SerializedCategory,
    predicates: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
enum SerializedCategory {
    Read,
    Create,
    Update,
    Delete,
    Validate,
    Write,
    Index,
    Children,
}

/// Extracted metadata from a binary blob, available without rebuilding the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    pub node_count: usize,
    pub predicate_count: usize,
    pub source_digest: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Category and segment conversion
// ---------------------------------------------------------------------------

fn serialize_category(category: RuleCategory) -> SerializedCategory {
    match category {
        RuleCategory::Read => SerializedCategory::Read,
        RuleCategory::Create => SerializedCategory::Create,
        RuleCategory::Update => SerializedCategory::Update,
        RuleCategory::Delete => SerializedCategory::Delete,
        RuleCategory::Validate => SerializedCategory::Validate,
        RuleCategory::Write => SerializedCategory::Write,
        RuleCategory::Index => SerializedCategory::Index,
        RuleCategory::Children => SerializedCategory::Children,
    }
}

fn deserialize_category(category: SerializedCategory) -> RuleCategory {
    match category {
        SerializedCategory::Read => RuleCategory::Read,
        SerializedCategory::Create => RuleCategory::Create,
        SerializedCategory::Update => RuleCategory::Update,
        SerializedCategory::Delete => RuleCategory::Delete,
        SerializedCategory::Validate => RuleCategory::Validate,
        SerializedCategory::Write => RuleCategory::Write,
        SerializedCategory::Index => RuleCategory::Index,
        SerializedCategory::Children => RuleCategory::Children,
    }
}

fn serialize_segment(segment: &PathSegment) -> SerializedSegment {
    match segment {
        PathSegment::Literal(s) => SerializedSegment::Literal(s.clone()),
        PathSegment::Variable(s) => SerializedSegment::Variable(s.clone()),
    }
}

fn deserialize_segment(segment: SerializedSegment) -> PathSegment {
    match segment {
        SerializedSegment::Literal(s) => PathSegment::Literal(s),
        SerializedSegment::Variable(s) => PathSegment::Variable(s),
    }
}

// ---------------------------------------------------------------------------
// RuleNode -> SerializedTree
// ---------------------------------------------------------------------------

fn flatten_node(
    node: &RuleNode,
    parent: Option<usize>,
    edge: Option<&PathSegment>,
    out: &mut Vec<SerializedNode>,
) {
    let index = out.len();
    out.push(SerializedNode {
        parent,
        edge: edge.map(serialize_segment),
        rules: node
            .rules()
            .iter()
            .map(|(category, predicates)| SerializedRules {
                category: serialize_category(*category),
                predicates: predicates.iter().map(|p| p.as_str().to_owned()).collect(),
            })
            .collect(),
    });
    for (segment, child) in node.children() {
        flatten_node(child, Some(index), Some(segment), out);
    }
}

fn tree_to_serialized(tree: &RuleNode, source_text: Option<&str>) -> SerializedTree {
    let source_digest = source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes());

    // Decoding rejects empty nodes, so hollow branches never reach the blob.
    let tree = prune_empty(tree.clone());
    let mut nodes = Vec::with_capacity(tree.len());
    flatten_node(&tree, None, None, &mut nodes);

    SerializedTree {
        metadata: TreeMetadata {
            node_count: nodes.len(),
            predicate_count: tree.predicate_count(),
            source_digest,
        },
        nodes,
    }
}

// ---------------------------------------------------------------------------
// SerializedTree -> RuleNode
// ---------------------------------------------------------------------------

fn serialized_to_tree(ser: SerializedTree) -> Result<RuleNode, DeserializeError> {
    validate(&ser)?;

    let mut links: Vec<Option<(usize, PathSegment)>> = Vec::with_capacity(ser.nodes.len());
    let mut nodes: Vec<RuleNode> = Vec::with_capacity(ser.nodes.len());
    for sn in ser.nodes {
        let mut node = RuleNode::new();
        for rules in sn.rules {
            let category = deserialize_category(rules.category);
            for predicate in rules.predicates {
                node.insert(category, Predicate::new(predicate));
            }
        }
        links.push(sn.parent.zip(sn.edge.map(deserialize_segment)));
        nodes.push(node);
    }

    // Parents always precede their children, so attaching from the back
    // moves every subtree only after it is complete.
    for index in (1..nodes.len()).rev() {
        if let Some((parent, segment)) = links[index].take() {
            let child = std::mem::take(&mut nodes[index]);
            nodes[parent].children.insert(segment, child);
        }
    }

    Ok(nodes.swap_remove(0))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(ser: &SerializedTree) -> Result<(), DeserializeError> {
    let node_count = ser.nodes.len();

    if ser.metadata.node_count != node_count {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} nodes but payload has {}",
            ser.metadata.node_count, node_count
        )));
    }

    let predicate_count: usize = ser
        .nodes
        .iter()
        .flat_map(|n| &n.rules)
        .map(|r| r.predicates.len())
        .sum();
    if ser.metadata.predicate_count != predicate_count {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} predicates but payload has {}",
            ser.metadata.predicate_count, predicate_count
        )));
    }

    let Some(root) = ser.nodes.first() else {
        return Err(DeserializeError::Validation("tree has no root node".to_owned()));
    };
    if root.parent.is_some() || root.edge.is_some() {
        return Err(DeserializeError::Validation(
            "root node must have no parent and no edge".to_owned(),
        ));
    }

    let mut child_counts = vec![0usize; node_count];
    let mut edges: BTreeSet<(usize, SerializedSegment)> = BTreeSet::new();
    for (index, node) in ser.nodes.iter().enumerate().skip(1) {
        let (Some(parent), Some(edge)) = (node.parent, &node.edge) else {
            return Err(DeserializeError::Validation(format!(
                "node {index} is missing its parent or edge"
            )));
        };
        if parent >= index {
            return Err(DeserializeError::Validation(format!(
                "node {index} names parent {parent}, which does not precede it"
            )));
        }
        // Variable edges are one edge regardless of name.
        let key = match edge {
            SerializedSegment::Variable(_) => SerializedSegment::Variable(String::new()),
            literal => literal.clone(),
        };
        if !edges.insert((parent, key)) {
            return Err(DeserializeError::Validation(format!(
                "node {parent} has a duplicate child edge"
            )));
        }
        child_counts[parent] += 1;
    }

    for (index, node) in ser.nodes.iter().enumerate() {
        let mut seen = BTreeSet::new();
        for rules in &node.rules {
            if rules.predicates.is_empty() {
                return Err(DeserializeError::Validation(format!(
                    "node {index} has an empty predicate set"
                )));
            }
            if !seen.insert(rules.category) {
                return Err(DeserializeError::Validation(format!(
                    "node {index} repeats a category"
                )));
            }
        }
        if index > 0 && node.rules.is_empty() && child_counts[index] == 0 {
            return Err(DeserializeError::Validation(format!(
                "node {index} is empty"
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) {
    let hash = blake3::hash(payload);
    let hash_bytes = hash.as_bytes();

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    #[allow(clippy::cast_possible_truncation)] // payload will never exceed 4 GiB
    let payload_len = payload.len() as u32;
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash_bytes[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] is engine_version (informational, not used for checks)
    // bytes[8..12] is flags (reserved)
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

fn checked_payload(bytes: &[u8]) -> Result<&[u8], DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_end = HEADER_SIZE + payload_len as usize;
    if bytes.len() < payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[HEADER_SIZE..payload_end];

    let computed_hash = blake3::hash(payload);
    if computed_hash.as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    Ok(payload)
}

fn decode_payload(bytes: &[u8]) -> Result<SerializedTree, DeserializeError> {
    let payload = checked_payload(bytes)?;
    let (serialized, _): (SerializedTree, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    Ok(serialized)
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(tree: &RuleNode, source_text: Option<&str>) -> Result<Vec<u8>, SerializeError> {
    let serialized = tree_to_serialized(tree, source_text);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<RuleNode, DeserializeError> {
    serialized_to_tree(decode_payload(bytes)?)
}

/// Read the metadata of a blob without rebuilding the tree.
///
/// Useful for checking a cached blob's source digest against the current
/// declaration source before deciding whether to recompile.
///
/// # Errors
///
/// Returns [`DeserializeError`] on header, integrity, or decode failure.
pub fn inspect(bytes: &[u8]) -> Result<BlobInfo, DeserializeError> {
    let ser = decode_payload(bytes)?;
    Ok(BlobInfo {
        node_count: ser.metadata.node_count,
        predicate_count: ser.metadata.predicate_count,
        source_digest: ser.metadata.source_digest,
    })
}

/// BLAKE3 digest of `source_text`, as stored in [`BlobInfo::source_digest`].
#[must_use]
pub fn source_digest(source_text: &str) -> [u8; 32] {
    *blake3::hash(source_text.as_bytes()).as_bytes()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
