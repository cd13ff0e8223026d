//! Mixin expansion (schema rewriting pass).
//!
//! Messages may declare mixins via the `[protomix.mixins]` option, naming
//! other messages by fully-qualified name. Expansion statically merges each
//! declared mixin's fields into the host message, in declaration order,
//! ahead of the host's own fields:
//!
//! ```proto
//! message Audited { string actor = 100; }
//! message Payment {
//!   option (protomix.mixins) = "acme.common.Audited";
//!   string id = 1;
//! }
//! // expands to: message Payment { string actor = 100; string id = 1; }
//! ```
//!
//! Field numbers are binary-encoding identity, so a tag collision anywhere
//! in the merged set (mixin vs. mixin or mixin vs. own field) is a fatal
//! error, never a silent override. Mixin names resolve against every message
//! across every loaded input, so mixins can live in a different file than
//! their hosts.

use protomix_descriptor::{
    load_descriptor_set, mixin_names, qualify, Descriptor, FieldDescriptor, FileDescriptor,
    LoadError,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

// =============================================================================
// Public API
// =============================================================================

/// One message paired with where it came from: the originating proto file and
/// the root-first namespace path (package segments, then enclosing messages).
#[derive(Debug, Clone)]
pub struct MessageEntry {
    pub file_path: PathBuf,
    pub namespace: Vec<String>,
    pub message: Descriptor,
}

impl MessageEntry {
    pub fn fq_name(&self) -> String {
        let name = self.message.name.clone().unwrap_or_default();
        qualify("", &[self.namespace.clone(), vec![name]].concat())
    }
}

/// A freshly built message holding the merged field set. Detached from the
/// source tree: field identity (name, tag, type, label, options) is copied,
/// never aliased.
#[derive(Debug, Clone)]
pub struct ExpandedMessage {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("mixin '{name}' not found in any loaded file")]
    MixinNotFound { name: String },
    #[error("field number conflict on '{field}' (tag {tag}) in {message}")]
    FieldIdConflict {
        field: String,
        tag: i32,
        message: String,
    },
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Default, Clone)]
pub struct ExpandStats {
    pub files: usize,
    pub messages: usize,
    pub expanded: usize,
}

#[derive(Debug, Clone)]
pub struct ExpandResult {
    pub stats: ExpandStats,
    pub written: Vec<PathBuf>,
}

// =============================================================================
// Extraction
// =============================================================================

/// Flatten one file's descriptor tree into a sequence of message entries.
///
/// Depth-first, parent before children, preserving declaration order at every
/// level, so downstream passes see a stable sequence. Pure: the input tree is
/// not touched.
pub fn extract_messages(file: &FileDescriptor, file_path: &Path) -> Vec<MessageEntry> {
    let mut entries = Vec::new();
    let namespace = file.package_segments();
    for message in &file.message_type {
        collect_message(message, file_path, &namespace, &mut entries);
    }
    entries
}

fn collect_message(
    message: &Descriptor,
    file_path: &Path,
    namespace: &[String],
    entries: &mut Vec<MessageEntry>,
) {
    let Some(name) = message.name.clone() else {
        return;
    };
    entries.push(MessageEntry {
        file_path: file_path.to_path_buf(),
        namespace: namespace.to_vec(),
        message: message.clone(),
    });
    let child_namespace = [namespace.to_vec(), vec![name]].concat();
    for nested in &message.nested_type {
        collect_message(nested, file_path, &child_namespace, entries);
    }
}

// =============================================================================
// Expansion
// =============================================================================

/// Expand every entry that declares at least one mixin.
///
/// The result maps the host's fully-qualified name to its expanded message;
/// entries with zero mixin declarations are skipped entirely (callers keep
/// the original message for those). Resolution uses a lookup map built from
/// *all* entries, so this is deliberately a pure function of its input and
/// repeated invocations are independent.
pub fn expand_mixins(
    entries: &[MessageEntry],
) -> Result<BTreeMap<String, ExpandedMessage>, ExpandError> {
    let mut by_fqn: HashMap<String, &Descriptor> = HashMap::new();
    for entry in entries {
        let fqn = entry.fq_name();
        if by_fqn.contains_key(&fqn) {
            // Same fully-qualified name in two inputs: first match wins.
            tracing::warn!(fqn = %fqn, file = %entry.file_path.display(), "duplicate message name; keeping first");
            continue;
        }
        by_fqn.insert(fqn, &entry.message);
    }

    let mut expanded = BTreeMap::new();
    for entry in entries {
        let mixins = mixin_names(entry.message.options.as_ref());
        if mixins.is_empty() {
            continue;
        }

        let host_name = entry.message.name.clone().unwrap_or_default();
        let mut fields: Vec<FieldDescriptor> = Vec::new();
        let mut seen_tags: HashSet<i32> = HashSet::new();

        for mixin_name in &mixins {
            let mixin = by_fqn
                .get(mixin_name.as_str())
                .ok_or_else(|| ExpandError::MixinNotFound {
                    name: mixin_name.clone(),
                })?;
            for field in &mixin.field {
                merge_field(field, &host_name, &mut fields, &mut seen_tags)?;
            }
        }
        for field in &entry.message.field {
            merge_field(field, &host_name, &mut fields, &mut seen_tags)?;
        }

        expanded.insert(
            entry.fq_name(),
            ExpandedMessage {
                name: host_name,
                fields,
            },
        );
    }

    Ok(expanded)
}

fn merge_field(
    field: &FieldDescriptor,
    host_name: &str,
    fields: &mut Vec<FieldDescriptor>,
    seen_tags: &mut HashSet<i32>,
) -> Result<(), ExpandError> {
    let tag = field.tag();
    if !seen_tags.insert(tag) {
        return Err(ExpandError::FieldIdConflict {
            field: field.name.clone().unwrap_or_default(),
            tag,
            message: host_name.to_string(),
        });
    }
    fields.push(field.clone());
    Ok(())
}

// =============================================================================
// Emission
// =============================================================================

/// Serialize one expanded message back to proto text, under `out_dir` with
/// the original file's base name. Text formatting stays minimal on purpose:
/// one top-level message, one `[repeated] <type> <name> = <tag>;` line per
/// merged field.
pub fn write_expanded_proto(
    original_path: &Path,
    message: &ExpandedMessage,
    out_dir: &Path,
) -> Result<PathBuf, ExpandError> {
    let base = original_path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("expanded.proto"));
    let output_path = out_dir.join(base);

    let mut lines = vec![
        "syntax = \"proto3\";".to_string(),
        String::new(),
        format!("message {} {{", message.name),
    ];
    for field in &message.fields {
        let repeated = if field.is_repeated() { "repeated " } else { "" };
        lines.push(format!(
            "  {}{} {} = {};",
            repeated,
            field.type_token(),
            field.name.clone().unwrap_or_default(),
            field.tag()
        ));
    }
    lines.push("}".to_string());

    std::fs::create_dir_all(out_dir)
        .and_then(|_| std::fs::write(&output_path, lines.join("\n")))
        .map_err(|source| ExpandError::Write {
            path: output_path.clone(),
            source,
        })?;
    Ok(output_path)
}

// =============================================================================
// Batch driver
// =============================================================================

/// Run the whole pass over a batch of descriptor set JSON files.
///
/// Loading is all-or-nothing: every input is parsed before any expansion
/// work begins, so a load failure produces no output at all. Descriptor sets
/// carry the original proto file name per inner file; output paths derive
/// from that name (falling back to the input path).
pub fn expand_proto_files(inputs: &[PathBuf], out_dir: &Path) -> Result<ExpandResult, ExpandError> {
    let mut sets = Vec::new();
    for input in inputs {
        sets.push((input.clone(), load_descriptor_set(input)?));
    }

    let mut entries: Vec<MessageEntry> = Vec::new();
    let mut stats = ExpandStats::default();
    for (input, set) in &sets {
        stats.files += set.file.len();
        for file in &set.file {
            let origin = file
                .name
                .as_deref()
                .map(PathBuf::from)
                .unwrap_or_else(|| input.clone());
            entries.extend(extract_messages(file, &origin));
        }
    }
    stats.messages = entries.len();

    let expanded = expand_mixins(&entries)?;
    stats.expanded = expanded.len();

    let mut written = Vec::new();
    for (fqn, message) in &expanded {
        let Some(source) = entries.iter().find(|e| &e.fq_name() == fqn) else {
            continue;
        };
        written.push(write_expanded_proto(&source.file_path, message, out_dir)?);
    }

    Ok(ExpandResult { stats, written })
}
