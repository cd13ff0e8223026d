//! Descriptor model for protomix (Buf descriptor sets → in-memory trees).
//!
//! This crate is intentionally **descriptor-driven**:
//!
//! - The caller runs `buf build --as-file-descriptor-set -o <descriptor.json>`
//! - We parse the descriptor set JSON into the structs below
//! - Downstream crates (`protomix-expand`, `protomix-visit`) transform and
//!   walk the resulting trees
//!
//! Why JSON?
//!
//! The binary `google.protobuf.FileDescriptorSet` format is easy to decode,
//! but **custom options** (the mixin declarations protomix cares about) are
//! encoded as extensions, and decoding those in Rust requires a
//! reflective/extension-aware stack. Buf's JSON output renders extension
//! fields explicitly, using bracketed keys like:
//!
//! ```json
//! { "[protomix.mixins]": ["acme.common.Audited"] }
//! ```
//!
//! That makes option-driven schema rewriting practical without a heavy
//! runtime dependency. Parsing the JSON itself is serde's job; nothing in
//! this crate validates schema semantics beyond what the structs encode.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Well-known per-message option key carrying mixin declarations.
pub const MIXIN_OPTION: &str = "[protomix.mixins]";

// =============================================================================
// Descriptor JSON (subset)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct FileDescriptorSet {
    #[serde(default)]
    pub file: Vec<FileDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub name: Option<String>,
    pub package: Option<String>,
    #[serde(default)]
    pub message_type: Vec<Descriptor>,
    #[serde(default)]
    pub enum_type: Vec<EnumDescriptor>,
    #[serde(default)]
    pub service: Vec<ServiceDescriptor>,
    #[serde(default)]
    pub source_code_info: Option<SourceCodeInfo>,
    pub syntax: Option<String>,
}

/// A message definition (`DescriptorProto` in descriptor.proto terms).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub name: Option<String>,
    #[serde(default)]
    pub field: Vec<FieldDescriptor>,
    #[serde(default)]
    pub nested_type: Vec<Descriptor>,
    #[serde(default)]
    pub enum_type: Vec<EnumDescriptor>,
    #[serde(default)]
    pub options: Option<OptionsBag>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: Option<String>,
    pub number: Option<i32>,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub typ: Option<String>,
    pub type_name: Option<String>,
    #[serde(default)]
    pub options: Option<OptionsBag>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDescriptor {
    pub name: Option<String>,
    #[serde(default)]
    pub value: Vec<EnumValueDescriptor>,
    #[serde(default)]
    pub options: Option<OptionsBag>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValueDescriptor {
    pub name: Option<String>,
    pub number: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    pub name: Option<String>,
    #[serde(default)]
    pub method: Vec<MethodDescriptor>,
    #[serde(default)]
    pub options: Option<OptionsBag>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    pub name: Option<String>,
    pub input_type: Option<String>,
    pub output_type: Option<String>,
    pub client_streaming: Option<bool>,
    pub server_streaming: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceCodeInfo {
    #[serde(default)]
    pub location: Vec<Location>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub path: Vec<i32>,
    #[serde(default)]
    pub span: Vec<i32>,
    pub leading_comments: Option<String>,
    pub trailing_comments: Option<String>,
    #[serde(default)]
    pub leading_detached_comments: Vec<String>,
}

/// Options bag as Buf JSON renders it: plain options by name, custom options
/// under bracketed extension keys.
pub type OptionsBag = BTreeMap<String, Value>;

// =============================================================================
// Loading
// =============================================================================

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse descriptor set JSON '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load one descriptor set JSON file. Any IO or parse failure is fatal for
/// the whole batch; callers must not start expansion until every input has
/// loaded.
pub fn load_descriptor_set(path: &Path) -> Result<FileDescriptorSet, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// =============================================================================
// Qualified names
// =============================================================================

/// Dot-join a package and a root-first sequence of enclosing names.
pub fn qualify(package: &str, segments: &[String]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !package.is_empty() {
        parts.push(package);
    }
    parts.extend(segments.iter().map(String::as_str));
    parts.join(".")
}

impl FileDescriptor {
    /// Package split into namespace segments (empty package → no segments).
    pub fn package_segments(&self) -> Vec<String> {
        match self.package.as_deref() {
            None | Some("") => Vec::new(),
            Some(p) => p.split('.').map(str::to_string).collect(),
        }
    }
}

// =============================================================================
// Mixin option accessor
// =============================================================================

/// Read the mixin declarations off an options bag, in declaration order.
///
/// Buf renders a repeated custom option as an array; a single occurrence may
/// surface as a bare string. Multiple textual occurrences of the option on
/// one message are semantically concatenated, so nested arrays flatten too.
/// A missing key, an empty array, or non-string entries contribute nothing.
pub fn mixin_names(options: Option<&OptionsBag>) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(value) = options.and_then(|bag| bag.get(MIXIN_OPTION)) {
        collect_names(value, &mut names);
    }
    names
}

fn collect_names(value: &Value, names: &mut Vec<String>) {
    match value {
        Value::String(s) => names.push(s.clone()),
        Value::Array(items) => {
            for item in items {
                collect_names(item, names);
            }
        }
        _ => {}
    }
}

// =============================================================================
// Field helpers
// =============================================================================

impl FieldDescriptor {
    pub fn tag(&self) -> i32 {
        self.number.unwrap_or(0)
    }

    pub fn is_repeated(&self) -> bool {
        matches!(self.label.as_deref(), Some("LABEL_REPEATED") | Some("repeated"))
    }

    /// Schema type keyword for re-emission: scalar `TYPE_*` names map to
    /// their proto keywords; message/enum fields use `type_name` with the
    /// leading dot stripped.
    pub fn type_token(&self) -> String {
        if let Some(type_name) = self.type_name.as_deref() {
            if !type_name.is_empty() {
                return type_name.trim_start_matches('.').to_string();
            }
        }
        match self.typ.as_deref() {
            Some(t) if t.starts_with("TYPE_") => t["TYPE_".len()..].to_ascii_lowercase(),
            Some(t) => t.to_string(),
            None => "bytes".to_string(),
        }
    }
}

// =============================================================================
// Comment side table
// =============================================================================

/// Comments from one file's `source_code_info`, keyed by source-location
/// path. This is the read-only side table that `protomix-visit` cursors point
/// into; it never holds references back into the descriptor tree.
#[derive(Debug, Default)]
pub struct CommentIndex {
    by_path: HashMap<Vec<i32>, String>,
}

impl CommentIndex {
    pub fn from_file(file: &FileDescriptor) -> Self {
        let mut by_path = HashMap::new();
        let Some(info) = &file.source_code_info else {
            return Self { by_path };
        };
        for loc in &info.location {
            let mut parts: Vec<String> = loc
                .leading_detached_comments
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            for c in [&loc.leading_comments, &loc.trailing_comments] {
                if let Some(c) = c.as_deref() {
                    let c = c.trim();
                    if !c.is_empty() {
                        parts.push(c.to_string());
                    }
                }
            }
            if !parts.is_empty() {
                by_path.insert(loc.path.clone(), parts.join("\n\n"));
            }
        }
        Self { by_path }
    }

    pub fn get(&self, path: &[i32]) -> Option<&str> {
        self.by_path.get(path).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}
