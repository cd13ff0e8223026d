//! Declaration-order traversal over a descriptor tree.
//!
//! `visit` walks one file (or message subtree) and calls back with, for each
//! message/enum node:
//!
//! - a derived *output identifier* (nested names flattened into one
//!   scope-qualified name, optionally camel-cased, wrapped with the caller's
//!   affixes, and nudged off reserved vocabulary), and
//! - the *qualified source name* (dot-joined proto path), and
//! - a [`SourceInfo`] cursor for the node's comments.
//!
//! Traversal order is load-bearing: generators rely on parent-before-child
//! and children-in-declaration-order to assign stable, non-conflicting
//! output identifiers and to keep emitted comments aligned with the
//! source-location table. The walk itself never fails; the first callback
//! error stops it and propagates unchanged.

use anyhow::Result;
use protomix_descriptor::{Descriptor, EnumDescriptor, FileDescriptor, ServiceDescriptor};

pub mod case;
pub mod source_info;

pub use case::{maybe_snake_to_camel, snake_to_camel};
pub use source_info::{paths, SourceInfo};

/// Output names that collide with the target vocabulary get a fixed suffix.
const RESERVED_TYPE_NAMES: [&str; 5] = ["Box", "Option", "Result", "String", "Vec"];

/// Naming policy threaded through a walk. Plain data, no global state.
#[derive(Debug, Clone, Default)]
pub struct VisitOptions {
    /// Camel-case raw schema names (`foo_bar` → `FooBar`).
    pub snake_to_camel: bool,
    /// Join nested type names with `_` instead of flattening them directly.
    pub use_snake_type_name: bool,
    /// Project-wide affixes applied to every output name.
    pub type_prefix: String,
    pub type_suffix: String,
}

impl VisitOptions {
    fn wrap_type_name(&self, name: &str) -> String {
        format!("{}{}{}", self.type_prefix, name, self.type_suffix)
    }
}

/// Suffixes `Message` onto names that match reserved vocabulary, i.e. a
/// proto message named `Option`. Applied only at emission; the descriptor
/// itself is never renamed.
fn avoid_reserved(name: String) -> String {
    if RESERVED_TYPE_NAMES.contains(&name.as_str()) {
        format!("{name}Message")
    } else {
        name
    }
}

/// Root of a walk: a whole file, or one message subtree.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    File(&'a FileDescriptor),
    Message(&'a Descriptor),
}

impl<'a> Node<'a> {
    fn enum_children(&self) -> &'a [EnumDescriptor] {
        match self {
            Node::File(f) => &f.enum_type,
            Node::Message(m) => &m.enum_type,
        }
    }

    fn message_children(&self) -> &'a [Descriptor] {
        match self {
            Node::File(f) => &f.message_type,
            Node::Message(m) => &m.nested_type,
        }
    }

    fn enum_path_kind(&self) -> i32 {
        match self {
            Node::File(_) => paths::file::ENUM_TYPE,
            Node::Message(_) => paths::message::ENUM_TYPE,
        }
    }

    fn message_path_kind(&self) -> i32 {
        match self {
            Node::File(_) => paths::file::MESSAGE_TYPE,
            Node::Message(_) => paths::message::NESTED_TYPE,
        }
    }
}

pub fn visit<M, E>(
    node: Node<'_>,
    source_info: &SourceInfo,
    options: &VisitOptions,
    on_message: &mut M,
    on_enum: &mut E,
    name_prefix: &str,
    path_prefix: &str,
) -> Result<()>
where
    M: FnMut(&str, &Descriptor, SourceInfo, &str) -> Result<()>,
    E: FnMut(&str, &EnumDescriptor, SourceInfo, &str) -> Result<()>,
{
    for (index, enum_desc) in node.enum_children().iter().enumerate() {
        let raw = enum_desc.name.as_deref().unwrap_or_default();
        // I.e. Foo_Bar.Zaz_Inner
        let qualified = format!("{path_prefix}{raw}");
        // I.e. FooBar_ZazInner
        let output = format!(
            "{name_prefix}{}",
            maybe_snake_to_camel(raw, options.snake_to_camel)
        );
        let output = avoid_reserved(options.wrap_type_name(&output));
        let cursor = source_info.open(node.enum_path_kind(), index);
        on_enum(&output, enum_desc, cursor, &qualified)?;
    }

    for (index, message) in node.message_children().iter().enumerate() {
        let raw = message.name.as_deref().unwrap_or_default();
        let qualified = format!("{path_prefix}{raw}");
        let base = format!(
            "{name_prefix}{}",
            maybe_snake_to_camel(raw, options.snake_to_camel)
        );
        let output = avoid_reserved(options.wrap_type_name(&base));
        let cursor = source_info.open(node.message_path_kind(), index);
        on_message(&output, message, cursor.clone(), &qualified)?;

        // Children flatten onto the bare name, before affixes and reserved
        // -name suffixing, so affixes stay outermost on every output name.
        let delim = if options.use_snake_type_name { "_" } else { "" };
        visit(
            Node::Message(message),
            &cursor,
            options,
            on_message,
            on_enum,
            &format!("{base}{delim}"),
            &format!("{qualified}."),
        )?;
    }

    Ok(())
}

/// Flat enumeration of a file's service declarations. Services do not nest
/// and get no name prefixing.
pub fn visit_services<S>(
    file: &FileDescriptor,
    source_info: &SourceInfo,
    on_service: &mut S,
) -> Result<()>
where
    S: FnMut(&ServiceDescriptor, SourceInfo) -> Result<()>,
{
    for (index, service) in file.service.iter().enumerate() {
        on_service(service, source_info.open(paths::file::SERVICE, index))?;
    }
    Ok(())
}
