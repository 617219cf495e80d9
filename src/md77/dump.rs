//! Annotated text rendering of metadata trees

use std::fmt::{self, Write};

use super::analyzer::Indices;
use super::models::Node;
use super::text::decode_cp1251;

const INDENT: &str = "  ";
const PLACEHOLDER: &str = "{...}";

/// Render `node` and its descendants, one line per node, pre-order.
///
/// Leaves are printed quoted; containers as `{...}`. A leaf that is a known
/// object id gets ` // object: <TAG>`; a leaf that is a field with a
/// reference gets ` // ref: <target>` plus ` (<TAG>)` when the target is a
/// known object. Each level is indented by two spaces.
pub fn dump_node<W: Write>(node: &Node, indices: &Indices, out: &mut W) -> fmt::Result {
    let mut pending = vec![(node, 0usize)];
    while let Some((node, depth)) = pending.pop() {
        write_line(node, depth, indices, out)?;
        pending.extend(node.children().iter().rev().map(|child| (child, depth + 1)));
    }
    Ok(())
}

/// Convenience wrapper around [`dump_node`] collecting into a `String`.
pub fn dump_to_string(node: &Node, indices: &Indices) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = dump_node(node, indices, &mut out);
    out
}

/// One-line caption of a node, as shown in a tree view.
///
/// A leaf shows its quoted value. A container is named after its first
/// child when that is a non-empty leaf (sections and objects carry their
/// name or id there), otherwise `{...}`.
pub fn label(node: &Node) -> String {
    match node {
        Node::Leaf(value) => format!("\"{}\"", decode_cp1251(value)),
        Node::Container(children) => match children.first() {
            Some(Node::Leaf(name)) if !name.is_empty() => decode_cp1251(name).into_owned(),
            _ => PLACEHOLDER.to_string(),
        },
    }
}

/// Render captions of `node` and its descendants down to `max_depth` levels,
/// each child prefixed with its position in the parent.
pub fn write_outline<W: Write>(node: &Node, max_depth: usize, out: &mut W) -> fmt::Result {
    let mut pending = vec![(node, None, 0usize)];
    while let Some((node, index, depth)) = pending.pop() {
        for _ in 0..depth {
            out.write_str(INDENT)?;
        }
        if let Some(index) = index {
            write!(out, "[{}] ", index)?;
        }
        writeln!(out, "{}", label(node))?;

        if depth < max_depth {
            pending.extend(
                node.children()
                    .iter()
                    .enumerate()
                    .rev()
                    .map(|(i, child)| (child, Some(i), depth + 1)),
            );
        }
    }
    Ok(())
}

fn write_line<W: Write>(node: &Node, depth: usize, indices: &Indices, out: &mut W) -> fmt::Result {
    for _ in 0..depth {
        out.write_str(INDENT)?;
    }

    match node {
        Node::Container(_) => out.write_str(PLACEHOLDER)?,
        Node::Leaf(value) => {
            write!(out, "\"{}\"", decode_cp1251(value))?;

            if let Some(tag) = indices.type_of(value) {
                write!(out, " // object: {}", tag)?;
            }
            if let Some(target) = indices.reference_of(value) {
                write!(out, " // ref: {}", decode_cp1251(target))?;
                if let Some(tag) = indices.type_of(target) {
                    write!(out, " ({})", tag)?;
                }
            }
        }
    }

    out.write_char('\n')
}
