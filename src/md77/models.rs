//! Data structures shared by the decoding pipeline

use std::fmt;

/// One node of a parsed metadata tree.
///
/// Leaf values are raw bytes in the container's single-byte codepage;
/// they are never transcoded while parsing or indexing.
///
/// `Clone`, `PartialEq`, `Debug` and `Drop` walk the tree with an explicit
/// stack, so they work on any depth the parser can produce.
pub enum Node {
    Leaf(Vec<u8>),
    Container(Vec<Node>),
}

impl Node {
    /// Leaf bytes, or an empty slice for a container.
    pub fn value(&self) -> &[u8] {
        match self {
            Node::Leaf(value) => value,
            Node::Container(_) => &[],
        }
    }

    /// Child nodes, or an empty slice for a leaf.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Leaf(_) => &[],
            Node::Container(children) => children,
        }
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children().get(index)
    }

    pub fn len(&self) -> usize {
        self.children().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children().is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Node::Container(_))
    }

    /// Value of the first child. Section and object containers are named this way.
    pub fn first_value(&self) -> &[u8] {
        self.child(0).map(Node::value).unwrap_or_default()
    }

    /// Follow a path of child positions starting at this node.
    pub fn get(&self, path: &NodePath) -> Option<&Node> {
        path.0
            .iter()
            .try_fold(self, |node, &index| node.child(index))
    }
}

impl Drop for Node {
    /// Unlinks descendants one level at a time so that dropping a deeply
    /// nested tree does not recurse.
    fn drop(&mut self) {
        let Node::Container(children) = self else {
            return;
        };
        let mut pending = std::mem::take(children);
        while let Some(mut node) = pending.pop() {
            if let Node::Container(grandchildren) = &mut node {
                pending.append(grandchildren);
            }
        }
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        let Node::Container(children) = self else {
            return Node::Leaf(self.value().to_vec());
        };

        // Source iterator and copied children for each container still open.
        let mut open = vec![(children.iter(), Vec::with_capacity(children.len()))];
        let mut copy = None;
        while let Some((source, copied)) = open.last_mut() {
            match source.next() {
                Some(Node::Leaf(value)) => copied.push(Node::Leaf(value.clone())),
                Some(Node::Container(nested)) => {
                    open.push((nested.iter(), Vec::with_capacity(nested.len())));
                }
                None => {
                    let node = Node::Container(std::mem::take(copied));
                    open.pop();
                    match open.last_mut() {
                        Some((_, parent)) => parent.push(node),
                        None => copy = Some(node),
                    }
                }
            }
        }
        copy.unwrap_or_else(|| Node::Container(Vec::new()))
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some(pair) = pending.pop() {
            match pair {
                (Node::Leaf(a), Node::Leaf(b)) => {
                    if a != b {
                        return false;
                    }
                }
                (Node::Container(a), Node::Container(b)) => {
                    if a.len() != b.len() {
                        return false;
                    }
                    pending.extend(a.iter().zip(b.iter()));
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    /// Same shape as a derived `Debug`: `Container([Leaf([..]), ..])`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        enum Step<'a> {
            Node(&'a Node),
            Text(&'static str),
        }

        let mut steps = vec![Step::Node(self)];
        while let Some(step) = steps.pop() {
            match step {
                Step::Text(text) => f.write_str(text)?,
                Step::Node(Node::Leaf(value)) => write!(f, "Leaf({:?})", value)?,
                Step::Node(Node::Container(children)) => {
                    f.write_str("Container([")?;
                    steps.push(Step::Text("])"));
                    for (i, child) in children.iter().enumerate().rev() {
                        steps.push(Step::Node(child));
                        if i > 0 {
                            steps.push(Step::Text(", "));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Positions of children leading from a tree root to one node.
///
/// Used instead of node references so that an index can outlive a borrow
/// of the tree while still being meaningless without it.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        NodePath(path)
    }
}

/// Type tag for configuration objects recognized by section name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionType {
    /// `Documents` section.
    Document,
    /// `SbCnts` section (subconto, i.e. catalogs).
    Subconto,
    /// `Registers` section.
    Register,
}

impl SectionType {
    /// Map a top-level section name to the type tag of the objects it holds.
    pub fn from_section_name(name: &[u8]) -> Option<Self> {
        match name {
            b"Documents" => Some(Self::Document),
            b"SbCnts" => Some(Self::Subconto),
            b"Registers" => Some(Self::Register),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            SectionType::Document => "DT",
            SectionType::Subconto => "SC",
            SectionType::Register => "RG",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Which sniffing rule produced a decoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffRule {
    /// zlib header at offset 0.
    Zlib,
    /// zlib header after an 8-byte prefix.
    ZlibAfterPrefix,
    /// Encrypted with the stream cipher, zlib inside.
    Encrypted,
    /// Plain text starting at the first `{`.
    PlainText,
}

/// Result of classifying one raw stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamContent {
    /// Plain-text bytes ready for the parser.
    Decoded { rule: SniffRule, bytes: Vec<u8> },
    /// Nothing matched; the raw bytes are kept for a diagnostic preview.
    Unrecognized(Vec<u8>),
}

/// One directory entry of the compound file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    pub name: String,
    /// Backslash-separated path from the root, e.g. `Metadata\Main MetaData Stream`.
    pub path: String,
    pub is_container: bool,
    pub size: u64,
    pub children: Vec<StorageEntry>,
}
