//! Shape trees: the grammar of variable-name suffixes a type can produce.
//!
//! A [`Ring`] is derived from a [`Shape`] and lists, level by level, the name
//! tokens that may follow a map key. The map-key resolver tests candidate
//! suffixes against it to find where a key ends.
//!
//! For `HashMap<String, Inner>` with
//!
//! ```rust
//! #[derive(serde::Deserialize)]
//! struct Inner {
//!     key: String,
//!     inner_node: Vec<u8>,
//! }
//! ```
//!
//! the ring is
//!
//! ```text
//! Root
//! ├── Terminal [KEY]
//! └── Terminal [INNER, NODE, #]
//! ```
//!
//! where `#` matches any all-digit token.

use crate::schema::Shape;
use crate::tags::{resolve_field, FieldRule};
use crate::Result;

/// One expected token of a variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An upper-cased name piece.
    Name(String),
    /// A sequence index.
    Index,
}

impl Token {
    /// Returns `true` if the raw name piece `raw` satisfies this token.
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            Token::Name(name) => name == raw,
            Token::Index => !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()),
        }
    }
}

/// A node of the shape tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ring {
    Root {
        tokens: Vec<Token>,
        children: Vec<Ring>,
    },
    Field {
        tokens: Vec<Token>,
        children: Vec<Ring>,
    },
    /// Embedded field or tuple position: no naming level of its own.
    Squash {
        tokens: Vec<Token>,
        children: Vec<Ring>,
    },
    Terminal(Vec<Token>),
    /// Opaque content matching any suffix.
    Dynamic,
}

#[derive(Clone, Copy)]
enum Branch {
    Root,
    Field,
    Squash,
}

impl Ring {
    /// Builds the tree of `shape`, naming fields with the given tag keys.
    ///
    /// # Errors
    ///
    /// Fails when a field name cannot be resolved.
    pub fn build(shape: &Shape, tags: &[String]) -> Result<Ring> {
        node(shape, Vec::new(), Branch::Root, tags)
    }

    /// Returns `true` if the tree is opaque all the way from its root.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Ring::Dynamic)
    }

    /// Returns `true` if `tail` spells a complete path through the tree.
    pub fn matches(&self, tail: &[&str]) -> bool {
        self.possibilities(tail) > 0
    }

    /// Counts the distinct paths through the tree spelled by `tail`.
    pub fn possibilities(&self, tail: &[&str]) -> usize {
        match self {
            Ring::Dynamic => 1,
            Ring::Terminal(tokens) => usize::from(
                tokens.len() == tail.len() && strip(tokens, tail).is_some(),
            ),
            Ring::Root { tokens, children }
            | Ring::Field { tokens, children }
            | Ring::Squash { tokens, children } => match strip(tokens, tail) {
                None => 0,
                Some(rest) if children.is_empty() => usize::from(rest.is_empty()),
                Some(rest) => children.iter().map(|child| child.possibilities(rest)).sum(),
            },
        }
    }
}

/// Removes `tokens` from the front of `tail`.
fn strip<'t, 's>(tokens: &[Token], tail: &'t [&'s str]) -> Option<&'t [&'s str]> {
    if tail.len() < tokens.len() {
        return None;
    }
    let (head, rest) = tail.split_at(tokens.len());
    tokens
        .iter()
        .zip(head)
        .all(|(token, raw)| token.matches(raw))
        .then_some(rest)
}

fn split_name(name: &str) -> Vec<Token> {
    name.to_uppercase()
        .split('_')
        .map(|piece| Token::Name(piece.to_string()))
        .collect()
}

fn branch(kind: Branch, tokens: Vec<Token>, children: Vec<Ring>) -> Ring {
    match kind {
        Branch::Root => Ring::Root { tokens, children },
        Branch::Field => Ring::Field { tokens, children },
        Branch::Squash => Ring::Squash { tokens, children },
    }
}

fn node(shape: &Shape, mut acc: Vec<Token>, kind: Branch, tags: &[String]) -> Result<Ring> {
    match shape {
        Shape::Option(inner) => node(inner, acc, kind, tags),
        Shape::Seq(element) => {
            acc.push(Token::Index);
            node(element, acc, kind, tags)
        }
        Shape::Tuple(elements) => {
            let children = elements
                .iter()
                .enumerate()
                .map(|(i, element)| {
                    node(element, vec![Token::Name(i.to_string())], Branch::Squash, tags)
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(branch(kind, acc, children))
        }
        Shape::Struct(structure) => {
            let mut children = Vec::with_capacity(structure.shapes.len());
            for field in &structure.shapes {
                match resolve_field(field.name, tags)? {
                    FieldRule::Skip => {}
                    FieldRule::Squash => {
                        children.push(node(&field.shape, Vec::new(), Branch::Squash, tags)?);
                    }
                    FieldRule::Named { name, .. } => {
                        children.push(node(&field.shape, split_name(name), Branch::Field, tags)?);
                    }
                }
            }
            Ok(branch(kind, acc, children))
        }
        Shape::Scalar(_) | Shape::Enum { .. } => Ok(Ring::Terminal(acc)),
        Shape::Map { .. } | Shape::Any => {
            if acc.is_empty() {
                Ok(Ring::Dynamic)
            } else {
                Ok(branch(kind, acc, vec![Ring::Dynamic]))
            }
        }
    }
}
