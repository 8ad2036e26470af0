// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Relative paths and their text form.
//!
//! ```text
//! /Name            HierarchicalReferences (and subtypes) to Name
//! .Name            Aggregates (and subtypes) to Name
//! <HasComponent>N  the named reference type (and subtypes)
//! <#Organizes>N    the named reference type only
//! <!HasChild>N     the inverse direction
//! /2:Name          browse name in namespace 2
//! /A&.B            `&` escapes a reserved character: the name is `A.B`
//! ```
use thiserror::Error;

use crate::address_space::AddressSpace;
use crate::ident::{NodeId, QualifiedName};
use crate::standard::reference_types;

/// Reason a relative path text could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelativePathError {
    /// The text holds no element.
    #[error("relative path is empty")]
    Empty,
    /// A character that cannot appear at this position.
    #[error("unexpected '{character}' at position {position}")]
    UnexpectedCharacter {
        /// Byte offset in the text.
        position: usize,
        /// The offending character.
        character: char,
    },
    /// `<` without a closing `>`.
    #[error("reference type starting at position {0} is not closed")]
    UnterminatedReferenceType(usize),
    /// `&` at the end of the text.
    #[error("escape character at the end of the path")]
    DanglingEscape,
    /// A namespace prefix that is not a valid index.
    #[error("invalid namespace prefix {0:?}")]
    InvalidNamespace(String),
    /// The reference type name does not resolve.
    #[error("unknown reference type {0:?}")]
    UnknownReferenceType(String),
}

/// One hop of a relative path.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RelativePathElement {
    /// Reference type to follow; `None` follows every reference.
    pub reference_type_id: Option<NodeId>,
    /// Follow the inverse direction.
    pub is_inverse: bool,
    /// Also follow subtypes of the reference type.
    pub include_subtypes: bool,
    /// Browse name of the target; empty matches every target on the last hop.
    pub target_name: QualifiedName,
}

impl RelativePathElement {
    /// Forward hop over `reference_type` and its subtypes to `target_name`.
    #[must_use]
    pub const fn new(reference_type: NodeId, target_name: QualifiedName) -> Self {
        Self {
            reference_type_id: Some(reference_type),
            is_inverse: false,
            include_subtypes: true,
            target_name,
        }
    }

    /// Hop over hierarchical references (`/Name`).
    #[must_use]
    pub const fn hierarchical(target_name: QualifiedName) -> Self {
        Self::new(reference_types::HIERARCHICAL_REFERENCES, target_name)
    }

    /// Hop over aggregates (`.Name`).
    #[must_use]
    pub const fn aggregate(target_name: QualifiedName) -> Self {
        Self::new(reference_types::AGGREGATES, target_name)
    }
}

/// Sequence of hops from a starting node.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct RelativePath {
    /// Hops in order.
    pub elements: Vec<RelativePathElement>,
}

impl From<Vec<RelativePathElement>> for RelativePath {
    fn from(elements: Vec<RelativePathElement>) -> Self {
        Self { elements }
    }
}

struct Cursor<'a> {
    text: &'a str,
    position: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.position..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let next = self.peek()?;
        self.position += next.len_utf8();
        Some(next)
    }

    /// Reads up to one of `stops`, resolving `&` escapes. Returns the text
    /// and the offset of the first unescaped `:` if any.
    fn read_until(&mut self, stops: &[char]) -> Result<(String, Option<usize>), RelativePathError> {
        let mut out = String::new();
        let mut colon = None;
        while let Some(next) = self.peek() {
            if stops.contains(&next) {
                break;
            }
            self.bump();
            match next {
                '&' => out.push(self.bump().ok_or(RelativePathError::DanglingEscape)?),
                ':' if colon.is_none() => {
                    colon = Some(out.len());
                    out.push(':');
                }
                '>' | '#' | '!' => {
                    return Err(RelativePathError::UnexpectedCharacter {
                        position: self.position - 1,
                        character: next,
                    })
                }
                other => out.push(other),
            }
        }
        Ok((out, colon))
    }
}

fn qualify(text: &str, colon: Option<usize>) -> Result<QualifiedName, RelativePathError> {
    match colon {
        Some(at) => {
            let (prefix, name) = (&text[..at], &text[at + 1..]);
            let namespace = prefix
                .parse::<u16>()
                .map_err(|_| RelativePathError::InvalidNamespace(prefix.to_owned()))?;
            Ok(QualifiedName::new(namespace, name))
        }
        None => Ok(QualifiedName::new(0, text)),
    }
}

impl AddressSpace {
    /// Parses the text form of a relative path, resolving reference type names.
    ///
    /// Naming a reference type by its inverse name flips the direction.
    pub fn parse_relative_path(&self, text: &str) -> Result<RelativePath, RelativePathError> {
        let mut cursor = Cursor { text, position: 0 };
        let mut elements = Vec::new();
        while let Some(lead) = cursor.bump() {
            let start = cursor.position - 1;
            let mut element = match lead {
                '/' => RelativePathElement::hierarchical(QualifiedName::default()),
                '.' => RelativePathElement::aggregate(QualifiedName::default()),
                '<' => self.parse_reference_type(&mut cursor, start)?,
                character => {
                    return Err(RelativePathError::UnexpectedCharacter {
                        position: start,
                        character,
                    })
                }
            };
            let (name, colon) = cursor.read_until(&['/', '.', '<'])?;
            element.target_name = qualify(&name, colon)?;
            elements.push(element);
        }
        if elements.is_empty() {
            return Err(RelativePathError::Empty);
        }
        Ok(RelativePath { elements })
    }

    fn parse_reference_type(
        &self,
        cursor: &mut Cursor<'_>,
        start: usize,
    ) -> Result<RelativePathElement, RelativePathError> {
        let mut include_subtypes = true;
        let mut is_inverse = false;
        loop {
            match cursor.peek() {
                Some('#') => include_subtypes = false,
                Some('!') => is_inverse = true,
                _ => break,
            }
            cursor.bump();
        }
        let (name, _) = cursor.read_until(&['>'])?;
        if cursor.bump() != Some('>') {
            return Err(RelativePathError::UnterminatedReferenceType(start));
        }
        let (reference_type, flipped) = if let Some(node) = self.find_reference_type(&name) {
            (node.node_id().clone(), false)
        } else if let Some(node) = self.find_reference_type_by_inverse_name(&name) {
            (node.node_id().clone(), true)
        } else {
            return Err(RelativePathError::UnknownReferenceType(name));
        };
        Ok(RelativePathElement {
            reference_type_id: Some(reference_type),
            is_inverse: is_inverse != flipped,
            include_subtypes,
            target_name: QualifiedName::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn space() -> AddressSpace {
        AddressSpace::new().unwrap()
    }

    #[test]
    fn shorthand_separators_map_to_standard_types() {
        let path = space().parse_relative_path("/Objects.Server").unwrap();
        assert_eq!(path.elements.len(), 2);
        assert_eq!(
            path.elements[0].reference_type_id,
            Some(reference_types::HIERARCHICAL_REFERENCES)
        );
        assert_eq!(path.elements[1].reference_type_id, Some(reference_types::AGGREGATES));
        assert_eq!(path.elements[1].target_name, QualifiedName::new(0, "Server"));
    }

    #[test]
    fn modifiers_and_inverse_names() {
        let space = space();
        let path = space.parse_relative_path("<#!Organizes>Root").unwrap();
        let hop = &path.elements[0];
        assert!(!hop.include_subtypes);
        assert!(hop.is_inverse);
        let path = space.parse_relative_path("<OrganizedBy>Root").unwrap();
        assert_eq!(path.elements[0].reference_type_id, Some(reference_types::ORGANIZES));
        assert!(path.elements[0].is_inverse);
    }

    #[test]
    fn escapes_and_namespaces() {
        let path = space().parse_relative_path("/2:Tank&.Level/").unwrap();
        assert_eq!(path.elements[0].target_name, QualifiedName::new(2, "Tank.Level"));
        assert!(path.elements[1].target_name.is_empty());
    }

    #[test]
    fn malformed_text_is_rejected() {
        let space = space();
        assert_eq!(space.parse_relative_path(""), Err(RelativePathError::Empty));
        assert_eq!(space.parse_relative_path("/A&"), Err(RelativePathError::DanglingEscape));
        assert_eq!(
            space.parse_relative_path("<HasComponent"),
            Err(RelativePathError::UnterminatedReferenceType(0))
        );
        assert!(matches!(
            space.parse_relative_path("Name"),
            Err(RelativePathError::UnexpectedCharacter { position: 0, character: 'N' })
        ));
        assert!(matches!(
            space.parse_relative_path("<NoSuchRef>X"),
            Err(RelativePathError::UnknownReferenceType(_))
        ));
        assert!(matches!(
            space.parse_relative_path("/x:Name"),
            Err(RelativePathError::InvalidNamespace(_))
        ));
    }
}
