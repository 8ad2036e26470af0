// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity primitives: node ids, qualified names, localized text, node classes.
use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Value part of a [`NodeId`].
///
/// Ordering is by variant first (numeric < string < guid < opaque) and then by
/// value, which gives every identity a stable rank for tie-breaks.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Identifier {
    /// Numeric identifier, text form `i=<u32>`.
    Numeric(u32),
    /// String identifier, text form `s=<text>`.
    String(String),
    /// GUID identifier, text form `g=<uuid>`.
    Guid(Uuid),
    /// Opaque byte identifier, text form `b=<base64>`.
    Opaque(Vec<u8>),
}

/// Discriminant of an [`Identifier`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum IdentifierKind {
    /// [`Identifier::Numeric`].
    Numeric,
    /// [`Identifier::String`].
    String,
    /// [`Identifier::Guid`].
    Guid,
    /// [`Identifier::Opaque`].
    Opaque,
}

impl Identifier {
    /// Returns the discriminant of this identifier.
    #[must_use]
    pub const fn kind(&self) -> IdentifierKind {
        match self {
            Self::Numeric(_) => IdentifierKind::Numeric,
            Self::String(_) => IdentifierKind::String,
            Self::Guid(_) => IdentifierKind::Guid,
            Self::Opaque(_) => IdentifierKind::Opaque,
        }
    }
}

/// Namespace-qualified node identity.
///
/// Immutable once assigned to a node. Equality and hashing are structural.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId {
    /// Index into the address space's namespace table.
    pub namespace: u16,
    /// Identifier within the namespace.
    pub identifier: Identifier,
}

impl NodeId {
    /// The null node id (`i=0`).
    pub const NULL: Self = Self::numeric(0, 0);

    /// Builds a numeric node id.
    #[must_use]
    pub const fn numeric(namespace: u16, value: u32) -> Self {
        Self {
            namespace,
            identifier: Identifier::Numeric(value),
        }
    }

    /// Builds a string node id.
    pub fn string(namespace: u16, value: impl Into<String>) -> Self {
        Self {
            namespace,
            identifier: Identifier::String(value.into()),
        }
    }

    /// Builds a GUID node id.
    #[must_use]
    pub const fn guid(namespace: u16, value: Uuid) -> Self {
        Self {
            namespace,
            identifier: Identifier::Guid(value),
        }
    }

    /// Builds an opaque node id.
    pub fn opaque(namespace: u16, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            namespace,
            identifier: Identifier::Opaque(bytes.into()),
        }
    }

    /// Returns true for `i=0` in namespace 0.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.namespace == 0 && matches!(self.identifier, Identifier::Numeric(0))
    }

    /// Numeric value, if this is a numeric id.
    #[must_use]
    pub const fn as_numeric(&self) -> Option<u32> {
        match self.identifier {
            Identifier::Numeric(value) => Some(value),
            _ => None,
        }
    }

    /// Numeric value when the id lives in namespace 0.
    #[must_use]
    pub const fn standard_numeric(&self) -> Option<u32> {
        if self.namespace == 0 {
            self.as_numeric()
        } else {
            None
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};", self.namespace)?;
        }
        match &self.identifier {
            Identifier::Numeric(value) => write!(f, "i={value}"),
            Identifier::String(value) => write!(f, "s={value}"),
            Identifier::Guid(value) => write!(f, "g={value}"),
            Identifier::Opaque(bytes) => write!(f, "b={}", BASE64.encode(bytes)),
        }
    }
}

/// Error returned when parsing the node-id text form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeIdParseError {
    /// No `i=`, `s=`, `g=` or `b=` part was found.
    #[error("missing identifier part in {0:?}")]
    MissingIdentifier(String),
    /// The `ns=` prefix is not a valid `u16`.
    #[error("invalid namespace index in {0:?}")]
    InvalidNamespace(String),
    /// The `i=` value is not a valid `u32`.
    #[error("invalid numeric identifier in {0:?}")]
    InvalidNumeric(String),
    /// The `g=` value is not a valid GUID.
    #[error("invalid guid identifier in {0:?}")]
    InvalidGuid(String),
    /// The `b=` value is not valid base64.
    #[error("invalid opaque identifier in {0:?}")]
    InvalidOpaque(String),
}

impl FromStr for NodeId {
    type Err = NodeIdParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let (namespace, rest) = match trimmed.strip_prefix("ns=") {
            Some(tail) => {
                let (index, rest) = tail
                    .split_once(';')
                    .ok_or_else(|| NodeIdParseError::MissingIdentifier(text.to_owned()))?;
                let index = index
                    .parse::<u16>()
                    .map_err(|_| NodeIdParseError::InvalidNamespace(text.to_owned()))?;
                (index, rest)
            }
            None => (0, trimmed),
        };

        let identifier = if let Some(value) = rest.strip_prefix("i=") {
            Identifier::Numeric(
                value
                    .parse()
                    .map_err(|_| NodeIdParseError::InvalidNumeric(text.to_owned()))?,
            )
        } else if let Some(value) = rest.strip_prefix("s=") {
            Identifier::String(value.to_owned())
        } else if let Some(value) = rest.strip_prefix("g=") {
            Identifier::Guid(
                Uuid::parse_str(value)
                    .map_err(|_| NodeIdParseError::InvalidGuid(text.to_owned()))?,
            )
        } else if let Some(value) = rest.strip_prefix("b=") {
            Identifier::Opaque(
                BASE64
                    .decode(value)
                    .map_err(|_| NodeIdParseError::InvalidOpaque(text.to_owned()))?,
            )
        } else {
            return Err(NodeIdParseError::MissingIdentifier(text.to_owned()));
        };

        Ok(Self {
            namespace,
            identifier,
        })
    }
}

/// Namespace-qualified browse name. Immutable once assigned to a node.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Namespace the name is defined in.
    pub namespace_index: u16,
    /// Unqualified name.
    pub name: String,
}

impl QualifiedName {
    /// Builds a qualified name.
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }

    /// Parses `n:Name`; text without a numeric prefix lands in namespace 0.
    pub fn parse(text: &str) -> Self {
        if let Some((prefix, name)) = text.split_once(':') {
            if let Ok(namespace_index) = prefix.parse::<u16>() {
                return Self::new(namespace_index, name);
            }
        }
        Self::new(0, text)
    }

    /// True when the name part is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index == 0 {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.namespace_index, self.name)
        }
    }
}

/// Human readable text with an optional locale.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    /// Locale id such as `en-US`.
    pub locale: Option<String>,
    /// The text itself.
    pub text: String,
}

impl LocalizedText {
    /// Text without a locale.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            locale: None,
            text: text.into(),
        }
    }

    /// Text tagged with a locale.
    pub fn with_locale(locale: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
            text: text.into(),
        }
    }
}

impl fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Fixed kind of a node, with the protocol's bitmask encoding.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum NodeClass {
    /// Object instance.
    Object,
    /// Variable instance.
    Variable,
    /// Method.
    Method,
    /// Object type.
    ObjectType,
    /// Variable type.
    VariableType,
    /// Reference type.
    ReferenceType,
    /// Data type.
    DataType,
    /// View.
    View,
}

impl NodeClass {
    /// Bit used for this class in node-class masks.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Object => 1,
            Self::Variable => 2,
            Self::Method => 4,
            Self::ObjectType => 8,
            Self::VariableType => 16,
            Self::ReferenceType => 32,
            Self::DataType => 64,
            Self::View => 128,
        }
    }

    /// True for the four type classes that form subtype hierarchies.
    #[must_use]
    pub const fn is_type(self) -> bool {
        matches!(
            self,
            Self::ObjectType | Self::VariableType | Self::ReferenceType | Self::DataType
        )
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "Object",
            Self::Variable => "Variable",
            Self::Method => "Method",
            Self::ObjectType => "ObjectType",
            Self::VariableType => "VariableType",
            Self::ReferenceType => "ReferenceType",
            Self::DataType => "DataType",
            Self::View => "View",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn namespace_zero_prefix_is_elided() {
        assert_eq!(NodeId::numeric(0, 85).to_string(), "i=85");
        assert_eq!(NodeId::string(2, "Pump-1").to_string(), "ns=2;s=Pump-1");
    }

    #[test]
    fn text_form_parses_every_identifier_kind() {
        let numeric: NodeId = "ns=3;i=1001".parse().unwrap();
        assert_eq!(numeric, NodeId::numeric(3, 1001));

        let string: NodeId = "s=a;b".parse().unwrap();
        assert_eq!(string, NodeId::string(0, "a;b"));

        let guid: NodeId = "ns=1;g=72962b91-fa75-4ae6-8d28-b404dc7daf63"
            .parse()
            .unwrap();
        assert_eq!(guid.identifier.kind(), IdentifierKind::Guid);

        let opaque = NodeId::opaque(1, vec![0xde, 0xad, 0xbe, 0xef]);
        let reparsed: NodeId = opaque.to_string().parse().unwrap();
        assert_eq!(reparsed, opaque);
    }

    #[test]
    fn malformed_text_is_rejected() {
        assert!(matches!(
            "ns=x;i=1".parse::<NodeId>(),
            Err(NodeIdParseError::InvalidNamespace(_))
        ));
        assert!(matches!(
            "i=-4".parse::<NodeId>(),
            Err(NodeIdParseError::InvalidNumeric(_))
        ));
        assert!(matches!(
            "HasComponent".parse::<NodeId>(),
            Err(NodeIdParseError::MissingIdentifier(_))
        ));
    }

    #[test]
    fn ordering_ranks_namespace_before_identifier() {
        let mut ids = vec![
            NodeId::string(1, "a"),
            NodeId::numeric(2, 1),
            NodeId::numeric(1, 9),
        ];
        ids.sort();
        assert_eq!(ids[0], NodeId::numeric(1, 9));
        assert_eq!(ids[2], NodeId::numeric(2, 1));
    }

    #[test]
    fn qualified_name_prefix_is_optional() {
        assert_eq!(QualifiedName::parse("2:Speed"), QualifiedName::new(2, "Speed"));
        assert_eq!(QualifiedName::parse("Speed"), QualifiedName::new(0, "Speed"));
        assert_eq!(QualifiedName::parse("x:y").name, "x:y");
        assert_eq!(QualifiedName::new(2, "Speed").to_string(), "2:Speed");
    }
}
