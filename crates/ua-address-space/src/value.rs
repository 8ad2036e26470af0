// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Attribute values: builtin kinds, variants, structure values and data-type definitions.
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ident::{LocalizedText, NodeId, QualifiedName};
use crate::status::StatusCode;

/// Wire-level primitive kinds. Discriminants equal the namespace-0 data-type ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum BuiltinType {
    Boolean = 1,
    SByte = 2,
    Byte = 3,
    Int16 = 4,
    UInt16 = 5,
    Int32 = 6,
    UInt32 = 7,
    Int64 = 8,
    UInt64 = 9,
    Float = 10,
    Double = 11,
    String = 12,
    DateTime = 13,
    Guid = 14,
    ByteString = 15,
    XmlElement = 16,
    NodeId = 17,
    ExpandedNodeId = 18,
    StatusCode = 19,
    QualifiedName = 20,
    LocalizedText = 21,
    ExtensionObject = 22,
    DataValue = 23,
    Variant = 24,
    DiagnosticInfo = 25,
}

impl BuiltinType {
    const ALL: [Self; 25] = [
        Self::Boolean,
        Self::SByte,
        Self::Byte,
        Self::Int16,
        Self::UInt16,
        Self::Int32,
        Self::UInt32,
        Self::Int64,
        Self::UInt64,
        Self::Float,
        Self::Double,
        Self::String,
        Self::DateTime,
        Self::Guid,
        Self::ByteString,
        Self::XmlElement,
        Self::NodeId,
        Self::ExpandedNodeId,
        Self::StatusCode,
        Self::QualifiedName,
        Self::LocalizedText,
        Self::ExtensionObject,
        Self::DataValue,
        Self::Variant,
        Self::DiagnosticInfo,
    ];

    /// Maps a namespace-0 numeric data-type id to its builtin kind.
    #[must_use]
    pub fn from_id(id: u32) -> Option<Self> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        Self::ALL.get(index).copied()
    }

    /// Namespace-0 numeric id of the data type node for this kind.
    #[must_use]
    pub const fn id(self) -> u32 {
        self as u32
    }
}

/// A structure value tagged with its data type.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtensionObject {
    /// Data type the value is an instance of.
    pub type_id: NodeId,
    /// Field values in definition order.
    pub fields: Vec<(String, Variant)>,
}

impl ExtensionObject {
    /// Empty value of the given data type.
    #[must_use]
    pub const fn new(type_id: NodeId) -> Self {
        Self {
            type_id,
            fields: Vec::new(),
        }
    }

    /// Builder form of [`ExtensionObject::set_field`].
    pub fn with_field(mut self, name: impl Into<String>, value: Variant) -> Self {
        self.set_field(name, value);
        self
    }

    /// Field value by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Variant> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Sets a field, replacing any value already stored under `name`.
    pub fn set_field(&mut self, name: impl Into<String>, value: Variant) {
        let name = name.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }
}

/// Value of a variable, event field or structure field.
#[derive(Clone, Debug, PartialEq, Default)]
#[allow(missing_docs)]
pub enum Variant {
    /// No value.
    #[default]
    Empty,
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    ByteString(Vec<u8>),
    NodeId(NodeId),
    StatusCode(StatusCode),
    QualifiedName(QualifiedName),
    LocalizedText(LocalizedText),
    ExtensionObject(Box<ExtensionObject>),
    /// One-dimensional array of values.
    Array(Vec<Variant>),
}

impl Variant {
    /// Builtin kind of a scalar value; `None` for `Empty` and arrays.
    #[must_use]
    pub const fn builtin_type(&self) -> Option<BuiltinType> {
        Some(match self {
            Self::Empty | Self::Array(_) => return None,
            Self::Boolean(_) => BuiltinType::Boolean,
            Self::SByte(_) => BuiltinType::SByte,
            Self::Byte(_) => BuiltinType::Byte,
            Self::Int16(_) => BuiltinType::Int16,
            Self::UInt16(_) => BuiltinType::UInt16,
            Self::Int32(_) => BuiltinType::Int32,
            Self::UInt32(_) => BuiltinType::UInt32,
            Self::Int64(_) => BuiltinType::Int64,
            Self::UInt64(_) => BuiltinType::UInt64,
            Self::Float(_) => BuiltinType::Float,
            Self::Double(_) => BuiltinType::Double,
            Self::String(_) => BuiltinType::String,
            Self::DateTime(_) => BuiltinType::DateTime,
            Self::Guid(_) => BuiltinType::Guid,
            Self::ByteString(_) => BuiltinType::ByteString,
            Self::NodeId(_) => BuiltinType::NodeId,
            Self::StatusCode(_) => BuiltinType::StatusCode,
            Self::QualifiedName(_) => BuiltinType::QualifiedName,
            Self::LocalizedText(_) => BuiltinType::LocalizedText,
            Self::ExtensionObject(_) => BuiltinType::ExtensionObject,
        })
    }

    /// Zero value for a builtin kind. Kinds without a natural zero map to `Empty`.
    #[must_use]
    pub fn default_for(kind: BuiltinType) -> Self {
        match kind {
            BuiltinType::Boolean => Self::Boolean(false),
            BuiltinType::SByte => Self::SByte(0),
            BuiltinType::Byte => Self::Byte(0),
            BuiltinType::Int16 => Self::Int16(0),
            BuiltinType::UInt16 => Self::UInt16(0),
            BuiltinType::Int32 => Self::Int32(0),
            BuiltinType::UInt32 => Self::UInt32(0),
            BuiltinType::Int64 => Self::Int64(0),
            BuiltinType::UInt64 => Self::UInt64(0),
            BuiltinType::Float => Self::Float(0.0),
            BuiltinType::Double => Self::Double(0.0),
            BuiltinType::String | BuiltinType::XmlElement => Self::String(String::new()),
            BuiltinType::DateTime => Self::DateTime(DateTime::<Utc>::UNIX_EPOCH),
            BuiltinType::Guid => Self::Guid(Uuid::nil()),
            BuiltinType::ByteString => Self::ByteString(Vec::new()),
            BuiltinType::NodeId | BuiltinType::ExpandedNodeId => Self::NodeId(NodeId::NULL),
            BuiltinType::StatusCode => Self::StatusCode(StatusCode::GOOD),
            BuiltinType::QualifiedName => Self::QualifiedName(QualifiedName::default()),
            BuiltinType::LocalizedText => Self::LocalizedText(LocalizedText::default()),
            BuiltinType::ExtensionObject
            | BuiltinType::DataValue
            | BuiltinType::Variant
            | BuiltinType::DiagnosticInfo => Self::Empty,
        }
    }

    /// True for [`Variant::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Borrowed string payload.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Borrowed node-id payload.
    #[must_use]
    pub const fn as_node_id(&self) -> Option<&NodeId> {
        match self {
            Self::NodeId(value) => Some(value),
            _ => None,
        }
    }

    /// Borrowed structure payload.
    #[must_use]
    pub fn as_extension_object(&self) -> Option<&ExtensionObject> {
        match self {
            Self::ExtensionObject(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<u16> for Variant {
    fn from(value: u16) -> Self {
        Self::UInt16(value)
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<NodeId> for Variant {
    fn from(value: NodeId) -> Self {
        Self::NodeId(value)
    }
}

impl From<LocalizedText> for Variant {
    fn from(value: LocalizedText) -> Self {
        Self::LocalizedText(value)
    }
}

impl From<ExtensionObject> for Variant {
    fn from(value: ExtensionObject) -> Self {
        Self::ExtensionObject(Box::new(value))
    }
}

/// Layout of a structured or enumerated data type.
#[derive(Clone, Debug, PartialEq)]
pub enum DataTypeDefinition {
    /// Structure with ordered fields.
    Structure(Vec<StructureField>),
    /// Enumeration with named values.
    Enum(Vec<EnumField>),
}

/// One field of a structure definition.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureField {
    /// Field name; also the browse name of the matching child variable.
    pub name: String,
    /// Data type of the field.
    pub data_type: NodeId,
    /// `-1` scalar, `>= 1` array of that rank.
    pub value_rank: i32,
    /// Optional fields are left out of default values.
    pub is_optional: bool,
}

impl StructureField {
    /// Mandatory scalar field.
    pub fn new(name: impl Into<String>, data_type: NodeId) -> Self {
        Self {
            name: name.into(),
            data_type,
            value_rank: -1,
            is_optional: false,
        }
    }
}

/// One value of an enumeration definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumField {
    /// Symbolic name.
    pub name: String,
    /// Encoded value.
    pub value: i64,
}
