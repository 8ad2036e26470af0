// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Construction of default structure values for data-type nodes.
use crate::address_space::AddressSpace;
use crate::ident::NodeId;
use crate::value::{DataTypeDefinition, ExtensionObject, Variant};

/// Builds a default [`ExtensionObject`] for a structured data type.
///
/// Instantiation asks the registered factory for a value whenever a variable's
/// data type derives from `Structure` and the caller supplied none.
pub trait ExtensionObjectFactory {
    /// Default value for `data_type`, or `None` when it cannot be built.
    fn construct(&self, space: &AddressSpace, data_type: &NodeId) -> Option<ExtensionObject>;
}

/// Builds values from the data type's structure definition.
///
/// Each mandatory field gets the default of its basic encoding kind; array
/// fields start empty and optional fields are left out. The definition of the
/// nearest type on the supertype chain that has one is used.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefinitionFactory;

impl ExtensionObjectFactory for DefinitionFactory {
    fn construct(&self, space: &AddressSpace, data_type: &NodeId) -> Option<ExtensionObject> {
        let fields = space.supertype_chain(data_type).into_iter().find_map(|id| {
            match space.find_node(&id)?.as_data_type()?.definition.as_ref()? {
                DataTypeDefinition::Structure(fields) => Some(fields.clone()),
                DataTypeDefinition::Enum(_) => None,
            }
        })?;
        let mut value = ExtensionObject::new(data_type.clone());
        for field in fields.iter().filter(|field| !field.is_optional) {
            let default = if field.value_rank >= 0 {
                Variant::Array(Vec::new())
            } else {
                space
                    .basic_encoding_kind(&field.data_type)
                    .map(Variant::default_for)
                    .unwrap_or_default()
            };
            value.set_field(field.name.clone(), default);
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::standard::data_types;

    #[test]
    fn argument_defaults_follow_definition() {
        let space = AddressSpace::new().unwrap();
        let value = DefinitionFactory.construct(&space, &data_types::ARGUMENT).unwrap();
        assert_eq!(value.field("Name"), Some(&Variant::String(String::new())));
        assert_eq!(value.field("ValueRank"), Some(&Variant::Int32(0)));
        assert_eq!(value.field("ArrayDimensions"), Some(&Variant::Array(Vec::new())));
    }

    #[test]
    fn scalar_types_have_no_structure() {
        let space = AddressSpace::new().unwrap();
        assert!(DefinitionFactory.construct(&space, &data_types::DOUBLE).is_none());
    }
}
