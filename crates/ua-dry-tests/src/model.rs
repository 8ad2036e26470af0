// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! A small type model used across the test suites.
//!
//! ```text
//! DeviceType
//!   SerialNumber   property String    Mandatory
//!   Manufacturer   property String    Optional
//!   Mode           ModeEnum           Mandatory
//!   Range          RangeVariableType  Mandatory   (Low, High)
//!   Diagnostics    object             Optional    (ErrorCount Mandatory, LastError Optional)
//!   Reset          method             Mandatory
//! PumpType : DeviceType
//!   Manufacturer   property String    Mandatory   (re-declared, value "ACME")
//!   FlowRate       Double             Mandatory   --MeasuredBy--> DeviceType.Range
//! AbstractMachineType (abstract)
//! FunctionalGroupType
//! ControllerType
//!   Setpoint, Output  Double          Mandatory
//!   Operational    FunctionalGroupType Mandatory --Organizes--> Setpoint, Output
//! ```
//! Every type and member has a string id; members derive theirs from the
//! parent (`DeviceType-SerialNumber`).

use ua_address_space::standard::{data_types, object_types, reference_types, variable_types};
use ua_address_space::{
    AddressSpace, AddressSpaceError, DataTypeAttributes, DataTypeDefinition, EnumField,
    Identifier, ModellingRule, NewNode, NodeBody, NodeId, QualifiedName, ReferenceSpec, StructureField,
    Variant,
};

/// URI of the namespace holding the sample model.
pub const SAMPLE_NAMESPACE_URI: &str = "urn:ua-dry-tests:model";

/// Ids of the sample model's types.
#[derive(Clone, Debug)]
pub struct SampleModel {
    /// Namespace index of the model.
    pub namespace: u16,
    /// `ModeEnum` data type (Off, Auto, Manual).
    pub mode_enum: NodeId,
    /// `RangeType` structure (Low, High).
    pub range_type: NodeId,
    /// `RangeVariableType` variable type.
    pub range_variable_type: NodeId,
    /// `MeasuredBy` reference type (inverse `Measures`).
    pub measured_by: NodeId,
    /// `DeviceType`.
    pub device_type: NodeId,
    /// `PumpType`, subtype of `DeviceType`.
    pub pump_type: NodeId,
    /// Abstract `AbstractMachineType`.
    pub abstract_machine_type: NodeId,
    /// `FunctionalGroupType`.
    pub functional_group_type: NodeId,
    /// `ControllerType`.
    pub controller_type: NodeId,
}

impl SampleModel {
    /// Browse name in the model namespace.
    pub fn name(&self, name: &str) -> QualifiedName {
        QualifiedName::new(self.namespace, name)
    }

    /// Id of a member declared directly under a type or member (`DeviceType-Range`).
    pub fn member(&self, parent: &NodeId, name: &str) -> NodeId {
        let parent = match &parent.identifier {
            Identifier::String(text) => text.clone(),
            _ => parent.to_string(),
        };
        NodeId::string(self.namespace, format!("{parent}-{name}"))
    }
}

/// Loads the sample model into its own namespace.
pub fn load_sample_model(space: &mut AddressSpace) -> Result<SampleModel, AddressSpaceError> {
    let ns = space.register_namespace(SAMPLE_NAMESPACE_URI)?;
    let id = |text: &str| NodeId::string(ns, text);
    let name = |text: &str| QualifiedName::new(ns, text);

    let mode_enum = space.add_node(
        ns,
        NewNode::new(
            name("ModeEnum"),
            NodeBody::DataType(DataTypeAttributes {
                is_abstract: false,
                definition: Some(DataTypeDefinition::Enum(
                    ["Off", "Auto", "Manual"]
                        .iter()
                        .zip(0_i64..)
                        .map(|(name, value)| EnumField {
                            name: (*name).to_owned(),
                            value,
                        })
                        .collect(),
                )),
            }),
        )
        .with_node_id(id("ModeEnum"))
        .subtype_of(data_types::ENUMERATION),
    )?;
    let range_type = space.add_node(
        ns,
        NewNode::new(
            name("RangeType"),
            NodeBody::DataType(DataTypeAttributes {
                is_abstract: false,
                definition: Some(DataTypeDefinition::Structure(vec![
                    StructureField::new("Low", data_types::DOUBLE),
                    StructureField::new("High", data_types::DOUBLE),
                ])),
            }),
        )
        .with_node_id(id("RangeType"))
        .subtype_of(data_types::STRUCTURE),
    )?;

    let range_variable_type = space.add_node(
        ns,
        NewNode::variable_type(name("RangeVariableType"), range_type.clone())
            .with_node_id(id("RangeVariableType"))
            .subtype_of(variable_types::BASE_DATA_VARIABLE_TYPE),
    )?;
    for field in ["Low", "High"] {
        space.add_node(
            ns,
            NewNode::variable(name(field), data_types::DOUBLE)
                .component_of(range_variable_type.clone())
                .with_modelling_rule(ModellingRule::Mandatory),
        )?;
    }

    let measured_by = space.add_node(
        ns,
        NewNode::reference_type(name("MeasuredBy"), Some("Measures"))
            .with_node_id(id("MeasuredBy")),
    )?;

    let device_type = space.add_node(
        ns,
        NewNode::object_type(name("DeviceType")).with_node_id(id("DeviceType")),
    )?;
    space.add_node(
        ns,
        NewNode::property(name("SerialNumber"), data_types::STRING)
            .property_of(device_type.clone())
            .with_modelling_rule(ModellingRule::Mandatory),
    )?;
    space.add_node(
        ns,
        NewNode::property(name("Manufacturer"), data_types::STRING)
            .property_of(device_type.clone())
            .with_modelling_rule(ModellingRule::Optional),
    )?;
    space.add_node(
        ns,
        NewNode::variable(name("Mode"), mode_enum.clone())
            .component_of(device_type.clone())
            .with_value(Variant::Int32(0))
            .with_modelling_rule(ModellingRule::Mandatory),
    )?;
    let device_range = space.add_node(
        ns,
        NewNode::variable(name("Range"), range_type.clone())
            .component_of(device_type.clone())
            .with_type_definition(range_variable_type.clone())
            .with_modelling_rule(ModellingRule::Mandatory),
    )?;
    let diagnostics = space.add_node(
        ns,
        NewNode::object(name("Diagnostics"))
            .component_of(device_type.clone())
            .with_modelling_rule(ModellingRule::Optional),
    )?;
    space.add_node(
        ns,
        NewNode::variable(name("ErrorCount"), data_types::INT32)
            .component_of(diagnostics.clone())
            .with_value(0_i32)
            .with_modelling_rule(ModellingRule::Mandatory),
    )?;
    space.add_node(
        ns,
        NewNode::variable(name("LastError"), data_types::STRING)
            .component_of(diagnostics)
            .with_modelling_rule(ModellingRule::Optional),
    )?;
    space.add_node(
        ns,
        NewNode::method(name("Reset"))
            .component_of(device_type.clone())
            .with_modelling_rule(ModellingRule::Mandatory),
    )?;

    let pump_type = space.add_node(
        ns,
        NewNode::object_type(name("PumpType"))
            .with_node_id(id("PumpType"))
            .subtype_of(device_type.clone()),
    )?;
    space.add_node(
        ns,
        NewNode::property(name("Manufacturer"), data_types::STRING)
            .property_of(pump_type.clone())
            .with_value("ACME")
            .with_modelling_rule(ModellingRule::Mandatory),
    )?;
    space.add_node(
        ns,
        NewNode::variable(name("FlowRate"), data_types::DOUBLE)
            .component_of(pump_type.clone())
            .with_modelling_rule(ModellingRule::Mandatory)
            .with_reference(ReferenceSpec::new(measured_by.clone(), device_range)),
    )?;

    let abstract_machine_type = space.add_node(
        ns,
        NewNode::object_type(name("AbstractMachineType"))
            .with_node_id(id("AbstractMachineType"))
            .abstract_type(),
    )?;
    let functional_group_type = space.add_node(
        ns,
        NewNode::object_type(name("FunctionalGroupType"))
            .with_node_id(id("FunctionalGroupType"))
            .subtype_of(object_types::FOLDER_TYPE),
    )?;

    let controller_type = space.add_node(
        ns,
        NewNode::object_type(name("ControllerType")).with_node_id(id("ControllerType")),
    )?;
    let mut grouped = Vec::new();
    for member in ["Setpoint", "Output"] {
        grouped.push(space.add_node(
            ns,
            NewNode::variable(name(member), data_types::DOUBLE)
                .component_of(controller_type.clone())
                .with_modelling_rule(ModellingRule::Mandatory),
        )?);
    }
    let operational = space.add_node(
        ns,
        NewNode::object(name("Operational"))
            .component_of(controller_type.clone())
            .with_type_definition(functional_group_type.clone())
            .with_modelling_rule(ModellingRule::Mandatory),
    )?;
    for member in grouped {
        space.add_reference(
            &operational,
            ReferenceSpec::new(reference_types::ORGANIZES, member),
        )?;
    }

    Ok(SampleModel {
        namespace: ns,
        mode_enum,
        range_type,
        range_variable_type,
        measured_by,
        device_type,
        pump_type,
        abstract_machine_type,
        functional_group_type,
        controller_type,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn members_derive_ids_from_their_type() {
        let mut space = AddressSpace::new().unwrap();
        let model = load_sample_model(&mut space).unwrap();
        let serial = model.member(&model.device_type, "SerialNumber");
        assert_eq!(serial, NodeId::string(model.namespace, "DeviceType-SerialNumber"));
        assert!(space.contains(&serial));
        let inner = model.member(&model.member(&model.device_type, "Diagnostics"), "ErrorCount");
        assert!(space.contains(&inner), "{inner}");
    }
}
