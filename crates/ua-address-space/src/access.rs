// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Caller context and node access policy used to filter browse results.
use crate::ident::NodeId;
use crate::node::Node;

/// Access restriction bits of a node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct AccessRestrictions(pub u16);

impl AccessRestrictions {
    /// No restrictions.
    pub const NONE: Self = Self(0);
    /// Requires a signed channel.
    pub const SIGNING_REQUIRED: Self = Self(0x01);
    /// Requires an encrypted channel.
    pub const ENCRYPTION_REQUIRED: Self = Self(0x02);
    /// Requires an activated session.
    pub const SESSION_REQUIRED: Self = Self(0x04);
    /// The other bits also hide the node from browse.
    pub const APPLY_RESTRICTIONS_TO_BROWSE: Self = Self(0x08);

    /// True when every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Bitwise union.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Permission bits granted to a role.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct PermissionType(pub u32);

impl PermissionType {
    /// May see the node in browse results.
    pub const BROWSE: Self = Self(0x0001);
    /// May read role permissions.
    pub const READ_ROLE_PERMISSIONS: Self = Self(0x0002);
    /// May read the value.
    pub const READ: Self = Self(0x0020);
    /// May write the value.
    pub const WRITE: Self = Self(0x0040);
    /// May receive events.
    pub const RECEIVE_EVENTS: Self = Self(0x0800);
    /// May call the method.
    pub const CALL: Self = Self(0x1000);

    /// True when every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Bitwise union.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Permissions granted to one role on one node.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct RolePermission {
    /// Role node id.
    pub role_id: NodeId,
    /// Granted permissions.
    pub permissions: PermissionType,
}

/// Security mode of the caller's channel.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum MessageSecurityMode {
    /// Plain messages.
    #[default]
    None,
    /// Signed messages.
    Sign,
    /// Signed and encrypted messages.
    SignAndEncrypt,
}

/// Who is asking. Passed to every browse call.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct SessionContext {
    /// Roles granted to the caller.
    pub roles: Vec<NodeId>,
    /// Channel security.
    pub security_mode: MessageSecurityMode,
    /// The caller has an activated session.
    pub has_session: bool,
    bypass: bool,
}

impl SessionContext {
    /// Internal caller that sees everything.
    #[must_use]
    pub fn system() -> Self {
        Self {
            bypass: true,
            ..Self::default()
        }
    }

    /// Session with the given roles over a plain channel.
    #[must_use]
    pub fn with_roles(roles: Vec<NodeId>) -> Self {
        Self {
            roles,
            has_session: true,
            ..Self::default()
        }
    }

    /// Same context over a channel with the given security.
    #[must_use]
    pub fn secured(mut self, mode: MessageSecurityMode) -> Self {
        self.security_mode = mode;
        self
    }

    /// True when any of the caller's roles holds `permission` on `node`.
    /// Nodes without role permissions grant everything.
    #[must_use]
    pub fn has_permission(&self, node: &Node, permission: PermissionType) -> bool {
        if self.bypass {
            return true;
        }
        let Some(grants) = node.role_permissions() else {
            return true;
        };
        grants.iter().any(|grant| {
            grant.permissions.contains(permission) && self.roles.contains(&grant.role_id)
        })
    }

    /// True when the node must be hidden from this caller's browse results.
    #[must_use]
    pub fn is_browse_access_restricted(&self, node: &Node) -> bool {
        if self.bypass {
            return false;
        }
        let restrictions = node.access_restrictions();
        if restrictions.contains(AccessRestrictions::APPLY_RESTRICTIONS_TO_BROWSE) {
            if restrictions.contains(AccessRestrictions::SIGNING_REQUIRED)
                && self.security_mode == MessageSecurityMode::None
            {
                return true;
            }
            if restrictions.contains(AccessRestrictions::ENCRYPTION_REQUIRED)
                && self.security_mode != MessageSecurityMode::SignAndEncrypt
            {
                return true;
            }
            if restrictions.contains(AccessRestrictions::SESSION_REQUIRED) && !self.has_session {
                return true;
            }
        }
        !self.has_permission(node, PermissionType::BROWSE)
    }
}
