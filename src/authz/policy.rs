//! Access policy evaluation: RoleRequirement x PrincipalRoles -> AccessDecision.
//!
//! Pure and deterministic. No I/O, no logging; the gate decides what to do
//! with the result.

use super::claims::PrincipalRoles;
use super::requirement::{RoleDescriptor, RoleRequirement, RoleScope};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    /// Every descriptor the principal does not hold, in requirement order.
    Denied { missing: Vec<RoleDescriptor> },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

pub fn is_satisfied(descriptor: &RoleDescriptor, principal: &PrincipalRoles) -> bool {
    match &descriptor.scope {
        RoleScope::Realm => principal.has_realm_role(&descriptor.role),
        RoleScope::Resource(resource) => principal.has_resource_role(resource, &descriptor.role),
    }
}

pub fn evaluate(requirement: &RoleRequirement, principal: &PrincipalRoles) -> AccessDecision {
    let missing: Vec<RoleDescriptor> = requirement
        .iter()
        .filter(|d| !is_satisfied(d, principal))
        .cloned()
        .collect();

    if missing.is_empty() {
        AccessDecision::Allowed
    } else {
        AccessDecision::Denied { missing }
    }
}
