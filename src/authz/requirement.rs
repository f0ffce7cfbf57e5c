/*
 * Responsibility
 * - Role Requirement の型 (scope + role name の順序付きリスト)
 * - `realm:admin` / `billing-client:write` 形式の文字列との相互変換
 * - route 登録時に一度だけ組み立て、以降は read-only で共有する
 */
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

const REALM_SCOPE: &str = "realm";

/// Where a role lives: the realm itself, or a named resource (client).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleScope {
    Realm,
    Resource(String),
}

/// One `(scope, role)` pair the caller must hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoleDescriptor {
    pub scope: RoleScope,
    pub role: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequirementError {
    #[error("empty role descriptor")]
    Empty,
    #[error("role descriptor '{0}' has an empty scope")]
    EmptyScope(String),
    #[error("role descriptor '{0}' has an empty role name")]
    EmptyRole(String),
}

impl RoleDescriptor {
    pub fn realm(role: impl Into<String>) -> Self {
        Self {
            scope: RoleScope::Realm,
            role: role.into(),
        }
    }

    pub fn resource(resource: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            scope: RoleScope::Resource(resource.into()),
            role: role.into(),
        }
    }
}

impl FromStr for RoleDescriptor {
    type Err = RequirementError;

    /// Parses `scope:role`. The first `:` splits; a bare name is a realm role.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RequirementError::Empty);
        }

        let Some((scope, role)) = s.split_once(':') else {
            return Ok(Self::realm(s));
        };

        let (scope, role) = (scope.trim(), role.trim());
        if scope.is_empty() {
            return Err(RequirementError::EmptyScope(s.to_string()));
        }
        if role.is_empty() {
            return Err(RequirementError::EmptyRole(s.to_string()));
        }

        if scope == REALM_SCOPE {
            Ok(Self::realm(role))
        } else {
            Ok(Self::resource(scope, role))
        }
    }
}

impl fmt::Display for RoleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            RoleScope::Realm => write!(f, "{}:{}", REALM_SCOPE, self.role),
            RoleScope::Resource(resource) => write!(f, "{}:{}", resource, self.role),
        }
    }
}

impl Serialize for RoleDescriptor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ordered set of descriptors, all of which must hold (logical AND).
///
/// An empty requirement means "authenticated only".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRequirement {
    descriptors: Vec<RoleDescriptor>,
}

impl RoleRequirement {
    pub fn authenticated_only() -> Self {
        Self::default()
    }

    pub fn new(descriptors: impl IntoIterator<Item = RoleDescriptor>) -> Self {
        Self {
            descriptors: descriptors.into_iter().collect(),
        }
    }

    /// Parses every entry; fails on the first malformed one.
    pub fn parse<I, T>(roles: I) -> Result<Self, RequirementError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        roles
            .into_iter()
            .map(|r| r.as_ref().parse::<RoleDescriptor>())
            .collect::<Result<Vec<_>, _>>()
            .map(|descriptors| Self { descriptors })
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoleDescriptor> {
        self.descriptors.iter()
    }

    /// `scope:role` labels, for logs and denial records.
    pub fn labels(&self) -> Vec<String> {
        self.descriptors.iter().map(ToString::to_string).collect()
    }
}

impl From<RoleDescriptor> for RoleRequirement {
    fn from(descriptor: RoleDescriptor) -> Self {
        Self {
            descriptors: vec![descriptor],
        }
    }
}

impl From<Vec<RoleDescriptor>> for RoleRequirement {
    fn from(descriptors: Vec<RoleDescriptor>) -> Self {
        Self { descriptors }
    }
}

impl FromStr for RoleRequirement {
    type Err = RequirementError;

    /// Comma separated list, e.g. `realm:admin,billing-client:write`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.split(',').map(str::trim).filter(|p| !p.is_empty()))
    }
}
