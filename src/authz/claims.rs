/*
 * Responsibility
 * - gateway が返した (検証済み) claims を型付きの TokenClaims に落とす
 * - realm / resource ごとのロール集合 (PrincipalRoles) を作る
 *
 * Notes
 * - 欠落・型違いの field はすべて default に倒す (fail-closed, panic しない)
 */
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Typed view of the access-token claims this service cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    #[serde(default, deserialize_with = "lenient")]
    pub sub: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub preferred_username: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub realm_access: RoleList,
    #[serde(default, deserialize_with = "lenient")]
    pub resource_access: HashMap<String, RoleList>,
}

/// `{ "roles": [...] }` as found under `realm_access` and each
/// `resource_access.<client>` entry. Non-string entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleList(pub Vec<String>);

impl<'de> Deserialize<'de> for RoleList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let roles = match value.get("roles") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        Ok(Self(roles))
    }
}

// Wrong-typed field -> default, instead of failing the whole claims object.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl TokenClaims {
    /// Never fails: anything that is not a claims object yields empty claims.
    pub fn from_value(claims: &Value) -> Self {
        Self::deserialize(claims).unwrap_or_default()
    }

    pub fn principal_roles(&self) -> PrincipalRoles {
        let realm = self.realm_access.0.iter().cloned().collect();
        let resources = self
            .resource_access
            .iter()
            .map(|(resource, roles)| (resource.clone(), roles.0.iter().cloned().collect()))
            .collect();

        PrincipalRoles { realm, resources }
    }
}

/// Realm roles plus per-resource roles of the caller, built once per request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrincipalRoles {
    realm: BTreeSet<String>,
    resources: BTreeMap<String, BTreeSet<String>>,
}

impl PrincipalRoles {
    pub fn new<R, S, M>(realm: R, resources: M) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
        M: IntoIterator<Item = (String, Vec<String>)>,
    {
        Self {
            realm: realm.into_iter().map(Into::into).collect(),
            resources: resources
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
        }
    }

    pub fn has_realm_role(&self, role: &str) -> bool {
        self.realm.contains(role)
    }

    pub fn has_resource_role(&self, resource: &str, role: &str) -> bool {
        self.resources
            .get(resource)
            .is_some_and(|roles| roles.contains(role))
    }

    pub fn realm_roles(&self) -> impl Iterator<Item = &str> {
        self.realm.iter().map(String::as_str)
    }

    pub fn resource_roles(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.resources
    }

    pub fn is_empty(&self) -> bool {
        self.realm.is_empty() && self.resources.values().all(BTreeSet::is_empty)
    }

    /// Flat `scope:role` labels (realm first), for diagnostics.
    pub fn labels(&self) -> Vec<String> {
        let realm = self.realm.iter().map(|r| format!("realm:{r}"));
        let resources = self
            .resources
            .iter()
            .flat_map(|(res, roles)| roles.iter().map(move |r| format!("{res}:{r}")));
        realm.chain(resources).collect()
    }
}

/// Claims extractor entry point.
pub fn extract_roles(claims: &Value) -> PrincipalRoles {
    TokenClaims::from_value(claims).principal_roles()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_realm_and_resource_roles() {
        let claims = json!({
            "sub": "0b1c",
            "preferred_username": "alice",
            "realm_access": { "roles": ["admin", "user"] },
            "resource_access": {
                "billing-client": { "roles": ["read", "write"] },
                "account": { "roles": ["view-profile"] }
            }
        });

        let roles = extract_roles(&claims);
        assert!(roles.has_realm_role("admin"));
        assert!(roles.has_realm_role("user"));
        assert!(roles.has_resource_role("billing-client", "write"));
        assert!(roles.has_resource_role("account", "view-profile"));
        assert!(!roles.has_resource_role("account", "write"));
        assert!(!roles.has_realm_role("view-profile"));
    }

    #[test]
    fn missing_claims_yield_empty_roles() {
        assert!(extract_roles(&json!({})).is_empty());
        assert!(extract_roles(&Value::Null).is_empty());
        assert!(extract_roles(&json!("not an object")).is_empty());
        assert!(extract_roles(&json!([1, 2, 3])).is_empty());
    }

    #[test]
    fn malformed_role_lists_fail_closed() {
        let claims = json!({
            "realm_access": { "roles": "admin" },
            "resource_access": ["billing-client"]
        });
        let roles = extract_roles(&claims);
        assert!(roles.is_empty());

        let claims = json!({
            "realm_access": "admin",
            "resource_access": { "billing-client": { "roles": { "write": true } } }
        });
        assert!(extract_roles(&claims).is_empty());
    }

    #[test]
    fn non_string_entries_are_dropped() {
        let claims = json!({ "realm_access": { "roles": ["admin", 7, null, { "x": 1 }] } });
        let roles = extract_roles(&claims);
        assert_eq!(roles.labels(), vec!["realm:admin"]);
    }

    #[test]
    fn wrong_typed_profile_fields_default() {
        let claims = TokenClaims::from_value(&json!({
            "sub": 42,
            "email": ["a@example.com"],
            "realm_access": { "roles": ["user"] }
        }));
        assert_eq!(claims.sub, None);
        assert_eq!(claims.email, None);
        assert!(claims.principal_roles().has_realm_role("user"));
    }

    #[test]
    fn labels_are_sorted_realm_first() {
        let roles = PrincipalRoles::new(
            ["user", "admin"],
            [("billing-client".to_string(), vec!["write".to_string()])],
        );
        assert_eq!(
            roles.labels(),
            vec!["realm:admin", "realm:user", "billing-client:write"]
        );
    }
}
