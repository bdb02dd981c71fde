use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Permission, PermissionCheck};
use crate::catalog::{CatalogError, CatalogResult};

/// Caller identity supplied with every request; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub role: String,
    pub client_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, role: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: role.into(),
            client_id: client_id.into(),
        }
    }
}

/// The "own" / "any" permissions guarding one kind of action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionPair {
    pub own: Permission,
    pub any: Permission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

impl Action {
    pub fn permissions(&self) -> PermissionPair {
        match self {
            Action::Read => PermissionPair {
                own: Permission::CatalogReadOwn,
                any: Permission::CatalogReadAny,
            },
            Action::Write => PermissionPair {
                own: Permission::CatalogWriteOwn,
                any: Permission::CatalogWriteAny,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Ownership-scoped authorization over a permission table.
///
/// A caller is allowed when it owns the resource and holds the "own"
/// permission, or when it holds the "any" permission regardless of owner.
/// `owner` is `None` when no owner is known (e.g. an unscoped search), in
/// which case only the "any" permission can allow.
#[derive(Clone)]
pub struct AccessPolicy {
    permissions: Arc<dyn PermissionCheck>,
}

impl AccessPolicy {
    pub fn new(permissions: Arc<dyn PermissionCheck>) -> Self {
        Self { permissions }
    }

    pub fn decide(&self, identity: &Identity, pair: PermissionPair, owner: Option<&str>) -> Decision {
        let owns = owner.is_some_and(|owner| owner == identity.user_id);
        if owns && self.permissions.can(&identity.role, pair.own) {
            return Decision::Allow;
        }
        if self.permissions.can(&identity.role, pair.any) {
            return Decision::Allow;
        }
        Decision::Deny
    }

    pub fn authorize(&self, identity: &Identity, action: Action, owner: Option<&str>) -> Decision {
        self.decide(identity, action.permissions(), owner)
    }

    /// Same as `authorize` but as a `Forbidden` failure on deny
    pub fn require(&self, identity: &Identity, action: Action, owner: Option<&str>) -> CatalogResult<()> {
        match self.authorize(identity, action, owner) {
            Decision::Allow => Ok(()),
            Decision::Deny => {
                tracing::warn!(
                    user_id = %identity.user_id,
                    role = %identity.role,
                    ?action,
                    "access denied"
                );
                Err(CatalogError::Forbidden)
            }
        }
    }
}

impl std::fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessPolicy").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::PermissionTable;

    /// Grants exactly the configured own/any permissions to role "tester"
    fn policy_with(own: bool, any: bool) -> AccessPolicy {
        let mut builder = PermissionTable::builder();
        if own {
            builder = builder.grant("tester", Permission::CatalogWriteOwn);
        }
        if any {
            builder = builder.grant("tester", Permission::CatalogWriteAny);
        }
        AccessPolicy::new(Arc::new(builder.build()))
    }

    #[test]
    fn truth_table_over_ownership_and_grants() {
        let caller = Identity::new("u-1", "tester", "web");
        for is_owner in [false, true] {
            for has_own in [false, true] {
                for has_any in [false, true] {
                    let policy = policy_with(has_own, has_any);
                    let owner = if is_owner { "u-1" } else { "u-2" };
                    let expected = if (is_owner && has_own) || has_any {
                        Decision::Allow
                    } else {
                        Decision::Deny
                    };
                    assert_eq!(
                        policy.authorize(&caller, Action::Write, Some(owner)),
                        expected,
                        "owner={} own={} any={}",
                        is_owner,
                        has_own,
                        has_any
                    );
                }
            }
        }
    }

    #[test]
    fn missing_owner_only_allows_any() {
        let caller = Identity::new("u-1", "tester", "web");
        assert_eq!(policy_with(true, false).authorize(&caller, Action::Write, None), Decision::Deny);
        assert_eq!(policy_with(false, true).authorize(&caller, Action::Write, None), Decision::Allow);
    }

    #[test]
    fn read_and_write_use_separate_pairs() {
        let policy = AccessPolicy::new(Arc::new(PermissionTable::catalog_default()));
        let merchant = Identity::new("m-1", "merchant", "web");
        let customer = Identity::new("c-1", "customer", "web");

        assert_eq!(policy.authorize(&merchant, Action::Read, Some("m-1")), Decision::Allow);
        assert_eq!(policy.authorize(&merchant, Action::Read, Some("m-2")), Decision::Deny);
        assert_eq!(policy.authorize(&customer, Action::Read, Some("m-1")), Decision::Allow);
        assert_eq!(policy.authorize(&customer, Action::Write, Some("c-1")), Decision::Deny);
    }

    #[test]
    fn require_maps_deny_to_forbidden() {
        let policy = AccessPolicy::new(Arc::new(PermissionTable::catalog_default()));
        let customer = Identity::new("c-1", "customer", "web");
        assert_eq!(
            policy.require(&customer, Action::Write, Some("m-1")),
            Err(CatalogError::Forbidden)
        );
    }
}
