// Role based access control for the catalog.
//
// The permission table answers "does this role hold this permission";
// the policy in `policy.rs` layers resource ownership on top of it.

pub mod policy;

use std::collections::{HashMap, HashSet};

pub use policy::{AccessPolicy, Action, Decision, Identity, PermissionPair};

/// Capability tokens understood by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    CatalogWriteOwn,
    CatalogWriteAny,
    CatalogReadOwn,
    CatalogReadAny,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::CatalogWriteOwn,
        Permission::CatalogWriteAny,
        Permission::CatalogReadOwn,
        Permission::CatalogReadAny,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CatalogWriteOwn => "catalog:write:own",
            Permission::CatalogWriteAny => "catalog:write:any",
            Permission::CatalogReadOwn => "catalog:read:own",
            Permission::CatalogReadAny => "catalog:read:any",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const ROLE_MERCHANT: &str = "merchant";
pub const ROLE_CUSTOMER: &str = "customer";
pub const ROLE_ADMIN: &str = "admin";

/// Capability check consumed by the access policy
pub trait PermissionCheck: Send + Sync {
    fn can(&self, role: &str, permission: Permission) -> bool;
}

/// Immutable role -> permission assignment, built once at startup
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    grants: HashMap<String, HashSet<Permission>>,
}

impl PermissionTable {
    pub fn builder() -> PermissionTableBuilder {
        PermissionTableBuilder::default()
    }

    /// The catalog's fixed role assignment
    pub fn catalog_default() -> Self {
        Self::builder()
            .grant(ROLE_MERCHANT, Permission::CatalogWriteOwn)
            .grant(ROLE_MERCHANT, Permission::CatalogReadOwn)
            .grant(ROLE_CUSTOMER, Permission::CatalogReadAny)
            .grant(ROLE_ADMIN, Permission::CatalogWriteAny)
            .grant(ROLE_ADMIN, Permission::CatalogReadAny)
            .build()
    }

    /// Lookup by permission name; unknown names are never granted
    pub fn can_named(&self, role: &str, permission: &str) -> bool {
        Permission::parse(permission).is_some_and(|p| self.can(role, p))
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.grants.keys().map(String::as_str)
    }
}

impl PermissionCheck for PermissionTable {
    fn can(&self, role: &str, permission: Permission) -> bool {
        self.grants
            .get(role)
            .is_some_and(|granted| granted.contains(&permission))
    }
}

#[derive(Debug, Default)]
pub struct PermissionTableBuilder {
    grants: HashMap<String, HashSet<Permission>>,
}

impl PermissionTableBuilder {
    pub fn grant(mut self, role: &str, permission: Permission) -> Self {
        self.grants
            .entry(role.to_string())
            .or_default()
            .insert(permission);
        self
    }

    pub fn build(self) -> PermissionTable {
        PermissionTable {
            grants: self.grants,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merchant_holds_only_own_permissions() {
        let table = PermissionTable::catalog_default();
        assert!(table.can(ROLE_MERCHANT, Permission::CatalogWriteOwn));
        assert!(table.can(ROLE_MERCHANT, Permission::CatalogReadOwn));
        assert!(!table.can(ROLE_MERCHANT, Permission::CatalogWriteAny));
        assert!(!table.can(ROLE_MERCHANT, Permission::CatalogReadAny));
    }

    #[test]
    fn customer_can_only_read() {
        let table = PermissionTable::catalog_default();
        assert!(table.can(ROLE_CUSTOMER, Permission::CatalogReadAny));
        assert!(!table.can(ROLE_CUSTOMER, Permission::CatalogWriteOwn));
        assert!(!table.can(ROLE_CUSTOMER, Permission::CatalogWriteAny));
    }

    #[test]
    fn unknown_roles_and_permissions_fail_closed() {
        let table = PermissionTable::catalog_default();
        for permission in Permission::ALL {
            assert!(!table.can("courier", permission));
            assert!(!table.can("", permission));
        }
        assert!(!table.can_named(ROLE_ADMIN, "catalog:delete:any"));
        assert!(table.can_named(ROLE_ADMIN, "catalog:write:any"));
    }

    #[test]
    fn permission_names_parse_back() {
        for permission in Permission::ALL {
            assert_eq!(Permission::parse(permission.as_str()), Some(permission));
        }
    }
}
