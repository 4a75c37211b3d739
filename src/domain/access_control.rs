//! Declared access-control policy and its reconciliation with stored grants.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use once_cell::sync::Lazy;
use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Permission {
    ViewUsers,
    ManageUsers,
    ManageRoles,
    ManageTechnologies,
    ModerateProfiles,
    ManageOwnSkills,
    ManageOwnProfiles,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleGrant {
    All,
    Only(Vec<Permission>),
}

#[derive(Debug, Clone)]
pub struct RoleDefinition {
    pub name: String,
    pub grant: RoleGrant,
}

impl RoleDefinition {
    pub fn all(name: &str) -> Self {
        RoleDefinition { name: name.to_string(), grant: RoleGrant::All }
    }

    pub fn only(name: &str, permissions: &[Permission]) -> Self {
        RoleDefinition { name: name.to_string(), grant: RoleGrant::Only(permissions.to_vec()) }
    }
}

/// Immutable role → permission table.
#[derive(Debug, Clone)]
pub struct PermissionPolicy {
    roles: Vec<RoleDefinition>,
}

static DEFAULT_POLICY: Lazy<PermissionPolicy> = Lazy::new(|| {
    PermissionPolicy::new(vec![
        RoleDefinition::all("admin"),
        RoleDefinition::only("moderator", &[
            Permission::ViewUsers,
            Permission::ManageTechnologies,
            Permission::ModerateProfiles,
        ]),
        RoleDefinition::only("member", &[
            Permission::ManageOwnSkills,
            Permission::ManageOwnProfiles,
        ]),
    ])
});

impl PermissionPolicy {
    pub fn new(roles: Vec<RoleDefinition>) -> Self {
        PermissionPolicy { roles }
    }

    /// The policy compiled into the binary.
    pub fn standard() -> &'static PermissionPolicy {
        &DEFAULT_POLICY
    }

    /// Every declared permission name.
    pub fn permissions(&self) -> BTreeSet<String> {
        Permission::iter().map(|p| p.to_string()).collect()
    }

    pub fn role_names(&self) -> BTreeSet<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    pub fn declares_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.name == role)
    }

    /// Permission names each declared role must hold.
    pub fn declared_grants(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.roles
            .iter()
            .map(|role| {
                let permissions = match &role.grant {
                    RoleGrant::All => self.permissions(),
                    RoleGrant::Only(subset) => subset.iter().map(|p| p.to_string()).collect(),
                };
                (role.name.clone(), permissions)
            })
            .collect()
    }
}

/// Persisted permissions and role grants at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessSnapshot {
    pub permissions: BTreeSet<String>,
    pub roles: BTreeMap<String, BTreeSet<String>>,
}

/// Writes needed to bring a snapshot in line with a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    pub create_permissions: Vec<String>,
    pub create_roles: Vec<String>,
    /// (role, permission) pairs to insert.
    pub grants: Vec<(String, String)>,
    /// (role, permission) pairs to delete from declared roles.
    pub revocations: Vec<(String, String)>,
    pub prune_roles: Vec<String>,
    pub prune_permissions: Vec<String>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.create_permissions.is_empty()
            && self.create_roles.is_empty()
            && self.grants.is_empty()
            && self.revocations.is_empty()
            && self.prune_roles.is_empty()
            && self.prune_permissions.is_empty()
    }
}

/// Computes the writes that make `snapshot` match `policy`.
///
/// Without `prune` nothing undeclared is deleted: stray permissions and roles
/// survive, only declared roles have their grants corrected.
pub fn plan_sync(policy: &PermissionPolicy, snapshot: &AccessSnapshot, prune: bool) -> SyncPlan {
    let declared_permissions = policy.permissions();
    let declared_grants = policy.declared_grants();

    let create_permissions = declared_permissions
        .difference(&snapshot.permissions)
        .cloned()
        .collect();

    let create_roles = declared_grants
        .keys()
        .filter(|role| !snapshot.roles.contains_key(*role))
        .cloned()
        .collect();

    let empty = BTreeSet::new();
    let mut grants = Vec::new();
    let mut revocations = Vec::new();

    for (role, wanted) in &declared_grants {
        let current = snapshot.roles.get(role).unwrap_or(&empty);

        grants.extend(wanted.difference(current).map(|p| (role.clone(), p.clone())));
        revocations.extend(current.difference(wanted).map(|p| (role.clone(), p.clone())));
    }

    let (prune_roles, prune_permissions) = if prune {
        (
            snapshot.roles.keys().filter(|r| !policy.declares_role(r)).cloned().collect(),
            snapshot.permissions.difference(&declared_permissions).cloned().collect(),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    SyncPlan {
        create_permissions,
        create_roles,
        grants,
        revocations,
        prune_roles,
        prune_permissions,
    }
}

/// Summary printed after a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub pruned: bool,
    pub permissions_created: usize,
    pub roles_created: usize,
    pub grants_added: usize,
    pub grants_revoked: usize,
    pub roles_deleted: usize,
    pub permissions_deleted: usize,
}

impl SyncReport {
    pub fn from_plan(plan: &SyncPlan, pruned: bool) -> Self {
        SyncReport {
            pruned,
            permissions_created: plan.create_permissions.len(),
            roles_created: plan.create_roles.len(),
            grants_added: plan.grants.len(),
            grants_revoked: plan.revocations.len(),
            roles_deleted: plan.prune_roles.len(),
            permissions_deleted: plan.prune_permissions.len(),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        *self == SyncReport { pruned: self.pruned, ..SyncReport::default() }
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unchanged() {
            return write!(f, "permissions already in sync");
        }
        write!(
            f,
            "permissions +{} roles +{} grants +{}/-{}",
            self.permissions_created, self.roles_created, self.grants_added, self.grants_revoked
        )?;
        if self.pruned {
            write!(f, " pruned roles {} permissions {}", self.roles_deleted, self.permissions_deleted)?;
        }
        Ok(())
    }
}
