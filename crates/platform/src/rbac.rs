//! Role and permission checks.
//!
//! The literal `any` acts as a wildcard on both sides: a requirement of
//! `any` admits every caller, and a role holding the `any` permission
//! grants every permission.

use hivebase_core::{HivebaseError, HivebaseResult};

pub const WILDCARD: &str = "any";

/// Does the caller hold at least one of the required roles?
pub fn has_role(caller_roles: &[String], required: &[&str]) -> bool {
    if required.iter().any(|r| *r == WILDCARD) {
        return true;
    }
    required.iter().any(|r| caller_roles.iter().any(|have| have == r))
}

/// Does any of the caller's permission sets grant one of the required
/// permissions? Each entry in `caller_permissions` is one role's
/// permission list.
pub fn has_permission(caller_permissions: &[Vec<String>], required: &[&str]) -> bool {
    if required.iter().any(|p| *p == WILDCARD) {
        return true;
    }
    caller_permissions.iter().any(|perms| {
        perms.iter().any(|have| have == WILDCARD)
            || required.iter().any(|p| perms.iter().any(|have| have == p))
    })
}

/// Guard used at request boundaries: error instead of bool.
pub fn require_role(caller_roles: &[String], required: &[&str]) -> HivebaseResult<()> {
    if has_role(caller_roles, required) {
        Ok(())
    } else {
        Err(HivebaseError::Forbidden("Role Required".to_string()))
    }
}

pub fn require_permission(
    caller_permissions: &[Vec<String>],
    required: &[&str],
) -> HivebaseResult<()> {
    if has_permission(caller_permissions, required) {
        Ok(())
    } else {
        Err(HivebaseError::Forbidden("Permission Denied".to_string()))
    }
}
