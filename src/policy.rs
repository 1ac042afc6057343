use crate::{
    auth::{AuthUser, Role},
    error::{ApiError, ApiResult},
};

/// Permission
///
/// The access rule a route declares. Evaluated against the identity resolved by the
/// `AuthUser` extractor; the token itself has already been validated at that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Any valid, unrevoked token.
    Authenticated,
    /// Tokens issued to `users` accounts (likes, submissions, "me" routes).
    Member,
    /// Tokens issued to admin accounts.
    Admin,
    /// A token whose embedded id equals this path id. Only the ids are compared.
    SelfOnly(i64),
}

/// authorize
///
/// Returns `Forbidden` when `identity` does not satisfy `permission`.
pub fn authorize(identity: &AuthUser, permission: Permission) -> ApiResult<()> {
    match permission {
        Permission::Authenticated => Ok(()),
        Permission::Member if identity.role == Role::User => Ok(()),
        Permission::Member => Err(ApiError::forbidden("User account required")),
        Permission::Admin if identity.is_admin() => Ok(()),
        Permission::Admin => Err(ApiError::forbidden("Admin access required")),
        Permission::SelfOnly(id) if identity.id == id => Ok(()),
        Permission::SelfOnly(_) => Err(ApiError::forbidden(
            "You can only update your own profile",
        )),
    }
}
