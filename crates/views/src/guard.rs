//! Session checks performed before a page mounts.

use logitrack_core::error::CoreError;
use logitrack_core::roles::{Role, User};
use logitrack_core::session::SessionStore;

/// The logged-in user, or `Unauthorized`.
pub fn require_session(session: &SessionStore) -> Result<User, CoreError> {
    session
        .current_user()
        .ok_or_else(|| CoreError::Unauthorized("no active session".into()))
}

/// The logged-in admin, or `Unauthorized`/`Forbidden`.
pub fn require_admin(session: &SessionStore) -> Result<User, CoreError> {
    let user = require_session(session)?;
    if !user.is_admin() {
        return Err(CoreError::Forbidden(format!(
            "role '{}' cannot access the admin dashboard",
            user.role
        )));
    }
    Ok(user)
}

/// Which landing view a user gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardKind {
    /// Waiting queue with carrier/route assignment.
    Admin,
    /// The user's own orders.
    User,
}

impl DashboardKind {
    pub fn for_user(user: &User) -> Self {
        match user.role {
            Role::Admin => DashboardKind::Admin,
            Role::User => DashboardKind::User,
        }
    }
}
