#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Admin authentication: provider contract, role derivation, and the
//! observable session.
//!
//! The identity provider itself is an external collaborator; this crate
//! defines the [`AuthProvider`] trait plus [`MemoryAuth`], a seeded
//! in-process implementation for tests and keyless deployments. Roles are
//! derived client-side from a static email allow-list and domain suffix —
//! they are not server-enforced claims.
//!
//! Session state is an explicitly constructed [`Session`] object passed to
//! whoever needs it; observers subscribe through a watch channel instead
//! of reading an ambient singleton.

mod memory;
mod session;

pub use memory::MemoryAuth;
pub use session::Session;

use async_trait::async_trait;
use civic_portal_content_models::{AdminRole, AdminUser};

/// Email domain whose accounts get admin-console access.
pub const ADMIN_DOMAIN: &str = "civicportal.org";

/// Accounts granted the elevated role.
pub const SUPER_ADMIN_EMAILS: &[&str] = &["admin@civicportal.org", "superadmin@civicportal.org"];

/// Stable identifier for why an auth operation failed, mapped to the
/// fixed user-facing strings shown by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    /// No account exists for the email.
    UserNotFound,
    /// Credentials did not match.
    WrongPassword,
    /// The email is not syntactically valid.
    InvalidEmail,
    /// The account exists but is disabled.
    UserDisabled,
    /// The provider throttled the caller.
    TooManyRequests,
    /// Sign-up attempted with an email that already has an account.
    EmailInUse,
    /// Sign-up password below the provider minimum.
    WeakPassword,
    /// The account authenticated but is not an admin.
    AccessDenied,
    /// Sign-up attempted with an email outside the allow-list.
    NotAuthorized,
    /// Anything else.
    Other,
}

impl AuthErrorCode {
    /// The fixed user-facing message for this failure.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::UserNotFound => "No admin account found with this email.",
            Self::WrongPassword => "Invalid password.",
            Self::InvalidEmail => "Invalid email format.",
            Self::UserDisabled => "This admin account has been disabled.",
            Self::TooManyRequests => "Too many failed attempts. Please try again later.",
            Self::EmailInUse => "An account with this email already exists.",
            Self::WeakPassword => "Password should be at least 6 characters.",
            Self::AccessDenied => "Access denied. Admin privileges required.",
            Self::NotAuthorized => "Email domain not authorized for admin access.",
            Self::Other => "Login failed. Please try again.",
        }
    }
}

/// An auth operation failure carrying its [`AuthErrorCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{}", .code.user_message())]
pub struct AuthError {
    /// Why the operation failed.
    pub code: AuthErrorCode,
}

impl AuthError {
    /// Wraps a code.
    #[must_use]
    pub const fn new(code: AuthErrorCode) -> Self {
        Self { code }
    }
}

impl From<AuthErrorCode> for AuthError {
    fn from(code: AuthErrorCode) -> Self {
        Self::new(code)
    }
}

/// Contract with the external identity provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Authenticates an admin account.
    ///
    /// Implementations must refuse accounts outside the admin allow-list
    /// with [`AuthErrorCode::AccessDenied`], signing them out again if the
    /// provider had already established a session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] with the mapped provider code on failure.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AdminUser, AuthError>;

    /// Ends the provider session, if any.
    async fn sign_out(&self);

    /// Creates a new admin account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the email is outside the allow-list, the
    /// account exists, or the password is rejected.
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AdminUser, AuthError>;
}

/// Whether an email is allowed into the admin console: allow-listed
/// outright, or carrying the admin domain suffix.
#[must_use]
pub fn is_admin_email(email: &str) -> bool {
    let email = email.to_lowercase();
    SUPER_ADMIN_EMAILS.contains(&email.as_str())
        || email.ends_with(&format!("@{ADMIN_DOMAIN}"))
}

/// Derives the admin role for an email.
///
/// Allow-listed accounts are super admins; everything else that
/// authenticated is a regular admin.
#[must_use]
pub fn derive_role(email: &str) -> AdminRole {
    let email = email.to_lowercase();
    if SUPER_ADMIN_EMAILS.contains(&email.as_str()) {
        AdminRole::SuperAdmin
    } else {
        AdminRole::Admin
    }
}

/// Display name for an account without one: the email local part, falling
/// back to a generic label.
#[must_use]
pub fn username_from_email(email: &str) -> String {
    email
        .split('@')
        .next()
        .filter(|part| !part.is_empty())
        .unwrap_or("Admin")
        .to_string()
}
