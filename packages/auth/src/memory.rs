//! Seeded in-process auth provider.
//!
//! Backs tests and deployments with no external identity provider. The
//! allow-list rules are the same ones any real provider adapter must
//! apply.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use civic_portal_content_models::AdminUser;

use crate::{AuthError, AuthErrorCode, AuthProvider, derive_role, is_admin_email,
    username_from_email};

struct Account {
    id: String,
    password: String,
    display_name: Option<String>,
    disabled: bool,
}

/// [`AuthProvider`] over an in-memory account table.
///
/// Methods panic only if the interior lock is poisoned.
#[derive(Default)]
pub struct MemoryAuth {
    accounts: RwLock<BTreeMap<String, Account>>,
}

impl MemoryAuth {
    /// Creates a provider with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an account (builder style).
    #[must_use]
    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.accounts
            .write()
            .expect("auth account table lock poisoned")
            .insert(
                email.to_lowercase(),
                Account {
                    id: uuid::Uuid::new_v4().to_string(),
                    password: password.to_string(),
                    display_name: None,
                    disabled: false,
                },
            );
        self
    }

    /// Marks a seeded account as disabled.
    #[must_use]
    pub fn with_disabled(self, email: &str) -> Self {
        if let Some(account) = self
            .accounts
            .write()
            .expect("auth account table lock poisoned")
            .get_mut(&email.to_lowercase())
        {
            account.disabled = true;
        }
        self
    }

    fn admin_user(id: String, email: &str, display_name: Option<&str>) -> AdminUser {
        AdminUser {
            id,
            email: email.to_string(),
            username: display_name
                .map_or_else(|| username_from_email(email), str::to_string),
            role: derive_role(email),
            last_login: chrono::Local::now().naive_local(),
        }
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        if !email.contains('@') {
            return Err(AuthErrorCode::InvalidEmail.into());
        }

        let key = email.to_lowercase();
        let (id, display_name) = {
            let guard = self
                .accounts
                .read()
                .expect("auth account table lock poisoned");
            let account = guard
                .get(&key)
                .ok_or(AuthError::new(AuthErrorCode::UserNotFound))?;
            if account.disabled {
                return Err(AuthErrorCode::UserDisabled.into());
            }
            if account.password != password {
                return Err(AuthErrorCode::WrongPassword.into());
            }
            (account.id.clone(), account.display_name.clone())
        };

        // Authenticated but not an admin: refuse, as if signed out again.
        if !is_admin_email(email) {
            log::warn!("non-admin account attempted console sign-in");
            return Err(AuthErrorCode::AccessDenied.into());
        }

        Ok(Self::admin_user(id, email, display_name.as_deref()))
    }

    async fn sign_out(&self) {}

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AdminUser, AuthError> {
        if !email.contains('@') {
            return Err(AuthErrorCode::InvalidEmail.into());
        }
        if !is_admin_email(email) {
            return Err(AuthErrorCode::NotAuthorized.into());
        }
        if password.len() < 6 {
            return Err(AuthErrorCode::WeakPassword.into());
        }

        let key = email.to_lowercase();
        let mut guard = self
            .accounts
            .write()
            .expect("auth account table lock poisoned");
        if guard.contains_key(&key) {
            return Err(AuthErrorCode::EmailInUse.into());
        }

        let id = uuid::Uuid::new_v4().to_string();
        let trimmed = display_name.map(str::trim).filter(|name| !name.is_empty());
        guard.insert(
            key,
            Account {
                id: id.clone(),
                password: password.to_string(),
                display_name: trimmed.map(str::to_string),
                disabled: false,
            },
        );

        Ok(Self::admin_user(id, email, trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_portal_content_models::AdminRole;

    #[tokio::test]
    async fn sign_in_happy_path_derives_role_and_username() {
        let auth = MemoryAuth::new().with_account("editor@civicportal.org", "hunter22");
        let user = auth.sign_in("editor@civicportal.org", "hunter22").await.unwrap();
        assert_eq!(user.role, AdminRole::Admin);
        assert_eq!(user.username, "editor");
    }

    #[tokio::test]
    async fn sign_in_failures_map_to_codes() {
        let auth = MemoryAuth::new()
            .with_account("editor@civicportal.org", "hunter22")
            .with_account("stale@civicportal.org", "hunter22")
            .with_disabled("stale@civicportal.org");

        let err = auth.sign_in("ghost@civicportal.org", "x").await.unwrap_err();
        assert_eq!(err.code, AuthErrorCode::UserNotFound);

        let err = auth
            .sign_in("editor@civicportal.org", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.code, AuthErrorCode::WrongPassword);

        let err = auth
            .sign_in("stale@civicportal.org", "hunter22")
            .await
            .unwrap_err();
        assert_eq!(err.code, AuthErrorCode::UserDisabled);

        let err = auth.sign_in("not-an-email", "x").await.unwrap_err();
        assert_eq!(err.code, AuthErrorCode::InvalidEmail);
    }

    #[tokio::test]
    async fn authenticated_non_admin_is_refused() {
        let auth = MemoryAuth::new().with_account("user@example.com", "hunter22");
        let err = auth.sign_in("user@example.com", "hunter22").await.unwrap_err();
        assert_eq!(err.code, AuthErrorCode::AccessDenied);
    }

    #[tokio::test]
    async fn create_user_enforces_allow_list_and_password_rules() {
        let auth = MemoryAuth::new().with_account("editor@civicportal.org", "hunter22");

        let err = auth
            .create_user("someone@example.com", "hunter22", None)
            .await
            .unwrap_err();
        assert_eq!(err.code, AuthErrorCode::NotAuthorized);

        let err = auth
            .create_user("new@civicportal.org", "short", None)
            .await
            .unwrap_err();
        assert_eq!(err.code, AuthErrorCode::WeakPassword);

        let err = auth
            .create_user("editor@civicportal.org", "hunter22", None)
            .await
            .unwrap_err();
        assert_eq!(err.code, AuthErrorCode::EmailInUse);

        let user = auth
            .create_user("new@civicportal.org", "hunter22", Some("  New Editor  "))
            .await
            .unwrap();
        assert_eq!(user.username, "New Editor");
        assert_eq!(user.role, AdminRole::Admin);

        // And the created account can sign in.
        assert!(auth.sign_in("new@civicportal.org", "hunter22").await.is_ok());
    }
}
