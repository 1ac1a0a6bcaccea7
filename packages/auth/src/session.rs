//! Observable session state.

use civic_portal_content_models::AdminUser;
use tokio::sync::watch;

/// The current admin session, observable through a watch channel.
///
/// Constructed once and handed to whoever needs it; subscribers see every
/// sign-in and sign-out, starting with the current value.
pub struct Session {
    tx: watch::Sender<Option<AdminUser>>,
}

impl Session {
    /// Creates a signed-out session.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// The currently signed-in admin, if any.
    #[must_use]
    pub fn current(&self) -> Option<AdminUser> {
        self.tx.borrow().clone()
    }

    /// Subscribes to session changes. The receiver immediately holds the
    /// current value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AdminUser>> {
        self.tx.subscribe()
    }

    /// Records a successful sign-in.
    pub fn signed_in(&self, user: AdminUser) {
        let _ = self.tx.send(Some(user));
        log::debug!("session: signed in");
    }

    /// Records a sign-out.
    pub fn signed_out(&self) {
        let _ = self.tx.send(None);
        log::debug!("session: signed out");
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use civic_portal_content_models::AdminRole;

    fn admin() -> AdminUser {
        AdminUser {
            id: "u1".to_string(),
            email: "admin@civicportal.org".to_string(),
            username: "admin".to_string(),
            role: AdminRole::SuperAdmin,
            last_login: NaiveDate::from_ymd_opt(2025, 6, 15)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn subscribers_observe_sign_in_and_out() {
        let session = Session::new();
        let mut rx = session.subscribe();
        assert!(rx.borrow().is_none());

        session.signed_in(admin());
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow().as_ref().map(|u| u.email.clone()),
            Some("admin@civicportal.org".to_string())
        );

        session.signed_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(session.current().is_none());
    }
}
