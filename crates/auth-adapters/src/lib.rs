//! pinpoint/crates/auth-adapters/src/lib.rs
//!
//! Session-holding implementation of the `AuthGateway` port. The core only
//! reads the current identity; sign-in and sign-out are driven from the
//! outside (the identity-provider handoff is not part of the core).

use std::sync::RwLock;

use tracing::info;

use domains::{AuthGateway, AuthUser};

#[derive(Default)]
pub struct SessionAuthGateway {
    session: RwLock<Option<AuthUser>>,
}

impl SessionAuthGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user: AuthUser) -> Self {
        Self { session: RwLock::new(Some(user)) }
    }

    pub fn sign_in(&self, user: AuthUser) {
        info!(uid = %user.uid, "user signed in");
        *self.session.write().expect("session lock poisoned") = Some(user);
    }

    pub fn sign_out(&self) {
        info!("user signed out");
        *self.session.write().expect("session lock poisoned") = None;
    }
}

impl AuthGateway for SessionAuthGateway {
    fn current_user(&self) -> Option<AuthUser> {
        self.session.read().expect("session lock poisoned").clone()
    }
}
