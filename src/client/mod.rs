//! Headless client: the view-models behind the request UI.
//!
//! These types hold no rendering concerns — a shell (web, TUI, tests)
//! composes them. They all speak to the store through the
//! [`RequestStore`](crate::store::RequestStore) trait, so the same code runs
//! against the in-memory store in tests and the remote HTTP store in a
//! deployed client. Session state is an explicit context object built once
//! after authentication, never ambient globals.

use crate::models::User;

pub mod feed;
pub mod form;
pub mod list;
pub mod shell;

/// Immutable per-session context. Constructed after the identity provider
/// resolves the user's roles; lives until session end.
#[derive(Debug, Clone)]
pub struct Session {
    user: User,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn is_reviewer(&self) -> bool {
        self.user.is_reviewer()
    }
}
