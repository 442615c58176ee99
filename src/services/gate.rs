//! Admin access decision.
//!
//! A request walks `Loading -> Unauthenticated` when there is no live session,
//! `Loading -> Unauthorized` when the signed-in email is not the configured
//! admin, and `Loading -> Verifying -> Authorized` otherwise. `Verifying` is
//! the forced refresh: the session is looked up again and its expiry extended,
//! so a session revoked between the two steps falls back to `Unauthenticated`.

use crate::models::User;
use crate::services::auth;
use crate::Database;
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Loading,
    Verifying,
    Unauthenticated,
    Unauthorized,
    Authorized,
}

impl GateState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GateState::Loading | GateState::Verifying)
    }
}

#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub state: GateState,
    pub user: Option<User>,
}

impl GateOutcome {
    fn unauthenticated() -> Self {
        Self {
            state: GateState::Unauthenticated,
            user: None,
        }
    }
}

/// Trimmed, case-insensitive comparison. No configured admin means nobody is.
pub fn is_admin_email(admin_email: Option<&str>, email: &str) -> bool {
    match admin_email.map(auth::normalize_email) {
        Some(admin) if !admin.is_empty() => admin == auth::normalize_email(email),
        _ => false,
    }
}

pub struct Gate<'a> {
    db: &'a Database,
    admin_email: Option<&'a str>,
    session_lifetime_days: i64,
}

impl<'a> Gate<'a> {
    pub fn new(db: &'a Database, admin_email: Option<&'a str>, session_lifetime_days: i64) -> Self {
        Self {
            db,
            admin_email,
            session_lifetime_days,
        }
    }

    pub fn check(&self, session_token: Option<&str>) -> Result<GateOutcome> {
        let mut state = GateState::Loading;

        let Some(token) = session_token.filter(|t| !t.is_empty()) else {
            tracing::debug!("gate: {:?} -> Unauthenticated (no session)", state);
            return Ok(GateOutcome::unauthenticated());
        };
        let Some(user) = auth::validate_session(self.db, token)? else {
            tracing::debug!("gate: {:?} -> Unauthenticated (expired)", state);
            return Ok(GateOutcome::unauthenticated());
        };

        if !is_admin_email(self.admin_email, &user.email) {
            tracing::warn!("Admin access denied for {}", user.email);
            return Ok(GateOutcome {
                state: GateState::Unauthorized,
                user: Some(user),
            });
        }

        state = GateState::Verifying;
        match auth::refresh_session(self.db, token, self.session_lifetime_days)? {
            Some(user) => Ok(GateOutcome {
                state: GateState::Authorized,
                user: Some(user),
            }),
            None => {
                tracing::debug!("gate: {:?} -> Unauthenticated", state);
                Ok(GateOutcome::unauthenticated())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_email_comparison() {
        assert!(is_admin_email(Some("Owner@Example.com"), " owner@example.com "));
        assert!(!is_admin_email(Some("owner@example.com"), "someone@example.com"));
        assert!(!is_admin_email(None, "owner@example.com"));
        assert!(!is_admin_email(Some("  "), ""));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!GateState::Loading.is_terminal());
        assert!(!GateState::Verifying.is_terminal());
        assert!(GateState::Authorized.is_terminal());
        assert!(GateState::Unauthorized.is_terminal());
        assert!(GateState::Unauthenticated.is_terminal());
    }
}
