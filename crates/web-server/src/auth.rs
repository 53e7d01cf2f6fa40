//! The two access tiers.
//!
//! Handlers opt in by taking [`ReadAccess`] or [`AdminAccess`] as their first
//! argument. Both are extractors over the request headers only, so a denied
//! request is rejected before its body is even read.

use crate::AppState;
use crate::error::AppError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use configuration::AuthSettings;
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

pub const READ_PASSWORD_HEADER: &str = "x-global-password";
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    Read,
    Admin,
}

impl AccessTier {
    pub fn header(self) -> &'static str {
        match self {
            AccessTier::Read => READ_PASSWORD_HEADER,
            AccessTier::Admin => ADMIN_PASSWORD_HEADER,
        }
    }
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessTier::Read => f.write_str("read"),
            AccessTier::Admin => f.write_str("admin"),
        }
    }
}

/// Holds the shared secret of each tier.
#[derive(Clone)]
pub struct AccessGate {
    read_password: String,
    admin_password: String,
}

impl AccessGate {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            read_password: settings.read_password.clone(),
            admin_password: settings.admin_password.clone(),
        }
    }

    /// True if `candidate` is exactly the secret of `tier`.
    pub fn verify(&self, tier: AccessTier, candidate: &str) -> bool {
        let expected = match tier {
            AccessTier::Read => &self.read_password,
            AccessTier::Admin => &self.admin_password,
        };
        constant_time_compare(candidate, expected)
    }

    /// Checks the tier's header; missing or non-UTF-8 values are denials.
    /// The admin credential also satisfies the read tier.
    pub fn authorize(&self, tier: AccessTier, headers: &HeaderMap) -> Result<(), AppError> {
        let presents = |tier: AccessTier| {
            headers
                .get(tier.header())
                .and_then(|value| value.to_str().ok())
                .is_some_and(|candidate| self.verify(tier, candidate))
        };
        let granted = match tier {
            AccessTier::Read => presents(AccessTier::Read) || presents(AccessTier::Admin),
            AccessTier::Admin => presents(AccessTier::Admin),
        };
        if granted {
            Ok(())
        } else {
            warn!(tier = %tier, "Access denied.");
            Err(AppError::Unauthorized(tier))
        }
    }
}

// Secrets must never reach the logs.
impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate").finish_non_exhaustive()
    }
}

/// Compares two strings in time independent of where they differ.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let max_len = a.len().max(b.len());
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);
    (lengths_equal & contents_equal).into()
}

/// Proof that the request carries the read credential.
#[derive(Debug, Clone, Copy)]
pub struct ReadAccess;

/// Proof that the request carries the admin credential.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ReadAccess {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state.gate.authorize(AccessTier::Read, &parts.headers)?;
        Ok(ReadAccess)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAccess {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state.gate.authorize(AccessTier::Admin, &parts.headers)?;
        Ok(AdminAccess)
    }
}
