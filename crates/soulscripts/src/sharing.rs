//! Sharing helpers.
//!
//! Collaborator email validation, public link construction, and the
//! online check that guards every sharing change.

use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::network::NetworkStatus;

/// Path segment public view links live under.
pub const SHARED_PATH: &str = "shared";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|e| panic!("email regex: {e}"))
    })
}

/// Whether `email` looks like a deliverable address.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Validate a collaborator email and return its stored (lowercased) form.
///
/// # Errors
///
/// Returns [`Error::InvalidEmail`] if the trimmed input is empty or malformed.
pub fn normalize_email(email: &str) -> Result<String> {
    let trimmed = email.trim();
    if is_valid_email(trimmed) {
        Ok(trimmed.to_lowercase())
    } else {
        Err(Error::invalid_email(email))
    }
}

/// Build the public view link for a share token.
#[must_use]
pub fn share_link(base_url: &str, token: Uuid) -> String {
    format!("{}/{SHARED_PATH}/{token}", base_url.trim_end_matches('/'))
}

/// Refuse sharing changes when the network state does not allow them.
///
/// With `require_online` unset the check always passes.
///
/// # Errors
///
/// Returns [`Error::SharingUnavailable`] when offline or working offline.
pub fn ensure_available(status: &NetworkStatus, require_online: bool) -> Result<()> {
    if require_online && !status.sharing_available() {
        return Err(Error::SharingUnavailable);
    }
    Ok(())
}
