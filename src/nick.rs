//! Nick validation
//!
//! A nick is the player's identity in the arena and the key attacks are
//! aimed at, so it must be a single word:
//! - 1-32 characters
//! - Starts with a letter
//! - Letters, digits and the IRC specials ``_-[]\^{}|` ``

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Longest accepted nick
pub const MAX_NICK_LEN: usize = 32;

/// Validation errors for nicks
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NickError {
    #[error("nick must be 1-32 characters")]
    Length,

    #[error("nick must start with a letter and contain only letters, digits and _-[]\\^{{}}|`")]
    InvalidFormat,
}

static NICK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_\-\[\]\\^{}|`]*$").unwrap());

/// Validate a nick. Case is preserved: `Alice` and `alice` are different
/// players.
pub fn validate_nick(nick: &str) -> Result<&str, NickError> {
    if nick.is_empty() || nick.chars().count() > MAX_NICK_LEN {
        return Err(NickError::Length);
    }
    if !NICK_REGEX.is_match(nick) {
        return Err(NickError::InvalidFormat);
    }
    Ok(nick)
}
