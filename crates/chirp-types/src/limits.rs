//! Input limits shared by the store and the HTTP layer.

use thiserror::Error;

pub const CHEEP_MAX_CHARS: usize = 160;
pub const COMMENT_MAX_CHARS: usize = 160;
pub const PAGE_SIZE: u32 = 32;
pub const TOP_REACTIONS: usize = 3;
pub const USERNAME_MIN: usize = 3;
/// Matches GitHub's login limit so OAuth logins fit unchanged.
pub const USERNAME_MAX: usize = 39;
pub const PASSWORD_MIN: usize = 8;
pub const EMAIL_MAX: usize = 254;
pub const EMOJI_MAX_CHARS: usize = 8;
pub const IMAGE_MAX_BYTES: usize = 5 * 1024 * 1024;

/// First path segments the router owns; an author with one of these names
/// would be unreachable at `/{author}`.
pub const RESERVED_USERNAMES: &[&str] =
    &["auth", "cheeps", "comments", "health", "images", "me", "timeline"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("text must not be empty")]
    EmptyText,
    #[error("text is longer than {max} characters")]
    TextTooLong { max: usize },
    #[error("username must be 3-39 characters of letters, digits, '_' or '-'")]
    InvalidUsername,
    #[error("username '{0}' is reserved")]
    ReservedUsername(String),
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least 8 characters")]
    PasswordTooShort,
    #[error("reaction must be a single emoji")]
    InvalidEmoji,
}

pub fn cheep_text(text: &str) -> Result<String, ValidationError> {
    bounded_text(text, CHEEP_MAX_CHARS)
}

pub fn comment_text(text: &str) -> Result<String, ValidationError> {
    bounded_text(text, COMMENT_MAX_CHARS)
}

fn bounded_text(text: &str, max: usize) -> Result<String, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    if text.chars().count() > max {
        return Err(ValidationError::TextTooLong { max });
    }
    Ok(text.to_string())
}

pub fn username(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    let len = name.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len)
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::InvalidUsername);
    }
    if is_reserved(name) {
        return Err(ValidationError::ReservedUsername(name.to_string()));
    }
    Ok(name.to_string())
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED_USERNAMES.iter().any(|r| r.eq_ignore_ascii_case(name))
}

pub fn email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    if email.len() > EMAIL_MAX || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }
    let (local, domain) = email.split_once('@').ok_or(ValidationError::InvalidEmail)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email.to_string())
}

pub fn password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

pub fn emoji(emoji: &str) -> Result<String, ValidationError> {
    let emoji = emoji.trim();
    if emoji.is_empty()
        || emoji.chars().count() > EMOJI_MAX_CHARS
        || emoji.chars().any(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
    {
        return Err(ValidationError::InvalidEmoji);
    }
    Ok(emoji.to_string())
}

/// A 1-based timeline page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page(u32);

impl Page {
    pub fn new(page: Option<u32>) -> Self {
        Self(page.unwrap_or(1).max(1))
    }

    pub fn number(&self) -> u32 {
        self.0
    }

    pub fn limit(&self) -> u32 {
        PAGE_SIZE
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.0 - 1) * u64::from(PAGE_SIZE)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self(1)
    }
}

/// Number of pages needed for `total` cheeps. An empty timeline still has
/// one (empty) page.
pub fn page_count(total: u64) -> u32 {
    let pages = total.div_ceil(u64::from(PAGE_SIZE)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}
