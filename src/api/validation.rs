use super::{ApiError, PageQuery};
use crate::db::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Resolves `(page, page_size)`, rejecting page 0 and sizes outside
/// `1..=MAX_PAGE_SIZE`.
pub fn validate_pagination(query: &PageQuery) -> Result<(u64, u64), ApiError> {
    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::validation(
            "Invalid page: 0. Pages start at 1",
        ));
    }

    let page_size = validate_page_size(query.page_size.unwrap_or(DEFAULT_PAGE_SIZE))?;
    Ok((page, page_size))
}

pub fn validate_page_size(page_size: u64) -> Result<u64, ApiError> {
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ApiError::validation(format!(
            "Invalid page_size: {page_size}. Must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(page_size)
}

pub fn validate_search_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Search query cannot be empty"));
    }
    Ok(trimmed)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    let valid = trimmed
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
        && !trimmed.contains(char::is_whitespace);

    if !valid {
        return Err(ApiError::validation(format!("Invalid e-mail: {trimmed}")));
    }
    Ok(trimmed)
}

pub fn validate_message_text(text: &str) -> Result<&str, ApiError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Message cannot be empty"));
    }
    if trimmed.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ApiError::validation(format!(
            "Message must be {MAX_MESSAGE_LENGTH} characters or less"
        )));
    }
    Ok(trimmed)
}

/// Parser ids are short slugs used in URLs.
pub fn validate_parser_id(id: &str) -> Result<&str, ApiError> {
    if id.is_empty() || id.len() > 64 {
        return Err(ApiError::validation(
            "Parser id must be between 1 and 64 characters",
        ));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::validation(
            "Parser id can only contain letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(id)
}

pub fn validate_progress_seconds(seconds: f64) -> Result<f64, ApiError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ApiError::validation(
            "Progress must be a non-negative number of seconds",
        ));
    }
    Ok(seconds)
}
