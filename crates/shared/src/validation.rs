use crate::constants::*;

pub fn validate_message_content(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("Message content is required".into());
    }
    if content.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(format!(
            "Message must be at most {} characters",
            MAX_MESSAGE_LENGTH
        ));
    }
    Ok(())
}

/// Returns the trimmed query when it is long enough to send to the server.
pub fn validate_search_query(query: &str) -> Result<&str, String> {
    let trimmed = query.trim();
    if trimmed.chars().count() < MIN_SEARCH_QUERY_LENGTH {
        return Err(format!(
            "Search must be at least {} characters",
            MIN_SEARCH_QUERY_LENGTH
        ));
    }
    if trimmed.chars().count() > MAX_SEARCH_QUERY_LENGTH {
        return Err(format!(
            "Search must be at most {} characters",
            MAX_SEARCH_QUERY_LENGTH
        ));
    }
    Ok(trimmed)
}

pub fn is_temporary_message_id(id: &str) -> bool {
    id.starts_with(TEMP_MESSAGE_ID_PREFIX)
}
