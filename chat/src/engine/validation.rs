/// Maximum chat message length (bytes).
pub const MAX_MESSAGE_LENGTH: usize = 255;

/// Maximum channel name length.
pub const MAX_CHANNEL_NAME_LENGTH: usize = 50;

/// Validate a channel name. Must be 1-50 chars with no control characters.
/// Spaces are allowed — built-in zone channels carry display names like
/// "General - Crossroads".
pub fn validate_channel_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Channel name cannot be empty".into());
    }
    if name.len() > MAX_CHANNEL_NAME_LENGTH {
        return Err(format!(
            "Channel name too long (max {} characters)",
            MAX_CHANNEL_NAME_LENGTH
        ));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err("Channel name cannot contain control characters".into());
    }
    Ok(())
}

/// Validate chat message content. Must be non-empty and under the length limit.
pub fn validate_message(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("Message cannot be empty".into());
    }
    if content.len() > MAX_MESSAGE_LENGTH {
        return Err(format!(
            "Message too long (max {} characters)",
            MAX_MESSAGE_LENGTH
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_channel_names() {
        assert!(validate_channel_name("world").is_ok());
        assert!(validate_channel_name("General - Crossroads").is_ok());
        assert!(validate_channel_name("raid-1").is_ok());
    }

    #[test]
    fn test_invalid_channel_names() {
        assert!(validate_channel_name("").is_err());
        assert!(validate_channel_name("   ").is_err());
        assert!(validate_channel_name("bad\nname").is_err());
        assert!(validate_channel_name(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_message_validation() {
        assert!(validate_message("hello").is_ok());
        assert!(validate_message("").is_err());
        assert!(validate_message("   ").is_err());
        assert!(validate_message(&"a".repeat(256)).is_err());
    }
}
