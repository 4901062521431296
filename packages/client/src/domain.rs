//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use relaychat_shared::protocol::LIST_ROOMS_SENTINEL;

use crate::error::ClientError;

/// One line typed by the user, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// `/quit`: leave the room and exit
    Quit,
    /// `/leave`: leave the current room
    Leave,
    /// `/rooms`: query the room list
    Rooms,
    /// `/join <room>`: switch to another room
    Join(String),
    /// Plain text to send to the room
    Say(String),
    /// Blank input
    Empty,
    /// A slash command that is not recognised
    Unknown(String),
}

/// Interpret a line of user input.
pub fn parse_input(input: &str) -> InputCommand {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return InputCommand::Empty;
    }
    if !trimmed.starts_with('/') {
        return InputCommand::Say(trimmed.to_string());
    }

    let (command, argument) = match trimmed.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (trimmed, ""),
    };

    match command.to_ascii_lowercase().as_str() {
        "/quit" => InputCommand::Quit,
        "/leave" => InputCommand::Leave,
        "/rooms" => InputCommand::Rooms,
        "/join" if !argument.is_empty() => InputCommand::Join(argument.to_string()),
        _ => InputCommand::Unknown(trimmed.to_string()),
    }
}

/// Check that a room or display name can be sent as one handshake line.
///
/// # Arguments
///
/// * `value` - The room or display name
/// * `what` - What the value is, for the error message
///
/// # Returns
///
/// The trimmed value, or [`ClientError::InvalidInput`]
pub fn validate_handshake_token(value: &str, what: &str) -> Result<String, ClientError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidInput(format!("{} must not be empty", what)));
    }
    if trimmed.contains(['\n', '\r']) {
        return Err(ClientError::InvalidInput(format!(
            "{} must be a single line",
            what
        )));
    }
    if trimmed == LIST_ROOMS_SENTINEL {
        return Err(ClientError::InvalidInput(format!(
            "{} '{}' is reserved",
            what, trimmed
        )));
    }
    Ok(trimmed.to_string())
}
