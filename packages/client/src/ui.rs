//! UI utilities for the client.

use std::io::Write;

/// Redisplay the prompt after printing an asynchronous line
pub fn redisplay_prompt(prompt: &str) {
    print!("{}", prompt);
    std::io::stdout().flush().ok();
}

/// Build the input prompt for the current room, if any
pub fn prompt_for(name: &str, room: Option<&str>) -> String {
    match room {
        Some(room) => format!("{}@{}> ", name, room),
        None => format!("{}> ", name),
    }
}
