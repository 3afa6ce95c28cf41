//! Helpers for keeping user data out of logs and prompts.
//!
//! Span fields only ever carry a file's base name, never its directory, and
//! API keys are masked before they reach any formatter.

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};

/// Returns only the final component of an uploaded filename.
///
/// Browsers and CLIs may hand us full paths; spans get the base name only.
pub fn redact_filename(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Masks an API key, keeping a short prefix so keys can be told apart.
///
/// - `sk-abcdef123456` → `sk-****`
/// - keys of 8 chars or fewer → `****`
pub fn mask_secret(secret: &SecretString) -> String {
    let exposed = secret.expose_secret();
    if exposed.chars().count() <= 8 {
        return "****".to_string();
    }
    let prefix: String = exposed.chars().take(3).collect();
    format!("{}****", prefix)
}

/// Escapes chat-template control sequences in user text before it is
/// embedded in a prompt.
pub fn sanitize_for_prompt(text: &str) -> String {
    text.replace("<|", "< |")
        .replace("|>", "| >")
        .replace("[INST]", "[ INST ]")
        .replace("[/INST]", "[ / INST ]")
        .replace("<<SYS>>", "< < SYS > >")
        .replace("<</SYS>>", "< < / SYS > >")
}
