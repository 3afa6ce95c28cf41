//! Prompts sent to the transcreation model.
//!
//! The system prompt is fixed; the user message wraps the extracted text,
//! escaped so that document content cannot pose as chat-template markup.

use crate::sanitize::sanitize_for_prompt;

/// System prompt for transcreating document text into spoken-style prose.
pub const TRANSCREATION_SYSTEM_PROMPT: &str = r#"You are a professional transcreator. You adapt written documents into another language so they sound natural when read aloud.

Follow these rules:

1. Convey the meaning and intent of the source, not a word-for-word translation.
2. Simplify long or technical sentences into clear spoken language.
3. Adapt idioms, units and cultural references to the target audience.
4. Drop tables, page numbers, footnote markers and other layout artifacts.
5. Output ONLY the transcreated text, with no commentary, headings or quotes."#;

/// Placeholders: `{language}`, `{text}`.
const USER_TEMPLATE: &str = "Transcreate the following document into {language}.\n\n<document>\n{text}\n</document>";

/// Builds the user message for one transcreation request.
pub fn transcreation_user_prompt(text: &str, target_language: &str) -> String {
    USER_TEMPLATE
        .replace("{language}", target_language.trim())
        .replace("{text}", &sanitize_for_prompt(text))
}
