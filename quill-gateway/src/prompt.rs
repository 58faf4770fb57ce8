//! Prompt builder: expands a user topic into the system/user message pair
//! sent to chat-style backends.

use quill_core::OutputMode;

const HTML_SYSTEM_PROMPT: &str =
    "You are a senior editorial writer. You produce publish-ready HTML articles and never wrap your output in Markdown code fences.";

const PLAIN_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// System instruction plus the (possibly template-expanded) user prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub system: String,
    pub user: String,
}

/// Build the message pair for a topic.
///
/// Html mode expands the topic into a fixed article template; PlainText
/// mode passes the topic through unchanged under a generic assistant
/// persona. Empty-topic rejection is the caller's responsibility.
pub fn build_prompt(topic: &str, mode: OutputMode) -> BuiltPrompt {
    match mode {
        OutputMode::Html => BuiltPrompt {
            system: HTML_SYSTEM_PROMPT.to_string(),
            user: article_template(topic),
        },
        OutputMode::PlainText => BuiltPrompt {
            system: PLAIN_SYSTEM_PROMPT.to_string(),
            user: topic.to_string(),
        },
    }
}

fn article_template(topic: &str) -> String {
    format!(
        "Write a complete article about: {topic}

Structure requirements:
- Begin with a title wrapped in an <h1> tag.
- Follow with an opening section that frames the topic.
- Continue with an analysis section of 3 to 4 paragraphs.
- End with a closing section.

Formatting requirements:
- Wrap every body paragraph in a <p> tag.
- You may emphasize key phrases with <strong>.
- Output raw HTML only. Never wrap the answer in Markdown code fences such as ```html."
    )
}
