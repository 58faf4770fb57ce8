//! Response normalizer: converts raw model output into the markup
//! contract the request asked for.

use std::sync::LazyLock;

use regex::Regex;

use quill_core::OutputMode;

/// Fence openers (optionally language-tagged) and bare closers.
static FENCE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_-]*").expect("fence regex must compile"));

/// Anything that looks like an HTML start tag.
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z][^>]*>").expect("html tag regex must compile"));

/// Class on the container synthesized around untagged prose.
const WRAPPER_CLASS: &str = "generated-article";

/// Clean raw model output for the requested output mode.
///
/// Html mode strips Markdown fences, synthesizes paragraph markup when the
/// backend returned untagged prose, and flattens the result to a single
/// line. PlainText mode only strips fences and keeps newlines verbatim.
///
/// Idempotent in Html mode: cleaning already-cleaned output returns it
/// unchanged.
pub fn clean(raw: &str, mode: OutputMode) -> String {
    let defenced = FENCE_MARKER.replace_all(raw, "");
    let stripped = defenced.trim();

    match mode {
        OutputMode::PlainText => stripped.to_string(),
        OutputMode::Html => {
            if stripped.is_empty() {
                return String::new();
            }
            let body = if HTML_TAG.is_match(stripped) {
                // Already markup; keep the backend's structure.
                stripped.to_string()
            } else {
                synthesize_html(stripped)
            };
            // The consumer expects inline-safe single-line HTML.
            body.replace(['\n', '\r'], "")
        }
    }
}

/// Wrap untagged prose: blank-line separated paragraphs become `<p>`
/// blocks, single newlines inside a paragraph become `<br/>`.
fn synthesize_html(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let paragraphs: String = text
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| format!("<p>{}</p>", paragraph.replace('\n', "<br/>")))
        .collect();

    format!("<div class=\"{WRAPPER_CLASS}\">{paragraphs}</div>")
}
