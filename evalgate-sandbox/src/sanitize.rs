//! Rendering of untrusted program output for inline display
//!
//! Program output ends up inside a chat message, in a code block. It must not be
//! able to ping people, close the code block it is shown in, or flood the
//! channel. Anything that does not fit is uploaded to the paste store instead.

use crate::limits::OutputLimits;
use crate::paste::PasteFallback;
use crate::types::RenderedOutput;
use regex::Regex;
use std::sync::LazyLock;

/// Shown instead of output that tries to break out of its code block
pub const ESCAPE_WARNING: &str = "You've tried to escape the code block; will not output result";

/// Shown when the program printed nothing
pub const NO_OUTPUT: &str = "[no output]";

const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Longest first so `<!@` is not seen as `<` followed by something else
const MENTION_TRIGGERS: [&str; 2] = ["<!@", "<@"];

/// Three or more backticks, right-to-left overrides or zero-width spaces in a row
static ESCAPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("[`\u{202E}\u{200B}]{3,}").expect("escape pattern is a valid regex")
});

/// Why the inline view was cut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    TooLongAndTooManyLines,
    TooManyLines,
    TooLong,
}

impl Truncation {
    pub fn notice(self) -> &'static str {
        match self {
            Truncation::TooLongAndTooManyLines => {
                "... (truncated - output too long, and contains too many lines)"
            }
            Truncation::TooManyLines => "... (truncated - output contains too many lines)",
            Truncation::TooLong => "... (output capped - output too long)",
        }
    }
}

/// Result of the synchronous part of rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedOutput {
    pub display_text: String,
    /// Input with trailing newlines removed, before any other change
    pub original: String,
    pub truncation: Option<Truncation>,
    pub escape_attempt: bool,
}

impl SanitizedOutput {
    /// Whether the original text should be sent to the paste store
    pub fn needs_upload(&self) -> bool {
        self.escape_attempt || self.truncation.is_some()
    }
}

/// Neutralize, number and cut `text` according to `limits`
pub fn sanitize(text: &str, limits: &OutputLimits) -> SanitizedOutput {
    let original = text.trim_end_matches('\n').to_string();
    let output = neutralize_mentions(&original);

    if ESCAPE_PATTERN.is_match(&output) {
        return SanitizedOutput {
            display_text: ESCAPE_WARNING.to_string(),
            original,
            truncation: None,
            escape_attempt: true,
        };
    }

    let line_breaks = output.matches('\n').count();
    let mut display = if line_breaks > 0 {
        number_lines(&output, limits.max_inline_lines)
    } else {
        output
    };

    let too_many_lines = line_breaks > limits.max_lines;
    let too_long = display.chars().count() >= limits.max_chars;
    let truncation = match (too_many_lines, too_long) {
        (true, true) => Some(Truncation::TooLongAndTooManyLines),
        (true, false) => Some(Truncation::TooManyLines),
        (false, true) => Some(Truncation::TooLong),
        (false, false) => None,
    };

    if too_long {
        if let Some((cut, _)) = display.char_indices().nth(limits.max_chars) {
            display.truncate(cut);
        }
    }
    if let Some(truncation) = truncation {
        display.push('\n');
        display.push_str(truncation.notice());
    }
    if display.is_empty() {
        display = NO_OUTPUT.to_string();
    }

    SanitizedOutput {
        display_text: display,
        original,
        truncation,
        escape_attempt: false,
    }
}

/// Insert a zero-width space after every mention trigger that lacks one
fn neutralize_mentions(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match MENTION_TRIGGERS.iter().find(|trigger| tail.starts_with(**trigger)) {
            Some(trigger) => {
                out.push_str(trigger);
                rest = &tail[trigger.len()..];
                if !rest.starts_with(ZERO_WIDTH_SPACE) {
                    out.push(ZERO_WIDTH_SPACE);
                }
            }
            None => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn number_lines(text: &str, keep: usize) -> String {
    text.split('\n')
        .take(keep)
        .enumerate()
        .map(|(i, line)| format!("{:03} | {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders output, consulting the paste store for anything that did not fit
#[derive(Clone)]
pub struct OutputSanitizer {
    limits: OutputLimits,
    paste: PasteFallback,
}

impl OutputSanitizer {
    pub fn new(limits: OutputLimits, paste: PasteFallback) -> Self {
        Self { limits, paste }
    }

    pub fn limits(&self) -> &OutputLimits {
        &self.limits
    }

    pub async fn render(&self, text: &str) -> RenderedOutput {
        let sanitized = sanitize(text, &self.limits);

        if sanitized.escape_attempt {
            tracing::warn!(
                output_len = sanitized.original.len(),
                "Code block escape attempt in program output"
            );
        }

        let paste_link = if sanitized.needs_upload() {
            self.paste.persist(&sanitized.original).await
        } else {
            None
        };

        RenderedOutput {
            display_text: sanitized.display_text,
            paste_link,
            truncated: sanitized.truncation.is_some(),
            escape_attempt: sanitized.escape_attempt,
        }
    }
}
