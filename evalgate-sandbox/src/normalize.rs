//! Extraction of a single code string from free-form chat text
//!
//! Users paste code wrapped in triple-backtick blocks (with or without a language
//! tag), in single or double backtick inline spans, split over several blocks,
//! or not wrapped at all. The rules below are tried in order and the first one
//! that produces code wins; the result is then dedented.

use crate::error::{GatewayError, GatewayResult};
use crate::types::{CodeKind, NormalizedCode};

const BACKTICKS: &str = "```";

/// A delimited span found in the text
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fence<'a> {
    /// Number of backticks on each side (1..=3)
    delimiter: usize,
    language: Option<&'a str>,
    body: &'a str,
}

impl Fence<'_> {
    fn is_block(&self) -> bool {
        self.delimiter == 3
    }
}

type Rule = fn(&str, &[Fence<'_>]) -> Option<(String, CodeKind)>;

/// Extraction rules, first match wins
const RULES: &[(&str, Rule)] = &[
    ("multiple blocks", multi_block),
    ("single fence", single_fence),
    ("unformatted", unformatted),
];

/// Extract the code to evaluate from raw submission text
pub fn normalize(raw: &str) -> GatewayResult<NormalizedCode> {
    let fences = scan_fences(raw);

    let (code, kind) = RULES
        .iter()
        .find_map(|&(name, rule)| {
            rule(raw, &fences).map(|found| {
                tracing::trace!(rule = name, "Extraction rule matched");
                found
            })
        })
        .ok_or(GatewayError::InputRejected)?;

    let code = dedent(&code);
    if code.trim().is_empty() {
        return Err(GatewayError::InputRejected);
    }

    tracing::debug!(kind = %kind, code_len = code.len(), "Normalized submission");
    Ok(NormalizedCode { code, kind })
}

fn multi_block(_raw: &str, fences: &[Fence<'_>]) -> Option<(String, CodeKind)> {
    let blocks: Vec<&str> = fences
        .iter()
        .filter(|fence| fence.is_block())
        .map(|fence| fence.body)
        .collect();
    if blocks.len() < 2 {
        return None;
    }
    let kind = CodeKind::MultiBlock {
        blocks: blocks.len(),
    };
    Some((blocks.join("\n"), kind))
}

/// One genuine block wins over any inline spans; otherwise the first span is used
fn single_fence(_raw: &str, fences: &[Fence<'_>]) -> Option<(String, CodeKind)> {
    let fence = fences
        .iter()
        .find(|fence| fence.is_block())
        .or_else(|| fences.first())?;

    let kind = if fence.is_block() {
        CodeKind::SingleBlock {
            language: fence.language.map(str::to_string),
        }
    } else {
        CodeKind::Inline {
            delimiter: fence.delimiter,
        }
    };
    Some((fence.body.to_string(), kind))
}

fn unformatted(raw: &str, _fences: &[Fence<'_>]) -> Option<(String, CodeKind)> {
    let start = leading_blank_lines(raw);
    Some((raw[start..].trim_end().to_string(), CodeKind::Unformatted))
}

/// Find all non-overlapping delimited spans, scanning left to right
fn scan_fences(text: &str) -> Vec<Fence<'_>> {
    let mut fences = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        if let Some((fence, end)) = fence_at(text, pos) {
            fences.push(fence);
            pos = end;
            continue;
        }
        // A backtick run that opens nothing is skipped whole, so none of its
        // backticks can open a span later in the text
        let rest = &text[pos..];
        let run = rest.len() - rest.trim_start_matches('`').len();
        pos += if run > 0 {
            run
        } else {
            rest.chars().next().map_or(1, char::len_utf8)
        };
    }

    fences
}

/// Try to match a span opening at `start`. Wider delimiters are tried first;
/// a delimiter without a matching closer falls back to a narrower one.
fn fence_at(text: &str, start: usize) -> Option<(Fence<'_>, usize)> {
    let rest = &text[start..];

    for width in (1..=BACKTICKS.len()).rev() {
        let delimiter = &BACKTICKS[..width];
        if !rest.starts_with(delimiter) {
            continue;
        }

        let mut cursor = start + width;
        let language = if width == 3 {
            language_tag(&text[cursor..])
        } else {
            None
        };
        if let Some(tag) = language {
            cursor += tag.len() + 1;
        }
        cursor += leading_blank_lines(&text[cursor..]);

        if let Some((body_end, close)) = closing_delimiter(text, cursor, delimiter) {
            // An inline closer right after its opener is the rest of a longer
            // backtick run, not a span
            if width < 3 && close == start + width {
                continue;
            }
            let fence = Fence {
                delimiter: width,
                language,
                body: &text[cursor..body_end],
            };
            return Some((fence, close + width));
        }
    }

    None
}

/// A language tag is a run of ASCII letters directly followed by a newline
fn language_tag(text: &str) -> Option<&str> {
    let len = text
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(text.len());
    if len > 0 && text[len..].starts_with('\n') {
        Some(&text[..len])
    } else {
        None
    }
}

/// Byte length of the empty or space/tab-only lines at the start of `text`
fn leading_blank_lines(text: &str) -> usize {
    let mut consumed = 0;
    while let Some(newline) = text[consumed..].find('\n') {
        if !text[consumed..consumed + newline].chars().all(is_indent) {
            break;
        }
        consumed += newline + 1;
    }
    consumed
}

/// Locate the first closing delimiter at or after `from`. Returns the end of the
/// body (whitespace before the closer excluded) and the closer's position.
fn closing_delimiter(text: &str, from: usize, delimiter: &str) -> Option<(usize, usize)> {
    let close = from + text[from..].find(delimiter)?;
    let body = &text[from..close];
    let body_end = from + body.trim_end().len();
    Some((body_end, close))
}

fn is_indent(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Remove the indentation shared by all non-blank lines. Tabs and spaces are
/// different characters; lines made only of spaces and tabs become empty.
fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| if line.chars().all(is_indent) { "" } else { line })
        .collect();

    let mut margin: Option<&str> = None;
    for &line in lines.iter().filter(|line| !line.is_empty()) {
        let indent = &line[..line.len() - line.trim_start_matches(is_indent).len()];
        margin = Some(match margin {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }

    let margin = margin.unwrap_or("");
    lines
        .iter()
        .map(|&line| line.strip_prefix(margin).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}
