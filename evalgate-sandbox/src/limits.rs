//! Output limits applied when rendering sandbox output

use serde::{Deserialize, Serialize};

/// Bounds on what is displayed inline and what may be uploaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLimits {
    /// Output with more line breaks than this is marked truncated
    pub max_lines: usize,

    /// Number of numbered lines kept in the inline view
    pub max_inline_lines: usize,

    /// Inline text of at least this many characters is cut to this length
    pub max_chars: usize,

    /// Texts longer than this are never sent to the paste store
    pub max_upload_chars: usize,
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self {
            max_lines: 10,
            max_inline_lines: 11,
            max_chars: 1000,
            max_upload_chars: 10_000,
        }
    }
}

impl OutputLimits {
    /// Reject limits that would make the inline view empty
    pub fn validate(&self) -> Result<(), String> {
        if self.max_inline_lines == 0 {
            return Err("output.max_inline_lines must be at least 1".to_string());
        }
        if self.max_chars == 0 {
            return Err("output.max_chars must be at least 1".to_string());
        }
        if self.max_upload_chars == 0 {
            return Err("output.max_upload_chars must be at least 1".to_string());
        }
        Ok(())
    }
}
