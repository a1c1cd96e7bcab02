//! Validation policy for the comment text input.
//!
//! Lengths are counted in characters of the raw text as typed, before
//! trimming. Whitespace is only removed by [`CommentInputValidator::normalize`]
//! at submission time.

pub const COMMENT_MIN_CHARS: usize = 5;
pub const COMMENT_MAX_CHARS: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentRule {
    Required,
    MinLength { min: usize, actual: usize },
    MaxLength { max: usize, actual: usize },
    NoSpace,
    NoNewLine,
}

/// Holds the draft being composed and judges candidate text against the
/// fixed comment policy. Every evaluation is independent of the draft and of
/// earlier evaluations.
#[derive(Debug, Clone, Default)]
pub struct CommentInputValidator {
    draft: String,
}

impl CommentInputValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn violations(&self, text: &str) -> Vec<CommentRule> {
        if text.is_empty() {
            return vec![CommentRule::Required];
        }

        let mut violations = Vec::new();
        let actual = text.chars().count();
        if actual < COMMENT_MIN_CHARS {
            violations.push(CommentRule::MinLength {
                min: COMMENT_MIN_CHARS,
                actual,
            });
        }
        if actual > COMMENT_MAX_CHARS {
            violations.push(CommentRule::MaxLength {
                max: COMMENT_MAX_CHARS,
                actual,
            });
        }
        if text.trim().is_empty() {
            violations.push(CommentRule::NoSpace);
        }
        if text.contains(['\n', '\r']) {
            violations.push(CommentRule::NoNewLine);
        }
        violations
    }

    pub fn is_valid(&self, text: &str) -> bool {
        self.violations(text).is_empty()
    }

    pub fn normalize(&self, text: &str) -> String {
        text.trim().to_string()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn is_draft_valid(&self) -> bool {
        self.is_valid(&self.draft)
    }

    pub fn reset(&mut self) {
        self.draft.clear();
    }
}

#[cfg(test)]
#[path = "tests/validator_tests.rs"]
mod tests;
