//! Pure text patches: anchored insertion and pattern replacement.
//!
//! Both return `None` when the file already holds the patch, which is the
//! whole idempotence contract: the decision is made from file contents, never
//! from a record of what ran before.

use regex::NoExpand;

use crate::domain::{
    anchor::{Anchor, AnchorPattern, Position},
    error::DomainError,
    mutation::FileTarget,
};

/// Insert `text` next to `anchor` in `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextInsertion {
    pub target: FileTarget,
    pub anchor: Anchor,
    pub text: String,
    pub position: Position,
}

impl TextInsertion {
    pub fn new(
        target: impl Into<FileTarget>,
        anchor: Anchor,
        text: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            target: target.into(),
            anchor,
            text: text.into(),
            position,
        }
    }

    /// Append `text` as trailing lines of `target`.
    pub fn append(target: impl Into<FileTarget>, text: impl Into<String>) -> Self {
        Self::new(target, Anchor::EndOfFile, text, Position::After)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.text.trim().is_empty() {
            return Err(DomainError::InvalidRecipe(format!(
                "insertion into {} has no text",
                self.target
            )));
        }
        let empty_anchor = match &self.anchor {
            Anchor::Line(line) => line.trim().is_empty(),
            Anchor::Substring(text) => text.is_empty(),
            Anchor::Pattern(_) | Anchor::EndOfFile => false,
        };
        if empty_anchor {
            return Err(DomainError::InvalidRecipe(format!(
                "insertion into {} has an empty anchor",
                self.target
            )));
        }
        self.target.validate()
    }

    /// Compute the patched contents, or `None` if `text` is already present.
    pub fn apply_to(&self, file: &str, contents: &str) -> Result<Option<String>, DomainError> {
        if contents.contains(&self.text) {
            return Ok(None);
        }
        let span = self.anchor.locate(contents, file)?;
        Ok(Some(span.splice(contents, &self.text, self.position)))
    }
}

/// Replace every match of `pattern` in `target` with a literal `replacement`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextReplacement {
    pub target: FileTarget,
    pub pattern: AnchorPattern,
    pub replacement: String,
}

impl TextReplacement {
    pub fn new(
        target: impl Into<FileTarget>,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            target: target.into(),
            pattern: AnchorPattern::new(pattern)?,
            replacement: replacement.into(),
        })
    }

    /// Compute the patched contents.
    ///
    /// `None` when the replacement is already present or nothing matches.
    pub fn apply_to(&self, contents: &str) -> Option<String> {
        if !self.replacement.is_empty() && contents.contains(&self.replacement) {
            return None;
        }
        if !self.pattern.regex().is_match(contents) {
            return None;
        }
        Some(
            self.pattern
                .regex()
                .replace_all(contents, NoExpand(&self.replacement))
                .into_owned(),
        )
    }
}
