//! Anchors: where a text insertion lands inside a file.
//!
//! Every anchor is a *line predicate*. The file is scanned line by line and
//! the anchor must select exactly one location; zero matches is
//! [`DomainError::AnchorNotFound`], several is [`DomainError::AmbiguousAnchor`].
//!
//! - [`Anchor::Line`] selects a whole line (compared after trimming) and the
//!   inserted text becomes new lines before or after it.
//! - [`Anchor::Substring`] and [`Anchor::Pattern`] select a span inside a
//!   line and the text is spliced in verbatim at that span.
//! - [`Anchor::EndOfFile`] appends the text as new trailing lines.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::domain::error::DomainError;

/// Where to put text relative to the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    Before,
    #[default]
    After,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

impl FromStr for Position {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            other => Err(DomainError::InvalidRecipe(format!(
                "position must be 'before' or 'after', got '{other}'"
            ))),
        }
    }
}

/// A compiled regular expression usable as an anchor or replacement target.
///
/// Wrapped so that anchors stay `PartialEq` (compared by source text).
#[derive(Debug, Clone)]
pub struct AnchorPattern(Regex);

impl AnchorPattern {
    pub fn new(pattern: &str) -> Result<Self, DomainError> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|e| DomainError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn regex(&self) -> &Regex {
        &self.0
    }
}

impl PartialEq for AnchorPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// Insertion point selector.
#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    /// A whole line equal to this text, ignoring surrounding whitespace.
    Line(String),
    /// Literal text occurring inside a line.
    Substring(String),
    /// A regular expression matched against each line.
    Pattern(AnchorPattern),
    /// The end of the file.
    EndOfFile,
}

impl Anchor {
    pub fn line(text: impl Into<String>) -> Self {
        Self::Line(text.into())
    }

    pub fn substring(text: impl Into<String>) -> Self {
        Self::Substring(text.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, DomainError> {
        AnchorPattern::new(pattern).map(Self::Pattern)
    }

    /// Locate the single span this anchor selects in `contents`.
    ///
    /// `file` is only used to label errors.
    pub fn locate(&self, contents: &str, file: &str) -> Result<AnchorSpan, DomainError> {
        if let Self::EndOfFile = self {
            return Ok(AnchorSpan {
                start: contents.len(),
                end: contents.len(),
                line: contents.lines().count() + 1,
                kind: SpanKind::EndOfFile,
            });
        }

        let mut found = Vec::new();
        let mut offset = 0;

        for (idx, raw) in contents.split_inclusive('\n').enumerate() {
            let line = raw.trim_end_matches(['\n', '\r']);
            let line_no = idx + 1;

            match self {
                Self::Line(text) => {
                    if line.trim() == text.trim() {
                        found.push(AnchorSpan {
                            start: offset,
                            end: offset + raw.len(),
                            line: line_no,
                            kind: SpanKind::WholeLine,
                        });
                    }
                }
                Self::Substring(text) => {
                    for (pos, m) in line.match_indices(text.as_str()) {
                        found.push(AnchorSpan {
                            start: offset + pos,
                            end: offset + pos + m.len(),
                            line: line_no,
                            kind: SpanKind::Inline,
                        });
                    }
                }
                Self::Pattern(pattern) => {
                    for m in pattern.regex().find_iter(line) {
                        found.push(AnchorSpan {
                            start: offset + m.start(),
                            end: offset + m.end(),
                            line: line_no,
                            kind: SpanKind::Inline,
                        });
                    }
                }
                Self::EndOfFile => unreachable!("handled above"),
            }

            offset += raw.len();
        }

        match found.len() {
            0 => Err(DomainError::AnchorNotFound {
                file: file.to_string(),
                anchor: self.to_string(),
            }),
            1 => Ok(found.remove(0)),
            count => Err(DomainError::AmbiguousAnchor {
                file: file.to_string(),
                anchor: self.to_string(),
                count,
                lines: found.iter().map(|s| s.line).collect(),
            }),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(text) => write!(f, "line {:?}", text.trim()),
            Self::Substring(text) => write!(f, "text {text:?}"),
            Self::Pattern(p) => write!(f, "pattern /{}/", p.as_str()),
            Self::EndOfFile => write!(f, "end of file"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    WholeLine,
    Inline,
    EndOfFile,
}

/// Byte span selected by an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorSpan {
    pub start: usize,
    /// For whole lines this includes the line terminator.
    pub end: usize,
    /// 1-based line number.
    pub line: usize,
    pub kind: SpanKind,
}

impl AnchorSpan {
    /// Splice `text` into `contents` at this span.
    pub fn splice(&self, contents: &str, text: &str, position: Position) -> String {
        let mut out = String::with_capacity(contents.len() + text.len() + 2);

        match self.kind {
            SpanKind::Inline => {
                let at = match position {
                    Position::Before => self.start,
                    Position::After => self.end,
                };
                out.push_str(&contents[..at]);
                out.push_str(text);
                out.push_str(&contents[at..]);
            }
            SpanKind::WholeLine => {
                let block = as_line_block(text);
                match position {
                    Position::Before => {
                        out.push_str(&contents[..self.start]);
                        out.push_str(&block);
                        out.push_str(&contents[self.start..]);
                    }
                    Position::After => {
                        out.push_str(&contents[..self.end]);
                        if !contents[..self.end].ends_with('\n') {
                            out.push('\n');
                        }
                        out.push_str(&block);
                        out.push_str(&contents[self.end..]);
                    }
                }
            }
            SpanKind::EndOfFile => {
                out.push_str(contents);
                if !contents.is_empty() && !contents.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&as_line_block(text));
            }
        }

        out
    }
}

fn as_line_block(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}
