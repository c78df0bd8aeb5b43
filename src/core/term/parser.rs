//! ANSI attribute parser
//!
//! Consumes terminal output chunks, folds SGR sequences into a running
//! [`StyleState`] and exposes the plain or style-annotated text.

use super::scanner::{strip_ansi, Token, Tokens};
use super::style::{AttributeFormat, StyleState};

/// Longest trailing sequence held back between chunks; longer ones are
/// passed through as text
pub const MAX_PENDING: usize = 4096;

/// A run of plain text sharing one style
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: StyleState,
}

/// Attribute-tracking parser, one per terminal output stream
#[derive(Debug, Default)]
pub struct AnsiParser {
    style: StyleState,
    /// Carry a truncated trailing sequence into the next chunk
    streaming: bool,
    pending: String,
}

impl AnsiParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser that joins escape sequences split across chunks
    pub fn streaming() -> Self {
        Self {
            streaming: true,
            ..Self::default()
        }
    }

    pub fn style(&self) -> &StyleState {
        &self.style
    }

    /// Bytes held back from the previous chunk (streaming mode only)
    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn reset(&mut self) {
        self.style.reset();
        self.pending.clear();
    }

    /// Apply every SGR sequence in `chunk` and return the resulting state
    pub fn parse(&mut self, chunk: &str) -> StyleState {
        self.consume(chunk, |_, _| {});
        self.style
    }

    /// Parse `chunk` and return its text split into styled runs.
    ///
    /// Adjacent text with the same style is merged into one span.
    pub fn spans(&mut self, chunk: &str) -> Vec<StyledSpan> {
        let mut spans: Vec<StyledSpan> = Vec::new();
        self.consume(chunk, |text, style| match spans.last_mut() {
            Some(last) if last.style == *style => last.text.push_str(text),
            _ => spans.push(StyledSpan {
                text: text.to_string(),
                style: *style,
            }),
        });
        spans
    }

    /// Describe the current attributes
    pub fn format_attributes(&self, format: AttributeFormat) -> String {
        self.style.describe(format)
    }

    /// Stateless; see [`strip_ansi`]
    pub fn strip_ansi(text: &str) -> String {
        strip_ansi(text)
    }

    fn consume(&mut self, chunk: &str, mut on_text: impl FnMut(&str, &StyleState)) {
        let joined;
        let input = if self.pending.is_empty() {
            chunk
        } else {
            joined = std::mem::take(&mut self.pending) + chunk;
            joined.as_str()
        };

        for token in Tokens::new(input) {
            match token {
                Token::Text(text) => on_text(text, &self.style),
                Token::Sequence(seq, _) if seq.is_sgr() => self.style.apply_sgr(&seq.params),
                Token::Sequence(seq, raw) => {
                    tracing::trace!(final_byte = %seq.final_byte, raw = ?raw, "skipping non-SGR sequence");
                }
                Token::Osc(_) => {}
                Token::Aborted(raw) => tracing::trace!(raw = ?raw, "sequence cancelled by ESC"),
                Token::Partial(rest) if self.streaming && rest.len() <= MAX_PENDING => {
                    self.pending.push_str(rest)
                }
                Token::Partial(rest) => {
                    tracing::debug!(len = rest.len(), "unterminated escape sequence, passing through");
                    on_text(rest, &self.style);
                }
            }
        }
    }
}
