//! Terminal output interpretation.
//!
//! - **term**: escape sequence tokenizer, SGR attribute state and the
//!   attribute-tracking parser
//! - **session**: per-terminal state combining the parser, caret position
//!   resolution, announcements and profiles
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── AnsiParser (SGR state + plain text)
//! ├── PositionCalculator (cached caret positions)
//! ├── CaretAnnouncer (blank suppression, punctuation)
//! └── ProfileManager (per-application verbosity)
//! ```

pub mod session;
pub mod term;
