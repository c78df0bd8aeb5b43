//! ANSI/VT escape-code handling
//!
//! - **scanner**: tokenizer splitting text from escape sequences
//! - **style**: SGR attribute state and its spoken description
//! - **parser**: stateful parser folding SGR codes into the style

pub mod parser;
pub mod scanner;
pub mod style;

pub use parser::{AnsiParser, StyledSpan};
pub use scanner::{strip_ansi, EscapeSequence, Token, Tokens};
pub use style::{AttrFlags, AttributeFormat, Color, StyleState};
