//! termaccess - screen reader support for terminal windows
//!
//! Turns raw terminal output and caret events into things worth speaking.
//!
//! # Features
//!
//! - **Attribute tracking**: SGR sequences fold into a running style that can
//!   be described in brief or detailed form
//! - **ANSI stripping**: escape sequences removed, malformed fragments kept
//! - **Caret positions**: cached `(row, column)` lookup with optional
//!   off-thread probing
//! - **Blank suppression**: no "blank" right after Enter while output is
//!   still arriving
//! - **Profiles**: per-application punctuation and tracking settings
//!
//! # Example
//!
//! ```
//! use termaccess::core::term::{AnsiParser, AttributeFormat};
//!
//! let mut parser = AnsiParser::new();
//! parser.parse("\x1b[1;31mError:\x1b[0m \x1b[4mdetails");
//! assert_eq!(parser.format_attributes(AttributeFormat::Detailed), "underline");
//! assert_eq!(AnsiParser::strip_ansi("\x1b[31mred\x1b[0m"), "red");
//! ```

pub mod app;
pub mod config;
pub mod core;
pub mod cursor;
pub mod position;
pub mod profile;
pub mod shaping;

pub use crate::config::{Config, ConfigError, CursorTrackingMode, PunctuationLevel, Verbosity};
pub use crate::core::session::Session;
pub use crate::core::term::{strip_ansi, AnsiParser, AttributeFormat, StyleState};
pub use crate::cursor::{Announcement, CaretAnnouncer, CaretCause};
pub use crate::position::{PositionCache, PositionCalculator, ScreenPosition};
pub use crate::profile::{ApplicationProfile, ProfileManager};
