//! Caret movement announcements
//!
//! Pressing Enter moves the caret onto an empty line before the shell's
//! output arrives. Announcing "blank" at that moment is noise, so a blank
//! caused by typing within a short window after Enter is suppressed.
//! Explicit navigation always announces.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::config::{CursorTrackingMode, PunctuationLevel, Verbosity};
use crate::position::{Rect, ScreenPosition};

pub const DEFAULT_BLANK_WINDOW: Duration = Duration::from_millis(300);

/// What moved the caret
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaretCause {
    /// Side effect of typed input
    Typing,
    /// Explicit review or navigation command
    Navigation,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Announcement {
    Blank,
    Character(String),
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Announcement::Blank => f.write_str("blank"),
            Announcement::Character(text) => f.write_str(text),
        }
    }
}

/// One caret movement as reported by the host
#[derive(Clone, Copy, Debug)]
pub struct CaretEvent<'a> {
    /// Text under the caret after the move
    pub char_at_caret: &'a str,
    pub cause: CaretCause,
    pub position: ScreenPosition,
}

impl<'a> CaretEvent<'a> {
    pub fn new(char_at_caret: &'a str, cause: CaretCause) -> Self {
        Self {
            char_at_caret,
            cause,
            position: ScreenPosition::UNKNOWN,
        }
    }

    pub fn at(mut self, position: ScreenPosition) -> Self {
        self.position = position;
        self
    }
}

#[derive(Clone, Debug)]
pub struct CaretAnnouncer {
    last_enter: Option<Instant>,
    blank_window: Duration,
    window: Option<Rect>,
}

impl Default for CaretAnnouncer {
    fn default() -> Self {
        Self::new(DEFAULT_BLANK_WINDOW)
    }
}

impl CaretAnnouncer {
    pub fn new(blank_window: Duration) -> Self {
        Self {
            last_enter: None,
            blank_window,
            window: None,
        }
    }

    /// Region used by [`CursorTrackingMode::Window`]
    pub fn with_window(mut self, window: Rect) -> Self {
        self.window = Some(window);
        self
    }

    pub fn set_window(&mut self, window: Option<Rect>) {
        self.window = window;
    }

    pub fn last_enter(&self) -> Option<Instant> {
        self.last_enter
    }

    /// Note a typed character. Only Enter is remembered.
    pub fn on_typed_char(&mut self, ch: char, now: Instant) {
        if ch == '\r' {
            self.last_enter = Some(now);
        }
    }

    /// Decide what, if anything, to say for a caret move
    pub fn on_caret_moved(&self, event: &CaretEvent<'_>, now: Instant, verbosity: &Verbosity) -> Option<Announcement> {
        match verbosity.tracking {
            CursorTrackingMode::Off => return None,
            CursorTrackingMode::Window => {
                // an unresolved position is never treated as clipped
                if let Some(window) = self.window.filter(|_| !event.position.is_unknown()) {
                    if !window.contains(event.position) {
                        trace!(position = %event.position, "caret outside window region");
                        return None;
                    }
                }
            }
            CursorTrackingMode::Standard | CursorTrackingMode::Highlight => {}
        }

        if is_blank(event.char_at_caret) {
            if event.cause == CaretCause::Typing && self.within_enter_window(now) {
                trace!("blank suppressed after enter");
                return None;
            }
            return Some(Announcement::Blank);
        }

        let text = speak_punctuation(event.char_at_caret, verbosity.punctuation);
        Some(Announcement::Character(text))
    }

    fn within_enter_window(&self, now: Instant) -> bool {
        match self.last_enter {
            Some(enter) => now.saturating_duration_since(enter) < self.blank_window,
            None => false,
        }
    }
}

fn is_blank(text: &str) -> bool {
    matches!(text, "" | "\n" | "\r" | "\r\n")
}

/// Symbol name and the lowest level at which it is spoken
fn symbol_name(ch: char) -> Option<(&'static str, PunctuationLevel)> {
    use PunctuationLevel::{All, Most, Off, Some as Few};

    let entry = match ch {
        ' ' => ("space", Off),
        '\t' => ("tab", Off),
        '$' => ("dollar", Few),
        '#' => ("number", Few),
        '%' => ("percent", Few),
        '&' => ("and", Few),
        '*' => ("star", Few),
        '@' => ("at", Few),
        '|' => ("bar", Few),
        '\\' => ("backslash", Few),
        '/' => ("slash", Few),
        '^' => ("caret", Few),
        '~' => ("tilde", Few),
        '(' => ("left paren", Most),
        ')' => ("right paren", Most),
        '[' => ("left bracket", Most),
        ']' => ("right bracket", Most),
        '{' => ("left brace", Most),
        '}' => ("right brace", Most),
        '<' => ("less", Most),
        '>' => ("greater", Most),
        '=' => ("equals", Most),
        '+' => ("plus", Most),
        '-' => ("dash", Most),
        '_' => ("line", Most),
        '"' => ("quote", Most),
        '`' => ("grave", Most),
        ':' => ("colon", Most),
        ';' => ("semi", Most),
        '.' => ("dot", All),
        ',' => ("comma", All),
        '!' => ("bang", All),
        '?' => ("question", All),
        '\'' => ("tick", All),
        _ => return None,
    };
    Some(entry)
}

fn speak_punctuation(text: &str, level: PunctuationLevel) -> String {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => match symbol_name(ch) {
            Some((name, min)) if level >= min => name.to_string(),
            _ => text.to_string(),
        },
        _ => text.to_string(),
    }
}
