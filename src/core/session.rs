//! Reader session
//!
//! Ties one terminal's output stream, caret tracking and the active
//! application profile together. The host forwards events here and speaks
//! whatever comes back.

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use super::term::{AnsiParser, StyledSpan};
use crate::app::{self, AppClass, FocusObject};
use crate::config::{Config, Verbosity};
use crate::cursor::{Announcement, CaretAnnouncer, CaretCause, CaretEvent};
use crate::position::{
    Bookmark, BoundTerminal, PositionCache, PositionCalculator, ProbeError, Rect, RegionBounds, ScreenPosition,
    TextPosition,
};
use crate::profile::ProfileManager;
use crate::shaping::ShapingPipeline;

/// Text extracted from one output chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUpdate {
    /// Plain text after shaping, ready to speak
    pub text: String,
    pub spans: Vec<StyledSpan>,
}

/// Per-terminal reader state
pub struct Session {
    config: Config,
    parser: AnsiParser,
    calculator: PositionCalculator,
    announcer: CaretAnnouncer,
    shaping: ShapingPipeline,
    profiles: ProfileManager,
    terminal: Option<Arc<dyn BoundTerminal>>,
    focus: AppClass,
    mark_start: Option<Bookmark>,
    mark_end: Option<Bookmark>,
    /// Where the caret was when it was last announced
    last_caret: Option<Bookmark>,
}

impl Default for Session {
    fn default() -> Self {
        Self::from_config(Config::default())
    }
}

impl Session {
    pub fn from_config(config: Config) -> Self {
        let cache = Arc::new(PositionCache::with_capacity(config.position_cache_capacity));
        let mut calculator = PositionCalculator::new(cache);
        if config.background_probe {
            if let Err(err) = calculator.enable_background() {
                warn!(error = %err, "background probing disabled");
            }
        }

        let shaping = ShapingPipeline::from_flags(config.shaping.bidi, config.shaping.emoji);
        debug!(providers = ?shaping.names(), "text shaping ready");

        Self {
            parser: AnsiParser::streaming(),
            calculator,
            announcer: CaretAnnouncer::new(config.blank_window()),
            shaping,
            profiles: ProfileManager::with_custom(config.profiles.iter().cloned()),
            terminal: None,
            focus: AppClass::Unknown,
            mark_start: None,
            mark_end: None,
            last_caret: None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn profiles(&self) -> &ProfileManager {
        &self.profiles
    }

    pub fn profiles_mut(&mut self) -> &mut ProfileManager {
        &mut self.profiles
    }

    pub fn calculator(&self) -> &PositionCalculator {
        &self.calculator
    }

    pub fn calculator_mut(&mut self) -> &mut PositionCalculator {
        &mut self.calculator
    }

    /// Effective verbosity: global settings with the active profile on top
    pub fn verbosity(&self) -> Verbosity {
        self.profiles.verbosity(self.config.verbosity())
    }

    /// Classification of the focused application
    pub fn focus(&self) -> &AppClass {
        &self.focus
    }

    /// Feed a chunk of raw terminal output
    pub fn feed_output(&mut self, chunk: &str) -> OutputUpdate {
        let spans = self.parser.spans(chunk);
        let plain: String = spans.iter().map(|span| span.text.as_str()).collect();
        OutputUpdate {
            text: self.shaping.process(&plain),
            spans,
        }
    }

    /// Spoken description of the current text attributes
    pub fn describe_attributes(&self) -> String {
        self.parser.format_attributes(self.config.attribute_format)
    }

    /// Focus moved to a new object
    pub fn on_focus(&mut self, obj: Option<&dyn FocusObject>) -> &AppClass {
        self.focus = app::classify(obj);
        self.profiles.activate_for(obj);
        if let AppClass::Terminal(name) = &self.focus {
            info!(app = %name, "terminal focused");
        }
        &self.focus
    }

    /// Bind the terminal positions resolve against.
    ///
    /// Switching to a different terminal drops every cached position and any
    /// half-received escape sequence.
    pub fn bind_terminal(&mut self, terminal: Option<Arc<dyn BoundTerminal>>) {
        let old = self.terminal.as_ref().map(|t| t.id());
        let new = terminal.as_ref().map(|t| t.id());
        if old != new {
            debug!(?old, ?new, "bound terminal changed");
            self.calculator.clear_cache();
            self.parser.reset();
            self.clear_marks();
            self.last_caret = None;
        }
        self.terminal = terminal;
    }

    /// Restrict window-mode tracking to `region`
    pub fn set_window(&mut self, region: Option<Rect>) {
        self.announcer.set_window(region);
    }

    /// Clip resolved positions to a review region. Clears the position cache.
    pub fn set_region(&mut self, region: Option<Arc<dyn RegionBounds>>) {
        self.calculator.set_region(region);
    }

    /// Screen position of `text`'s caret.
    ///
    /// With background probing on, a position that is not cached yet is
    /// queued and reported as [`ScreenPosition::UNKNOWN`]; a later call finds
    /// it in the cache.
    pub fn caret_position(&mut self, text: Option<&dyn TextPosition>) -> ScreenPosition {
        let Some(terminal) = self.terminal.clone() else {
            return ScreenPosition::UNKNOWN;
        };
        // store whatever the worker finished since the last event
        self.calculator.poll_background();
        self.calculator
            .calculate_deferred(text, terminal)
            .unwrap_or(ScreenPosition::UNKNOWN)
    }

    /// Start a selection at `text`. Returns the mark, or `None` for a stale position.
    pub fn set_mark_start(&mut self, text: &dyn TextPosition) -> Option<Bookmark> {
        self.mark_start = text.bookmark();
        debug!(mark = ?self.mark_start, "mark start");
        self.mark_start
    }

    /// End a selection at `text`. Returns the mark, or `None` for a stale position.
    pub fn set_mark_end(&mut self, text: &dyn TextPosition) -> Option<Bookmark> {
        self.mark_end = text.bookmark();
        debug!(mark = ?self.mark_end, "mark end");
        self.mark_end
    }

    pub fn clear_marks(&mut self) {
        self.mark_start = None;
        self.mark_end = None;
    }

    pub fn marks(&self) -> (Option<Bookmark>, Option<Bookmark>) {
        (self.mark_start, self.mark_end)
    }

    /// Character offsets covered by the selection, both marks included.
    ///
    /// `None` unless both marks are set in the same buffer. Marks set in
    /// reverse order give the same range.
    pub fn marked_range(&self) -> Option<Range<usize>> {
        let (start, end) = (self.mark_start?, self.mark_end?);
        if start.buffer != end.buffer {
            debug!(start = start.buffer, end = end.buffer, "marks are in different buffers");
            return None;
        }
        let (low, high) = if start.offset <= end.offset {
            (start.offset, end.offset)
        } else {
            (end.offset, start.offset)
        };
        Some(low..high + 1)
    }

    /// Text between the marks, read from the bound terminal
    pub fn marked_text(&self) -> Result<Option<String>, ProbeError> {
        let (Some(range), Some(terminal)) = (self.marked_range(), self.terminal.as_ref()) else {
            return Ok(None);
        };
        let buffer = self.mark_start.map_or(0, |mark| mark.buffer);
        let before_end = terminal.text_before(&Bookmark::new(buffer, range.end))?;
        Ok(Some(before_end.chars().skip(range.start).collect()))
    }

    pub fn on_typed_char(&mut self, ch: char, now: Instant) {
        self.announcer.on_typed_char(ch, now);
    }

    /// Caret moved. A caret that has not left the last announced position
    /// stays silent; one without a resolvable position is always considered.
    pub fn on_caret_moved(
        &mut self,
        char_at_caret: &str,
        cause: CaretCause,
        text: Option<&dyn TextPosition>,
        now: Instant,
    ) -> Option<Announcement> {
        let key = text.and_then(|t| t.bookmark());
        if key.is_some() && key == self.last_caret {
            trace!(key = ?key, "caret position unchanged");
            return None;
        }

        let event = CaretEvent::new(char_at_caret, cause).at(self.caret_position(text));
        let said = self.announcer.on_caret_moved(&event, now, &self.verbosity());
        if said.is_some() {
            self.last_caret = key;
        }
        said
    }
}
