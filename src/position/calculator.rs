//! Cache-first position resolution

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::geometry;
use super::{BackgroundProbe, BoundTerminal, PositionCache, RegionBounds, ScreenPosition, TextPosition};

/// Resolves caret positions, consulting the cache before probing.
///
/// The cache is shared, not owned: clones of the `Arc` (for example the
/// background probe's) see the same entries.
pub struct PositionCalculator {
    cache: Arc<PositionCache>,
    region: Option<Arc<dyn RegionBounds>>,
    background: Option<BackgroundProbe>,
}

impl Default for PositionCalculator {
    fn default() -> Self {
        Self::new(Arc::new(PositionCache::new()))
    }
}

impl PositionCalculator {
    pub fn new(cache: Arc<PositionCache>) -> Self {
        Self {
            cache,
            region: None,
            background: None,
        }
    }

    pub fn cache(&self) -> &Arc<PositionCache> {
        &self.cache
    }

    /// Restrict results to a window region. Clears the cache.
    pub fn set_region(&mut self, region: Option<Arc<dyn RegionBounds>>) {
        self.region = region;
        self.clear_cache();
    }

    /// Forget every cached position; call when the bound terminal changes.
    ///
    /// A background request still in flight is cancelled too, so its result
    /// cannot repopulate the cleared cache.
    pub fn clear_cache(&mut self) {
        if let Some(background) = self.background.as_mut() {
            background.cancel();
        }
        self.cache.clear();
    }

    /// Screen position of `text`'s caret.
    ///
    /// Returns [`ScreenPosition::UNKNOWN`] when there is no terminal, the
    /// text position is missing or stale, or the probe fails. A failed probe
    /// leaves the cache untouched.
    pub fn calculate(&self, text: Option<&dyn TextPosition>, terminal: Option<&dyn BoundTerminal>) -> ScreenPosition {
        let Some(terminal) = terminal else {
            return ScreenPosition::UNKNOWN;
        };
        let Some(key) = text.and_then(|t| t.bookmark()) else {
            return ScreenPosition::UNKNOWN;
        };

        if let Some(pos) = self.cache.get(&key) {
            return self.clip(pos);
        }

        match geometry::probe(terminal, &key) {
            Ok(pos) => {
                self.cache.set(key, pos.row, pos.column);
                self.clip(pos)
            }
            Err(err) => {
                warn!(terminal = terminal.id(), key = ?key, error = %err, "position probe failed");
                ScreenPosition::UNKNOWN
            }
        }
    }

    /// Start the background probe worker
    pub fn enable_background(&mut self) -> io::Result<()> {
        if self.background.is_none() {
            self.background = Some(BackgroundProbe::spawn(Arc::clone(&self.cache))?);
        }
        Ok(())
    }

    /// Cached position right away, or queue a background probe and return
    /// `None`. Without a worker this falls back to [`calculate`](Self::calculate).
    pub fn calculate_deferred(
        &mut self,
        text: Option<&dyn TextPosition>,
        terminal: Arc<dyn BoundTerminal>,
    ) -> Option<ScreenPosition> {
        let Some(key) = text.and_then(|t| t.bookmark()) else {
            return Some(ScreenPosition::UNKNOWN);
        };
        if let Some(pos) = self.cache.get(&key) {
            return Some(self.clip(pos));
        }

        let Some(background) = self.background.as_mut() else {
            return Some(self.calculate(text, Some(terminal.as_ref())));
        };
        if let Err(err) = background.request(key, terminal) {
            warn!(error = %err, "could not queue background probe");
            return Some(ScreenPosition::UNKNOWN);
        }
        None
    }

    /// Collect a finished background result for the latest request
    pub fn poll_background(&mut self) -> Option<ScreenPosition> {
        let pos = self.background.as_mut()?.poll()?;
        Some(self.clip(pos))
    }

    /// Block until the latest background request resolves
    pub fn wait_background(&mut self, timeout: Duration) -> Option<ScreenPosition> {
        let pos = self.background.as_mut()?.wait(timeout)?;
        Some(self.clip(pos))
    }

    /// Clamp into the enabled window region, unless one is being defined
    fn clip(&self, pos: ScreenPosition) -> ScreenPosition {
        match &self.region {
            Some(region) if !region.is_defining() && !pos.is_unknown() => match region.bounds() {
                Some(bounds) => bounds.clamp(pos),
                None => pos,
            },
            _ => pos,
        }
    }
}
