//! Optional text transforms applied before announcement.
//!
//! Each provider reports whether it can run in this build and exposes a
//! pure `&str -> String` transform. Unavailable or disabled providers are
//! skipped, so the pipeline degrades to the identity.

pub mod bidi;
pub mod emoji;

pub use bidi::BidiHelper;
pub use emoji::EmojiHelper;

/// A swappable text-shaping provider
pub trait TextShaper: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the provider's backing support is compiled in
    fn is_available(&self) -> bool;

    fn process_text(&self, text: &str) -> String;
}

/// Ordered list of providers
#[derive(Default)]
pub struct ShapingPipeline {
    providers: Vec<Box<dyn TextShaper>>,
}

impl ShapingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline with the built-in providers enabled by the flags
    pub fn from_flags(bidi: bool, emoji: bool) -> Self {
        let mut pipeline = Self::new();
        if bidi {
            pipeline.push(BidiHelper::new());
        }
        if emoji {
            pipeline.push(EmojiHelper::new());
        }
        pipeline
    }

    pub fn push(&mut self, provider: impl TextShaper + 'static) {
        if !provider.is_available() {
            tracing::debug!(provider = provider.name(), "text shaping provider unavailable, skipping");
            return;
        }
        self.providers.push(Box::new(provider));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn process(&self, text: &str) -> String {
        self.providers
            .iter()
            .fold(text.to_string(), |acc, provider| provider.process_text(&acc))
    }
}
