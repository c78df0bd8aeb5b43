//! Emoji width and cleanup

use unicode_width::UnicodeWidthStr;

use super::TextShaper;

const TEXT_PRESENTATION: char = '\u{fe0e}';
const EMOJI_PRESENTATION: char = '\u{fe0f}';

#[derive(Clone, Copy, Debug, Default)]
pub struct EmojiHelper;

impl EmojiHelper {
    pub fn new() -> Self {
        Self
    }

    /// Terminal cell width of `text` (emoji and CJK count as 2)
    pub fn display_width(&self, text: &str) -> usize {
        UnicodeWidthStr::width(text)
    }

    pub fn contains_emoji(&self, text: &str) -> bool {
        text.chars().any(is_emoji)
    }
}

impl TextShaper for EmojiHelper {
    fn name(&self) -> &'static str {
        "emoji"
    }

    fn is_available(&self) -> bool {
        true
    }

    /// Drop presentation selectors; they are invisible and unspeakable
    fn process_text(&self, text: &str) -> String {
        text.chars()
            .filter(|&c| c != TEXT_PRESENTATION && c != EMOJI_PRESENTATION)
            .collect()
    }
}

fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F300..=0x1FAFF | 0x2600..=0x27BF | 0x1F1E6..=0x1F1FF | 0x2B00..=0x2BFF
    )
}
