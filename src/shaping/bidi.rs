//! Bidirectional text reordering
//!
//! Screen text is stored in logical order; reading it aloud needs the
//! visual order the user sees. Backed by `unicode-bidi` when the `bidi`
//! feature is enabled.

use super::TextShaper;

#[derive(Clone, Copy, Debug, Default)]
pub struct BidiHelper;

impl BidiHelper {
    pub fn new() -> Self {
        Self
    }
}

impl TextShaper for BidiHelper {
    fn name(&self) -> &'static str {
        "bidi"
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "bidi")
    }

    fn process_text(&self, text: &str) -> String {
        reorder(text)
    }
}

/// Reorder each line into visual order
#[cfg(feature = "bidi")]
fn reorder(text: &str) -> String {
    use unicode_bidi::BidiInfo;

    if text.is_empty() {
        return String::new();
    }

    let bidi_info = BidiInfo::new(text, None);
    if !bidi_info.has_rtl() {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len());
    for para in &bidi_info.paragraphs {
        let line = para.range.clone();
        result.push_str(&bidi_info.reorder_line(para, line));
    }
    result
}

#[cfg(not(feature = "bidi"))]
fn reorder(text: &str) -> String {
    text.to_string()
}
