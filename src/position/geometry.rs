//! Live position probe

use unicode_width::UnicodeWidthChar;

use super::{Bookmark, BoundTerminal, ProbeError, ScreenPosition};

const TAB_WIDTH: u32 = 8;

/// Screen position of the character following `text`.
///
/// Rows count line breaks (`\r\n`, `\n` or a lone `\r`); the column is the
/// display width of the last line plus one.
pub fn locate(text: &str) -> ScreenPosition {
    let mut row = 1u32;
    let mut width = 0u32;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                chars.next_if_eq(&'\n');
                row = row.saturating_add(1);
                width = 0;
            }
            '\n' => {
                row = row.saturating_add(1);
                width = 0;
            }
            '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
            _ => width = width.saturating_add(ch.width().unwrap_or(0) as u32),
        }
    }

    ScreenPosition::new(row, width.saturating_add(1))
}

/// Run the expensive probe for one bookmark
pub fn probe(terminal: &dyn BoundTerminal, bookmark: &Bookmark) -> Result<ScreenPosition, ProbeError> {
    let text = terminal.text_before(bookmark)?;
    let got = text.chars().count();
    if got != bookmark.offset {
        return Err(ProbeError::Inconsistent {
            offset: bookmark.offset,
            got,
        });
    }
    Ok(locate(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of_buffer() {
        assert_eq!(locate(""), (1, 1));
    }

    #[test]
    fn test_single_line() {
        assert_eq!(locate("hello"), (1, 6));
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(locate("one\ntwo\nab"), (3, 3));
        assert_eq!(locate("one\r\ntwo\r\n"), (3, 1));
        assert_eq!(locate("one\rtwo"), (2, 4));
    }

    #[test]
    fn test_wide_and_combining() {
        // two wide CJK characters
        assert_eq!(locate("日本"), (1, 5));
        // e + combining acute accent
        assert_eq!(locate("e\u{301}x"), (1, 3));
    }

    #[test]
    fn test_tab_stops() {
        assert_eq!(locate("\t"), (1, 9));
        assert_eq!(locate("abc\tx"), (1, 10));
    }
}
