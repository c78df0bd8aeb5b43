//! Escape sequence tokenizer
//!
//! Splits terminal output into literal text and control sequences. The
//! tokenizer is stateless between calls; streaming is layered on top by the
//! parser, which re-feeds a trailing [`Token::Partial`].

const ESC: char = '\x1b';
const BEL: char = '\x07';

/// A single CSI sequence: `ESC [ [marker] params [intermediates] final`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EscapeSequence {
    /// Numeric parameters; empty parameters are 0
    pub params: Vec<u16>,
    /// Private marker (`?`, `>`, `=`, `<`) directly after `[`
    pub marker: Option<char>,
    /// Intermediate bytes (0x20..=0x2F) before the final byte
    pub intermediates: Vec<char>,
    pub final_byte: char,
}

impl EscapeSequence {
    /// Parse one complete sequence. Returns `None` unless `raw` is exactly
    /// one well-formed CSI sequence.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut tokens = Tokens::new(raw);
        match (tokens.next(), tokens.next()) {
            (Some(Token::Sequence(seq, _)), None) => Some(seq),
            _ => None,
        }
    }

    /// Select Graphic Rendition, the only kind that changes text style
    pub fn is_sgr(&self) -> bool {
        self.final_byte == 'm' && self.marker.is_none() && self.intermediates.is_empty()
    }
}

/// One piece of scanned input
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    /// Literal text, including malformed fragments left in place
    Text(&'a str),
    /// A recognized CSI sequence and its raw form
    Sequence(EscapeSequence, &'a str),
    /// Operating system command (`ESC ] ... BEL` or `ESC ] ... ESC \`)
    Osc(&'a str),
    /// An escape sequence cut off by the end of input
    Partial(&'a str),
    /// A sequence interrupted by a new ESC. Discarded, as a terminal would.
    Aborted(&'a str),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum ScanState {
    Escape,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    OscString,
    EscapeInOsc,
}

/// Iterator over the tokens of a chunk
pub struct Tokens<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Scan one escape sequence starting at the ESC at `self.pos`
    fn scan_escape(&mut self) -> Token<'a> {
        let rest = &self.input[self.pos..];
        let mut state = ScanState::Escape;
        let mut seq = EscapeSequence::default();
        let mut current: Option<u16> = None;
        // a separator was seen, so a missing last parameter still counts
        let mut pending_param = false;

        // offset of the ESC that may start an OSC terminator
        let mut osc_esc = 0;

        for (i, ch) in rest.char_indices().skip(1) {
            let end = i + ch.len_utf8();
            let raw = &rest[..end];

            // a new ESC cancels an unfinished sequence; rescan from it
            if ch == ESC && !matches!(state, ScanState::OscString | ScanState::EscapeInOsc) {
                return self.emit(i, Token::Aborted(&rest[..i]));
            }

            match state {
                ScanState::Escape => match ch {
                    '[' => state = ScanState::CsiEntry,
                    ']' => state = ScanState::OscString,
                    _ => return self.emit(end, Token::Text(raw)),
                },
                ScanState::CsiEntry | ScanState::CsiParam => match ch {
                    '0'..='9' => {
                        let digit = ch as u16 - '0' as u16;
                        current = Some(current.unwrap_or(0).saturating_mul(10).saturating_add(digit));
                        state = ScanState::CsiParam;
                    }
                    ';' | ':' => {
                        seq.params.push(current.take().unwrap_or(0));
                        pending_param = true;
                        state = ScanState::CsiParam;
                    }
                    '?' | '>' | '=' | '<' if state == ScanState::CsiEntry && seq.marker.is_none() => {
                        seq.marker = Some(ch);
                    }
                    '\x20'..='\x2f' => {
                        finish_param(&mut seq, &mut current, pending_param);
                        seq.intermediates.push(ch);
                        state = ScanState::CsiIntermediate;
                    }
                    '\x40'..='\x7e' => {
                        finish_param(&mut seq, &mut current, pending_param);
                        seq.final_byte = ch;
                        return self.emit(end, Token::Sequence(seq, raw));
                    }
                    _ => return self.emit(end, Token::Text(raw)),
                },
                ScanState::CsiIntermediate => match ch {
                    '\x20'..='\x2f' => seq.intermediates.push(ch),
                    '\x40'..='\x7e' => {
                        seq.final_byte = ch;
                        return self.emit(end, Token::Sequence(seq, raw));
                    }
                    _ => return self.emit(end, Token::Text(raw)),
                },
                ScanState::OscString => match ch {
                    BEL => return self.emit(end, Token::Osc(raw)),
                    ESC => {
                        osc_esc = i;
                        state = ScanState::EscapeInOsc;
                    }
                    _ => {}
                },
                // anything but `\` ends the OSC and starts a new escape
                ScanState::EscapeInOsc => match ch {
                    '\\' => return self.emit(end, Token::Osc(raw)),
                    _ => return self.emit(osc_esc, Token::Osc(&rest[..osc_esc])),
                },
            }
        }

        self.pos = self.input.len();
        Token::Partial(rest)
    }

    fn emit(&mut self, len: usize, token: Token<'a>) -> Token<'a> {
        self.pos += len;
        token
    }
}

fn finish_param(seq: &mut EscapeSequence, current: &mut Option<u16>, pending: bool) {
    if let Some(value) = current.take() {
        seq.params.push(value);
    } else if pending {
        seq.params.push(0);
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let rest = &self.input[self.pos..];
        if rest.is_empty() {
            return None;
        }

        if rest.starts_with(ESC) {
            return Some(self.scan_escape());
        }

        let len = rest.find(ESC).unwrap_or(rest.len());
        self.pos += len;
        Some(Token::Text(&rest[..len]))
    }
}

/// Remove every recognized escape sequence from `text`.
///
/// Literal text and malformed fragments are kept in their original order.
/// Sequences cut short by another ESC are dropped with it.
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for token in Tokens::new(text) {
        match token {
            Token::Text(s) | Token::Partial(s) => out.push_str(s),
            Token::Sequence(..) | Token::Osc(_) | Token::Aborted(_) => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &str) -> Vec<Token<'_>> {
        Tokens::new(input).collect()
    }

    #[test]
    fn test_plain_text_single_token() {
        assert_eq!(collect("hello"), vec![Token::Text("hello")]);
        assert!(collect("").is_empty());
    }

    #[test]
    fn test_sgr_sequence() {
        let tokens = collect("\x1b[1;31mX");
        let expected = EscapeSequence {
            params: vec![1, 31],
            final_byte: 'm',
            ..Default::default()
        };
        assert_eq!(tokens, vec![Token::Sequence(expected, "\x1b[1;31m"), Token::Text("X")]);
    }

    #[test]
    fn test_empty_and_trailing_params() {
        assert_eq!(EscapeSequence::parse("\x1b[m").map(|s| s.params), Some(vec![]));
        assert_eq!(EscapeSequence::parse("\x1b[;1m").map(|s| s.params), Some(vec![0, 1]));
        assert_eq!(EscapeSequence::parse("\x1b[1;m").map(|s| s.params), Some(vec![1, 0]));
    }

    #[test]
    fn test_private_marker_and_intermediate() {
        let seq = EscapeSequence::parse("\x1b[?25l").unwrap();
        assert_eq!(seq.marker, Some('?'));
        assert_eq!(seq.final_byte, 'l');
        assert!(!seq.is_sgr());

        let seq = EscapeSequence::parse("\x1b[2 q").unwrap();
        assert_eq!(seq.intermediates, vec![' ']);
        assert_eq!(seq.final_byte, 'q');
    }

    #[test]
    fn test_param_saturates() {
        let seq = EscapeSequence::parse("\x1b[99999999m").unwrap();
        assert_eq!(seq.params, vec![u16::MAX]);
    }

    #[test]
    fn test_non_csi_escape_passes_through() {
        assert_eq!(collect("\x1b7a"), vec![Token::Text("\x1b7"), Token::Text("a")]);
    }

    #[test]
    fn test_malformed_fragment_kept() {
        assert_eq!(strip_ansi("\x1b[31\nX"), "\x1b[31\nX");
        assert_eq!(strip_ansi("a\x1b[1\x01b"), "a\x1b[1\x01b");
    }

    #[test]
    fn test_esc_restarts_sequence() {
        assert_eq!(strip_ansi("\x1b[31\x1b[0mX"), "X");
        assert_eq!(strip_ansi("\x1b\x1b[31mX"), "X");
        assert_eq!(strip_ansi("a\x1b[1$\x1b[0mb"), "ab");

        let tokens = collect("\x1b[5\x1b[0mX");
        assert_eq!(tokens[0], Token::Aborted("\x1b[5"));
        assert!(matches!(&tokens[1], Token::Sequence(seq, "\x1b[0m") if seq.params == vec![0]));
        assert_eq!(tokens[2], Token::Text("X"));
    }

    #[test]
    fn test_esc_ends_unterminated_osc() {
        assert_eq!(strip_ansi("\x1b]0;title\x1b[31mred"), "red");
        assert_eq!(
            collect("\x1b]0;t\x1b[1m"),
            vec![
                Token::Osc("\x1b]0;t"),
                Token::Sequence(
                    EscapeSequence {
                        params: vec![1],
                        final_byte: 'm',
                        ..Default::default()
                    },
                    "\x1b[1m"
                ),
            ]
        );
        assert_eq!(strip_ansi("\x1b]0;t\x1bXafter"), "\x1bXafter");
    }

    #[test]
    fn test_truncated_sequence_is_partial() {
        assert_eq!(collect("ok\x1b[3"), vec![Token::Text("ok"), Token::Partial("\x1b[3")]);
        assert_eq!(strip_ansi("ok\x1b[3"), "ok\x1b[3");
    }

    #[test]
    fn test_osc_title_stripped() {
        assert_eq!(strip_ansi("\x1b]0;my title\x07prompt$ "), "prompt$ ");
        assert_eq!(strip_ansi("\x1b]2;t\x1b\\done"), "done");
    }

    #[test]
    fn test_strip_complex() {
        let text = "\x1b[1m\x1b[31mRed\x1b[0m\x1b[32mGreen\x1b[0m";
        assert_eq!(strip_ansi(text), "RedGreen");
    }

    #[test]
    fn test_strip_keeps_unicode() {
        assert_eq!(strip_ansi("\x1b[1mこんにちは\x1b[0m 🎉"), "こんにちは 🎉");
    }

    #[test]
    fn test_strip_idempotent_on_edge_cases() {
        for input in [
            "\x1b[31\x1b[0mm",
            "\x1b\x1b[31m[0m",
            "\x1b[",
            "\x1b]0;x",
            "\x1b]0;x\x1b[1mm",
            "\x1b[?1;2$",
        ] {
            let once = strip_ansi(input);
            assert_eq!(strip_ansi(&once), once, "input {:?}", input);
        }
    }
}
