use proptest::prelude::*;
use termaccess::core::term::{strip_ansi, AnsiParser, AttributeFormat, Color, StyleState};

fn sgr(params: &[u16]) -> String {
    let joined: Vec<String> = params.iter().map(|p| p.to_string()).collect();
    format!("\x1b[{}m", joined.join(";"))
}

fn sgr_code() -> impl Strategy<Value = u16> {
    prop_oneof![
        Just(0u16),
        1u16..=9,
        21u16..=29,
        30u16..=37,
        Just(39u16),
        40u16..=47,
        Just(49u16),
        90u16..=97,
        100u16..=107,
        any::<u16>(),
    ]
}

/// Whether `text` still holds a complete `ESC [ params letter` sequence
fn has_complete_csi(text: &str) -> bool {
    text.match_indices("\x1b[").any(|(at, _)| {
        let tail = &text[at + 2..];
        let params = tail.find(|c: char| !matches!(c, '0'..='9' | ';' | ':')).unwrap_or(tail.len());
        tail[params..].starts_with(|c: char| c.is_ascii_alphabetic())
    })
}

fn mixed_piece() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::collection::vec(sgr_code(), 0..4).prop_map(|codes| sgr(&codes)),
        Just("\x1b".to_string()),
        Just("\x1b[31".to_string()),
        Just("\x1b[1$".to_string()),
        Just("\x1b]0;title".to_string()),
        Just("\x1b]2;t\x07".to_string()),
        "[a-z;0-9\\[m ]{0,4}",
    ]
}

proptest! {
    #[test]
    fn strip_leaves_no_complete_sequence(pieces in prop::collection::vec(mixed_piece(), 0..10)) {
        let input = pieces.concat();
        let stripped = strip_ansi(&input);
        prop_assert!(!has_complete_csi(&stripped), "{:?} -> {:?}", input, stripped);
        prop_assert_eq!(strip_ansi(&stripped), stripped);
    }

    #[test]
    fn strip_is_idempotent(text in "[a-z0-9;:?\\[\\]\\\\m$ \\x1b\\x07\\n]{0,48}") {
        let once = strip_ansi(&text);
        prop_assert_eq!(strip_ansi(&once), once);
    }

    #[test]
    fn strip_without_escape_is_identity(text in "[^\\x1b]{0,64}") {
        prop_assert_eq!(strip_ansi(&text), text);
    }

    #[test]
    fn chunked_parse_matches_whole(chunks in prop::collection::vec((prop::collection::vec(sgr_code(), 0..4), "[a-z ]{0,6}"), 0..8)) {
        let pieces: Vec<String> = chunks.iter().map(|(codes, text)| format!("{}{}", sgr(codes), text)).collect();

        let mut whole = AnsiParser::new();
        let expected = whole.parse(&pieces.concat());

        let mut chunked = AnsiParser::new();
        for piece in &pieces {
            chunked.parse(piece);
        }
        prop_assert_eq!(*chunked.style(), expected);
    }

    #[test]
    fn reset_clears_any_state(codes in prop::collection::vec(sgr_code(), 0..12)) {
        let mut parser = AnsiParser::new();
        parser.parse(&sgr(&codes));
        let state = parser.parse("\x1b[0m");
        prop_assert!(state.is_default());
        prop_assert_eq!(parser.format_attributes(AttributeFormat::Detailed), "");
    }

    #[test]
    fn streaming_split_matches_whole(codes in prop::collection::vec(sgr_code(), 1..6), split in 0usize..64) {
        let input = format!("ab{}cd{}ef", sgr(&codes), sgr(&[1, 4]));
        let split = split.min(input.len());
        let (head, tail) = input.split_at(split);

        let mut whole = AnsiParser::new();
        let expected = whole.parse(&input);

        let mut streaming = AnsiParser::streaming();
        streaming.parse(head);
        prop_assert_eq!(streaming.parse(tail), expected);
        prop_assert!(streaming.pending().is_empty());
    }
}

#[test]
fn error_line_then_reset() {
    let mut parser = AnsiParser::new();
    let state = parser.parse("\x1b[1;31mError:\x1b[0m file not found");
    assert_eq!(state, StyleState::new());
    assert_eq!(AnsiParser::strip_ansi("\x1b[1;31mError:\x1b[0m file not found"), "Error: file not found");
}

#[test]
fn unrecognized_code_keeps_previous_state() {
    let mut parser = AnsiParser::new();
    parser.parse("\x1b[3;44m");
    let state = parser.parse("\x1b[999mInvalid code");
    assert!(state.italic());
    assert_eq!(state.background, Some(Color::Blue));
}

#[test]
fn extended_colors_do_not_leak_flags() {
    let mut parser = AnsiParser::new();
    // 5 and 1 here are color sub-parameters, not blink and bold
    let state = parser.parse("\x1b[38;5;1;48;2;1;5;7m");
    assert!(!state.bold());
    assert!(!state.blink());
    assert!(!state.reverse());
    assert_eq!(state.foreground, Some(Color::from_index(1)));
    assert_eq!(state.background, Some(Color::Rgb(1, 5, 7)));
}

#[test]
fn brief_and_detailed_formats() {
    let mut parser = AnsiParser::new();
    parser.parse("\x1b[1;31;44m");
    assert_eq!(parser.format_attributes(AttributeFormat::Detailed), "bold, red foreground, blue background");
    assert_eq!(parser.format_attributes(AttributeFormat::Brief), "bold red on blue");
}
