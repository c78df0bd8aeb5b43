//! Text attribute state
//!
//! Running SGR state (colors + flags) and its spoken description.

use std::fmt;

use bitflags::bitflags;

/// Terminal color as announced to the user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
    /// 256-color palette entry (38;5;n / 48;5;n)
    Indexed(u8),
    Rgb(u8, u8, u8),
}

impl Color {
    const BASE: [Color; 8] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::White,
    ];

    const BRIGHT: [Color; 8] = [
        Color::BrightBlack,
        Color::BrightRed,
        Color::BrightGreen,
        Color::BrightYellow,
        Color::BrightBlue,
        Color::BrightMagenta,
        Color::BrightCyan,
        Color::BrightWhite,
    ];

    /// Named color for an offset 0..=7 within an SGR color range
    pub fn named(offset: u16) -> Option<Self> {
        Self::BASE.get(offset as usize).copied()
    }

    pub fn bright(offset: u16) -> Option<Self> {
        Self::BRIGHT.get(offset as usize).copied()
    }

    /// Palette index, folding the first 16 entries back onto named colors
    pub fn from_index(n: u8) -> Self {
        match n {
            0..=7 => Self::BASE[n as usize],
            8..=15 => Self::BRIGHT[(n - 8) as usize],
            _ => Color::Indexed(n),
        }
    }

    /// Human-readable color name
    pub fn name(&self) -> String {
        match self {
            Color::Black => "black".into(),
            Color::Red => "red".into(),
            Color::Green => "green".into(),
            Color::Yellow => "yellow".into(),
            Color::Blue => "blue".into(),
            Color::Magenta => "magenta".into(),
            Color::Cyan => "cyan".into(),
            Color::White => "white".into(),
            Color::BrightBlack => "bright black".into(),
            Color::BrightRed => "bright red".into(),
            Color::BrightGreen => "bright green".into(),
            Color::BrightYellow => "bright yellow".into(),
            Color::BrightBlue => "bright blue".into(),
            Color::BrightMagenta => "bright magenta".into(),
            Color::BrightCyan => "bright cyan".into(),
            Color::BrightWhite => "bright white".into(),
            Color::Indexed(n) => format!("color {}", n),
            Color::Rgb(r, g, b) => format!("rgb {} {} {}", r, g, b),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl PartialEq<&str> for Color {
    fn eq(&self, other: &&str) -> bool {
        self.name() == *other
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AttrFlags: u16 {
        const BOLD          = 0b0000_0000_0001;
        const DIM           = 0b0000_0000_0010;
        const ITALIC        = 0b0000_0000_0100;
        const UNDERLINE     = 0b0000_0000_1000;
        const BLINK         = 0b0000_0001_0000;
        const REVERSE       = 0b0000_0010_0000;
        const CONCEAL       = 0b0000_0100_0000;
        const STRIKETHROUGH = 0b0000_1000_0000;
    }
}

/// Flag names in announcement order
const FLAG_NAMES: [(AttrFlags, &str); 8] = [
    (AttrFlags::BOLD, "bold"),
    (AttrFlags::DIM, "dim"),
    (AttrFlags::ITALIC, "italic"),
    (AttrFlags::UNDERLINE, "underline"),
    (AttrFlags::BLINK, "blink"),
    (AttrFlags::REVERSE, "reverse"),
    (AttrFlags::CONCEAL, "conceal"),
    (AttrFlags::STRIKETHROUGH, "strikethrough"),
];

/// How much of the style state to put into words
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeFormat {
    /// `bold red on blue`
    Brief,
    /// `bold, underline, red foreground, blue background`
    #[default]
    Detailed,
}

/// Text attributes accumulated from SGR sequences.
///
/// `None` colors mean "not overridden"; the reset-to-default codes (39/49)
/// put a color back to `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StyleState {
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub flags: AttrFlags,
}

impl StyleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn bold(&self) -> bool {
        self.flags.contains(AttrFlags::BOLD)
    }

    pub fn dim(&self) -> bool {
        self.flags.contains(AttrFlags::DIM)
    }

    pub fn italic(&self) -> bool {
        self.flags.contains(AttrFlags::ITALIC)
    }

    pub fn underline(&self) -> bool {
        self.flags.contains(AttrFlags::UNDERLINE)
    }

    pub fn blink(&self) -> bool {
        self.flags.contains(AttrFlags::BLINK)
    }

    pub fn reverse(&self) -> bool {
        self.flags.contains(AttrFlags::REVERSE)
    }

    pub fn conceal(&self) -> bool {
        self.flags.contains(AttrFlags::CONCEAL)
    }

    pub fn strikethrough(&self) -> bool {
        self.flags.contains(AttrFlags::STRIKETHROUGH)
    }

    /// Apply the parameters of one SGR sequence, left to right.
    ///
    /// An empty list is a full reset. Unknown codes are ignored.
    pub fn apply_sgr(&mut self, params: &[u16]) {
        if params.is_empty() {
            self.reset();
            return;
        }

        let mut iter = params.iter().copied();

        while let Some(param) = iter.next() {
            match param {
                0 => self.reset(),
                1 => self.flags |= AttrFlags::BOLD,
                2 => self.flags |= AttrFlags::DIM,
                3 => self.flags |= AttrFlags::ITALIC,
                4 => self.flags |= AttrFlags::UNDERLINE,
                5 => self.flags |= AttrFlags::BLINK,
                7 => self.flags |= AttrFlags::REVERSE,
                8 => self.flags |= AttrFlags::CONCEAL,
                9 => self.flags |= AttrFlags::STRIKETHROUGH,

                22 => self.flags &= !(AttrFlags::BOLD | AttrFlags::DIM),
                23 => self.flags &= !AttrFlags::ITALIC,
                24 => self.flags &= !AttrFlags::UNDERLINE,
                25 => self.flags &= !AttrFlags::BLINK,
                27 => self.flags &= !AttrFlags::REVERSE,
                28 => self.flags &= !AttrFlags::CONCEAL,
                29 => self.flags &= !AttrFlags::STRIKETHROUGH,

                30..=37 => self.foreground = Color::named(param - 30),
                38 => {
                    if let Some(color) = extended_color(&mut iter) {
                        self.foreground = Some(color);
                    }
                }
                39 => self.foreground = None,

                40..=47 => self.background = Color::named(param - 40),
                48 => {
                    if let Some(color) = extended_color(&mut iter) {
                        self.background = Some(color);
                    }
                }
                49 => self.background = None,

                90..=97 => self.foreground = Color::bright(param - 90),
                100..=107 => self.background = Color::bright(param - 100),

                _ => tracing::trace!(code = param, "ignoring unknown SGR code"),
            }
        }
    }

    /// Describe the current attributes. Empty when nothing is set.
    pub fn describe(&self, format: AttributeFormat) -> String {
        let flags = FLAG_NAMES
            .iter()
            .filter(|(flag, _)| self.flags.contains(*flag))
            .map(|(_, name)| *name);

        match format {
            AttributeFormat::Detailed => {
                let mut parts: Vec<String> = flags.map(String::from).collect();
                if let Some(fg) = self.foreground {
                    parts.push(format!("{} foreground", fg));
                }
                if let Some(bg) = self.background {
                    parts.push(format!("{} background", bg));
                }
                parts.join(", ")
            }
            AttributeFormat::Brief => {
                let mut parts: Vec<String> = flags.map(String::from).collect();
                match (self.foreground, self.background) {
                    (Some(fg), Some(bg)) => parts.push(format!("{} on {}", fg, bg)),
                    (Some(fg), None) => parts.push(fg.name()),
                    (None, Some(bg)) => parts.push(format!("on {}", bg)),
                    (None, None) => {}
                }
                parts.join(" ")
            }
        }
    }
}

/// Read the sub-parameters of a 38/48 extended color.
///
/// Malformed forms still consume what they read so the remaining
/// parameters are never mistaken for flags.
fn extended_color(iter: &mut impl Iterator<Item = u16>) -> Option<Color> {
    match iter.next()? {
        5 => {
            let n = iter.next()?;
            u8::try_from(n).ok().map(Color::from_index)
        }
        2 => {
            let r = u8::try_from(iter.next()?).ok();
            let g = u8::try_from(iter.next()?).ok();
            let b = u8::try_from(iter.next()?).ok();
            Some(Color::Rgb(r?, g?, b?))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_parameters() {
        let mut style = StyleState::new();
        style.apply_sgr(&[1, 31, 4]);

        assert!(style.bold());
        assert!(style.underline());
        assert_eq!(style.foreground, Some(Color::Red));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut style = StyleState::new();
        style.apply_sgr(&[1, 3, 4, 5, 7, 8, 9, 31, 41]);
        style.apply_sgr(&[0]);

        assert!(style.is_default());
    }

    #[test]
    fn test_default_colors_unset() {
        let mut style = StyleState::new();
        style.apply_sgr(&[31, 41]);
        style.apply_sgr(&[39, 49]);

        assert_eq!(style.foreground, None);
        assert_eq!(style.background, None);
    }

    #[test]
    fn test_off_codes() {
        let mut style = StyleState::new();
        style.apply_sgr(&[1, 2, 3, 4, 5, 7, 8, 9]);
        style.apply_sgr(&[22, 23, 24, 25, 27, 28, 29]);

        assert!(style.flags.is_empty());
    }

    #[test]
    fn test_unknown_code_is_noop() {
        let mut style = StyleState::new();
        style.apply_sgr(&[1, 32]);
        let before = style;
        style.apply_sgr(&[999]);

        assert_eq!(style, before);
    }

    #[test]
    fn test_extended_colors_consume_arguments() {
        let mut style = StyleState::new();
        // 38;5;1 must not turn on blink (5) or bold (1)
        style.apply_sgr(&[38, 5, 1, 48, 2, 10, 20, 30]);

        assert_eq!(style.foreground, Some(Color::Red));
        assert_eq!(style.background, Some(Color::Rgb(10, 20, 30)));
        assert!(style.flags.is_empty());

        style.apply_sgr(&[38, 5, 208]);
        assert_eq!(style.foreground, Some(Color::Indexed(208)));
    }

    #[test]
    fn test_bright_colors() {
        let mut style = StyleState::new();
        style.apply_sgr(&[94, 101]);

        assert_eq!(style.foreground.map(|c| c.name()).as_deref(), Some("bright blue"));
        assert_eq!(style.background, Some(Color::BrightRed));
    }

    #[test]
    fn test_describe_detailed() {
        let mut style = StyleState::new();
        style.apply_sgr(&[1, 4, 31, 44]);

        assert_eq!(
            style.describe(AttributeFormat::Detailed),
            "bold, underline, red foreground, blue background"
        );
    }

    #[test]
    fn test_describe_brief() {
        let mut style = StyleState::new();
        style.apply_sgr(&[1, 31, 44]);
        assert_eq!(style.describe(AttributeFormat::Brief), "bold red on blue");

        style.apply_sgr(&[0, 42]);
        assert_eq!(style.describe(AttributeFormat::Brief), "on green");
    }

    #[test]
    fn test_describe_default_is_empty() {
        let style = StyleState::new();
        assert!(style.describe(AttributeFormat::Detailed).is_empty());
        assert!(style.describe(AttributeFormat::Brief).is_empty());
    }

    #[test]
    fn test_color_compares_with_name() {
        assert!(Color::Red == "red");
        assert!(Color::Indexed(200) == "color 200");
    }
}
