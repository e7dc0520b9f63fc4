//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.
//!
//! Letters are coloured by their position in the alphabet, cycling through six colours.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// One Dark letter colours: green, yellow, red, blue, magenta, cyan.
const ONEDARK_LETTERS: [Color; 6] = [
    rgb(0x98C379),
    rgb(0xE5C07B),
    rgb(0xE06C75),
    rgb(0x61AFEF),
    rgb(0xC678DD),
    rgb(0x56B6C2),
];

const HIGH_CONTRAST_LETTERS: [Color; 6] = [
    rgb(0x00FF00),
    rgb(0xFFFF00),
    rgb(0xFF0000),
    rgb(0x0088FF),
    rgb(0xFF00FF),
    rgb(0x00FFFF),
];

/// Blue/orange/teal first so small alphabets never rely on red vs green.
const COLORBLIND_LETTERS: [Color; 6] = [
    rgb(0x0077BB),
    rgb(0xEE7733),
    rgb(0x009988),
    rgb(0xCC3311),
    rgb(0xEE3377),
    rgb(0xBBBB00),
];

/// btop keys tried for each letter slot, first hit wins.
const LETTER_KEYS: [&[&str]; 6] = [
    &["mem_box", "cpu_start"],
    &["title", "cpu_mid"],
    &["cpu_end", "temp_end"],
    &["cpu_box"],
    &["net_box"],
    &["hi_fg", "proc_misc"],
];

/// Letter palette and board colours.
#[derive(Debug, Clone)]
pub struct Theme {
    pub letters: [Color; 6],
    /// Board background.
    pub bg: Color,
    /// Borders.
    pub div_line: Color,
    /// Sidebar text.
    pub main_fg: Color,
    /// Titles and the cursor frame.
    pub title: Color,
    /// Empty cells and secondary text.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    pub const fn onedark_default() -> Self {
        Self {
            letters: ONEDARK_LETTERS,
            bg: rgb(0x31353F),
            div_line: rgb(0x3F444F),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xE5C07B),
            inactive_fg: rgb(0x5C6370),
        }
    }

    /// Load a btop-style theme file (`theme[key]="#RRGGBB"`), then apply `palette`.
    /// A missing path gives the One Dark defaults.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Replace letter colours for the accessibility palettes. UI colours are kept.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => self.letters = HIGH_CONTRAST_LETTERS,
            crate::Palette::Colorblind => self.letters = COLORBLIND_LETTERS,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let defaults = Self::onedark_default();
        let mut letters = defaults.letters;
        for (slot, keys) in letters.iter_mut().zip(LETTER_KEYS) {
            if let Some(color) = keys.iter().find_map(|k| get(*k)) {
                *slot = color;
            }
        }
        Self {
            letters,
            bg: get("meter_bg").unwrap_or(defaults.bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            inactive_fg: get("inactive_fg").unwrap_or(defaults.inactive_fg),
        }
    }

    /// Colour for `letter`, by its index in `alphabet`. Unknown letters use the first colour.
    pub fn letter_color(&self, letter: char, alphabet: &[char]) -> Color {
        let index = alphabet.iter().position(|&c| c == letter).unwrap_or(0);
        self.letters[index % self.letters.len()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return Err(ThemeError::InvalidHex(s.to_string()));
    }
    let (r, g, b) = if s.len() == 6 {
        let r =
            u8::from_str_radix(&s[0..2], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        let g =
            u8::from_str_radix(&s[2..4], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        let b =
            u8::from_str_radix(&s[4..6], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        (r, g, b)
    } else if s.len() == 3 {
        let r = u8::from_str_radix(&s[0..1], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        let g = u8::from_str_radix(&s[1..2], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        let b = u8::from_str_radix(&s[2..3], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        (r, g, b)
    } else {
        return Err(ThemeError::InvalidHex(s.to_string()));
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_letter_colours_cycle_through_palette() {
        let theme = Theme::default();
        let alphabet: Vec<char> = ('A'..='H').collect();
        assert_eq!(theme.letter_color('A', &alphabet), theme.letters[0]);
        assert_eq!(theme.letter_color('C', &alphabet), theme.letters[2]);
        assert_eq!(theme.letter_color('G', &alphabet), theme.letters[0]);
        assert_eq!(theme.letter_color('Z', &alphabet), theme.letters[0]);
    }

    #[test]
    fn test_palette_overrides_letters_only() {
        let mut theme = Theme::default();
        let bg = theme.bg;
        theme.apply_palette(crate::Palette::HighContrast);
        assert!(matches!(theme.letters[0], Color::Rgb(0x00, 0xFF, 0x00)));
        assert_eq!(theme.bg, bg);
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_theme_file_keys_map_to_letters() {
        let map = parse_theme_file(
            "# comment\ntheme[mem_box]='#010203'\ntheme[main_fg]=\"#ABCDEF\"\n",
        );
        let theme = Theme::from_map(&map);
        assert!(matches!(theme.letters[0], Color::Rgb(1, 2, 3)));
        assert!(matches!(theme.main_fg, Color::Rgb(0xAB, 0xCD, 0xEF)));
    }

    #[test]
    fn test_bad_hex_is_an_error() {
        assert!(matches!(parse_hex("#12"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#aé€"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("ééé"), Err(ThemeError::InvalidHex(_))));
        assert!(parse_hex("#GG0000").is_err());
    }
}
