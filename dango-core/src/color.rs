//! Terminal color representation
//!
//! Supports:
//! - Named 16-color palette (standard ANSI colors)
//! - 256-color indexed palette
//! - 24-bit true color (RGB)
//! - X11-style colour specs (`#rrggbb`, `rgb:rr/gg/bb`, names)
//! - HLS conversion for DECCTR colour-table exchange

use serde::{Deserialize, Serialize};

/// Represents a terminal color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    /// Default foreground or background color
    Default,
    /// Named color from the 16-color palette (0-15)
    Named(NamedColor),
    /// 256-color palette index (0-255)
    Indexed(u8),
    /// 24-bit RGB color
    Rgb(Rgb),
}

impl Default for Color {
    fn default() -> Self {
        Color::Default
    }
}

impl Color {
    /// Resolve to a concrete RGB value, through the default 256-color
    /// table for named and indexed colors. `Default` has no RGB value.
    pub fn to_rgb(self) -> Option<Rgb> {
        match self {
            Color::Default => None,
            Color::Named(named) => Some(default_256_palette()[named.to_index() as usize]),
            Color::Indexed(i) => Some(default_256_palette()[i as usize]),
            Color::Rgb(rgb) => Some(rgb),
        }
    }

    /// Parse an X11-style colour specification: `#rgb`, `#rrggbb`,
    /// `rgb:RR/GG/BB` (1-4 hex digits per component), or a colour name.
    pub fn parse_x11(s: &str) -> Option<Color> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(spec) = s.strip_prefix("rgb:") {
            return parse_rgb_spec(spec);
        }
        parse_name(s)
    }
}

/// Named colors from the standard 16-color ANSI palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum NamedColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

impl NamedColor {
    /// Convert from SGR color code (30-37 for fg, 40-47 for bg)
    pub fn from_sgr_normal(code: u8) -> Option<Self> {
        match code {
            0 => Some(NamedColor::Black),
            1 => Some(NamedColor::Red),
            2 => Some(NamedColor::Green),
            3 => Some(NamedColor::Yellow),
            4 => Some(NamedColor::Blue),
            5 => Some(NamedColor::Magenta),
            6 => Some(NamedColor::Cyan),
            7 => Some(NamedColor::White),
            _ => None,
        }
    }

    /// Convert from SGR bright color code (90-97 for fg, 100-107 for bg)
    pub fn from_sgr_bright(code: u8) -> Option<Self> {
        match code {
            0 => Some(NamedColor::BrightBlack),
            1 => Some(NamedColor::BrightRed),
            2 => Some(NamedColor::BrightGreen),
            3 => Some(NamedColor::BrightYellow),
            4 => Some(NamedColor::BrightBlue),
            5 => Some(NamedColor::BrightMagenta),
            6 => Some(NamedColor::BrightCyan),
            7 => Some(NamedColor::BrightWhite),
            _ => None,
        }
    }

    pub fn is_bright(self) -> bool {
        self.to_index() >= 8
    }

    /// Get the index in the 256-color palette
    pub fn to_index(self) -> u8 {
        self as u8
    }

    pub fn from_index(i: u8) -> Option<Self> {
        if i < 8 {
            Self::from_sgr_normal(i)
        } else if i < 16 {
            Self::from_sgr_bright(i - 8)
        } else {
            None
        }
    }
}

/// 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Build from HLS as DECCTR exchanges it: hue 0..=360 degrees,
    /// lightness and saturation 0..=100 percent.
    pub fn from_hls(h: u16, l: u8, s: u8) -> Self {
        let h = f64::from(h % 360);
        let l = f64::from(l.min(100)) / 100.0;
        let s = f64::from(s.min(100)) / 100.0;

        if s == 0.0 {
            let v = (l * 255.0).round() as u8;
            return Rgb::new(v, v, v);
        }
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = l - c / 2.0;
        let (r, g, b) = match h as u32 {
            0..=59 => (c, x, 0.0),
            60..=119 => (x, c, 0.0),
            120..=179 => (0.0, c, x),
            180..=239 => (0.0, x, c),
            240..=299 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Rgb::new(
            ((r + m) * 255.0).round() as u8,
            ((g + m) * 255.0).round() as u8,
            ((b + m) * 255.0).round() as u8,
        )
    }

    /// Split into HLS, the inverse of [`Rgb::from_hls`].
    pub fn to_hls(self) -> (u16, u8, u8) {
        let r = f64::from(self.r) / 255.0;
        let g = f64::from(self.g) / 255.0;
        let b = f64::from(self.b) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let d = max - min;

        if d == 0.0 {
            return (0, (l * 100.0).round() as u8, 0);
        }
        let s = d / (1.0 - (2.0 * l - 1.0).abs());
        let h = if max == r {
            60.0 * (((g - b) / d) % 6.0)
        } else if max == g {
            60.0 * ((b - r) / d + 2.0)
        } else {
            60.0 * ((r - g) / d + 4.0)
        };
        let h = if h < 0.0 { h + 360.0 } else { h };
        (
            h.round() as u16 % 360,
            (l * 100.0).round() as u8,
            (s * 100.0).round() as u8,
        )
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let digits = hex.as_bytes();
    if !digits.iter().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
            Some(Color::Rgb(Rgb::new(r * 17, g * 17, b * 17)))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::Rgb(Rgb::new(r, g, b)))
        }
        _ => None,
    }
}

/// Parse one component of an `rgb:` spec, scaling 1-4 hex digits to 8 bits.
fn parse_rgb_component(s: &str) -> Option<u8> {
    if s.is_empty() || s.len() > 4 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let v = u32::from_str_radix(s, 16).ok()?;
    let max = (1u32 << (4 * s.len() as u32)) - 1;
    Some((v * 255 / max) as u8)
}

fn parse_rgb_spec(spec: &str) -> Option<Color> {
    let mut parts = spec.split('/');
    let r = parse_rgb_component(parts.next()?)?;
    let g = parse_rgb_component(parts.next()?)?;
    let b = parse_rgb_component(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(Color::Rgb(Rgb::new(r, g, b)))
}

fn parse_name(s: &str) -> Option<Color> {
    let name = s.to_ascii_lowercase();
    let named = match name.as_str() {
        "black" => NamedColor::Black,
        "red" => NamedColor::Red,
        "green" => NamedColor::Green,
        "yellow" => NamedColor::Yellow,
        "blue" => NamedColor::Blue,
        "magenta" => NamedColor::Magenta,
        "cyan" => NamedColor::Cyan,
        "white" => NamedColor::White,
        "brightblack" | "grey" | "gray" => NamedColor::BrightBlack,
        "brightred" => NamedColor::BrightRed,
        "brightgreen" => NamedColor::BrightGreen,
        "brightyellow" => NamedColor::BrightYellow,
        "brightblue" => NamedColor::BrightBlue,
        "brightmagenta" => NamedColor::BrightMagenta,
        "brightcyan" => NamedColor::BrightCyan,
        "brightwhite" => NamedColor::BrightWhite,
        _ => {
            // "colourN" / "colorN" index the 256-color palette.
            let idx = name
                .strip_prefix("colour")
                .or_else(|| name.strip_prefix("color"))?;
            let idx = idx.parse::<u16>().ok()?;
            if idx > 255 {
                return None;
            }
            return Some(Color::Indexed(idx as u8));
        }
    };
    Some(Color::Named(named))
}

/// Default color palette for 256-color mode
/// Colors 0-15: Standard ANSI colors
/// Colors 16-231: 6x6x6 color cube
/// Colors 232-255: Grayscale ramp
pub fn default_256_palette() -> [Rgb; 256] {
    let mut palette = [Rgb::new(0, 0, 0); 256];

    // Standard colors (0-7)
    palette[0] = Rgb::new(0, 0, 0);
    palette[1] = Rgb::new(205, 0, 0);
    palette[2] = Rgb::new(0, 205, 0);
    palette[3] = Rgb::new(205, 205, 0);
    palette[4] = Rgb::new(0, 0, 238);
    palette[5] = Rgb::new(205, 0, 205);
    palette[6] = Rgb::new(0, 205, 205);
    palette[7] = Rgb::new(229, 229, 229);

    // Bright colors (8-15)
    palette[8] = Rgb::new(127, 127, 127);
    palette[9] = Rgb::new(255, 0, 0);
    palette[10] = Rgb::new(0, 255, 0);
    palette[11] = Rgb::new(255, 255, 0);
    palette[12] = Rgb::new(92, 92, 255);
    palette[13] = Rgb::new(255, 0, 255);
    palette[14] = Rgb::new(0, 255, 255);
    palette[15] = Rgb::new(255, 255, 255);

    // 6x6x6 color cube (16-231)
    let cube_values = [0u8, 95, 135, 175, 215, 255];
    for r in 0..6 {
        for g in 0..6 {
            for b in 0..6 {
                let index = 16 + r * 36 + g * 6 + b;
                palette[index] = Rgb::new(cube_values[r], cube_values[g], cube_values[b]);
            }
        }
    }

    // Grayscale ramp (232-255)
    for i in 0..24 {
        let gray = (i * 10 + 8) as u8;
        palette[232 + i] = Rgb::new(gray, gray, gray);
    }

    palette
}
