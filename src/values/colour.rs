//! RGB colours and the named-colour table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque RGB colour.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Colour {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Colour { r, g, b }
    }

    /// Packed `0xRRGGBB` integer.
    pub fn to_rgb(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }

    /// Unpack a `0xRRGGBB` integer. Values outside 24 bits are rejected.
    pub fn from_rgb(rgb: i64) -> Option<Self> {
        if !(0..=0xFF_FFFF).contains(&rgb) {
            return None;
        }
        let rgb = rgb as u32;
        Some(Colour::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8))
    }

    /// `#RRGGBB` rendering.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parse a colour name or a `#RRGGBB` literal.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(c) = Self::named(s) {
            return Some(c);
        }
        let digits = s.strip_prefix('#')?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let rgb = u32::from_str_radix(digits, 16).ok()?;
        Self::from_rgb(i64::from(rgb))
    }

    /// Look up a colour by name, ignoring case, spaces and underscores.
    pub fn named(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        NAMED_COLOURS
            .iter()
            .find(|(n, _)| *n == key)
            .and_then(|(_, rgb)| Self::from_rgb(i64::from(*rgb)))
    }
}

impl fmt::Debug for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Colour({})", self.to_hex())
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

const NAMED_COLOURS: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("white", 0xFFFFFF),
    ("red", 0xFF0000),
    ("green", 0x008000),
    ("lime", 0x00FF00),
    ("blue", 0x0000FF),
    ("yellow", 0xFFFF00),
    ("cyan", 0x00FFFF),
    ("aqua", 0x00FFFF),
    ("magenta", 0xFF00FF),
    ("fuchsia", 0xFF00FF),
    ("gray", 0x808080),
    ("grey", 0x808080),
    ("darkgray", 0xA9A9A9),
    ("darkgrey", 0xA9A9A9),
    ("lightgray", 0xD3D3D3),
    ("lightgrey", 0xD3D3D3),
    ("silver", 0xC0C0C0),
    ("maroon", 0x800000),
    ("olive", 0x808000),
    ("navy", 0x000080),
    ("purple", 0x800080),
    ("teal", 0x008080),
    ("orange", 0xFFA500),
    ("pink", 0xFFC0CB),
    ("brown", 0xA52A2A),
    ("gold", 0xFFD700),
    ("violet", 0xEE82EE),
    ("indigo", 0x4B0082),
    ("darkred", 0x8B0000),
    ("darkgreen", 0x006400),
    ("darkblue", 0x00008B),
    ("lightblue", 0xADD8E6),
    ("lightgreen", 0x90EE90),
    ("skyblue", 0x87CEEB),
    ("salmon", 0xFA8072),
    ("turquoise", 0x40E0D0),
    ("beige", 0xF5F5DC),
];
