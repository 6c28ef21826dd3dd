use std::fmt;
use std::str::FromStr;

use palette::{Hsl, IntoColor, Srgb};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// PinColor – an sRGB colour that serializes as "#RRGGBB"
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinColor(pub Srgb<u8>);

impl PinColor {
    pub const GRAY: PinColor = PinColor(Srgb::new(128, 128, 128));

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        PinColor(Srgb::new(r, g, b))
    }
}

impl fmt::Display for PinColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02X}{:02X}{:02X}",
            self.0.red, self.0.green, self.0.blue
        )
    }
}

impl FromStr for PinColor {
    type Err = palette::rgb::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Srgb::<u8>::from_str(s.trim()).map(PinColor)
    }
}

impl Serialize for PinColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PinColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// The qualitative palette pinned spectra cycle through.
const PLOTLY_COLORS: [PinColor; 10] = [
    PinColor::from_rgb(0x63, 0x6E, 0xFA),
    PinColor::from_rgb(0xEF, 0x55, 0x3B),
    PinColor::from_rgb(0x00, 0xCC, 0x96),
    PinColor::from_rgb(0xAB, 0x63, 0xFA),
    PinColor::from_rgb(0xFF, 0xA1, 0x5A),
    PinColor::from_rgb(0x19, 0xD3, 0xF3),
    PinColor::from_rgb(0xFF, 0x66, 0x92),
    PinColor::from_rgb(0xB6, 0xE8, 0x80),
    PinColor::from_rgb(0xFF, 0x97, 0xFF),
    PinColor::from_rgb(0xFE, 0xCB, 0x52),
];

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<PinColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            PinColor::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Palette – cyclic colour lookup by insertion index
// ---------------------------------------------------------------------------

/// A non-empty, cyclically indexed list of colours.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<PinColor>,
}

impl Palette {
    pub fn plotly() -> Self {
        Palette {
            colors: PLOTLY_COLORS.to_vec(),
        }
    }

    /// `n` evenly spaced hues; an empty request falls back to a single gray.
    pub fn generated(n: usize) -> Self {
        Self::from_colors(generate_palette(n))
    }

    pub fn from_colors(colors: Vec<PinColor>) -> Self {
        if colors.is_empty() {
            return Palette {
                colors: vec![PinColor::GRAY],
            };
        }
        Palette { colors }
    }

    /// Colour for the `index`-th item; wraps around once the palette is used up.
    pub fn color_at(&self, index: usize) -> PinColor {
        self.colors[index % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::plotly()
    }
}
