//! Colours for the Sankey groups and the choropleth bands.
use qu::ick_use::*;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// An sRGB colour, written as `#rrggbb`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Colour for anything with no data to show.
pub const NEUTRAL: Rgb = Rgb::new(0xcc, 0xcc, 0xcc);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb` (the `#` is optional).
    pub fn from_hex(input: &str) -> Result<Self> {
        let hex = input.trim().trim_start_matches('#');
        ensure!(
            hex.is_ascii() && (hex.len() == 6 || hex.len() == 3),
            "\"{}\" is not a hex colour",
            input
        );
        let channel = |s: &str| {
            u8::from_str_radix(s, 16).with_context(|| format!("\"{}\" is not a hex colour", input))
        };
        if hex.len() == 3 {
            // #abc == #aabbcc
            let r = channel(&hex[0..1])?;
            let g = channel(&hex[1..2])?;
            let b = channel(&hex[2..3])?;
            Ok(Self::new(r * 17, g * 17, b * 17))
        } else {
            Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            ))
        }
    }

    /// Per-channel integer mean (rounded down) of `colors`, or `None` if there are none.
    pub fn blend(colors: &[Rgb]) -> Option<Rgb> {
        if colors.is_empty() {
            return None;
        }
        let n = colors.len() as u32;
        let (r, g, b) = colors.iter().fold((0u32, 0u32, 0u32), |(r, g, b), c| {
            (r + c.r as u32, g + c.g as u32, b + c.b as u32)
        });
        Some(Rgb::new((r / n) as u8, (g / n) as u8, (b / n) as u8))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::from_hex(s)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s: String = Deserialize::deserialize(d)?;
        Rgb::from_hex(&s).map_err(de::Error::custom)
    }
}

const CATEGORY10: [Rgb; 10] = [
    Rgb::new(0x1f, 0x77, 0xb4),
    Rgb::new(0xff, 0x7f, 0x0e),
    Rgb::new(0x2c, 0xa0, 0x2c),
    Rgb::new(0xd6, 0x27, 0x28),
    Rgb::new(0x94, 0x67, 0xbd),
    Rgb::new(0x8c, 0x56, 0x4b),
    Rgb::new(0xe3, 0x77, 0xc2),
    Rgb::new(0x7f, 0x7f, 0x7f),
    Rgb::new(0xbc, 0xbd, 0x22),
    Rgb::new(0x17, 0xbe, 0xcf),
];

const WARM: [Rgb; 5] = [
    Rgb::new(0xf3, 0x98, 0x21),
    Rgb::new(0xd9, 0xb6, 0x43),
    Rgb::new(0xf5, 0xf1, 0xb3),
    Rgb::new(0xbb, 0xce, 0xe2),
    Rgb::new(0x4f, 0x7b, 0xbf),
];

/// Choropleth steps, lightest (lowest scores) first.
pub const BANDS: [Rgb; 8] = [
    Rgb::new(0xff, 0xff, 0xcc),
    Rgb::new(0xff, 0xed, 0xa0),
    Rgb::new(0xfe, 0xd9, 0x76),
    Rgb::new(0xfe, 0xb2, 0x4c),
    Rgb::new(0xfd, 0x8d, 0x3c),
    Rgb::new(0xfc, 0x4e, 0x2a),
    Rgb::new(0xe3, 0x1a, 0x1c),
    Rgb::new(0xb1, 0x00, 0x26),
];

/// A fixed, ordered list of group colours.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Palette {
    #[default]
    Category10,
    Warm,
}

impl Palette {
    pub fn colors(self) -> &'static [Rgb] {
        match self {
            Palette::Category10 => &CATEGORY10,
            Palette::Warm => &WARM,
        }
    }

    /// Colour for group `idx`, cycling when there are more groups than colours.
    pub fn color(self, idx: usize) -> Rgb {
        let colors = self.colors();
        colors[idx % colors.len()]
    }
}

impl FromStr for Palette {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "category10" | "category-10" => Ok(Palette::Category10),
            "warm" => Ok(Palette::Warm),
            _ => bail!("unknown palette \"{}\" (expected category10 or warm)", s),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Palette, Rgb, NEUTRAL};

    #[test]
    fn hex() {
        assert_eq!(Rgb::from_hex("#f39821").unwrap(), Rgb::new(0xf3, 0x98, 0x21));
        assert_eq!(Rgb::from_hex("ccc").unwrap(), NEUTRAL);
        assert_eq!(NEUTRAL.to_string(), "#cccccc");
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("#gg0000").is_err());
        assert_eq!(
            serde_json::to_string(&Rgb::new(1, 2, 255)).unwrap(),
            "\"#0102ff\""
        );
    }

    #[test]
    fn blending() {
        let red = Rgb::new(255, 0, 0);
        let blue = Rgb::new(0, 0, 255);
        assert_eq!(Rgb::blend(&[red, blue]), Some(Rgb::new(127, 0, 127)));
        assert_eq!(Rgb::blend(&[red]), Some(red));
        assert_eq!(Rgb::blend(&[]), None);
    }

    #[test]
    fn palettes_cycle() {
        assert_eq!(Palette::Warm.color(5), Palette::Warm.color(0));
        assert_eq!(Palette::Category10.color(0).to_string(), "#1f77b4");
        assert_eq!("warm".parse::<Palette>().unwrap(), Palette::Warm);
    }
}
