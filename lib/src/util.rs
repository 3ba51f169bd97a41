use serde::{de, Deserialize, Deserializer};
use std::{fs, io, path::Path};

/// Converts a not found error to Ok(false)
pub fn path_exists(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) => Ok(false),
        Err(e) => Err(e),
    }
}

// Helpers for serde to parse fields with quirks.

/// Parse an integer count, allowing thousands separators (`1,234`).
pub fn count<'de, D>(d: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(d)?;
    parse_count(&s).map_err(de::Error::custom)
}

/// Parse a percentage cell in `0..=100`. Blank cells are `None`, a trailing `%` is ignored.
pub fn opt_percentage<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(d)?;
    let s = s.trim().trim_end_matches('%').trim();
    if s.is_empty() {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(v) if (0. ..=100.).contains(&v) => Ok(Some(v)),
        Ok(v) => Err(de::Error::custom(format!("invalid percentage {}", v))),
        Err(e) => Err(de::Error::custom(format!("{}", e))),
    }
}

pub fn parse_count(input: &str) -> Result<u64, String> {
    let cleaned = input
        .trim()
        .chars()
        .filter(|ch| *ch != ',')
        .collect::<String>();
    if cleaned.is_empty() {
        return Err("empty count".into());
    }
    cleaned
        .parse::<u64>()
        .map_err(|e| format!("\"{}\" is not a count: {}", input, e))
}

/// Round to 2 decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.).round() / 100.
}

pub fn header(header: &str) {
    let len = header.chars().count();
    print!("\n{}\n", header);
    for _ in 0..len {
        print!("=");
    }
    println!("\n")
}

#[cfg(test)]
mod test {
    use super::{parse_count, round2};

    #[test]
    fn counts_with_separators() {
        assert_eq!(parse_count("1,234"), Ok(1234));
        assert_eq!(parse_count(" 42 "), Ok(42));
        assert!(parse_count("").is_err());
        assert!(parse_count("-3").is_err());
        assert!(parse_count("abc").is_err());
    }

    #[test]
    fn rounding() {
        assert_eq!(round2(12.345678), 12.35);
        assert_eq!(round2(3.0), 3.0);
        assert_eq!(round2(0.004), 0.0);
    }
}
