//! Demographic age groups.
//!
//! Disease tables are published per life stage ([`AgeBucket`]), while population counts are
//! published per 10-year bracket ([`AgeBracket`]). Every bracket belongs to exactly one life
//! stage.
use crate::Range;
use qu::ick_use::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// One of the five life stages a disease table is published for.
///
/// Ordering is youngest first.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgeBucket {
    Infants,
    Adolescents,
    YoungAdults,
    MiddleAged,
    Seniors,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 5] = [
        AgeBucket::Infants,
        AgeBucket::Adolescents,
        AgeBucket::YoungAdults,
        AgeBucket::MiddleAged,
        AgeBucket::Seniors,
    ];

    /// A human-readable label for the bucket.
    pub fn label(self) -> &'static str {
        use AgeBucket::*;
        match self {
            Infants => "Infants",
            Adolescents => "Adolescents",
            YoungAdults => "Young adults",
            MiddleAged => "Middle-aged",
            Seniors => "Seniors",
        }
    }

    /// The label used on the published tables and as the Sankey node name.
    pub fn korean_label(self) -> &'static str {
        use AgeBucket::*;
        match self {
            Infants => "유아",
            Adolescents => "청소년",
            YoungAdults => "청년",
            MiddleAged => "중년",
            Seniors => "노년",
        }
    }

    /// Short key, also the stem of the default asset file.
    pub fn code(self) -> &'static str {
        use AgeBucket::*;
        match self {
            Infants => "infants",
            Adolescents => "adolescents",
            YoungAdults => "young",
            MiddleAged => "middle",
            Seniors => "seniors",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.csv", self.code())
    }

    pub fn ages(self) -> Range<u16> {
        use AgeBucket::*;
        match self {
            Infants => Range::new_unchecked(0, Some(10)),
            Adolescents => Range::new_unchecked(10, Some(20)),
            YoungAdults => Range::new_unchecked(20, Some(40)),
            MiddleAged => Range::new_unchecked(40, Some(60)),
            Seniors => Range::new_unchecked(60, None),
        }
    }

    /// Position on the bucket slider.
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|b| *b == self)
            .unwrap_or_default()
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn for_age(age: u16) -> Self {
        Self::ALL
            .into_iter()
            .find(|b| b.ages().contains(&age))
            .unwrap_or(AgeBucket::Seniors)
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.korean_label(), self.ages())
    }
}

impl FromStr for AgeBucket {
    type Err = Error;
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        Self::ALL
            .into_iter()
            .find(|b| {
                input.eq_ignore_ascii_case(b.code())
                    || input.eq_ignore_ascii_case(b.label())
                    || input == b.korean_label()
                    || input == b.to_string()
            })
            .or_else(|| match input.to_ascii_lowercase().as_str() {
                "young-adults" | "young_adults" => Some(AgeBucket::YoungAdults),
                "middle-aged" | "middle_aged" => Some(AgeBucket::MiddleAged),
                _ => None,
            })
            .ok_or_else(|| format_err!("didn't recognise age bucket \"{}\"", input))
    }
}

/// The 10-year brackets used by the population tables.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum AgeBracket {
    #[serde(rename = "0~9세")]
    Age0To9,
    #[serde(rename = "10~19세")]
    Age10To19,
    #[serde(rename = "20~29세")]
    Age20To29,
    #[serde(rename = "30~39세")]
    Age30To39,
    #[serde(rename = "40~49세")]
    Age40To49,
    #[serde(rename = "50~59세")]
    Age50To59,
    #[serde(rename = "60~69세")]
    Age60To69,
    #[serde(rename = "70~79세")]
    Age70To79,
    #[serde(rename = "80~89세")]
    Age80To89,
    #[serde(rename = "90~99세")]
    Age90To99,
    #[serde(rename = "100세 이상")]
    Age100Plus,
}

impl AgeBracket {
    pub const ALL: [AgeBracket; 11] = [
        AgeBracket::Age0To9,
        AgeBracket::Age10To19,
        AgeBracket::Age20To29,
        AgeBracket::Age30To39,
        AgeBracket::Age40To49,
        AgeBracket::Age50To59,
        AgeBracket::Age60To69,
        AgeBracket::Age70To79,
        AgeBracket::Age80To89,
        AgeBracket::Age90To99,
        AgeBracket::Age100Plus,
    ];

    /// The column header used in the population table.
    pub fn label(self) -> &'static str {
        use AgeBracket::*;
        match self {
            Age0To9 => "0~9세",
            Age10To19 => "10~19세",
            Age20To29 => "20~29세",
            Age30To39 => "30~39세",
            Age40To49 => "40~49세",
            Age50To59 => "50~59세",
            Age60To69 => "60~69세",
            Age70To79 => "70~79세",
            Age80To89 => "80~89세",
            Age90To99 => "90~99세",
            Age100Plus => "100세 이상",
        }
    }

    pub fn ages(self) -> Range<u16> {
        let start = self.index() as u16 * 10;
        if matches!(self, AgeBracket::Age100Plus) {
            Range::new_unchecked(start, None)
        } else {
            Range::new_unchecked(start, Some(start + 10))
        }
    }

    /// The life stage this bracket is counted under.
    pub fn bucket(self) -> AgeBucket {
        AgeBucket::for_age(*self.ages().start())
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|b| *b == self)
            .unwrap_or_default()
    }

    pub fn for_age(age: u16) -> Self {
        Self::ALL
            .into_iter()
            .find(|b| b.ages().contains(&age))
            .unwrap_or(AgeBracket::Age100Plus)
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeBracket {
    type Err = Error;
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        Self::ALL
            .into_iter()
            .find(|b| input == b.label() || input == b.ages().to_string())
            .or_else(|| match input {
                "100" | "100 이상" => Some(AgeBracket::Age100Plus),
                _ => None,
            })
            .ok_or_else(|| format_err!("didn't recognise age bracket \"{}\"", input))
    }
}

#[cfg(test)]
mod test {
    use super::{AgeBracket, AgeBucket};

    #[test]
    fn bucket_keys() {
        for bucket in AgeBucket::ALL {
            assert_eq!(bucket.code().parse::<AgeBucket>().unwrap(), bucket);
            assert_eq!(bucket.korean_label().parse::<AgeBucket>().unwrap(), bucket);
            assert_eq!(bucket.to_string().parse::<AgeBucket>().unwrap(), bucket);
            assert_eq!(AgeBucket::from_index(bucket.index()), Some(bucket));
        }
        assert_eq!("young".parse::<AgeBucket>().unwrap(), AgeBucket::YoungAdults);
        assert_eq!(AgeBucket::Seniors.to_string(), "노년(60+)");
        assert_eq!(AgeBucket::YoungAdults.file_name(), "young.csv");
        assert!("toddlers".parse::<AgeBucket>().is_err());
    }

    #[test]
    fn brackets_map_to_buckets() {
        use AgeBracket::*;
        assert_eq!(Age0To9.bucket(), AgeBucket::Infants);
        assert_eq!(Age10To19.bucket(), AgeBucket::Adolescents);
        assert_eq!(Age30To39.bucket(), AgeBucket::YoungAdults);
        assert_eq!(Age50To59.bucket(), AgeBucket::MiddleAged);
        assert_eq!(Age100Plus.bucket(), AgeBucket::Seniors);
        assert_eq!(AgeBracket::for_age(47), Age40To49);
        assert_eq!(AgeBracket::for_age(104), Age100Plus);
        assert_eq!("20~29세".parse::<AgeBracket>().unwrap(), Age20To29);
        assert_eq!("20-29".parse::<AgeBracket>().unwrap(), Age20To29);
        assert_eq!("100+".parse::<AgeBracket>().unwrap(), Age100Plus);
    }
}
