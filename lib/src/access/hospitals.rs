//! Hospital counts per region and specialty, one listing per reporting period.
use super::regions::canonical_region;
use crate::{read_csv, util::count, ArcStr};
use chrono::{Datelike, NaiveDate};
use qu::ick_use::*;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt, fs, io,
    path::Path,
    str::FromStr,
    sync::Arc,
};

/// A reporting month, written `YYYY.MM`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Period(NaiveDate);

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Period)
            .ok_or_else(|| format_err!("{}.{:02} is not a valid month", year, month))
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }
}

impl FromStr for Period {
    type Err = Error;
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let (year, month) = input
            .split_once(&['.', '-'][..])
            .ok_or_else(|| format_err!("expected a period like `2023.03`, found \"{}\"", input))?;
        let year = year
            .parse::<i32>()
            .with_context(|| format!("bad year in period \"{}\"", input))?;
        let month = month
            .parse::<u32>()
            .with_context(|| format!("bad month in period \"{}\"", input))?;
        Period::new(year, month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y.%m"))
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s: String = Deserialize::deserialize(d)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Deserialize)]
struct HospitalRowRaw {
    #[serde(rename = "시도", alias = "region")]
    region: String,
    #[serde(rename = "진료과목", alias = "specialty")]
    specialty: ArcStr,
    #[serde(rename = "병원수", alias = "count", deserialize_with = "count")]
    count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HospitalRow {
    /// Full region name.
    pub region: ArcStr,
    pub specialty: ArcStr,
    pub count: u64,
}

/// One period's hospital listing, indexed by region.
#[derive(Debug, Clone)]
pub struct Hospitals {
    period: Period,
    rows: Arc<Vec<HospitalRow>>,
    by_region: BTreeMap<ArcStr, Vec<usize>>,
}

impl Hospitals {
    pub fn from_reader(reader: impl io::Read, period: Period, source: &str) -> Result<Self> {
        let raw: Vec<HospitalRowRaw> = read_csv(reader, source)?;
        let mut rows = Vec::with_capacity(raw.len());
        let mut by_region: BTreeMap<ArcStr, Vec<usize>> = BTreeMap::new();
        for row in raw {
            let region: ArcStr = canonical_region(&row.region).into();
            by_region.entry(region.clone()).or_default().push(rows.len());
            rows.push(HospitalRow {
                region,
                specialty: row.specialty,
                count: row.count,
            });
        }
        Ok(Self {
            period,
            rows: Arc::new(rows),
            by_region,
        })
    }

    pub fn load(path: impl AsRef<Path>, period: Period) -> Result<Self> {
        fn inner(path: &Path, period: Period) -> Result<Hospitals> {
            let reader = io::BufReader::new(fs::File::open(path)?);
            Hospitals::from_reader(reader, period, &path.display().to_string())
        }
        let path = path.as_ref();
        inner(path, period).with_context(|| {
            format!(
                "loading hospital listing for {} from \"{}\"",
                period,
                path.display()
            )
        })
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn regions(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_region.keys().map(|r| &**r)
    }

    pub fn rows_for<'a>(&'a self, region: &str) -> impl Iterator<Item = &'a HospitalRow> + 'a {
        self.by_region
            .get(canonical_region(region))
            .into_iter()
            .flatten()
            .map(move |idx| &self.rows[*idx])
    }

    /// All hospitals in the region, or `None` if the listing has no rows for it.
    pub fn total_for(&self, region: &str) -> Option<u64> {
        self.by_region.get(canonical_region(region))?;
        Some(self.rows_for(region).map(|row| row.count).sum())
    }

    /// Hospitals in the region whose specialty is one of `specialties`, or `None` if the
    /// listing has no rows for the region.
    pub fn matching(&self, region: &str, specialties: &BTreeSet<ArcStr>) -> Option<u64> {
        self.by_region.get(canonical_region(region))?;
        Some(
            self.rows_for(region)
                .filter(|row| specialties.contains(&*row.specialty))
                .map(|row| row.count)
                .sum(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::{Hospitals, Period};
    use crate::ArcStr;
    use std::collections::BTreeSet;

    const LISTING: &str = "\
시도,진료과목,병원수
서울,내과,\"1,200\"
서울,소아청소년과,300
서울특별시,이비인후과,150
부산,내과,400
부산,소아청소년과
";

    fn listing() -> Hospitals {
        Hospitals::from_reader(LISTING.as_bytes(), "2023.03".parse().unwrap(), "t").unwrap()
    }

    #[test]
    fn periods() {
        let p: Period = "2023.03".parse().unwrap();
        assert_eq!((p.year(), p.month()), (2023, 3));
        assert_eq!(p.to_string(), "2023.03");
        assert!("2023.06".parse::<Period>().unwrap() > p);
        assert!("2023.13".parse::<Period>().is_err());
        assert!("March".parse::<Period>().is_err());
    }

    #[test]
    fn totals_by_region() {
        let h = listing();
        // short and full names land on the same region
        assert_eq!(h.total_for("서울"), Some(1650));
        assert_eq!(h.total_for("서울특별시"), Some(1650));
        // the short row is skipped
        assert_eq!(h.total_for("부산"), Some(400));
        assert_eq!(h.total_for("제주"), None);
        assert_eq!(h.regions().count(), 2);
    }

    #[test]
    fn specialty_filter() {
        let h = listing();
        let wanted: BTreeSet<ArcStr> = ["소아청소년과", "이비인후과"]
            .into_iter()
            .map(ArcStr::from)
            .collect();
        assert_eq!(h.matching("서울", &wanted), Some(450));
        assert_eq!(h.matching("부산", &wanted), Some(0));
        assert_eq!(h.matching("대구", &wanted), None);
    }
}
