//! Per-age-bucket disease incidence tables.
use crate::{
    read_csv,
    util::{count, opt_percentage, round2},
    AgeBucket, ArcStr, Sex,
};
use qu::ick_use::*;
use serde::{Deserialize, Serialize};
use std::{fs, io, ops::Deref, path::Path, sync::Arc};

#[derive(Debug, Clone, Deserialize)]
struct DiseaseRowRaw {
    #[serde(rename = "항목", alias = "name")]
    name: ArcStr,
    #[serde(rename = "남", alias = "male", deserialize_with = "count")]
    male_count: u64,
    #[serde(rename = "여", alias = "female", deserialize_with = "count")]
    female_count: u64,
    #[serde(rename = "총", alias = "total", deserialize_with = "count")]
    total: u64,
    #[serde(
        rename = "비율",
        alias = "percentage",
        default,
        deserialize_with = "opt_percentage"
    )]
    percentage: Option<f64>,
}

/// A row in a disease table.
///
/// `total` is taken from the file as-is; it is not required to equal `male_count +
/// female_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseRow {
    pub name: ArcStr,
    pub male_count: u64,
    pub female_count: u64,
    pub total: u64,
    /// Share of the table in percent, rounded to 2 decimal places.
    pub percentage: f64,
}

impl DiseaseRow {
    pub fn count(&self, sex: Sex) -> u64 {
        match sex {
            Sex::Male => self.male_count,
            Sex::Female => self.female_count,
        }
    }
}

/// The parsed disease table for one age bucket.
///
/// Rows are kept in file order and shared, so rankings built from the same table point at the
/// same rows.
#[derive(Debug, Clone)]
pub struct DiseaseTable {
    bucket: AgeBucket,
    rows: Arc<Vec<Arc<DiseaseRow>>>,
}

impl DiseaseTable {
    pub fn from_reader(reader: impl io::Read, bucket: AgeBucket, source: &str) -> Result<Self> {
        let raw: Vec<DiseaseRowRaw> = read_csv(reader, source)?;
        Ok(Self::from_raw(raw, bucket))
    }

    pub fn load(path: impl AsRef<Path>, bucket: AgeBucket) -> Result<Self> {
        fn inner(path: &Path, bucket: AgeBucket) -> Result<DiseaseTable> {
            let reader = io::BufReader::new(fs::File::open(path)?);
            DiseaseTable::from_reader(reader, bucket, &path.display().to_string())
        }
        let path = path.as_ref();
        inner(path, bucket).with_context(|| {
            format!(
                "loading disease table for {} from \"{}\"",
                bucket.label(),
                path.display()
            )
        })
    }

    /// A table with no rows, for buckets whose data isn't available.
    pub fn empty(bucket: AgeBucket) -> Self {
        Self {
            bucket,
            rows: Arc::new(vec![]),
        }
    }

    pub fn bucket(&self) -> AgeBucket {
        self.bucket
    }

    /// Iterate over shared handles to the rows, in file order.
    pub fn shared_rows(&self) -> impl Iterator<Item = &Arc<DiseaseRow>> + '_ {
        self.rows.iter()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&DiseaseRow> {
        self.iter().find(|row| &*row.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiseaseRow> + '_ {
        self.rows.iter().map(|row| &**row)
    }

    fn from_raw(raw: Vec<DiseaseRowRaw>, bucket: AgeBucket) -> Self {
        // only needed when some rows have no percentage in the file.
        let grand_total = raw.iter().fold(0u64, |acc, row| acc.saturating_add(row.total));
        let rows = raw
            .into_iter()
            .map(|row| {
                let percentage = match row.percentage {
                    Some(pct) => round2(pct),
                    None if grand_total == 0 => 0.,
                    None => round2(row.total as f64 / grand_total as f64 * 100.),
                };
                Arc::new(DiseaseRow {
                    name: row.name,
                    male_count: row.male_count,
                    female_count: row.female_count,
                    total: row.total,
                    percentage,
                })
            })
            .collect();
        Self {
            bucket,
            rows: Arc::new(rows),
        }
    }
}

impl Deref for DiseaseTable {
    type Target = [Arc<DiseaseRow>];
    fn deref(&self) -> &Self::Target {
        &self.rows
    }
}

#[cfg(test)]
mod test {
    use super::DiseaseTable;
    use crate::AgeBucket;

    const TABLE: &str = "\
항목,남,여,총,비율
급성 기관지염,\"1,200\",1000,2300,23.456
알레르기성 비염,900,1100,2000,20
감기,700,,700,7
";

    #[test]
    fn parse_korean_headers() {
        let table = DiseaseTable::from_reader(TABLE.as_bytes(), AgeBucket::Infants, "t").unwrap();
        // the row with an empty female count is malformed and skipped
        assert_eq!(table.len(), 2);
        let first = &table[0];
        assert_eq!(&*first.name, "급성 기관지염");
        assert_eq!(first.male_count, 1200);
        assert_eq!(first.female_count, 1000);
        // passed through, not recomputed from male + female
        assert_eq!(first.total, 2300);
        assert_eq!(first.percentage, 23.46);
        assert_eq!(table.bucket(), AgeBucket::Infants);
    }

    #[test]
    fn short_rows_are_skipped() {
        let input = "name,male,female,total,percentage\na,1,2,3,1\nb,1,2\nc,5,5,10,2\n";
        let table = DiseaseTable::from_reader(input.as_bytes(), AgeBucket::Seniors, "t").unwrap();
        let names = table.iter().map(|r| &*r.name).collect::<Vec<_>>();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn out_of_range_percentages_are_skipped() {
        let input = "name,male,female,total,percentage\na,1,2,3,100\nb,1,2,3,100.5\nc,1,2,3,-1\nd,1,2,3,0%\n";
        let table = DiseaseTable::from_reader(input.as_bytes(), AgeBucket::Seniors, "t").unwrap();
        let names = table.iter().map(|r| &*r.name).collect::<Vec<_>>();
        assert_eq!(names, ["a", "d"]);
    }

    #[test]
    fn derived_percentage() {
        let input = "name,male,female,total\na,1,2,30\nb,4,5,10\n";
        let table = DiseaseTable::from_reader(input.as_bytes(), AgeBucket::Seniors, "t").unwrap();
        assert_eq!(table[0].percentage, 75.0);
        assert_eq!(table[1].percentage, 25.0);
        assert_eq!(table.find_by_name("b").map(|r| r.total), Some(10));
    }

    #[test]
    fn missing_file() {
        assert!(DiseaseTable::load("/nonexistent/infants.csv", AgeBucket::Infants).is_err());
    }
}
