//! Resident population per region and 10-year age bracket.
use super::regions::canonical_region;
use crate::{checked_record, csv_headers, csv_reader, util::parse_count, AgeBracket, ArcStr};
use qu::ick_use::*;
use std::{collections::BTreeMap, fs, io, path::Path};

/// Header names accepted for the region column.
const REGION_COLUMNS: [&str; 4] = ["region", "행정기관", "시도", "행정구역"];

/// One row per region, one column per age bracket.
///
/// Columns that aren't a region or a bracket label (e.g. a precomputed total) are ignored.
/// Brackets missing from the header are treated as unknown, not zero.
#[derive(Debug, Clone, Default)]
pub struct Population {
    brackets: Vec<AgeBracket>,
    by_region: BTreeMap<ArcStr, BTreeMap<AgeBracket, u64>>,
}

impl Population {
    pub fn from_reader(reader: impl io::Read, source: &str) -> Result<Self> {
        let mut rdr = csv_reader(reader);
        let headers = csv_headers(&mut rdr, source)?;
        let region_col = headers
            .iter()
            .position(|h| REGION_COLUMNS.iter().any(|c| h.eq_ignore_ascii_case(c)))
            .ok_or_else(|| {
                format_err!(
                    "\"{}\" has no region column (expected one of {})",
                    source,
                    REGION_COLUMNS.join(", ")
                )
            })?;
        let columns = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, h)| Some((idx, h.parse::<AgeBracket>().ok()?)))
            .collect::<Vec<_>>();
        if columns.is_empty() {
            event!(
                Level::WARN,
                "\"{}\" has no age bracket columns; every region will have unknown population",
                source
            );
        }

        let mut by_region = BTreeMap::new();
        'rows: for record in rdr.records() {
            let Some((record, line)) = checked_record(record, &headers, source) else {
                continue
            };
            let region: ArcStr = canonical_region(&record[region_col]).into();
            let mut counts = BTreeMap::new();
            for (col, bracket) in &columns {
                match parse_count(&record[*col]) {
                    Ok(n) => {
                        counts.insert(*bracket, n);
                    }
                    Err(e) => {
                        event!(
                            Level::WARN,
                            "\"{}\" line {}: {} column: {}; skipping row",
                            source,
                            line,
                            bracket,
                            e
                        );
                        continue 'rows;
                    }
                }
            }
            by_region.insert(region, counts);
        }
        Ok(Self {
            brackets: columns.into_iter().map(|(_, b)| b).collect(),
            by_region,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        fn inner(path: &Path) -> Result<Population> {
            let reader = io::BufReader::new(fs::File::open(path)?);
            Population::from_reader(reader, &path.display().to_string())
        }
        let path = path.as_ref();
        inner(path).with_context(|| format!("loading population table \"{}\"", path.display()))
    }

    /// The brackets this table has columns for.
    pub fn brackets(&self) -> &[AgeBracket] {
        &self.brackets
    }

    pub fn regions(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_region.keys().map(|r| &**r)
    }

    pub fn for_bracket(&self, region: &str, bracket: AgeBracket) -> Option<u64> {
        self.by_region
            .get(canonical_region(region))?
            .get(&bracket)
            .copied()
    }

    /// Sum over every bracket column.
    pub fn total(&self, region: &str) -> Option<u64> {
        let counts = self.by_region.get(canonical_region(region))?;
        if counts.is_empty() {
            return None;
        }
        Some(counts.values().sum())
    }
}
