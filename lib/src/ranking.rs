//! Ordering disease tables for display.
//!
//! A ranking is a stable, descending sort of one disease table by one sex's count, truncated to
//! the top `k` rows. Ties keep file order. Everything here is a pure function of the table and
//! the sort key, so toggling the key back and forth reproduces the same rows in the same order.
use crate::{util::round2, AgeBucket, ArcStr, Datasets, DiseaseRow, DiseaseTable, Sex};
use qu::ick_use::*;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, ops::Deref, str::FromStr, sync::Arc};

/// Which count orders the rows, and which segment comes first in a stacked bar.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    MaleFirst,
    FemaleFirst,
}

impl SortKey {
    pub fn sex(self) -> Sex {
        match self {
            SortKey::MaleFirst => Sex::Male,
            SortKey::FemaleFirst => Sex::Female,
        }
    }

    /// Segment order for stacked bars.
    pub fn stack_order(self) -> [Sex; 2] {
        match self {
            SortKey::MaleFirst => [Sex::Male, Sex::Female],
            SortKey::FemaleFirst => [Sex::Female, Sex::Male],
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortKey::MaleFirst => SortKey::FemaleFirst,
            SortKey::FemaleFirst => SortKey::MaleFirst,
        }
    }

    pub fn value(self, row: &DiseaseRow) -> u64 {
        row.count(self.sex())
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SortKey::MaleFirst => f.write_str("male-first"),
            SortKey::FemaleFirst => f.write_str("female-first"),
        }
    }
}

impl FromStr for SortKey {
    type Err = Error;
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "male-first" | "male" | "m" | "남" => Ok(SortKey::MaleFirst),
            "female-first" | "female" | "f" | "여" => Ok(SortKey::FemaleFirst),
            _ => bail!("expected `male-first` or `female-first`, found \"{}\"", input),
        }
    }
}

/// A disease row in its position after sorting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRow {
    #[serde(flatten)]
    pub row: Arc<DiseaseRow>,
    pub age_bucket: AgeBucket,
    /// 0-based position after sorting.
    pub rank: usize,
}

impl Deref for RankedRow {
    type Target = DiseaseRow;
    fn deref(&self) -> &Self::Target {
        &self.row
    }
}

impl RankedRow {
    /// One-line summary of the row, for the detail view.
    pub fn describe(&self) -> String {
        format!(
            "{} shows {}% in {} and ranks #{}",
            self.name,
            self.percentage,
            self.age_bucket.label(),
            self.rank + 1
        )
    }
}

/// The top rows of one bucket's table under one sort key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    bucket: AgeBucket,
    key: SortKey,
    /// The truncation bound the ranking was built with.
    k: usize,
    rows: Vec<RankedRow>,
}

impl Ranking {
    /// Sort `table` descending by `key` (ties in file order) and keep the first `k` rows.
    pub fn new(table: &DiseaseTable, key: SortKey, k: usize) -> Self {
        let mut rows = table.shared_rows().cloned().collect::<Vec<_>>();
        // `sort_by` is stable, which gives us file order for ties.
        rows.sort_by(|a, b| key.value(b).cmp(&key.value(a)));
        let rows = rows
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(rank, row)| RankedRow {
                row,
                age_bucket: table.bucket(),
                rank,
            })
            .collect();
        Self {
            bucket: table.bucket(),
            key,
            k,
            rows,
        }
    }

    pub fn bucket(&self) -> AgeBucket {
        self.bucket
    }

    pub fn key(&self) -> SortKey {
        self.key
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Inverse-rank weight used when magnitudes aren't comparable between buckets.
    pub fn weight(&self, row: &RankedRow) -> f64 {
        self.k.saturating_sub(row.rank) as f64
    }

    /// Rank movement of every row relative to an earlier ranking.
    pub fn changes_since(&self, previous: &[RankedRow]) -> Vec<(ArcStr, RankChange)> {
        rank_changes(&self.rows, previous)
    }

    pub fn stacked_bars(&self) -> StackedBars {
        StackedBars::new(&self.rows, self.key)
    }
}

impl Deref for Ranking {
    type Target = [RankedRow];
    fn deref(&self) -> &Self::Target {
        &self.rows
    }
}

/// How far a row has moved since the previous selection.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "direction", content = "by")]
pub enum RankChange {
    Up(usize),
    Down(usize),
    Same,
    /// Not present in the previous selection.
    New,
}

impl fmt::Display for RankChange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RankChange::Up(n) => write!(f, "↑{}", n),
            RankChange::Down(n) => write!(f, "↓{}", n),
            RankChange::Same => f.write_str("-"),
            RankChange::New => f.write_str("new"),
        }
    }
}

/// Compare each current row's rank to the rank of the same name in `previous`.
pub fn rank_changes(current: &[RankedRow], previous: &[RankedRow]) -> Vec<(ArcStr, RankChange)> {
    let previous_ranks = previous
        .iter()
        .map(|row| (row.name.clone(), row.rank))
        .collect::<HashMap<_, _>>();
    current
        .iter()
        .map(|row| {
            let change = match previous_ranks.get(&row.name) {
                None => RankChange::New,
                Some(&prev) if prev > row.rank => RankChange::Up(prev - row.rank),
                Some(&prev) if prev < row.rank => RankChange::Down(row.rank - prev),
                Some(_) => RankChange::Same,
            };
            (row.name.clone(), change)
        })
        .collect()
}

/// One segment of a stacked bar, covering `[start, end)` on the count axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub sex: Sex,
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedBar {
    pub name: ArcStr,
    pub segments: [Segment; 2],
}

/// Input for the horizontal stacked bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackedBars {
    pub keys: [Sex; 2],
    /// Upper end of the count axis (the largest `total`).
    pub domain_max: u64,
    pub bars: Vec<StackedBar>,
}

impl StackedBars {
    pub fn new(rows: &[RankedRow], key: SortKey) -> Self {
        let keys = key.stack_order();
        let bars = rows
            .iter()
            .map(|row| {
                let first = row.count(keys[0]);
                let second = row.count(keys[1]);
                StackedBar {
                    name: row.name.clone(),
                    segments: [
                        Segment {
                            sex: keys[0],
                            start: 0,
                            end: first,
                        },
                        Segment {
                            sex: keys[1],
                            start: first,
                            end: first.saturating_add(second),
                        },
                    ],
                }
            })
            .collect();
        Self {
            keys,
            domain_max: rows.iter().map(|row| row.total).max().unwrap_or(0),
            bars,
        }
    }
}

/// A single row's share against everything else, for the pie detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieBreakdown {
    pub name: ArcStr,
    pub share: f64,
    pub other: f64,
}

impl PieBreakdown {
    pub fn new(row: &DiseaseRow) -> Self {
        let share = row.percentage.clamp(0., 100.);
        Self {
            name: row.name.clone(),
            share,
            other: round2(100. - share),
        }
    }
}

/// State owned by one disease chart: which bucket and sort key are selected, and what was shown
/// before the last change (for rank-change arrows).
///
/// Each chart owns its own selection, so two charts never see each other's state.
#[derive(Debug, Clone)]
pub struct BucketSelection {
    initialized: bool,
    bucket: AgeBucket,
    key: SortKey,
    k: usize,
    current: Vec<RankedRow>,
    previous: Vec<RankedRow>,
}

impl BucketSelection {
    /// Nothing is ranked until [`initialize`](Self::initialize) is called.
    pub fn new(bucket: AgeBucket, key: SortKey, k: usize) -> Self {
        Self {
            initialized: false,
            bucket,
            key,
            k,
            current: vec![],
            previous: vec![],
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Rank the starting bucket, the first time only.
    ///
    /// Returns `true` if this call did the initialization.
    pub fn initialize(&mut self, datasets: &Datasets) -> bool {
        if self.initialized {
            return false;
        }
        self.initialized = true;
        self.current = self.rank(datasets);
        true
    }

    pub fn bucket(&self) -> AgeBucket {
        self.bucket
    }

    pub fn key(&self) -> SortKey {
        self.key
    }

    pub fn current(&self) -> &[RankedRow] {
        &self.current
    }

    pub fn previous(&self) -> &[RankedRow] {
        &self.previous
    }

    pub fn select(&mut self, bucket: AgeBucket, datasets: &Datasets) -> &[RankedRow] {
        self.bucket = bucket;
        self.refresh(datasets)
    }

    pub fn set_key(&mut self, key: SortKey, datasets: &Datasets) -> &[RankedRow] {
        self.key = key;
        self.refresh(datasets)
    }

    pub fn changes(&self) -> Vec<(ArcStr, RankChange)> {
        rank_changes(&self.current, &self.previous)
    }

    fn refresh(&mut self, datasets: &Datasets) -> &[RankedRow] {
        self.initialized = true;
        let next = self.rank(datasets);
        self.previous = std::mem::replace(&mut self.current, next);
        &self.current
    }

    fn rank(&self, datasets: &Datasets) -> Vec<RankedRow> {
        match datasets.disease_table(self.bucket) {
            Some(table) => Ranking::new(table, self.key, self.k).rows,
            None => {
                event!(
                    Level::WARN,
                    "no disease table loaded for {}; showing nothing",
                    self.bucket.label()
                );
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{AgeBucket, Datasets, DiseaseTable};
    use std::sync::Arc;

    const TABLE: &str = "\
name,male,female,total,percentage
a,10,50,60,10
b,30,20,70,20
c,30,40,100,30
d,5,60,65,15
e,20,10,30,25
";

    fn table() -> DiseaseTable {
        DiseaseTable::from_reader(TABLE.as_bytes(), AgeBucket::Adolescents, "t").unwrap()
    }

    fn names(rows: &[RankedRow]) -> Vec<&str> {
        rows.iter().map(|r| &*r.name).collect()
    }

    #[test]
    fn stable_descending() {
        let ranking = Ranking::new(&table(), SortKey::MaleFirst, 10);
        // b and c tie on 30, file order wins
        assert_eq!(names(&ranking), ["b", "c", "e", "a", "d"]);
        let ranks = ranking.iter().map(|r| r.rank).collect::<Vec<_>>();
        assert_eq!(ranks, [0, 1, 2, 3, 4]);

        let ranking = Ranking::new(&table(), SortKey::FemaleFirst, 10);
        assert_eq!(names(&ranking), ["d", "a", "c", "b", "e"]);
    }

    #[test]
    fn resorting_is_idempotent() {
        let table = table();
        let once = Ranking::new(&table, SortKey::FemaleFirst, 5);
        let toggled = Ranking::new(&table, SortKey::MaleFirst, 5);
        let twice = Ranking::new(&table, toggled.key().toggled(), 5);
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert!(Arc::ptr_eq(&a.row, &b.row));
            assert_eq!(a.rank, b.rank);
        }
    }

    #[test]
    fn truncation() {
        let table = table();
        assert_eq!(Ranking::new(&table, SortKey::MaleFirst, 3).len(), 3);
        assert_eq!(Ranking::new(&table, SortKey::MaleFirst, 5).len(), 5);
        // fewer only when the input is shorter
        assert_eq!(Ranking::new(&table, SortKey::MaleFirst, 12).len(), 5);
        assert_eq!(Ranking::new(&table, SortKey::MaleFirst, 0).len(), 0);
    }

    #[test]
    fn weights_and_description() {
        let ranking = Ranking::new(&table(), SortKey::MaleFirst, 12);
        assert_eq!(ranking.weight(&ranking[0]), 12.);
        assert_eq!(ranking.weight(&ranking[4]), 8.);
        assert_eq!(
            ranking[0].describe(),
            "b shows 20% in Adolescents and ranks #1"
        );
    }

    #[test]
    fn changes() {
        let table = table();
        let male = Ranking::new(&table, SortKey::MaleFirst, 3);
        let female = Ranking::new(&table, SortKey::FemaleFirst, 3);
        // male: b c e; female: d a c
        let changes = female.changes_since(&male);
        assert_eq!(changes[0].1, RankChange::New);
        assert_eq!(changes[1].1, RankChange::New);
        assert_eq!(changes[2].1, RankChange::Down(1));
        let back = male.changes_since(&female);
        assert_eq!(back[1].1, RankChange::Up(1));
        assert_eq!(RankChange::Up(2).to_string(), "↑2");
        assert_eq!(RankChange::Same.to_string(), "-");
    }

    #[test]
    fn stacked_segments() {
        let ranking = Ranking::new(&table(), SortKey::FemaleFirst, 2);
        let bars = ranking.stacked_bars();
        assert_eq!(bars.keys, [Sex::Female, Sex::Male]);
        assert_eq!(bars.domain_max, 65);
        let d = &bars.bars[0];
        assert_eq!(&*d.name, "d");
        assert_eq!((d.segments[0].start, d.segments[0].end), (0, 60));
        assert_eq!((d.segments[1].start, d.segments[1].end), (60, 65));

        let input = format!("name,male,female,total\nbig,{0},{0},{0}\n", u64::MAX);
        let table = DiseaseTable::from_reader(input.as_bytes(), AgeBucket::Seniors, "t").unwrap();
        let bars = Ranking::new(&table, SortKey::MaleFirst, 1).stacked_bars();
        assert_eq!(bars.bars[0].segments[1].end, u64::MAX);
    }

    #[test]
    fn pie() {
        let table = table();
        let pie = PieBreakdown::new(&table[2]);
        assert_eq!(pie.share, 30.);
        assert_eq!(pie.other, 70.);
    }

    #[test]
    fn selection_lifecycle() {
        let mut datasets = Datasets::default();
        datasets.insert_disease_table(table());
        let mut selection = BucketSelection::new(AgeBucket::Infants, SortKey::MaleFirst, 3);
        assert!(!selection.is_initialized());
        // no infants data: degrade to nothing
        assert!(selection.initialize(&datasets));
        assert!(selection.current().is_empty());
        assert!(!selection.initialize(&datasets));

        selection.select(AgeBucket::Adolescents, &datasets);
        assert_eq!(names(selection.current()), ["b", "c", "e"]);
        selection.set_key(SortKey::FemaleFirst, &datasets);
        assert_eq!(names(selection.current()), ["d", "a", "c"]);
        assert_eq!(names(selection.previous()), ["b", "c", "e"]);
        assert_eq!(selection.changes()[2].1, RankChange::Down(1));
    }
}
