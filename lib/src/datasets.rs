//! Whatever data has been loaded so far.
//!
//! Every dataset is optional. A failed load is logged and leaves its slot empty, and everything
//! computed from a snapshot degrades to empty rankings, empty graphs, or zero scores. Loading a
//! dataset again is the retry.
use crate::{
    access::{all_regions, DiseaseSpecialties, Hospitals, Period, Population, Scorer},
    boundary::Boundaries,
    config::HospitalListing,
    AgeBucket, ArcStr, Config, DiseaseTable, Ranking, SortKey,
};
use qu::ick_use::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Datasets {
    diseases: BTreeMap<AgeBucket, DiseaseTable>,
    hospitals: BTreeMap<Period, Hospitals>,
    population: Option<Population>,
    specialties: Option<DiseaseSpecialties>,
    boundaries: Option<Boundaries>,
}

/// Logs the error and returns `None`.
fn logged<T>(result: Result<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            event!(Level::WARN, "{:#}", e);
            None
        }
    }
}

impl Datasets {
    /// Try to load everything the config names.
    pub fn load_all(config: &Config) -> Self {
        let mut datasets = Self::default();
        for bucket in AgeBucket::ALL {
            datasets.load_disease_table(config, bucket);
        }
        for listing in &config.hospitals {
            datasets.load_hospitals(config, listing);
        }
        datasets.load_population(config);
        datasets.load_specialties(config);
        datasets.load_boundaries(config);
        datasets
    }

    /// Returns whether the table is now available.
    pub fn load_disease_table(&mut self, config: &Config, bucket: AgeBucket) -> bool {
        match logged(DiseaseTable::load(config.bucket_path(bucket), bucket)) {
            Some(table) => {
                self.diseases.insert(bucket, table);
                true
            }
            None => {
                self.diseases.remove(&bucket);
                false
            }
        }
    }

    pub fn load_hospitals(&mut self, config: &Config, listing: &HospitalListing) -> bool {
        match logged(Hospitals::load(config.hospital_path(listing), listing.period)) {
            Some(hospitals) => {
                self.hospitals.insert(listing.period, hospitals);
                true
            }
            None => {
                self.hospitals.remove(&listing.period);
                false
            }
        }
    }

    pub fn load_population(&mut self, config: &Config) -> bool {
        self.population = logged(Population::load(config.population_path()));
        self.population.is_some()
    }

    pub fn load_specialties(&mut self, config: &Config) -> bool {
        self.specialties = logged(DiseaseSpecialties::load(config.specialties_path()));
        self.specialties.is_some()
    }

    pub fn load_boundaries(&mut self, config: &Config) -> bool {
        self.boundaries = logged(Boundaries::load(config.boundaries_path()));
        self.boundaries.is_some()
    }

    pub fn insert_disease_table(&mut self, table: DiseaseTable) {
        self.diseases.insert(table.bucket(), table);
    }

    pub fn insert_hospitals(&mut self, hospitals: Hospitals) {
        self.hospitals.insert(hospitals.period(), hospitals);
    }

    pub fn set_population(&mut self, population: Population) {
        self.population = Some(population);
    }

    pub fn set_specialties(&mut self, specialties: DiseaseSpecialties) {
        self.specialties = Some(specialties);
    }

    pub fn set_boundaries(&mut self, boundaries: Boundaries) {
        self.boundaries = Some(boundaries);
    }

    pub fn disease_table(&self, bucket: AgeBucket) -> Option<&DiseaseTable> {
        self.diseases.get(&bucket)
    }

    /// Rankings of every loaded bucket, youngest first.
    pub fn rankings(&self, key: SortKey, k: usize) -> Vec<Ranking> {
        self.diseases
            .values()
            .map(|table| Ranking::new(table, key, k))
            .collect()
    }

    pub fn hospitals(&self, period: Period) -> Option<&Hospitals> {
        self.hospitals.get(&period)
    }

    pub fn periods(&self) -> impl Iterator<Item = Period> + '_ {
        self.hospitals.keys().copied()
    }

    pub fn population(&self) -> Option<&Population> {
        self.population.as_ref()
    }

    pub fn specialties(&self) -> Option<&DiseaseSpecialties> {
        self.specialties.as_ref()
    }

    pub fn boundaries(&self) -> Option<&Boundaries> {
        self.boundaries.as_ref()
    }

    /// A scorer for one period, over whatever of its inputs have loaded.
    pub fn scorer(&self, period: Period, scale: f64) -> Scorer<'_> {
        Scorer::new(self.hospitals(period), self.population(), scale)
    }

    /// The names the map is drawn with: the boundary names if loaded, otherwise every known
    /// region.
    pub fn region_names(&self) -> Vec<ArcStr> {
        match &self.boundaries {
            Some(b) if !b.is_empty() => b.names().map(ArcStr::from).collect(),
            _ => all_regions().map(ArcStr::from).collect(),
        }
    }
}
