//! Hospital accessibility scores per region, and their mapping onto choropleth colour bands.
//!
//! A score is a hospital count divided by a population, scaled to "per `scale` residents". It is
//! never negative and never NaN: missing data or an empty population scores 0, which is what a
//! region shows until its data has loaded.
mod hospitals;
mod population;
mod regions;
mod specialties;

pub use hospitals::{HospitalRow, Hospitals, Period};
pub use population::Population;
pub use regions::{all_regions, canonical_region};
pub use specialties::DiseaseSpecialties;

use crate::{
    color::{Rgb, BANDS, NEUTRAL},
    AgeBracket, ArcStr,
};
use noisy_float::prelude::*;
use qu::ick_use::*;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

/// Lower bound of each colour band, as a fraction of the selected regions' score range.
pub const BAND_THRESHOLDS: [f64; 8] = [0., 0.01, 0.05, 0.1, 0.3, 0.5, 0.7, 0.9];

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringMethod {
    /// All hospitals over all residents.
    Unweighted,
    /// Hospitals with a relevant specialty over residents of the selected age bracket.
    SpecialtyWeighted,
}

impl ScoringMethod {
    pub const ALL: [ScoringMethod; 2] = [ScoringMethod::Unweighted, ScoringMethod::SpecialtyWeighted];

    pub fn label(self) -> &'static str {
        match self {
            ScoringMethod::Unweighted => "unweighted",
            ScoringMethod::SpecialtyWeighted => "specialty-weighted",
        }
    }
}

impl fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ScoringMethod {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unweighted" | "old" => Ok(ScoringMethod::Unweighted),
            "specialty-weighted" | "weighted" | "refined" | "new" => {
                Ok(ScoringMethod::SpecialtyWeighted)
            }
            _ => bail!(
                "unknown scoring method \"{}\" (expected unweighted or specialty-weighted)",
                s
            ),
        }
    }
}

/// `hospitals * scale / population`, or 0 if that isn't a finite number.
pub fn ratio(hospitals: u64, population: u64, scale: f64) -> f64 {
    if population == 0 {
        return 0.;
    }
    let v = hospitals as f64 * scale / population as f64;
    if v.is_finite() && v >= 0. {
        v
    } else {
        0.
    }
}

/// What to score: the method, and the age bracket and specialties it may use.
#[derive(Debug, Clone)]
pub struct ScoreRequest {
    pub method: ScoringMethod,
    pub bracket: AgeBracket,
    pub specialties: BTreeSet<ArcStr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionScore {
    pub region: ArcStr,
    pub score: f64,
}

/// Scores regions against whichever datasets are available.
#[derive(Debug, Copy, Clone)]
pub struct Scorer<'a> {
    hospitals: Option<&'a Hospitals>,
    population: Option<&'a Population>,
    scale: f64,
}

impl<'a> Scorer<'a> {
    pub fn new(
        hospitals: Option<&'a Hospitals>,
        population: Option<&'a Population>,
        scale: f64,
    ) -> Self {
        Self {
            hospitals,
            population,
            scale,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Score one region. Missing data is logged and scores 0.
    pub fn score(&self, region: &str, request: &ScoreRequest) -> f64 {
        let region = canonical_region(region);
        let Some(hospitals) = self.hospitals else {
            event!(
                Level::WARN,
                "no hospital listing loaded; {} scores 0",
                region
            );
            return 0.;
        };
        let Some(population) = self.population else {
            event!(
                Level::WARN,
                "no population table loaded; {} scores 0",
                region
            );
            return 0.;
        };
        let (count, residents) = match request.method {
            ScoringMethod::Unweighted => (hospitals.total_for(region), population.total(region)),
            ScoringMethod::SpecialtyWeighted => (
                hospitals.matching(region, &request.specialties),
                population.for_bracket(region, request.bracket),
            ),
        };
        match (count, residents) {
            (Some(count), Some(residents)) => ratio(count, residents, self.scale),
            (None, _) => {
                event!(
                    Level::WARN,
                    "{} has no hospitals listed for {}; scoring 0",
                    region,
                    hospitals.period()
                );
                0.
            }
            (_, None) => {
                event!(
                    Level::WARN,
                    "{} has no population figure for {}; scoring 0",
                    region,
                    match request.method {
                        ScoringMethod::Unweighted => "any age".to_string(),
                        ScoringMethod::SpecialtyWeighted => request.bracket.to_string(),
                    }
                );
                0.
            }
        }
    }

    pub fn scores<I, S>(&self, regions: I, request: &ScoreRequest) -> Vec<RegionScore>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        regions
            .into_iter()
            .map(|region| {
                let region = canonical_region(region.as_ref());
                RegionScore {
                    region: region.into(),
                    score: self.score(region, request),
                }
            })
            .collect()
    }
}

/// The min-max domain of the colour scale.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ScoreScale {
    pub min: f64,
    pub max: f64,
}

impl ScoreScale {
    /// `None` if there are no scores.
    pub fn new(scores: impl IntoIterator<Item = f64>) -> Option<Self> {
        let scores = scores
            .into_iter()
            .filter(|s| s.is_finite())
            .map(n64)
            .collect::<Vec<_>>();
        let min = scores.iter().copied().min()?;
        let max = scores.iter().copied().max()?;
        Some(Self {
            min: min.raw(),
            max: max.raw(),
        })
    }

    /// Index into [`BANDS`]: the highest band whose threshold the score reaches.
    ///
    /// If every score is the same, everything is in band 0.
    pub fn band(&self, score: f64) -> usize {
        let span = self.max - self.min;
        if span <= 0. || !score.is_finite() {
            return 0;
        }
        let frac = ((score - self.min) / span).clamp(0., 1.);
        BAND_THRESHOLDS
            .iter()
            .rposition(|t| frac >= *t)
            .unwrap_or(0)
    }

    pub fn color(&self, score: f64) -> Rgb {
        BANDS[self.band(score)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoroplethCell {
    pub region: ArcStr,
    pub score: Option<f64>,
    /// `None` for regions outside the selection.
    pub band: Option<usize>,
    pub color: Rgb,
    pub selected: bool,
}

/// Region → colour for the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choropleth {
    /// Over the selected regions only.
    pub scale: Option<ScoreScale>,
    pub cells: Vec<ChoroplethCell>,
}

impl Choropleth {
    /// One cell per name in `regions`.
    ///
    /// The colour scale only considers scores of selected regions. Unselected regions are
    /// neutral whatever their score. Region names may be short or full.
    pub fn new<I, S>(regions: I, scores: &[RegionScore], selected: &BTreeSet<ArcStr>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selected = selected
            .iter()
            .map(|r| canonical_region(r))
            .collect::<BTreeSet<_>>();
        let score_of = |region: &str| {
            scores
                .iter()
                .find(|s| canonical_region(&s.region) == region)
                .map(|s| s.score)
        };
        let scale = ScoreScale::new(
            scores
                .iter()
                .filter(|s| selected.contains(canonical_region(&s.region)))
                .map(|s| s.score),
        );
        let cells = regions
            .into_iter()
            .map(|region| {
                let region = canonical_region(region.as_ref());
                let score = score_of(region);
                let is_selected = selected.contains(region);
                let band = match (is_selected, scale) {
                    (true, Some(scale)) => Some(scale.band(score.unwrap_or(0.))),
                    _ => None,
                };
                ChoroplethCell {
                    region: region.into(),
                    score,
                    band,
                    color: band.map(|b| BANDS[b]).unwrap_or(NEUTRAL),
                    selected: is_selected,
                }
            })
            .collect();
        Self { scale, cells }
    }

    pub fn cell(&self, region: &str) -> Option<&ChoroplethCell> {
        let region = canonical_region(region);
        self.cells.iter().find(|c| &*c.region == region)
    }
}
