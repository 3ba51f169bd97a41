//! Settings shared by the binaries, read from `medaccess.toml`.
use crate::{access::Period, asset_path, color::Palette, file_exists, AgeBucket};
use qu::ick_use::*;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_CONFIG: &str = "data/medaccess.toml";

/// All relative paths are resolved against `asset_root`, and `asset_root` itself against the
/// directory holding the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub asset_root: PathBuf,
    pub top_k: TopK,
    /// Scores are hospitals per this many residents.
    pub scale: f64,
    pub palette: Palette,
    /// Draw the 10-year bracket → life stage links in front of the Sankey.
    pub bracket_shares: bool,
    pub buckets: BucketPaths,
    pub hospitals: Vec<HospitalListing>,
    pub population: PathBuf,
    pub specialties: PathBuf,
    pub boundaries: PathBuf,
}

/// How many rows each view keeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct TopK {
    pub bar_chart: usize,
    pub rank_list: usize,
    pub flow: usize,
}

impl Default for TopK {
    fn default() -> Self {
        Self {
            bar_chart: 12,
            rank_list: 15,
            flow: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BucketPaths {
    pub infants: PathBuf,
    pub adolescents: PathBuf,
    pub young: PathBuf,
    pub middle: PathBuf,
    pub seniors: PathBuf,
}

impl Default for BucketPaths {
    fn default() -> Self {
        let p = |b: AgeBucket| PathBuf::from(b.file_name());
        Self {
            infants: p(AgeBucket::Infants),
            adolescents: p(AgeBucket::Adolescents),
            young: p(AgeBucket::YoungAdults),
            middle: p(AgeBucket::MiddleAged),
            seniors: p(AgeBucket::Seniors),
        }
    }
}

impl BucketPaths {
    pub fn get(&self, bucket: AgeBucket) -> &Path {
        match bucket {
            AgeBucket::Infants => &self.infants,
            AgeBucket::Adolescents => &self.adolescents,
            AgeBucket::YoungAdults => &self.young,
            AgeBucket::MiddleAged => &self.middle,
            AgeBucket::Seniors => &self.seniors,
        }
    }
}

/// One reporting period's hospital listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct HospitalListing {
    pub period: Period,
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let hospitals = ["2023.03", "2023.06", "2023.09", "2023.12"]
            .into_iter()
            .filter_map(|p| {
                Some(HospitalListing {
                    period: p.parse().ok()?,
                    path: format!("hospitals_{}.csv", p.replace('.', "_")).into(),
                })
            })
            .collect();
        Self {
            asset_root: "data".into(),
            top_k: TopK::default(),
            scale: 100_000.,
            palette: Palette::default(),
            bracket_shares: false,
            buckets: BucketPaths::default(),
            hospitals,
            population: "population.csv".into(),
            specialties: "disease_specialties.csv".into(),
            boundaries: "boundaries.geojson".into(),
        }
    }
}

impl Config {
    /// Read the config at `path`. A missing file gives the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        fn inner(path: &Path) -> Result<Config> {
            if !file_exists(path)? {
                event!(
                    Level::INFO,
                    "no config at \"{}\"; using defaults",
                    path.display()
                );
                return Ok(Config::default());
            }
            let mut config = Config::from_toml(&fs::read_to_string(path)?)?;
            if let Some(dir) = path.parent() {
                config.asset_root = dir.join(&config.asset_root);
            }
            Ok(config)
        }
        let path = path.as_ref();
        inner(path).with_context(|| format!("loading config \"{}\"", path.display()))
    }

    pub fn from_toml(input: &str) -> Result<Self> {
        let config: Config = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result {
        ensure!(
            self.scale.is_finite() && self.scale > 0.,
            "scale must be a positive number, found {}",
            self.scale
        );
        let TopK {
            bar_chart,
            rank_list,
            flow,
        } = self.top_k;
        ensure!(
            bar_chart > 0 && rank_list > 0 && flow > 0,
            "top-k values must be at least 1"
        );
        let mut periods = self.hospitals.iter().map(|h| h.period).collect::<Vec<_>>();
        periods.sort();
        periods.dedup();
        ensure!(
            periods.len() == self.hospitals.len(),
            "each hospital listing period may only appear once"
        );
        Ok(())
    }

    pub fn bucket_path(&self, bucket: AgeBucket) -> PathBuf {
        asset_path(&self.asset_root, self.buckets.get(bucket))
    }

    pub fn hospital_path(&self, listing: &HospitalListing) -> PathBuf {
        asset_path(&self.asset_root, &listing.path)
    }

    pub fn population_path(&self) -> PathBuf {
        asset_path(&self.asset_root, &self.population)
    }

    pub fn specialties_path(&self) -> PathBuf {
        asset_path(&self.asset_root, &self.specialties)
    }

    pub fn boundaries_path(&self) -> PathBuf {
        asset_path(&self.asset_root, &self.boundaries)
    }

    /// The earliest configured period.
    pub fn default_period(&self) -> Option<Period> {
        self.hospitals.iter().map(|h| h.period).min()
    }
}

#[cfg(test)]
mod test {
    use super::Config;
    use crate::{color::Palette, AgeBucket};
    use std::path::Path;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scale, 100_000.);
        assert_eq!(config.top_k.bar_chart, 12);
        assert_eq!(config.hospitals.len(), 4);
        assert_eq!(config.default_period().unwrap().to_string(), "2023.03");
        assert_eq!(
            config.bucket_path(AgeBucket::MiddleAged),
            Path::new("data/middle.csv")
        );
        assert_eq!(
            config.hospital_path(&config.hospitals[1]),
            Path::new("data/hospitals_2023_06.csv")
        );
    }

    #[test]
    fn partial_file() {
        let config = Config::from_toml(
            r#"
            scale = 1000.0
            palette = "warm"

            [top-k]
            flow = 15

            [buckets]
            seniors = "old.csv"

            [[hospitals]]
            period = "2024.01"
            path = "h.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.scale, 1000.);
        assert_eq!(config.palette, Palette::Warm);
        assert_eq!(config.top_k.flow, 15);
        assert_eq!(config.top_k.rank_list, 15);
        assert_eq!(config.buckets.seniors, Path::new("old.csv"));
        assert_eq!(config.buckets.infants, Path::new("infants.csv"));
        assert_eq!(config.hospitals.len(), 1);
    }

    #[test]
    fn bad_files() {
        assert!(Config::from_toml("scale = 0.0").is_err());
        assert!(Config::from_toml("scale = \"big\"").is_err());
        assert!(Config::from_toml("colour = \"red\"").is_err());
        assert!(Config::from_toml("[top-k]\nflow = 0").is_err());
    }

    #[test]
    fn bundled_data() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../data/medaccess.toml");
        let config = Config::load(&path).unwrap();
        let datasets = crate::Datasets::load_all(&config);
        for bucket in AgeBucket::ALL {
            assert_eq!(datasets.disease_table(bucket).map(|t| t.len()), Some(15));
        }
        assert_eq!(datasets.periods().count(), 4);
        assert_eq!(datasets.region_names().len(), 17);
        assert!(datasets.population().is_some());
        assert!(datasets.specialties().is_some());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load("/nonexistent/medaccess.toml").unwrap();
        assert_eq!(config, Config::default());
    }
}
