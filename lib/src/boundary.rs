//! Region boundaries. Only the region names are used here; geometry is passed through to the
//! map renderer untouched.
use crate::{access::canonical_region, ArcStr};
use qu::ick_use::*;
use serde::Deserialize;
use std::{fs, io, path::Path};

/// Property keys that may hold the region name, most preferred first.
const NAME_KEYS: [&str; 4] = ["CTP_KOR_NM", "CTP_ENG_NM", "name", "NAME"];

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    geometry: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct Boundary {
    /// Full Korean region name.
    pub name: ArcStr,
    pub geometry: serde_json::Value,
}

/// The features of a GeoJSON `FeatureCollection`, keyed by region name.
#[derive(Debug, Clone, Default)]
pub struct Boundaries {
    features: Vec<Boundary>,
}

impl Boundaries {
    /// Features without a recognisable name property are skipped with a warning.
    pub fn from_reader(reader: impl io::Read, source: &str) -> Result<Self> {
        let collection: FeatureCollection = serde_json::from_reader(reader)
            .with_context(|| format!("\"{}\" is not a GeoJSON feature collection", source))?;
        let mut features = Vec::with_capacity(collection.features.len());
        for (idx, feature) in collection.features.into_iter().enumerate() {
            let name = NAME_KEYS
                .iter()
                .find_map(|key| feature.properties.get(*key)?.as_str());
            match name {
                Some(name) => features.push(Boundary {
                    name: canonical_region(name).into(),
                    geometry: feature.geometry,
                }),
                None => event!(
                    Level::WARN,
                    "\"{}\" feature {} has no name property; skipping",
                    source,
                    idx
                ),
            }
        }
        Ok(Self { features })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        fn inner(path: &Path) -> Result<Boundaries> {
            let reader = io::BufReader::new(fs::File::open(path)?);
            Boundaries::from_reader(reader, &path.display().to_string())
        }
        let path = path.as_ref();
        inner(path).with_context(|| format!("loading boundaries \"{}\"", path.display()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.features.iter().map(|f| &*f.name)
    }

    pub fn get(&self, name: &str) -> Option<&Boundary> {
        let name = canonical_region(name);
        self.features.iter().find(|f| &*f.name == name)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
