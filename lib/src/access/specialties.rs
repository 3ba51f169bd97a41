//! Which hospital specialties treat which diseases.
use crate::{read_csv, ArcStr};
use qu::ick_use::*;
use serde::Deserialize;
use std::{collections::BTreeSet, fs, io, path::Path};

#[derive(Debug, Clone, Deserialize)]
struct Pair {
    #[serde(rename = "질병", alias = "disease")]
    disease: ArcStr,
    #[serde(rename = "진료과목", alias = "specialty")]
    specialty: ArcStr,
}

/// Disease → specialty pairs. A disease may appear with several specialties.
#[derive(Debug, Clone, Default)]
pub struct DiseaseSpecialties {
    pairs: Vec<Pair>,
    /// Distinct diseases, in the order they first appear.
    diseases: Vec<ArcStr>,
}

impl DiseaseSpecialties {
    pub fn from_reader(reader: impl io::Read, source: &str) -> Result<Self> {
        let pairs: Vec<Pair> = read_csv(reader, source)?;
        let mut diseases: Vec<ArcStr> = vec![];
        for pair in &pairs {
            if !diseases.contains(&pair.disease) {
                diseases.push(pair.disease.clone());
            }
        }
        Ok(Self { pairs, diseases })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        fn inner(path: &Path) -> Result<DiseaseSpecialties> {
            let reader = io::BufReader::new(fs::File::open(path)?);
            DiseaseSpecialties::from_reader(reader, &path.display().to_string())
        }
        let path = path.as_ref();
        inner(path)
            .with_context(|| format!("loading disease specialties \"{}\"", path.display()))
    }

    pub fn diseases(&self) -> &[ArcStr] {
        &self.diseases
    }

    /// Diseases containing `term`, ignoring case. An empty term matches everything.
    pub fn search<'a>(&'a self, term: &str) -> impl Iterator<Item = &'a ArcStr> + 'a {
        let term = term.trim().to_lowercase();
        self.diseases
            .iter()
            .filter(move |d| d.to_lowercase().contains(&term))
    }

    /// Every specialty relevant to any of `diseases`.
    pub fn specialties_for<I, S>(&self, diseases: I) -> BTreeSet<ArcStr>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted = diseases
            .into_iter()
            .map(|d| d.as_ref().trim().to_string())
            .collect::<BTreeSet<_>>();
        let specialties = self
            .pairs
            .iter()
            .filter(|p| wanted.contains(&*p.disease))
            .map(|p| p.specialty.clone())
            .collect::<BTreeSet<_>>();
        for disease in &wanted {
            if !self.diseases.iter().any(|d| &**d == disease) {
                event!(Level::WARN, "no specialties known for disease \"{}\"", disease);
            }
        }
        specialties
    }
}

#[cfg(test)]
mod test {
    use super::DiseaseSpecialties;

    const TABLE: &str = "\
질병,진료과목
Asthma,내과
천식,소아청소년과
천식,내과
중이염,이비인후과
";

    #[test]
    fn search_and_union() {
        let table = DiseaseSpecialties::from_reader(TABLE.as_bytes(), "t").unwrap();
        let names = table.diseases().iter().map(|d| &**d).collect::<Vec<_>>();
        assert_eq!(names, ["Asthma", "천식", "중이염"]);
        assert_eq!(table.search("asth").count(), 1);
        assert_eq!(table.search("").count(), 3);
        assert_eq!(table.search("염").count(), 1);

        let specialties = table.specialties_for(["천식", "중이염", "unknown"]);
        let specialties = specialties.iter().map(|s| &**s).collect::<Vec<_>>();
        assert_eq!(specialties, ["내과", "소아청소년과", "이비인후과"]);
    }
}
