//! Names of the 17 first-level administrative regions (시도).
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Short name (as shown in the region selector) → full name (as in the boundary and population
/// data).
static ALIASES: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("서울", "서울특별시"),
        ("부산", "부산광역시"),
        ("대구", "대구광역시"),
        ("인천", "인천광역시"),
        ("광주", "광주광역시"),
        ("대전", "대전광역시"),
        ("울산", "울산광역시"),
        ("세종", "세종특별자치시"),
        ("세종시", "세종특별자치시"),
        ("경기", "경기도"),
        ("강원", "강원도"),
        ("충북", "충청북도"),
        ("충남", "충청남도"),
        ("전북", "전라북도"),
        ("전남", "전라남도"),
        ("경북", "경상북도"),
        ("경남", "경상남도"),
        ("제주", "제주특별자치도"),
    ]
    .into_iter()
    .collect()
});

/// Boundary files carry English names too.
static ENGLISH: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("seoul", "서울특별시"),
        ("busan", "부산광역시"),
        ("daegu", "대구광역시"),
        ("incheon", "인천광역시"),
        ("gwangju", "광주광역시"),
        ("daejeon", "대전광역시"),
        ("ulsan", "울산광역시"),
        ("sejong", "세종특별자치시"),
        ("sejong-si", "세종특별자치시"),
        ("gyeonggi-do", "경기도"),
        ("gangwon-do", "강원도"),
        ("chungcheongbuk-do", "충청북도"),
        ("chungcheongnam-do", "충청남도"),
        ("jeollabuk-do", "전라북도"),
        ("jeollanam-do", "전라남도"),
        ("gyeongsangbuk-do", "경상북도"),
        ("gyeongsangnam-do", "경상남도"),
        ("jeju-do", "제주특별자치도"),
    ]
    .into_iter()
    .collect()
});

/// The full Korean name for `name`. Names we don't know are passed through (trimmed).
pub fn canonical_region(name: &str) -> &str {
    let name = name.trim();
    if let Some(full) = ALIASES.get(name) {
        return *full;
    }
    match ENGLISH.get(name.to_ascii_lowercase().as_str()) {
        Some(full) => *full,
        None => name,
    }
}

/// Every full region name, once each.
pub fn all_regions() -> impl Iterator<Item = &'static str> {
    let mut seen = Vec::new();
    ALIASES.values().copied().filter(move |full| {
        if seen.contains(full) {
            false
        } else {
            seen.push(*full);
            true
        }
    })
}

#[cfg(test)]
mod test {
    use super::{all_regions, canonical_region};

    #[test]
    fn aliases() {
        assert_eq!(canonical_region("서울"), "서울특별시");
        assert_eq!(canonical_region(" 세종시 "), "세종특별자치시");
        assert_eq!(canonical_region("서울특별시"), "서울특별시");
        assert_eq!(canonical_region("Gyeonggi-do"), "경기도");
        assert_eq!(canonical_region("Atlantis"), "Atlantis");
        assert_eq!(all_regions().count(), 17);
    }
}
