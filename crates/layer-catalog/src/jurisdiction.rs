//! Fixed Australian state and territory extents.

use overlay_common::BoundingBox;

use crate::coverage::bbox_intersection_percent;

/// A state or territory with its approximate extent in EPSG:4326.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jurisdiction {
    pub code: &'static str,
    pub name: &'static str,
    pub bbox: BoundingBox,
}

const fn jurisdiction(
    code: &'static str,
    name: &'static str,
    bbox: [f64; 4],
) -> Jurisdiction {
    Jurisdiction {
        code,
        name,
        bbox: BoundingBox {
            min_x: bbox[0],
            min_y: bbox[1],
            max_x: bbox[2],
            max_y: bbox[3],
        },
    }
}

/// Sorted by code.
pub const AUSTRALIAN_JURISDICTIONS: [Jurisdiction; 8] = [
    jurisdiction("ACT", "Australian Capital Territory", [148.76, -35.92, 149.4, -35.12]),
    jurisdiction("NSW", "New South Wales", [141.0, -37.5, 153.6, -28.2]),
    jurisdiction("NT", "Northern Territory", [129.0, -26.0, 138.0, -10.9]),
    jurisdiction("QLD", "Queensland", [138.0, -29.2, 153.55, -10.7]),
    jurisdiction("SA", "South Australia", [129.0, -38.1, 141.0, -26.0]),
    jurisdiction("TAS", "Tasmania", [143.8, -43.7, 148.5, -39.5]),
    jurisdiction("VIC", "Victoria", [140.96, -39.2, 150.0, -33.98]),
    jurisdiction("WA", "Western Australia", [112.9, -35.2, 129.0, -13.7]),
];

pub fn find_jurisdiction(code: &str) -> Option<&'static Jurisdiction> {
    AUSTRALIAN_JURISDICTIONS
        .iter()
        .find(|j| j.code.eq_ignore_ascii_case(code))
}

/// Jurisdiction with the largest share of the viewport.
///
/// Equal shares resolve to the alphabetically first code. Returns `None`
/// when the viewport touches no jurisdiction.
pub fn detect_viewport_state(viewport: &BoundingBox) -> Option<&'static Jurisdiction> {
    let mut best: Option<(&'static Jurisdiction, f64)> = None;
    for j in AUSTRALIAN_JURISDICTIONS.iter() {
        let pct = bbox_intersection_percent(viewport, &j.bbox);
        if pct <= 0.0 {
            continue;
        }
        // Strict `>` keeps the earlier (alphabetically smaller) code on ties.
        if best.map_or(true, |(_, p)| pct > p) {
            best = Some((j, pct));
        }
    }
    best.map(|(j, _)| j)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted() {
        let codes: Vec<&str> = AUSTRALIAN_JURISDICTIONS.iter().map(|j| j.code).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn test_brisbane_is_qld() {
        let brisbane = BoundingBox::new(152.9, -27.6, 153.2, -27.3);
        assert_eq!(detect_viewport_state(&brisbane).unwrap().code, "QLD");
    }

    #[test]
    fn test_canberra_prefers_act() {
        // ACT sits entirely inside the NSW box; both cover 100%, ACT sorts first.
        let canberra = BoundingBox::new(149.0, -35.4, 149.2, -35.2);
        assert_eq!(detect_viewport_state(&canberra).unwrap().code, "ACT");
    }

    #[test]
    fn test_ocean_has_no_state() {
        let pacific = BoundingBox::new(170.0, -20.0, 171.0, -19.0);
        assert!(detect_viewport_state(&pacific).is_none());
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(find_jurisdiction("vic").unwrap().name, "Victoria");
        assert!(find_jurisdiction("XX").is_none());
    }
}
