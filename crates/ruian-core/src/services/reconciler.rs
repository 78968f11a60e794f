//! Reconciliation of a registry match with what the user typed

use crate::clients::RegistryPlace;
use ruian_types::{MunicipalityId, Region, RegionId, ResolvedAddress, Suggestion};

/// Result of a full-address match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub address: ResolvedAddress,
    pub canonical: String,
    /// Present only when the canonical form differs from the input
    pub correction: Option<Suggestion>,
}

/// Render a 5-digit ZIP as `XXX XX`; anything else passes through
pub fn format_zip(zip: &str) -> String {
    if zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit()) {
        format!("{} {}", &zip[..3], &zip[3..])
    } else {
        zip.to_string()
    }
}

/// Collapse runs of whitespace and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Postal rendering: `<street|part|municipality> <number>, <zip> <municipality>`
pub fn canonical_label(address: &ResolvedAddress) -> String {
    let head = address
        .street_name
        .as_deref()
        .or(address.municipality_part_name.as_deref())
        .unwrap_or(&address.municipality_name);

    let number = match (&address.ce, &address.cp, &address.co) {
        (Some(ce), _, _) => Some(format!("ev.{}", ce)),
        (None, Some(cp), Some(co)) => Some(format!("{}/{}", cp, co)),
        (None, Some(cp), None) => Some(cp.clone()),
        (None, None, _) => None,
    };

    let first = match number {
        Some(number) => format!("{} {}", head, number),
        None => head.to_string(),
    };

    let zip = format_zip(&address.zip);
    if zip.is_empty() {
        format!("{}, {}", first, address.municipality_name)
    } else {
        format!("{}, {} {}", first, zip, address.municipality_name)
    }
}

/// Build the immutable result record from a matched registry place
pub fn resolve_place(place: &RegistryPlace, original: &str) -> Option<ResolvedAddress> {
    let municipality_id = match place.municipality_id.as_deref().map(str::parse::<u64>) {
        Some(Ok(id)) => MunicipalityId::new(id),
        _ => {
            log::warn!("Matched place has no usable municipalityId: {:?}", place.municipality_id);
            return None;
        }
    };

    let region_id = place
        .region_id
        .as_deref()
        .and_then(|r| r.parse::<u32>().ok())
        .map(RegionId::new);
    let region_name = place.region_name.clone().or_else(|| {
        region_id
            .and_then(Region::by_id)
            .map(|r| r.name.to_string())
    });

    let id = place.id.clone().or_else(|| place.ruian_id.clone()).unwrap_or_default();
    let ruian_id = place.ruian_id.clone().unwrap_or_else(|| id.clone());

    Some(ResolvedAddress {
        valid: true,
        municipality_id,
        municipality_name: place.municipality_name.clone().unwrap_or_default(),
        municipality_part_id: place.municipality_part_id.clone(),
        municipality_part_name: place.municipality_part_name.clone(),
        street_name: place.street_name.clone(),
        ce: place.ce.clone(),
        cp: place.cp.clone(),
        co: place.co.clone(),
        zip: place.zip.clone().unwrap_or_default(),
        id,
        ruian_id,
        region_id,
        region_name,
        original_string: original.to_string(),
    })
}

/// Resolve the match and decide whether a `complete` correction is offered
pub fn reconcile(input: &str, place: &RegistryPlace) -> Option<Reconciliation> {
    let address = resolve_place(place, input)?;
    let canonical = canonical_label(&address);

    let correction = if normalize_whitespace(&canonical) == normalize_whitespace(input) {
        None
    } else {
        Some(Suggestion::Complete {
            label: canonical.clone(),
            address: Box::new(address.clone()),
        })
    };

    Some(Reconciliation {
        address,
        canonical,
        correction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ValidationResponse;
    use crate::test_support::wenceslas_match;

    fn wenceslas() -> RegistryPlace {
        let response: ValidationResponse = serde_json::from_value(wenceslas_match()).unwrap();
        response.place.unwrap()
    }

    #[test]
    fn test_format_zip() {
        assert_eq!(format_zip("11000"), "110 00");
        assert_eq!(format_zip("1100"), "1100");
        assert_eq!(format_zip("110 00"), "110 00");
        assert_eq!(format_zip("11a00"), "11a00");
        assert_eq!(format_zip(""), "");
        assert_eq!(format_zip(&format_zip("11000").replace(' ', "")), "110 00");
    }

    #[test]
    fn test_canonical_label_variants() {
        let mut address = resolve_place(&wenceslas(), "x").unwrap();
        assert_eq!(canonical_label(&address), "Václavské náměstí 812/59, 110 00 Praha");

        address.co = None;
        assert_eq!(canonical_label(&address), "Václavské náměstí 812, 110 00 Praha");

        address.street_name = None;
        assert_eq!(canonical_label(&address), "Nové Město 812, 110 00 Praha");

        address.municipality_part_name = None;
        address.ce = Some("14".into());
        assert_eq!(canonical_label(&address), "Praha ev.14, 110 00 Praha");
    }

    #[test]
    fn test_matching_input_needs_no_correction() {
        let result = reconcile("Václavské  náměstí 812/59,  110 00 Praha ", &wenceslas()).unwrap();
        assert!(result.correction.is_none());
        assert!(result.address.valid);
        assert_eq!(result.address.cp.as_deref(), Some("812"));
        assert_eq!(result.address.co.as_deref(), Some("59"));
        assert_eq!(result.address.zip, "11000");
        assert_eq!(result.address.region_id, Some(RegionId::new(19)));
    }

    #[test]
    fn test_registration_number_in_canonical_form_needs_no_correction() {
        let mut place = wenceslas();
        place.municipality_name = Some("Lhota".into());
        place.municipality_part_name = None;
        place.street_name = None;
        place.cp = None;
        place.co = None;
        place.ce = Some("7".into());
        place.zip = Some("25101".into());

        let result = reconcile("Lhota ev.7, 251 01 Lhota", &place).unwrap();
        assert_eq!(result.canonical, "Lhota ev.7, 251 01 Lhota");
        assert!(result.correction.is_none());

        let spaced = reconcile("Lhota ev. 7, 251 01 Lhota", &place).unwrap();
        assert!(spaced.correction.is_some());
    }

    #[test]
    fn test_reordered_input_gets_correction() {
        let input = "Praha, Václavské náměstí 812/59";
        let result = reconcile(input, &wenceslas()).unwrap();

        match result.correction {
            Some(Suggestion::Complete { label, address }) => {
                assert_eq!(label, "Václavské náměstí 812/59, 110 00 Praha");
                assert_eq!(address.original_string, input);
            }
            other => panic!("expected a complete suggestion, got {:?}", other),
        }
    }

    #[test]
    fn test_place_without_municipality_id_is_rejected() {
        let mut place = wenceslas();
        place.municipality_id = None;
        assert!(resolve_place(&place, "x").is_none());
    }
}
