/// Name used when the lookup itself fails or finds nothing
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Name used when a place was found but carries no usable text
pub const SELECTED_LOCATION: &str = "Selected Location";

/// Place description returned by a reverse geocoding service
///
/// Every part is optional; services fill in whatever they know.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceCandidate {
    pub common_name: Option<String>,
    pub formatted_address: Option<String>,
    pub point_of_interest: Option<String>,
    pub locality: Option<String>,
    pub administrative_area: Option<String>,
    pub country: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl PlaceCandidate {
    /// Best display string for this place.
    ///
    /// Common name, then formatted address, then the comma-joined
    /// point of interest / locality / region / country (skipping missing
    /// parts), then [`SELECTED_LOCATION`]. Blank strings count as missing.
    pub fn display_name(&self) -> String {
        if let Some(name) = non_blank(&self.common_name) {
            return name.to_string();
        }
        if let Some(address) = non_blank(&self.formatted_address) {
            return address.to_string();
        }

        let composed = [
            &self.point_of_interest,
            &self.locality,
            &self.administrative_area,
            &self.country,
        ]
        .into_iter()
        .filter_map(non_blank)
        .collect::<Vec<_>>()
        .join(", ");

        if composed.is_empty() {
            SELECTED_LOCATION.to_string()
        } else {
            composed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn test_common_name_wins() {
        let candidate = PlaceCandidate {
            common_name: some("Kyoto"),
            formatted_address: some("Kyoto, Kyoto Prefecture, Japan"),
            locality: some("Kyoto"),
            ..Default::default()
        };
        assert_eq!(candidate.display_name(), "Kyoto");
    }

    #[test]
    fn test_address_when_no_common_name() {
        let candidate = PlaceCandidate {
            common_name: some("  "),
            formatted_address: some("1 Infinite Loop, Cupertino"),
            ..Default::default()
        };
        assert_eq!(candidate.display_name(), "1 Infinite Loop, Cupertino");
    }

    #[test]
    fn test_composed_skips_missing_parts() {
        let candidate = PlaceCandidate {
            point_of_interest: some("Fushimi Inari"),
            administrative_area: some("Kyoto Prefecture"),
            country: some("Japan"),
            ..Default::default()
        };
        assert_eq!(
            candidate.display_name(),
            "Fushimi Inari, Kyoto Prefecture, Japan"
        );
    }

    #[test]
    fn test_empty_candidate_is_selected_location() {
        assert_eq!(PlaceCandidate::default().display_name(), SELECTED_LOCATION);

        let blank = PlaceCandidate {
            locality: some(""),
            country: some(" "),
            ..Default::default()
        };
        assert_eq!(blank.display_name(), SELECTED_LOCATION);
    }
}
