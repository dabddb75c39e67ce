mod place_candidate;

pub use place_candidate::{PlaceCandidate, SELECTED_LOCATION, UNKNOWN_LOCATION};
