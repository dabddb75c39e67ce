mod geo_place_resolver;
mod nominatim_client;

pub use geo_place_resolver::{GeoPlaceResolver, ReverseGeocoder};
pub use nominatim_client::NominatimClient;
