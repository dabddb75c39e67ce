//! Reverse geocoding.
//!
//! [`GeoPlaceResolver`] turns a coordinate into a display name on top of a
//! pluggable [`ReverseGeocoder`]; [`NominatimClient`] is the production
//! backend.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::{GeoPlaceResolver, NominatimClient, ReverseGeocoder};
