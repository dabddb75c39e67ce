pub mod constants;
pub mod coordinate;
pub mod multipart;
#[cfg(test)]
pub mod test_helpers;
pub mod types;

pub use coordinate::Coordinate;
