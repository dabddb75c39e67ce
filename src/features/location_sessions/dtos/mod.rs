mod location_session_dto;

pub use location_session_dto::*;
