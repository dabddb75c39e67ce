mod location_session_handler;

pub use location_session_handler::*;
