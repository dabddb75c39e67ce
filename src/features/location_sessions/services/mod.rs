mod location_selection_session;
mod location_session_service;

pub use location_selection_session::LocationSelectionSession;
pub use location_session_service::LocationSessionService;
