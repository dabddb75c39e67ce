mod session_state;

pub use session_state::{SelectedLocation, SessionState};
