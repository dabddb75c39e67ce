use crate::shared::Coordinate;

/// Where a location selection currently stands
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// No pin placed
    #[default]
    Empty,
    /// Pin placed, name lookup in flight
    Pending { coordinate: Coordinate },
    /// Pin placed and named
    Named { coordinate: Coordinate, name: String },
}

impl SessionState {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            SessionState::Empty => None,
            SessionState::Pending { coordinate } | SessionState::Named { coordinate, .. } => {
                Some(*coordinate)
            }
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            SessionState::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Empty => "empty",
            SessionState::Pending { .. } => "pending",
            SessionState::Named { .. } => "named",
        }
    }
}

/// The (coordinate, name) pair handed over on confirmation
///
/// `name` is empty when the session was confirmed before its lookup finished.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedLocation {
    pub coordinate: Coordinate,
    pub name: String,
}
