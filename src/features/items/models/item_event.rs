use uuid::Uuid;

/// Change notification published after every successful repository write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemEvent {
    Created(Uuid),
    Updated(Uuid),
    Deleted(Uuid),
}

impl ItemEvent {
    pub fn item_id(&self) -> Uuid {
        match self {
            ItemEvent::Created(id) | ItemEvent::Updated(id) | ItemEvent::Deleted(id) => *id,
        }
    }
}
