use shared::item::ItemId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("no item with id {0:?}")]
    UnknownItem(ItemId),

    #[error("item {id:?} is a {found}, expected a {expected}")]
    WrongKind {
        id: ItemId,
        expected: &'static str,
        found: &'static str,
    },

    #[error("layer {layer} out of range (board has {layer_count} layers)")]
    LayerOutOfRange { layer: usize, layer_count: usize },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

pub type Result<T> = std::result::Result<T, BoardError>;

/// Why a forced insertion or a via move could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShoveError {
    #[error("blocked by fixed obstacle {obstacle:?}")]
    Blocked { obstacle: ItemId },

    #[error("shove recursion depth exhausted at obstacle {obstacle:?}")]
    RecursionExhausted { obstacle: ItemId },

    #[error("could not spring over obstacle {obstacle:?}")]
    SpringOverFailed { obstacle: ItemId },

    #[error("stop requested")]
    Stopped,

    #[error(transparent)]
    Board(#[from] BoardError),
}

impl ShoveError {
    /// The item that prevented the insertion, if any.
    pub fn obstacle(&self) -> Option<ItemId> {
        match self {
            ShoveError::Blocked { obstacle }
            | ShoveError::RecursionExhausted { obstacle }
            | ShoveError::SpringOverFailed { obstacle } => Some(*obstacle),
            ShoveError::Stopped | ShoveError::Board(_) => None,
        }
    }
}
