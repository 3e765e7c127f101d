// error.rs — failures that abort a callback and are reported to the host

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("ED_Alloc: no free edicts (max {max})")]
    NoFreeEdicts { max: usize },

    #[error("entity {ent} has no client")]
    NoClient { ent: usize },

    #[error("NULL ent->think on entity {ent}")]
    NullThink { ent: usize },
}

pub type GameResult<T> = Result<T, GameError>;
