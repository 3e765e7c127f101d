// game.rs — values the host interprets on game-owned entities

pub use kots_common::game_api::{GAME_API_VERSION, SVF_NOCLIENT, SVF_DEADMONSTER, SVF_MONSTER};
pub use kots_common::q_shared::Multicast;

// edict->solid values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Solid {
    #[default]
    Not = 0,
    Trigger,
    Bbox,
    Bsp,
}
