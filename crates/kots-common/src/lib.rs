// Shared definitions for the KOTS game module and the host that loads it.

pub mod game_api;
pub mod q_shared;
