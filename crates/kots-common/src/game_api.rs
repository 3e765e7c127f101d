// game_api.rs — values shared across the host/game boundary

/// Game API version - must match between engine and game module
pub const GAME_API_VERSION: i32 = 3;

// edict->svflags
pub const SVF_NOCLIENT: i32 = 0x00000001;
pub const SVF_DEADMONSTER: i32 = 0x00000002;
pub const SVF_MONSTER: i32 = 0x00000004;

// Server to client message opcodes used by the game module
pub const SVC_MUZZLEFLASH: i32 = 1;
pub const SVC_MUZZLEFLASH2: i32 = 2;
pub const SVC_TEMP_ENTITY: i32 = 3;

// Temp entity events
pub const TE_GUNSHOT: i32 = 0;
pub const TE_BLOOD: i32 = 1;
pub const TE_BLASTER: i32 = 2;
pub const TE_SPARKS: i32 = 9;
pub const TE_SCREEN_SPARKS: i32 = 12;
pub const TE_SHIELD_SPARKS: i32 = 13;
pub const TE_BULLET_SPARKS: i32 = 14;
pub const TE_MEDIC_CABLE_ATTACK: i32 = 19;
pub const TE_GRAPPLE_CABLE: i32 = 24;
