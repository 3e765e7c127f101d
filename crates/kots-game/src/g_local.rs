// g_local.rs — Local definitions for the game module

// Re-export shared items so game files can reach them via `use crate::g_local::*`
pub use kots_common::q_shared::*;
pub use kots_common::game_api::*;
pub use crate::game::Solid;
pub use crate::kots_character::Character;

use parking_lot::Mutex;

use crate::game_import::gi_cvar;

pub const GAMEVERSION: &str = "kots";

pub const FRAMETIME: f32 = 0.1;

// Memory tags
pub const TAG_GAME: i32 = 765;
pub const TAG_LEVEL: i32 = 766;

pub const BODY_QUEUE_SIZE: usize = 8;

// edict->flags
bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct EntityFlags: i32 {
        const FLY            = 0x00000001;
        const SWIM           = 0x00000002;
        const INWATER        = 0x00000008;
        const GODMODE        = 0x00000010;
        const NOTARGET       = 0x00000020;
        const TEAMSLAVE      = 0x00000400;
        const NO_KNOCKBACK   = 0x00000800;
        const RESPAWN        = -2147483648_i32; // 0x80000000
    }
}

// Damage flags
bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DamageFlags: i32 {
        const RADIUS        = 0x00000001;
        const NO_ARMOR      = 0x00000002;
        const ENERGY        = 0x00000004;
        const NO_KNOCKBACK  = 0x00000008;
        const BULLET        = 0x00000010;
        const NO_PROTECTION = 0x00000020;
        const NO_RESIST     = 0x00000040; // bypasses character resistances
    }
}

// edict->takedamage
pub const DAMAGE_NO: i32 = 0;
pub const DAMAGE_YES: i32 = 1;
pub const DAMAGE_AIM: i32 = 2;

// Dead flags
pub const DEAD_NO: i32 = 0;
pub const DEAD_DYING: i32 = 1;
pub const DEAD_DEAD: i32 = 2;
pub const DEAD_RESPAWNABLE: i32 = 3;

// Item spawnflags
pub const ITEM_TRIGGER_SPAWN: i32 = 0x00000001;
pub const ITEM_NO_TOUCH: i32 = 0x00000002;
pub const DROPPED_ITEM: i32 = 0x00010000;
pub const DROPPED_PLAYER_ITEM: i32 = 0x00020000;

// Handedness
pub const RIGHT_HANDED: i32 = 0;
pub const LEFT_HANDED: i32 = 1;
pub const CENTER_HANDED: i32 = 2;

// Player noise types
pub const PNOISE_SELF: i32 = 0;
pub const PNOISE_WEAPON: i32 = 1;
pub const PNOISE_IMPACT: i32 = 2;

// Means of death
pub const MOD_UNKNOWN: i32 = 0;
pub const MOD_TELEFRAG: i32 = 21;
pub const MOD_TRIGGER_HURT: i32 = 31;
pub const MOD_GRAPPLE: i32 = 34;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum WeaponState {
    #[default]
    Ready = 0,
    Activating,
    Dropping,
    Firing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum MoveType {
    #[default]
    None = 0,
    Noclip,
    Push,
    Stop,
    Walk,
    Step,
    Fly,
    Toss,
    FlyMissile,
    Bounce,
}

/// Grapple hook progress. Ordered so `state > Fly` means the hook is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(i32)]
pub enum GrappleState {
    #[default]
    Fly = 0,
    Pull,
    Hang,
}

// ============================================================
// Client data
// ============================================================

/// Client data that stays across respawns.
#[derive(Debug, Clone, Default)]
pub struct ClientPersistant {
    pub netname: String,
    pub hand: i32,
    pub connected: bool,
    pub weapon: Option<usize>, // index into the weapon think table
    pub dexterity: i32,
    pub team: i32, // 0 = no team
}

#[derive(Debug, Clone, Default)]
pub struct GClient {
    // Known to server
    pub ps: PlayerState,
    pub ping: i32,

    // Private to game
    pub pers: ClientPersistant,

    pub buttons: i32,
    pub oldbuttons: i32,
    pub latched_buttons: i32,
    pub newweapon: Option<usize>,

    pub weaponstate: WeaponState,
    pub kick_angles: Vec3,
    pub kick_origin: Vec3,
    pub v_angle: Vec3,
    pub oldvelocity: Vec3,
    pub silencer_shots: i32,

    // Grapple
    pub ctf_grapple: Option<usize>, // hook edict
    pub ctf_grapplestate: GrappleState,
    pub ctf_grapplereleasetime: f32,
}

// ============================================================
// Entity
// ============================================================

#[derive(Debug, Clone, Default)]
pub struct Edict {
    // Server-visible fields
    pub s: EntityState,
    pub client: Option<usize>, // index into clients array, None if not a player
    pub inuse: bool,
    pub linkcount: i32,
    pub svflags: i32,
    pub mins: Vec3,
    pub maxs: Vec3,
    pub absmin: Vec3,
    pub absmax: Vec3,
    pub size: Vec3,
    pub solid: Solid,
    pub clipmask: i32,
    pub owner: Option<usize>,

    // Game-private fields
    pub movetype: MoveType,
    pub flags: EntityFlags,
    pub model: String,
    pub freetime: f32,
    pub message: String,
    pub classname: String,
    pub spawnflags: i32,
    pub target: String,
    pub targetname: String,
    pub killtarget: String,

    pub velocity: Vec3,
    pub mass: i32,
    pub gravity: f32,

    pub nextthink: f32,
    pub think_fn: Option<usize>,
    pub touch_fn: Option<usize>,
    pub use_fn: Option<usize>,

    pub health: i32,
    pub max_health: i32,
    pub deadflag: i32,
    pub takedamage: i32,
    pub dmg: i32,
    pub viewheight: i32,

    pub enemy: Option<usize>,
    pub activator: Option<usize>,
    pub mynoise: Option<usize>,
    pub mynoise2: Option<usize>,
    pub noise_index: i32,
    pub delay: f32,
    pub wait: f32,
    pub teleport_time: f32,

    pub item: Option<usize>,
    pub character: Option<Character>,
}

impl Edict {
    pub fn is_monster(&self) -> bool {
        self.svflags & SVF_MONSTER != 0
    }
}

// ============================================================
// Level / game globals
// ============================================================

#[derive(Debug, Clone, Default)]
pub struct GameLocals {
    pub maxclients: usize,
    pub maxentities: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LevelLocals {
    pub framenum: i32,
    pub time: f32,
    pub mapname: String,

    pub sound_entity: Option<usize>,
    pub sound_entity_framenum: i32,
    pub sound2_entity: Option<usize>,
    pub sound2_entity_framenum: i32,
}

// ============================================================
// Game Context
// ============================================================

/// All state owned by the game module.
pub struct GameCtx {
    pub edicts: Vec<Edict>,
    pub clients: Vec<GClient>,
    pub game: GameLocals,
    pub level: LevelLocals,

    /// Slots `0..num_edicts` have been handed out at least once.
    pub num_edicts: usize,
    pub means_of_death: i32,

    // Cvar values
    pub deathmatch: f32,
    pub sv_gravity: f32,
}

impl GameCtx {
    /// Build a pool with the world in slot 0 and one reserved slot per client.
    pub fn new(maxclients: usize, maxentities: usize) -> Self {
        let maxclients = maxclients.min(MAX_EDICTS - 1);
        let maxentities = maxentities.clamp(maxclients + 1, MAX_EDICTS);
        let mut edicts = Vec::with_capacity(maxentities);
        edicts.resize_with(maxentities, Edict::default);

        let world = &mut edicts[0];
        world.inuse = true;
        world.classname = "worldspawn".to_string();
        world.solid = Solid::Bsp;
        world.movetype = MoveType::Push;

        for (i, ent) in edicts.iter_mut().enumerate().take(maxclients + 1).skip(1) {
            ent.client = Some(i - 1);
            ent.s.number = i as i32;
        }

        Self {
            edicts,
            clients: vec![GClient::default(); maxclients],
            game: GameLocals { maxclients, maxentities },
            level: LevelLocals::default(),
            num_edicts: maxclients + 1,
            means_of_death: MOD_UNKNOWN,
            deathmatch: 0.0,
            sv_gravity: 800.0,
        }
    }

    /// Read the latched server configuration from the host console.
    pub fn init_from_cvars() -> Self {
        let maxclients = gi_cvar("maxclients", "4", CVAR_SERVERINFO | CVAR_LATCH).max(1.0) as usize;
        let maxentities = gi_cvar("maxentities", "1024", CVAR_LATCH).max(0.0) as usize;

        let mut ctx = Self::new(maxclients, maxentities);
        ctx.deathmatch = gi_cvar("deathmatch", "0", CVAR_LATCH);
        ctx.sv_gravity = gi_cvar("sv_gravity", "800", 0);
        ctx
    }

    /// Client record behind an entity, if it is a player.
    pub fn client_of(&self, ent: usize) -> Option<usize> {
        self.edicts.get(ent).and_then(|e| e.client)
    }

    /// The entity a trace hit, if the host reported one inside the pool.
    pub fn trace_ent(&self, tr: &Trace) -> Option<usize> {
        usize::try_from(tr.ent_index).ok().filter(|&i| i < self.edicts.len())
    }

    pub fn dexterity(&self, ent: usize) -> i32 {
        self.edicts[ent].character.as_ref().map_or(0, |c| c.cur_dexterity)
    }
}

// ============================================================
// Global Game Context
// ============================================================

static GLOBAL_GAME_CTX: Mutex<Option<GameCtx>> = parking_lot::const_mutex(None);

/// Install the global game context. Called once at game init time.
pub fn init_global_game_ctx(ctx: GameCtx) {
    *GLOBAL_GAME_CTX.lock() = Some(ctx);
}

/// Access the global game context via a closure.
/// Returns None if the context hasn't been initialized yet.
pub fn with_global_game_ctx<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut GameCtx) -> R,
{
    GLOBAL_GAME_CTX.lock().as_mut().map(f)
}

/// Take the global game context out (for shutdown).
pub fn take_global_game_ctx() -> Option<GameCtx> {
    GLOBAL_GAME_CTX.lock().take()
}
