// q_shared.rs — math, trace and state types shared by the game module and its host

// ============================================================
// Basic types
// ============================================================

pub type Vec3 = [f32; 3];

#[allow(non_upper_case_globals)]
pub const vec3_origin: Vec3 = [0.0, 0.0, 0.0];

// Angle indexes
pub const PITCH: usize = 0; // up / down
pub const YAW: usize = 1; // left / right
pub const ROLL: usize = 2; // fall over

pub const RAD_TO_DEG: f32 = 180.0 / std::f32::consts::PI;

// ============================================================
// Limits
// ============================================================

pub const MAX_EDICTS: usize = 1024;
pub const MAX_ITEMS: usize = 256;
pub const MAX_STATS: usize = 32;

// ============================================================
// Multicast
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Multicast {
    All = 0,
    Phs = 1,
    Pvs = 2,
    AllR = 3,
    PhsR = 4,
    PvsR = 5,
}

// ============================================================
// Content flags
// ============================================================

pub const CONTENTS_SOLID: i32 = 1;
pub const CONTENTS_WINDOW: i32 = 2;
pub const CONTENTS_LAVA: i32 = 8;
pub const CONTENTS_SLIME: i32 = 16;
pub const CONTENTS_WATER: i32 = 32;
pub const CONTENTS_PLAYERCLIP: i32 = 0x10000;
pub const CONTENTS_MONSTERCLIP: i32 = 0x20000;
pub const CONTENTS_MONSTER: i32 = 0x2000000;
pub const CONTENTS_DEADMONSTER: i32 = 0x4000000;

// Surface flags
pub const SURF_LIGHT: i32 = 0x1;
pub const SURF_SLICK: i32 = 0x2;
pub const SURF_SKY: i32 = 0x4;
pub const SURF_WARP: i32 = 0x8;
pub const SURF_NODRAW: i32 = 0x80;

// ============================================================
// Content masks
// ============================================================

pub const MASK_SOLID: i32 = CONTENTS_SOLID | CONTENTS_WINDOW;
pub const MASK_PLAYERSOLID: i32 =
    CONTENTS_SOLID | CONTENTS_PLAYERCLIP | CONTENTS_WINDOW | CONTENTS_MONSTER;
pub const MASK_MONSTERSOLID: i32 =
    CONTENTS_SOLID | CONTENTS_MONSTERCLIP | CONTENTS_WINDOW | CONTENTS_MONSTER;
pub const MASK_OPAQUE: i32 = CONTENTS_SOLID | CONTENTS_SLIME | CONTENTS_LAVA;
pub const MASK_SHOT: i32 =
    CONTENTS_SOLID | CONTENTS_MONSTER | CONTENTS_WINDOW | CONTENTS_DEADMONSTER;

// BoxEdicts area selectors
pub const AREA_SOLID: i32 = 1;
pub const AREA_TRIGGERS: i32 = 2;

// ============================================================
// Plane / surface / trace
// ============================================================

#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct CPlane {
    pub normal: Vec3,
    pub dist: f32,
    pub plane_type: u8,
    pub signbits: u8,
    pub pad: [u8; 2],
}

#[derive(Debug, Clone, Default)]
#[repr(C)]
pub struct CSurface {
    pub name: [u8; 16],
    pub flags: i32,
    pub value: i32,
}

impl CSurface {
    pub fn with_flags(flags: i32) -> Self {
        Self { flags, ..Self::default() }
    }
}

/// Result of a host collision query. `ent_index` is -1 when nothing was hit.
#[derive(Debug, Clone)]
pub struct Trace {
    pub allsolid: bool,
    pub startsolid: bool,
    pub fraction: f32,
    pub endpos: Vec3,
    pub plane: CPlane,
    pub surface: Option<CSurface>,
    pub contents: i32,
    pub ent_index: i32,
}

impl Default for Trace {
    fn default() -> Self {
        Self {
            allsolid: false,
            startsolid: false,
            fraction: 1.0,
            endpos: [0.0; 3],
            plane: CPlane::default(),
            surface: None,
            contents: 0,
            ent_index: -1,
        }
    }
}

impl Trace {
    /// A trace that ran its full length and ended at `end`.
    pub fn clear(end: &Vec3) -> Self {
        Self { endpos: *end, ..Self::default() }
    }

    /// A trace stopped by entity `ent_index` at `fraction`.
    pub fn hit(ent_index: i32, fraction: f32, endpos: &Vec3) -> Self {
        Self {
            fraction,
            endpos: *endpos,
            ent_index,
            ..Self::default()
        }
    }
}

// ============================================================
// Player movement
// ============================================================

pub const PMF_DUCKED: u8 = 1;
pub const PMF_JUMP_HELD: u8 = 2;
pub const PMF_ON_GROUND: u8 = 4;
pub const PMF_TIME_WATERJUMP: u8 = 8;
pub const PMF_TIME_LAND: u8 = 16;
pub const PMF_TIME_TELEPORT: u8 = 32;
pub const PMF_NO_PREDICTION: u8 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum PmType {
    #[default]
    Normal = 0,
    Spectator = 1,
    Dead = 2,
    Gib = 3,
    Freeze = 4,
}

#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct PmoveState {
    pub pm_type: PmType,
    pub origin: [i16; 3],
    pub velocity: [i16; 3],
    pub pm_flags: u8,
    pub pm_time: u8,
    pub gravity: i16,
    pub delta_angles: [i16; 3],
}

// Button bits
pub const BUTTON_ATTACK: i32 = 1;
pub const BUTTON_USE: i32 = 2;
pub const BUTTON_ANY: i32 = 128;

// ============================================================
// Console variable flags
// ============================================================

pub const CVAR_ARCHIVE: i32 = 1;
pub const CVAR_USERINFO: i32 = 2;
pub const CVAR_SERVERINFO: i32 = 4;
pub const CVAR_NOSET: i32 = 8;
pub const CVAR_LATCH: i32 = 16;

// ============================================================
// Sound channels / attenuation
// ============================================================

pub const CHAN_AUTO: i32 = 0;
pub const CHAN_WEAPON: i32 = 1;
pub const CHAN_VOICE: i32 = 2;
pub const CHAN_ITEM: i32 = 3;
pub const CHAN_BODY: i32 = 4;
pub const CHAN_NO_PHS_ADD: i32 = 8;
pub const CHAN_RELIABLE: i32 = 16;

pub const ATTN_NONE: f32 = 0.0;
pub const ATTN_NORM: f32 = 1.0;
pub const ATTN_IDLE: f32 = 2.0;
pub const ATTN_STATIC: f32 = 3.0;

// ============================================================
// Entity / player state
// ============================================================

#[derive(Debug, Clone, Default)]
#[repr(C)]
pub struct EntityState {
    pub number: i32,
    pub origin: Vec3,
    pub angles: Vec3,
    pub old_origin: Vec3,
    pub modelindex: i32,
    pub modelindex2: i32,
    pub frame: i32,
    pub skinnum: i32,
    pub effects: u32,
    pub renderfx: i32,
    pub solid: i32,
    pub sound: i32,
    pub event: i32,
}

#[derive(Debug, Clone)]
#[repr(C)]
pub struct PlayerState {
    pub pmove: PmoveState,
    pub viewangles: Vec3,
    pub viewoffset: Vec3,
    pub kick_angles: Vec3,
    pub gunangles: Vec3,
    pub gunoffset: Vec3,
    pub gunindex: i32,
    pub gunframe: i32,
    pub fov: f32,
    pub stats: [i16; MAX_STATS],
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            pmove: PmoveState::default(),
            viewangles: [0.0; 3],
            viewoffset: [0.0; 3],
            kick_angles: [0.0; 3],
            gunangles: [0.0; 3],
            gunoffset: [0.0; 3],
            gunindex: 0,
            gunframe: 0,
            fov: 90.0,
            stats: [0; MAX_STATS],
        }
    }
}

// ============================================================
// MATHLIB
// ============================================================

#[inline]
pub fn dot_product(a: &Vec3, b: &Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn vector_subtract(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn vector_add(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn vector_scale(v: &Vec3, scale: f32) -> Vec3 {
    [v[0] * scale, v[1] * scale, v[2] * scale]
}

/// veca + scale * vecb
#[inline]
pub fn vector_ma(veca: &Vec3, scale: f32, vecb: &Vec3) -> Vec3 {
    [
        veca[0] + scale * vecb[0],
        veca[1] + scale * vecb[1],
        veca[2] + scale * vecb[2],
    ]
}

pub fn vector_compare(v1: &Vec3, v2: &Vec3) -> bool {
    v1[0] == v2[0] && v1[1] == v2[1] && v1[2] == v2[2]
}

pub fn vector_length(v: &Vec3) -> f32 {
    dot_product(v, v).sqrt()
}

/// Normalize in place, returns original length.
pub fn vector_normalize(v: &mut Vec3) -> f32 {
    let length = vector_length(v);
    if length != 0.0 {
        let ilength = 1.0 / length;
        v[0] *= ilength;
        v[1] *= ilength;
        v[2] *= ilength;
    }
    length
}

pub fn cross_product(v1: &Vec3, v2: &Vec3) -> Vec3 {
    [
        v1[1] * v2[2] - v1[2] * v2[1],
        v1[2] * v2[0] - v1[0] * v2[2],
        v1[0] * v2[1] - v1[1] * v2[0],
    ]
}

// ============================================================
// Angle functions
// ============================================================

pub fn angle_vectors(
    angles: &Vec3,
    forward: Option<&mut Vec3>,
    right: Option<&mut Vec3>,
    up: Option<&mut Vec3>,
) {
    let (sy, cy) = angles[YAW].to_radians().sin_cos();
    let (sp, cp) = angles[PITCH].to_radians().sin_cos();
    let (sr, cr) = angles[ROLL].to_radians().sin_cos();

    if let Some(f) = forward {
        *f = [cp * cy, cp * sy, -sp];
    }
    if let Some(r) = right {
        *r = [
            -sr * sp * cy + cr * sy,
            -sr * sp * sy - cr * cy,
            -sr * cp,
        ];
    }
    if let Some(u) = up {
        *u = [
            cr * sp * cy + sr * sy,
            cr * sp * sy - sr * cy,
            cr * cp,
        ];
    }
}

/// Returns (forward, right, up) for `angles`.
pub fn angle_vectors_tuple(angles: &Vec3) -> (Vec3, Vec3, Vec3) {
    let mut forward = [0.0; 3];
    let mut right = [0.0; 3];
    let mut up = [0.0; 3];
    angle_vectors(angles, Some(&mut forward), Some(&mut right), Some(&mut up));
    (forward, right, up)
}

/// Yaw of a direction, truncated to whole degrees.
pub fn vectoyaw(vec: &Vec3) -> f32 {
    if vec[PITCH] == 0.0 {
        if vec[YAW] > 0.0 {
            90.0
        } else if vec[YAW] < 0.0 {
            -90.0
        } else {
            0.0
        }
    } else {
        let yaw = (vec[YAW].atan2(vec[PITCH]) * RAD_TO_DEG) as i32 as f32;
        if yaw < 0.0 {
            yaw + 360.0
        } else {
            yaw
        }
    }
}

/// Euler angles of a direction, pitch and yaw truncated to whole degrees.
pub fn vectoangles(value1: &Vec3, angles: &mut Vec3) {
    let mut yaw;
    let mut pitch;

    if value1[1] == 0.0 && value1[0] == 0.0 {
        yaw = 0.0;
        pitch = if value1[2] > 0.0 { 90.0 } else { 270.0 };
    } else {
        yaw = if value1[0] != 0.0 {
            (value1[1].atan2(value1[0]) * RAD_TO_DEG) as i32 as f32
        } else if value1[1] > 0.0 {
            90.0
        } else {
            -90.0
        };
        if yaw < 0.0 {
            yaw += 360.0;
        }

        let forward = (value1[0] * value1[0] + value1[1] * value1[1]).sqrt();
        pitch = (value1[2].atan2(forward) * RAD_TO_DEG) as i32 as f32;
        if pitch < 0.0 {
            pitch += 360.0;
        }
    }

    angles[PITCH] = -pitch;
    angles[YAW] = yaw;
    angles[ROLL] = 0.0;
}

// ============================================================
// String comparison (case-insensitive)
// ============================================================

pub fn q_stricmp(s1: &str, s2: &str) -> std::cmp::Ordering {
    s1.to_ascii_lowercase().cmp(&s2.to_ascii_lowercase())
}

pub fn q_streq_nocase(s1: &str, s2: &str) -> bool {
    s1.eq_ignore_ascii_case(s2)
}
