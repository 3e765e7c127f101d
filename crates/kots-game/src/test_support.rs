// test_support.rs — recording host and context builders for unit tests

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::g_local::*;
use crate::game_import::{set_gi, GameImport};
use crate::g_utils::g_spawn;
use crate::kots_character::kots_character_init;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Dprintf(String),
    Error(String),
    Centerprint(i32, String),
    Sound { ent: i32, channel: i32, name: String, volume: f32 },
    Link(i32),
    Unlink(i32),
    WriteByte(i32),
    WriteShort(i32),
    WritePosition(Vec3),
    WriteDir(Vec3),
    Multicast(Vec3, Multicast),
    TagMalloc(i32, i32),
    FreeTags(i32),
}

/// Host that records every call and replays scripted query results.
#[derive(Default)]
pub(crate) struct RecordingImport {
    calls: RefCell<Vec<Call>>,
    sounds: RefCell<Vec<String>>,
    models: RefCell<Vec<String>>,
    traces: RefCell<VecDeque<Trace>>,
    box_results: RefCell<Vec<i32>>,
    cvars: RefCell<HashMap<String, f32>>,
}

impl RecordingImport {
    /// Create a recorder and install it as this thread's host.
    pub fn install() -> Rc<Self> {
        let gi = Rc::new(Self::default());
        set_gi(gi.clone());
        gi
    }

    /// Queue a trace result. Once the queue is empty, traces run clear.
    pub fn push_trace(&self, tr: Trace) {
        self.traces.borrow_mut().push_back(tr);
    }

    pub fn set_box_results(&self, hits: Vec<i32>) {
        *self.box_results.borrow_mut() = hits;
    }

    pub fn set_cvar(&self, name: &str, value: f32) {
        self.cvars.borrow_mut().insert(name.to_string(), value);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn dprints(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Dprintf(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Error(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn sounds_played(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Sound { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn model_name(&self, index: i32) -> Option<String> {
        self.models.borrow().get((index - 1).max(0) as usize).cloned()
    }

    fn push(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn register(list: &RefCell<Vec<String>>, name: &str) -> i32 {
        let mut list = list.borrow_mut();
        let pos = match list.iter().position(|n| n == name) {
            Some(p) => p,
            None => {
                list.push(name.to_string());
                list.len() - 1
            }
        };
        pos as i32 + 1
    }
}

impl GameImport for RecordingImport {
    fn dprintf(&self, msg: &str) {
        self.push(Call::Dprintf(msg.to_string()));
    }
    fn error(&self, msg: &str) {
        self.push(Call::Error(msg.to_string()));
    }
    fn centerprintf(&self, ent_idx: i32, msg: &str) {
        self.push(Call::Centerprint(ent_idx, msg.to_string()));
    }

    fn sound(&self, ent_idx: i32, channel: i32, soundindex: i32, volume: f32, _attenuation: f32, _timeofs: f32) {
        let name = self
            .sounds
            .borrow()
            .get((soundindex - 1).max(0) as usize)
            .cloned()
            .unwrap_or_default();
        self.push(Call::Sound { ent: ent_idx, channel, name, volume });
    }

    fn soundindex(&self, name: &str) -> i32 {
        Self::register(&self.sounds, name)
    }
    fn modelindex(&self, name: &str) -> i32 {
        Self::register(&self.models, name)
    }

    fn trace(&self, _start: &Vec3, _mins: &Vec3, _maxs: &Vec3, end: &Vec3, _passent: i32, _contentmask: i32) -> Trace {
        self.traces.borrow_mut().pop_front().unwrap_or_else(|| Trace::clear(end))
    }

    fn linkentity(&self, ent_idx: i32) {
        self.push(Call::Link(ent_idx));
    }
    fn unlinkentity(&self, ent_idx: i32) {
        self.push(Call::Unlink(ent_idx));
    }
    fn box_edicts(&self, _mins: &Vec3, _maxs: &Vec3, maxcount: i32, _areatype: i32) -> Vec<i32> {
        self.box_results.borrow().iter().copied().take(maxcount.max(0) as usize).collect()
    }

    fn multicast(&self, origin: &Vec3, to: Multicast) {
        self.push(Call::Multicast(*origin, to));
    }
    fn write_byte(&self, c: i32) {
        self.push(Call::WriteByte(c));
    }
    fn write_short(&self, c: i32) {
        self.push(Call::WriteShort(c));
    }
    fn write_position(&self, pos: &Vec3) {
        self.push(Call::WritePosition(*pos));
    }
    fn write_dir(&self, dir: &Vec3) {
        self.push(Call::WriteDir(*dir));
    }

    fn tag_malloc(&self, size: i32, tag: i32) -> Vec<u8> {
        self.push(Call::TagMalloc(size, tag));
        vec![0u8; size.max(0) as usize]
    }
    fn free_tags(&self, tag: i32) {
        self.push(Call::FreeTags(tag));
    }

    fn cvar(&self, var_name: &str, value: &str, _flags: i32) -> f32 {
        self.cvars
            .borrow()
            .get(var_name)
            .copied()
            .unwrap_or_else(|| value.parse().unwrap_or(0.0))
    }
}

// ============================================================
// Context builders
// ============================================================

/// Small pool with `maxclients` reserved player slots.
pub(crate) fn test_ctx(maxclients: usize) -> GameCtx {
    let mut ctx = GameCtx::new(maxclients, 128);
    ctx.level.time = 10.0;
    ctx
}

/// Spawn a bare entity above the reserved range.
pub(crate) fn spawn_plain(ctx: &mut GameCtx) -> usize {
    g_spawn(ctx).expect("test pool exhausted")
}

/// Bring client slot `slot` (1-based) into the game as a live player.
pub(crate) fn spawn_player(ctx: &mut GameCtx, slot: usize, dexterity: i32) -> usize {
    let client = ctx.edicts[slot].client.expect("not a client slot");
    ctx.clients[client].pers.dexterity = dexterity;
    ctx.clients[client].pers.connected = true;

    let e = &mut ctx.edicts[slot];
    e.inuse = true;
    e.classname = "player".to_string();
    e.solid = Solid::Bbox;
    e.movetype = MoveType::Walk;
    e.takedamage = DAMAGE_AIM;
    e.health = 100;
    e.max_health = 100;
    e.mass = 200;
    e.gravity = 1.0;
    e.viewheight = 22;
    e.mins = [-16.0, -16.0, -24.0];
    e.maxs = [16.0, 16.0, 32.0];
    e.size = [32.0, 32.0, 56.0];
    e.clipmask = MASK_PLAYERSOLID;
    kots_character_init(ctx, slot);
    slot
}

/// Use up the reserved body-queue slots so later spawns can really be freed.
pub(crate) fn fill_body_queue(ctx: &mut GameCtx) {
    while ctx.num_edicts <= ctx.game.maxclients + BODY_QUEUE_SIZE {
        spawn_plain(ctx);
    }
}
