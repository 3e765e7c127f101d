//! Game import interface — functions provided by the host engine to the game module.
//! This mirrors the C `game_import_t` function pointer table from game.h.
//!
//! The simulation runs on one thread, so the installed table lives in a
//! thread-local slot set at game init time via `set_gi()`. Until a host installs
//! one, calls fall through to `StubGameImport`.

use std::cell::RefCell;
use std::rc::Rc;

use kots_common::q_shared::{Multicast, Trace, Vec3};

thread_local! {
    static GI: RefCell<Option<Rc<dyn GameImport>>> = const { RefCell::new(None) };
}

/// Install the host's import table for the calling thread.
pub fn set_gi(gi: Rc<dyn GameImport>) {
    GI.with(|slot| *slot.borrow_mut() = Some(gi));
}

/// Drop the installed import table. Later calls go to the stub.
pub fn clear_gi() {
    GI.with(|slot| *slot.borrow_mut() = None);
}

fn gi() -> Rc<dyn GameImport> {
    // Clone out of the slot so host callbacks may re-enter gi_* freely.
    GI.with(|slot| slot.borrow().clone())
        .unwrap_or_else(|| Rc::new(StubGameImport))
}

// ---- Free functions mirroring C `gi.xxx(...)` calls ----

pub fn gi_dprintf(msg: &str) { gi().dprintf(msg); }
pub fn gi_error(msg: &str) { gi().error(msg); }
pub fn gi_centerprintf(ent_idx: i32, msg: &str) { gi().centerprintf(ent_idx, msg); }
pub fn gi_sound(ent_idx: i32, channel: i32, soundindex: i32, volume: f32, attenuation: f32, timeofs: f32) {
    gi().sound(ent_idx, channel, soundindex, volume, attenuation, timeofs);
}
pub fn gi_soundindex(name: &str) -> i32 { gi().soundindex(name) }
pub fn gi_modelindex(name: &str) -> i32 { gi().modelindex(name) }
pub fn gi_trace(start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3, passent: i32, contentmask: i32) -> Trace {
    gi().trace(start, mins, maxs, end, passent, contentmask)
}
pub fn gi_linkentity(ent_idx: i32) { gi().linkentity(ent_idx); }
pub fn gi_unlinkentity(ent_idx: i32) { gi().unlinkentity(ent_idx); }
pub fn gi_box_edicts(mins: &Vec3, maxs: &Vec3, maxcount: i32, areatype: i32) -> Vec<i32> {
    gi().box_edicts(mins, maxs, maxcount, areatype)
}
pub fn gi_multicast(origin: &Vec3, to: Multicast) { gi().multicast(origin, to); }
pub fn gi_write_byte(c: i32) { gi().write_byte(c); }
pub fn gi_write_short(c: i32) { gi().write_short(c); }
pub fn gi_write_position(pos: &Vec3) { gi().write_position(pos); }
pub fn gi_write_dir(dir: &Vec3) { gi().write_dir(dir); }
pub fn gi_tag_malloc(size: i32, tag: i32) -> Vec<u8> { gi().tag_malloc(size, tag) }
pub fn gi_free_tags(tag: i32) { gi().free_tags(tag); }
pub fn gi_cvar(var_name: &str, value: &str, flags: i32) -> f32 { gi().cvar(var_name, value, flags) }

/// Game import interface — functions provided by the host engine to the game module.
pub trait GameImport {
    // Printing
    fn dprintf(&self, msg: &str);
    fn error(&self, msg: &str);
    fn centerprintf(&self, ent_idx: i32, msg: &str);

    // Sound
    fn sound(&self, ent_idx: i32, channel: i32, soundindex: i32, volume: f32, attenuation: f32, timeofs: f32);

    // Indexing
    fn soundindex(&self, name: &str) -> i32;
    fn modelindex(&self, name: &str) -> i32;

    // Collision
    fn trace(&self, start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3, passent: i32, contentmask: i32) -> Trace;

    // Entity linking
    fn linkentity(&self, ent_idx: i32);
    fn unlinkentity(&self, ent_idx: i32);
    fn box_edicts(&self, mins: &Vec3, maxs: &Vec3, maxcount: i32, areatype: i32) -> Vec<i32>;

    // Network messaging
    fn multicast(&self, origin: &Vec3, to: Multicast);
    fn write_byte(&self, c: i32);
    fn write_short(&self, c: i32);
    fn write_position(&self, pos: &Vec3);
    fn write_dir(&self, dir: &Vec3);

    // Memory, tracked by the host per tag
    fn tag_malloc(&self, size: i32, tag: i32) -> Vec<u8>;
    fn free_tags(&self, tag: i32);

    // Cvars
    fn cvar(&self, var_name: &str, value: &str, flags: i32) -> f32;
}

/// Stand-in used before a host installs its table. Prints go to stderr,
/// traces never hit, cvars report their defaults.
pub struct StubGameImport;

impl GameImport for StubGameImport {
    fn dprintf(&self, msg: &str) {
        eprint!("{}", msg);
    }
    fn error(&self, msg: &str) {
        eprint!("ERROR: {}", msg);
    }
    fn centerprintf(&self, _ent_idx: i32, msg: &str) {
        eprintln!("{}", msg);
    }

    fn sound(&self, _ent_idx: i32, _channel: i32, _soundindex: i32, _volume: f32, _attenuation: f32, _timeofs: f32) {}

    fn soundindex(&self, _name: &str) -> i32 { 0 }
    fn modelindex(&self, _name: &str) -> i32 { 0 }

    fn trace(&self, _start: &Vec3, _mins: &Vec3, _maxs: &Vec3, end: &Vec3, _passent: i32, _contentmask: i32) -> Trace {
        Trace::clear(end)
    }

    fn linkentity(&self, _ent_idx: i32) {}
    fn unlinkentity(&self, _ent_idx: i32) {}
    fn box_edicts(&self, _mins: &Vec3, _maxs: &Vec3, _maxcount: i32, _areatype: i32) -> Vec<i32> {
        Vec::new()
    }

    fn multicast(&self, _origin: &Vec3, _to: Multicast) {}
    fn write_byte(&self, _c: i32) {}
    fn write_short(&self, _c: i32) {}
    fn write_position(&self, _pos: &Vec3) {}
    fn write_dir(&self, _dir: &Vec3) {}

    fn tag_malloc(&self, size: i32, _tag: i32) -> Vec<u8> {
        vec![0u8; size.max(0) as usize]
    }
    fn free_tags(&self, _tag: i32) {}

    fn cvar(&self, _var_name: &str, value: &str, _flags: i32) -> f32 {
        value.parse().unwrap_or(0.0)
    }
}
