// g_utils.rs — Entity lifetime, target firing and spawn utilities

/*
Copyright (C) 1997-2001 Id Software, Inc.

This program is free software; you can redistribute it and/or
modify it under the terms of the GNU General Public License
as published by the Free Software Foundation; either version 2
of the License, or (at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.

See the GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program; if not, write to the Free Software
Foundation, Inc., 59 Temple Place - Suite 330, Boston, MA  02111-1307, USA.
*/

use rand::Rng;
use rayon::prelude::*;

use crate::dispatch::{call_touch, call_use, THINK_DELAY, THINK_FREE_EDICT};
use crate::error::{GameError, GameResult};
use crate::g_combat::t_damage;
use crate::g_local::*;
use crate::game_import::*;
use crate::kots_character::{kots_character_clear_edicts, kots_character_free, kots_character_init};
use crate::kots_items::{kots_free_item, kots_telefrag_item};

const MAXCHOICES: usize = 8;

/// String fields `g_find` can match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdictField {
    Targetname,
    Classname,
}

impl EdictField {
    fn get(self, e: &Edict) -> &str {
        match self {
            EdictField::Targetname => &e.targetname,
            EdictField::Classname => &e.classname,
        }
    }
}

/// Projects a point in 3D space using forward and right vectors.
/// Used for weapon muzzle positioning.
pub fn g_project_source(point: &Vec3, distance: &Vec3, forward: &Vec3, right: &Vec3) -> Vec3 {
    [
        point[0] + forward[0] * distance[0] + right[0] * distance[1],
        point[1] + forward[1] * distance[0] + right[1] * distance[1],
        point[2] + forward[2] * distance[0] + right[2] * distance[1] + distance[2],
    ]
}

/// Searches in-use entities after `from` (or from the start) for one whose
/// `field` matches `match_val`, ignoring case.
pub fn g_find(ctx: &GameCtx, from: Option<usize>, field: EdictField, match_val: &str) -> Option<usize> {
    let start = from.map_or(0, |f| f + 1);
    (start..ctx.num_edicts).find(|&i| {
        let e = &ctx.edicts[i];
        if !e.inuse {
            return false;
        }
        let s = field.get(e);
        !s.is_empty() && q_streq_nocase(s, match_val)
    })
}

/// Returns the next entity after `from` whose bbox centre lies within `rad` of `org`.
/// Non-solid entities are skipped.
pub fn findradius(ctx: &GameCtx, from: Option<usize>, org: &Vec3, rad: f32) -> Option<usize> {
    let start = from.map_or(0, |f| f + 1);
    (start..ctx.num_edicts).find(|&i| within_radius(&ctx.edicts[i], org, rad))
}

/// Every entity `findradius` would visit, scanned in parallel.
pub fn findradius_all(ctx: &GameCtx, org: &Vec3, rad: f32) -> Vec<usize> {
    let mut result: Vec<usize> = ctx.edicts[..ctx.num_edicts]
        .par_iter()
        .enumerate()
        .filter_map(|(i, e)| within_radius(e, org, rad).then_some(i))
        .collect();
    result.sort_unstable();
    result
}

fn within_radius(e: &Edict, org: &Vec3, rad: f32) -> bool {
    if !e.inuse || e.solid == Solid::Not {
        return false;
    }
    let mut eorg = [0.0f32; 3];
    for j in 0..3 {
        eorg[j] = org[j] - (e.s.origin[j] + (e.mins[j] + e.maxs[j]) * 0.5);
    }
    vector_length(&eorg) <= rad
}

/// Pick a random entity from up to eight with the matching targetname.
pub fn g_pick_target(ctx: &GameCtx, targetname: &str) -> Option<usize> {
    if targetname.is_empty() {
        gi_dprintf("G_PickTarget called with NULL targetname\n");
        return None;
    }

    let mut choices = Vec::with_capacity(MAXCHOICES);
    let mut ent = None;
    while let Some(found) = g_find(ctx, ent, EdictField::Targetname, targetname) {
        choices.push(found);
        if choices.len() == MAXCHOICES {
            break;
        }
        ent = Some(found);
    }

    if choices.is_empty() {
        gi_dprintf(&format!("G_PickTarget: target {} not found\n", targetname));
        return None;
    }

    Some(choices[rand::thread_rng().gen_range(0..choices.len())])
}

/// Think for a "DelayedUse" relay: fire the stored targets, then go away.
pub fn think_delay(ctx: &mut GameCtx, ent: usize) -> GameResult<()> {
    let activator = ctx.edicts[ent].activator;
    g_use_targets(ctx, ent, activator)?;
    g_free_edict(ctx, ent);
    Ok(())
}

pub fn think_free_edict(ctx: &mut GameCtx, ent: usize) -> GameResult<()> {
    g_free_edict(ctx, ent);
    Ok(())
}

/// Fire everything `ent` targets.
///
/// A delayed entity spawns a relay that repeats this later. Otherwise the
/// message is shown to the activator, killtargets are removed, then every
/// matching target has its use callback run.
pub fn g_use_targets(ctx: &mut GameCtx, ent: usize, activator: Option<usize>) -> GameResult<()> {
    let (delay, message, target, killtarget, noise_index) = {
        let e = &ctx.edicts[ent];
        (e.delay, e.message.clone(), e.target.clone(), e.killtarget.clone(), e.noise_index)
    };

    // check for a delay
    if delay != 0.0 {
        let t = g_spawn(ctx)?;
        let time = ctx.level.time;
        let te = &mut ctx.edicts[t];
        te.classname = "DelayedUse".to_string();
        te.nextthink = time + delay;
        te.think_fn = Some(THINK_DELAY);
        te.activator = activator;
        if activator.is_none() {
            gi_dprintf("Think_Delay with no activator\n");
        }
        te.message = g_copy_string(&message);
        te.target = g_copy_string(&target);
        te.killtarget = g_copy_string(&killtarget);
        return Ok(());
    }

    // print the message
    if !message.is_empty() {
        if let Some(a) = activator.filter(|&a| !ctx.edicts[a].is_monster()) {
            gi_centerprintf(a as i32, &message);
            let noise = if noise_index != 0 {
                noise_index
            } else {
                gi_soundindex("misc/talk1.wav")
            };
            gi_sound(a as i32, CHAN_AUTO, noise, 1.0, ATTN_NORM, 0.0);
        }
    }

    // kill killtargets
    if !killtarget.is_empty() {
        let mut t = None;
        while let Some(found) = g_find(ctx, t, EdictField::Targetname, &killtarget) {
            g_free_edict(ctx, found);
            if !ctx.edicts[ent].inuse {
                gi_dprintf("entity was removed while using killtargets\n");
                return Ok(());
            }
            t = Some(found);
        }
    }

    // fire targets
    if !target.is_empty() {
        let mut t = None;
        while let Some(found) = g_find(ctx, t, EdictField::Targetname, &target) {
            t = Some(found);

            // doors fire area portals in a specific way
            if q_streq_nocase(&ctx.edicts[found].classname, "func_areaportal") {
                let cn = &ctx.edicts[ent].classname;
                if q_streq_nocase(cn, "func_door") || q_streq_nocase(cn, "func_door_rotating") {
                    continue;
                }
            }

            if found == ent {
                gi_dprintf("WARNING: Entity used itself.\n");
            } else if ctx.edicts[found].use_fn.is_some() {
                call_use(ctx, found, ent, activator)?;
            }

            if !ctx.edicts[ent].inuse {
                gi_dprintf("entity was removed while using targets\n");
                return Ok(());
            }
        }
    }

    Ok(())
}

/// Builds a vector from components.
pub fn tv(x: f32, y: f32, z: f32) -> Vec3 {
    [x, y, z]
}

/// Render a vector as "(x y z)" with whole units, for console output.
pub fn vtos(v: &Vec3) -> String {
    format!("({} {} {})", v[0] as i32, v[1] as i32, v[2] as i32)
}

const VEC_UP: Vec3 = [0.0, -1.0, 0.0];
const MOVEDIR_UP: Vec3 = [0.0, 0.0, 1.0];
const VEC_DOWN: Vec3 = [0.0, -2.0, 0.0];
const MOVEDIR_DOWN: Vec3 = [0.0, 0.0, -1.0];

/// Turn editor angles into a movement direction. The angles are cleared.
pub fn g_set_movedir(angles: &mut Vec3, movedir: &mut Vec3) {
    if vector_compare(angles, &VEC_UP) {
        *movedir = MOVEDIR_UP;
    } else if vector_compare(angles, &VEC_DOWN) {
        *movedir = MOVEDIR_DOWN;
    } else {
        angle_vectors(angles, Some(movedir), None, None);
    }
    *angles = vec3_origin;
}

pub use kots_common::q_shared::{vectoangles, vectoyaw};

/// Level-lifetime copy of a string, allocated under the host's level tag.
pub fn g_copy_string(s: &str) -> String {
    let mut buf = gi_tag_malloc(s.len() as i32, TAG_LEVEL);
    buf.clear();
    buf.extend_from_slice(s.as_bytes());
    String::from_utf8(buf).unwrap_or_default()
}

/// Mark a slot as a fresh, in-use entity.
pub fn g_init_edict(ctx: &mut GameCtx, idx: usize) {
    let e = &mut ctx.edicts[idx];
    e.inuse = true;
    e.classname = "noclass".to_string();
    e.gravity = 1.0;
    e.s.number = idx as i32;
    e.character = None;

    if e.client.is_some() {
        kots_character_init(ctx, idx);
    }
}

/// Either finds a free edict, or allocates a new one.
/// Slots freed less than half a second ago are passed over so the client
/// doesn't lerp a recycled entity from its old position.
pub fn g_spawn(ctx: &mut GameCtx) -> GameResult<usize> {
    let time = ctx.level.time;
    let first = ctx.game.maxclients + 1;

    let reuse = (first..ctx.num_edicts).find(|&i| {
        let e = &ctx.edicts[i];
        !e.inuse && (e.freetime < 2.0 || time - e.freetime > 0.5)
    });

    let idx = match reuse {
        Some(i) => i,
        None => {
            if ctx.num_edicts >= ctx.game.maxentities {
                return Err(GameError::NoFreeEdicts { max: ctx.game.maxentities });
            }
            let i = ctx.num_edicts;
            ctx.num_edicts += 1;
            if ctx.edicts.len() <= i {
                ctx.edicts.resize_with(i + 1, Edict::default);
            }
            i
        }
    };

    g_init_edict(ctx, idx);
    Ok(idx)
}

/// Marks the edict as free.
pub fn g_free_edict(ctx: &mut GameCtx, idx: usize) {
    // monsters with a character go away in two steps
    let e = &ctx.edicts[idx];
    if e.is_monster() && e.character.is_some() {
        // a dead monster is already non-solid, so the hidden flag marks the second call
        if e.svflags & SVF_NOCLIENT == 0 {
            let time = ctx.level.time;
            let e = &mut ctx.edicts[idx];
            e.svflags |= SVF_NOCLIENT;
            e.movetype = MoveType::Noclip;
            e.solid = Solid::Not;
            e.deadflag = DEAD_DEAD;
            e.takedamage = DAMAGE_NO;
            e.think_fn = Some(THINK_FREE_EDICT);
            e.nextthink = time + 10.0;
            g_link_entity(ctx, idx);
            return;
        }
        kots_character_clear_edicts(ctx, idx);
    }

    gi_unlinkentity(idx as i32);

    if idx <= ctx.game.maxclients + BODY_QUEUE_SIZE {
        return;
    }

    kots_character_free(ctx, idx);
    kots_free_item(ctx, idx);

    let time = ctx.level.time;
    let e = &mut ctx.edicts[idx];
    *e = Edict::default();
    e.classname = "freed".to_string();
    e.freetime = time;
    e.inuse = false;
}

/// Refresh the derived bounds the host reads, then link into the world.
pub fn g_link_entity(ctx: &mut GameCtx, idx: usize) {
    let e = &mut ctx.edicts[idx];
    e.size = vector_subtract(&e.maxs, &e.mins);
    e.absmin = vector_add(&e.s.origin, &e.mins);
    e.absmax = vector_add(&e.s.origin, &e.maxs);
    e.linkcount += 1;
    gi_linkentity(idx as i32);
}

/// Run the touch of every trigger `ent` is standing in.
pub fn g_touch_triggers(ctx: &mut GameCtx, ent: usize) -> GameResult<()> {
    let e = &ctx.edicts[ent];

    // dead things don't activate triggers!
    if (e.client.is_some() || e.is_monster()) && e.health <= 0 {
        return Ok(());
    }

    let touch = gi_box_edicts(&e.absmin, &e.absmax, MAX_EDICTS as i32, AREA_TRIGGERS);

    // be careful, it is possible to have an entity in this
    // list removed before we get to it (killtriggered)
    for hit in touch.into_iter().filter_map(|h| usize::try_from(h).ok()) {
        match ctx.edicts.get(hit) {
            Some(h) if h.inuse && h.touch_fn.is_some() => {}
            _ => continue,
        }
        call_touch(ctx, hit, ent, None, None)?;
    }
    Ok(())
}

/// Call the touch function of trigger `ent` for every solid it now overlaps.
/// Used after linking a new trigger in during gameplay.
pub fn g_touch_solids(ctx: &mut GameCtx, ent: usize) -> GameResult<()> {
    let e = &ctx.edicts[ent];
    let touch = gi_box_edicts(&e.absmin, &e.absmax, MAX_EDICTS as i32, AREA_SOLID);

    for hit in touch.into_iter().filter_map(|h| usize::try_from(h).ok()) {
        match ctx.edicts.get(hit) {
            Some(h) if h.inuse => {}
            _ => continue,
        }
        if ctx.edicts[ent].touch_fn.is_some() {
            call_touch(ctx, ent, hit, None, None)?;
        }
        if !ctx.edicts[ent].inuse {
            break;
        }
    }
    Ok(())
}

/// Push `targ` clear of a spawning `attacker` instead of telefragging it.
/// Returns true if a clear spot was found.
pub fn kots_spawn_kick(ctx: &mut GameCtx, targ: usize, attacker: usize) -> bool {
    let mut yaw = 30.0 * rand::thread_rng().gen_range(0..12) as f32;

    let facing = match ctx.client_of(targ) {
        Some(c) => ctx.clients[c].v_angle,
        None => ctx.edicts[targ].s.angles,
    };
    let mut forward = [0.0f32; 3];
    angle_vectors(&facing, Some(&mut forward), None, None);

    let (t, a) = (&ctx.edicts[targ], &ctx.edicts[attacker]);
    let distance = t.size[0].hypot(t.size[1])
        + (a.maxs[0] - a.mins[0]).abs().hypot((a.maxs[1] - a.mins[1]).abs());
    let (att_origin, mins, maxs) = (a.s.origin, t.mins, t.maxs);

    for _ in 0..=12 {
        let mut dest = vector_ma(&att_origin, distance, &forward);
        let start = ctx.edicts[targ].s.origin;
        let tr = gi_trace(&start, &mins, &maxs, &dest, targ as i32, MASK_PLAYERSOLID);

        if tr.fraction >= 1.0 {
            ctx.edicts[targ].s.origin = dest;

            // lift off the floor if there's room
            dest[2] += 10.0;
            let tr = gi_trace(&ctx.edicts[targ].s.origin, &mins, &maxs, &dest, targ as i32, MASK_PLAYERSOLID);
            if tr.fraction >= 1.0 {
                ctx.edicts[targ].s.origin[2] += 10.0;
            }
            g_link_entity(ctx, targ);

            let origin = ctx.edicts[targ].s.origin;
            t_damage(
                ctx, targ, attacker, attacker, &forward, &origin, &vec3_origin,
                50, 500, DamageFlags::NO_PROTECTION | DamageFlags::NO_RESIST, MOD_TELEFRAG,
            );
            gi_sound(targ as i32, CHAN_VOICE, gi_soundindex("*jump1.wav"), 1.0, ATTN_NORM, 0.0);
            return true;
        }

        let angles = [0.0, yaw, 0.0];
        yaw += 30.0;
        angle_vectors(&angles, Some(&mut forward), None, None);
    }

    false
}

/// Kills all entities that would touch the proposed new positioning of ent.
/// Ent should be unlinked before calling this!
pub fn killbox(ctx: &mut GameCtx, ent: usize) -> bool {
    let (origin, mins, maxs) = {
        let e = &ctx.edicts[ent];
        (e.s.origin, e.mins, e.maxs)
    };

    // clear dropped items off the spot while we can't be hurt by them
    let saved = ctx.edicts[ent].takedamage;
    ctx.edicts[ent].takedamage = DAMAGE_NO;
    let radius = (((mins[1] as i32).abs() + (maxs[1] as i32).abs()) * 2) as f32;
    // the sweep starts after ent, like a findradius walk seeded with it
    for other in findradius_all(ctx, &origin, radius).into_iter().filter(|&o| o > ent).take(MAX_EDICTS) {
        if ctx.edicts[other].inuse && ctx.edicts[other].item.is_some() {
            kots_telefrag_item(ctx, other);
        }
    }
    ctx.edicts[ent].takedamage = saved;

    // unsink from the floor
    let mut start = origin;
    for _ in 0..8 {
        let tr = gi_trace(&start, &mins, &maxs, &origin, -1, MASK_SOLID);
        if tr.allsolid {
            start[2] += 4.0;
        } else {
            ctx.edicts[ent].s.origin[2] = tr.endpos[2];
            break;
        }
    }

    let origin = ctx.edicts[ent].s.origin;
    let mut count = 0;
    loop {
        let tr = gi_trace(&origin, &mins, &maxs, &origin, -1, MASK_PLAYERSOLID);
        let Some(victim) = ctx.trace_ent(&tr) else {
            break;
        };

        count += 1;
        if count > MAX_EDICTS {
            break;
        }

        if ctx.edicts[victim].character.is_some() && kots_spawn_kick(ctx, victim, ent) {
            break;
        }

        // nail it
        t_damage(
            ctx, victim, ent, ent, &vec3_origin, &origin, &vec3_origin,
            100000, 0, DamageFlags::NO_PROTECTION, MOD_TELEFRAG,
        );

        // if we didn't kill it, fail
        if ctx.edicts[victim].solid != Solid::Not {
            return false;
        }
    }

    true
}
