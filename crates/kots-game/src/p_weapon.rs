// p_weapon.rs — Player weapon framework

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

use crate::dispatch::{call_weapon_think, ThinkFn, WEAPON_GRAPPLE};
use crate::error::{GameError, GameResult};
use crate::g_local::*;
use crate::game_import::*;
use crate::g_utils::{g_link_entity, g_project_source, g_spawn};

/// View models, indexed like the weapon think table.
const WEAPON_VIEW_MODELS: [(usize, &str); 1] = [
    (WEAPON_GRAPPLE, "models/weapons/grapple/tris.md2"),
];

/// Adjusts weapon offset based on handedness, then calls G_ProjectSource.
pub fn p_project_source(client: &GClient, point: &Vec3, distance: &Vec3, forward: &Vec3, right: &Vec3) -> Vec3 {
    let mut dist = *distance;
    if client.pers.hand == LEFT_HANDED {
        dist[1] *= -1.0;
    } else if client.pers.hand == CENTER_HANDED {
        dist[1] = 0.0;
    }
    g_project_source(point, &dist, forward, right)
}

fn spawn_noise(ctx: &mut GameCtx, who: usize) -> GameResult<usize> {
    let noise = g_spawn(ctx)?;
    let e = &mut ctx.edicts[noise];
    e.classname = "player_noise".to_string();
    e.mins = [-8.0, -8.0, -8.0];
    e.maxs = [8.0, 8.0, 8.0];
    e.owner = Some(who);
    e.svflags = SVF_NOCLIENT;
    Ok(noise)
}

/// Each player can have two noise objects associated with it:
/// a personal noise (jumping, pain, weapon firing), and a weapon
/// target noise (bullet wall impacts).
///
/// Monsters that don't directly see the player can move
/// to a noise in hopes of seeing the player from there.
pub fn player_noise(ctx: &mut GameCtx, who: usize, where_pos: &Vec3, noise_type: i32) -> GameResult<()> {
    if noise_type == PNOISE_WEAPON {
        if let Some(c) = ctx.client_of(who) {
            let client = &mut ctx.clients[c];
            if client.silencer_shots > 0 {
                client.silencer_shots -= 1;
                return Ok(());
            }
        }
    }

    if ctx.deathmatch != 0.0 {
        return Ok(());
    }

    if ctx.edicts[who].flags.contains(EntityFlags::NOTARGET) {
        return Ok(());
    }

    if ctx.edicts[who].mynoise.is_none() {
        let n1 = spawn_noise(ctx, who)?;
        ctx.edicts[who].mynoise = Some(n1);
        let n2 = spawn_noise(ctx, who)?;
        ctx.edicts[who].mynoise2 = Some(n2);
    }

    let framenum = ctx.level.framenum;
    let noise = if noise_type == PNOISE_SELF || noise_type == PNOISE_WEAPON {
        ctx.level.sound_entity = ctx.edicts[who].mynoise;
        ctx.level.sound_entity_framenum = framenum;
        ctx.edicts[who].mynoise
    } else {
        ctx.level.sound2_entity = ctx.edicts[who].mynoise2;
        ctx.level.sound2_entity_framenum = framenum;
        ctx.edicts[who].mynoise2
    };
    let Some(noise) = noise else {
        return Ok(());
    };

    let time = ctx.level.time;
    let e = &mut ctx.edicts[noise];
    e.s.origin = *where_pos;
    e.teleport_time = time;
    g_link_entity(ctx, noise);
    Ok(())
}

/// The current weapon is down; bring up the requested one.
pub fn change_weapon(ctx: &mut GameCtx, ent: usize) -> GameResult<()> {
    let c = ctx.client_of(ent).ok_or(GameError::NoClient { ent })?;
    let client = &mut ctx.clients[c];

    client.pers.weapon = client.newweapon.take();

    let Some(weapon) = client.pers.weapon else {
        // dead
        client.ps.gunindex = 0;
        return Ok(());
    };

    client.weaponstate = WeaponState::Activating;
    client.ps.gunframe = 0;
    client.ps.gunindex = WEAPON_VIEW_MODELS
        .iter()
        .find(|(w, _)| *w == weapon)
        .map_or(0, |(_, model)| gi_modelindex(model));
    Ok(())
}

/// Called by ClientBeginServerFrame and ClientThink.
pub fn think_weapon(ctx: &mut GameCtx, ent: usize) -> GameResult<()> {
    let c = ctx.client_of(ent).ok_or(GameError::NoClient { ent })?;

    // if just died, put the weapon away
    if ctx.edicts[ent].health < 1 {
        ctx.clients[c].newweapon = None;
        change_weapon(ctx, ent)?;
    }

    // call active weapon think routine
    match ctx.clients[c].pers.weapon {
        Some(weapon) => call_weapon_think(ctx, ent, weapon),
        None => Ok(()),
    }
}

/// A generic function to handle the basics of weapon thinking.
///
/// Frames run activate `0..=activate_last`, fire up to `fire_last`, idle up to
/// `idle_last` and deactivate up to `deactivate_last`. `pause_frames` and
/// `fire_frames` are zero-terminated.
pub fn weapon_generic(
    ctx: &mut GameCtx,
    ent: usize,
    frame_activate_last: i32,
    frame_fire_last: i32,
    frame_idle_last: i32,
    frame_deactivate_last: i32,
    pause_frames: &[i32],
    fire_frames: &[i32],
    fire_fn: ThinkFn,
) -> GameResult<()> {
    let frame_fire_first = frame_activate_last + 1;
    let frame_idle_first = frame_fire_last + 1;
    let frame_deactivate_first = frame_idle_last + 1;

    let c = ctx.client_of(ent).ok_or(GameError::NoClient { ent })?;

    if ctx.edicts[ent].deadflag != DEAD_NO {
        return Ok(());
    }

    let client = &mut ctx.clients[c];
    match client.weaponstate {
        WeaponState::Dropping => {
            if client.ps.gunframe == frame_deactivate_last {
                return change_weapon(ctx, ent);
            }
            client.ps.gunframe += 1;
            return Ok(());
        }
        WeaponState::Activating => {
            if client.ps.gunframe == frame_activate_last {
                client.weaponstate = WeaponState::Ready;
                client.ps.gunframe = frame_idle_first;
                return Ok(());
            }
            client.ps.gunframe += 1;
            return Ok(());
        }
        _ => {}
    }

    if client.newweapon.is_some() && client.weaponstate != WeaponState::Firing {
        client.weaponstate = WeaponState::Dropping;
        client.ps.gunframe = frame_deactivate_first;
        return Ok(());
    }

    if client.weaponstate == WeaponState::Ready {
        if (client.latched_buttons | client.buttons) & BUTTON_ATTACK != 0 {
            client.latched_buttons &= !BUTTON_ATTACK;
            client.ps.gunframe = frame_fire_first;
            client.weaponstate = WeaponState::Firing;
        } else {
            if client.ps.gunframe == frame_idle_last {
                client.ps.gunframe = frame_idle_first;
                return Ok(());
            }

            let gunframe = client.ps.gunframe;
            let paused = pause_frames
                .iter()
                .take_while(|&&f| f != 0)
                .any(|&f| f == gunframe);
            if paused && rand::thread_rng().gen::<u32>() & 15 != 0 {
                return Ok(());
            }

            client.ps.gunframe += 1;
            return Ok(());
        }
    }

    if ctx.clients[c].weaponstate == WeaponState::Firing {
        let gunframe = ctx.clients[c].ps.gunframe;
        let fire = fire_frames
            .iter()
            .take_while(|&&f| f != 0)
            .any(|&f| f == gunframe);

        if fire {
            fire_fn(ctx, ent)?;
        } else {
            ctx.clients[c].ps.gunframe += 1;
        }

        let client = &mut ctx.clients[c];
        if client.ps.gunframe == frame_idle_first + 1 {
            client.weaponstate = WeaponState::Ready;
        }
    }
    Ok(())
}
