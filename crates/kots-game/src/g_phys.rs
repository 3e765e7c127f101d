// g_phys.rs — Thinking and the movement the game runs itself

use crate::dispatch::call_touch;
use crate::error::{GameError, GameResult};
use crate::g_local::*;
use crate::game_import::*;
use crate::g_utils::g_link_entity;

pub fn sv_add_gravity(ctx: &mut GameCtx, ent: usize) {
    let g = ctx.sv_gravity;
    let e = &mut ctx.edicts[ent];
    e.velocity[2] -= e.gravity * g * FRAMETIME;
}

/// Runs thinking code if time. There is some play in the exact time the think
/// function will be called, because it is called before any movement is done
/// in a frame. Not used for pushmove objects.
///
/// Returns false if the entity thought this frame.
pub fn sv_run_think(ctx: &mut GameCtx, ent: usize) -> GameResult<bool> {
    let thinktime = ctx.edicts[ent].nextthink;
    if thinktime <= 0.0 || thinktime > ctx.level.time + 0.001 {
        return Ok(true);
    }

    ctx.edicts[ent].nextthink = 0.0;
    if ctx.edicts[ent].think_fn.is_none() {
        return Err(GameError::NullThink { ent });
    }
    crate::dispatch::call_think(ctx, ent)?;

    Ok(false)
}

/// Two entities have touched, so run their touch functions.
pub fn sv_impact(ctx: &mut GameCtx, e1: usize, trace: &Trace) -> GameResult<()> {
    let e2 = ctx.trace_ent(trace).unwrap_or(0);

    if ctx.edicts[e1].touch_fn.is_some() && ctx.edicts[e1].solid != Solid::Not {
        call_touch(ctx, e1, e2, Some(&trace.plane), trace.surface.as_ref())?;
    }

    if ctx.edicts[e2].touch_fn.is_some() && ctx.edicts[e2].solid != Solid::Not {
        call_touch(ctx, e2, e1, None, None)?;
    }
    Ok(())
}

/// Move `ent` by `push`, stopping at whatever it runs into.
pub fn sv_push_entity(ctx: &mut GameCtx, ent: usize, push: &Vec3) -> GameResult<Trace> {
    let e = &ctx.edicts[ent];
    let start = e.s.origin;
    let end = vector_add(&start, push);
    let mask = if e.clipmask != 0 { e.clipmask } else { MASK_SOLID };
    let passent = e.owner.map_or(ent as i32, |o| o as i32);

    let trace = gi_trace(&start, &e.mins, &e.maxs, &end, passent, mask);

    ctx.edicts[ent].s.origin = trace.endpos;
    g_link_entity(ctx, ent);

    if trace.fraction != 1.0 {
        sv_impact(ctx, ent, &trace)?;
    }
    Ok(trace)
}

/// Projectiles fly straight, no gravity.
fn sv_physics_flymissile(ctx: &mut GameCtx, ent: usize) -> GameResult<()> {
    if !sv_run_think(ctx, ent)? {
        return Ok(());
    }
    if !ctx.edicts[ent].inuse {
        return Ok(());
    }

    let velocity = ctx.edicts[ent].velocity;
    if vector_compare(&velocity, &vec3_origin) {
        return Ok(());
    }

    ctx.edicts[ent].s.old_origin = ctx.edicts[ent].s.origin;
    let push = vector_scale(&velocity, FRAMETIME);
    sv_push_entity(ctx, ent, &push)?;
    Ok(())
}

/// Run one frame of an entity the game is responsible for moving.
pub fn g_run_entity(ctx: &mut GameCtx, ent: usize) -> GameResult<()> {
    match ctx.edicts[ent].movetype {
        MoveType::FlyMissile => sv_physics_flymissile(ctx, ent),
        _ => sv_run_think(ctx, ent).map(|_| ()),
    }
}
