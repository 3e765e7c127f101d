// g_trigger.rs — touch and relay triggers that feed g_use_targets

use crate::dispatch::{THINK_FREE_EDICT, THINK_MULTI_WAIT};
use crate::error::GameResult;
use crate::g_local::*;
use crate::g_utils::g_use_targets;

// trigger spawnflags
pub const TRIGGER_MONSTER: i32 = 1;
pub const TRIGGER_NOT_PLAYER: i32 = 2;

/// The wait time has passed, so set back up for another activation.
pub fn multi_wait(ctx: &mut GameCtx, ent: usize) -> GameResult<()> {
    ctx.edicts[ent].nextthink = 0.0;
    Ok(())
}

/// The trigger was just activated. `activator` should be set to the
/// activator so it can be held through a delay.
pub fn multi_trigger(ctx: &mut GameCtx, ent: usize) -> GameResult<()> {
    if ctx.edicts[ent].nextthink != 0.0 {
        return Ok(()); // already been triggered
    }

    let activator = ctx.edicts[ent].activator;
    g_use_targets(ctx, ent, activator)?;
    if !ctx.edicts[ent].inuse {
        return Ok(());
    }

    let time = ctx.level.time;
    let e = &mut ctx.edicts[ent];
    if e.wait > 0.0 {
        e.think_fn = Some(THINK_MULTI_WAIT);
        e.nextthink = time + e.wait;
    } else {
        // can't free here, we may be inside a touch loop over area links
        e.touch_fn = None;
        e.nextthink = time + FRAMETIME;
        e.think_fn = Some(THINK_FREE_EDICT);
    }
    Ok(())
}

pub fn use_multi(ctx: &mut GameCtx, ent: usize, _other: usize, activator: Option<usize>) -> GameResult<()> {
    ctx.edicts[ent].activator = activator;
    multi_trigger(ctx, ent)
}

pub fn touch_multi(
    ctx: &mut GameCtx,
    ent: usize,
    other: usize,
    _plane: Option<&CPlane>,
    _surf: Option<&CSurface>,
) -> GameResult<()> {
    let (o, spawnflags) = (&ctx.edicts[other], ctx.edicts[ent].spawnflags);
    if o.client.is_some() {
        if spawnflags & TRIGGER_NOT_PLAYER != 0 {
            return Ok(());
        }
    } else if o.is_monster() {
        if spawnflags & TRIGGER_MONSTER == 0 {
            return Ok(());
        }
    } else {
        return Ok(());
    }

    ctx.edicts[ent].activator = Some(other);
    multi_trigger(ctx, ent)
}

/// A relay can't be touched, only fired by other events.
pub fn trigger_relay_use(ctx: &mut GameCtx, ent: usize, _other: usize, activator: Option<usize>) -> GameResult<()> {
    g_use_targets(ctx, ent, activator)
}
