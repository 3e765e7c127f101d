// g_main.rs — Game entry points and frame logic

use crate::dispatch::{call_think, call_touch, call_use, report};
use crate::error::GameResult;
use crate::g_local::*;
use crate::g_phys::g_run_entity;
use crate::game_import::*;
use crate::kots_hook::grapple_client_frame;
use crate::p_weapon::think_weapon;

// ============================================================
// InitGame / ShutdownGame
// ============================================================

/// Called once when the host loads the game module.
pub fn ge_init() {
    gi_dprintf("==== InitGame ====\n");
    init_global_game_ctx(GameCtx::init_from_cvars());
}

pub fn ge_shutdown() {
    gi_dprintf("==== ShutdownGame ====\n");

    gi_free_tags(TAG_LEVEL);
    gi_free_tags(TAG_GAME);
    take_global_game_ctx();
}

// ============================================================
// Host callbacks
// ============================================================

pub fn ge_run_frame() {
    with_global_game_ctx(g_run_frame);
}

/// Run `ent`'s think callback on behalf of the host.
pub fn ge_think(ent: usize) {
    with_global_game_ctx(|ctx| {
        if ent < ctx.edicts.len() {
            report(call_think(ctx, ent));
        }
    });
}

pub fn ge_touch(ent: usize, other: usize) {
    with_global_game_ctx(|ctx| {
        if ent < ctx.edicts.len() && other < ctx.edicts.len() {
            report(call_touch(ctx, ent, other, None, None));
        }
    });
}

pub fn ge_use(ent: usize, other: usize, activator: Option<usize>) {
    with_global_game_ctx(|ctx| {
        if ent < ctx.edicts.len() && other < ctx.edicts.len() {
            let activator = activator.filter(|&a| a < ctx.edicts.len());
            report(call_use(ctx, ent, other, activator));
        }
    });
}

// ============================================================
// G_RunFrame
// ============================================================

/// Weapon and hook service for a player at the start of a server frame.
fn client_begin_server_frame(ctx: &mut GameCtx, ent: usize) -> GameResult<()> {
    think_weapon(ctx, ent)?;
    grapple_client_frame(ctx, ent);
    Ok(())
}

/// Advances the world by FRAMETIME.
pub fn g_run_frame(ctx: &mut GameCtx) {
    ctx.level.framenum += 1;
    ctx.level.time = ctx.level.framenum as f32 * FRAMETIME;

    //
    // treat each object in turn
    // even the world gets a chance to think
    //
    let num_edicts = ctx.num_edicts;
    let maxclients = ctx.game.maxclients;

    for i in 0..num_edicts {
        if !ctx.edicts[i].inuse {
            continue;
        }

        ctx.edicts[i].s.old_origin = ctx.edicts[i].s.origin;

        if i > 0 && i <= maxclients {
            report(client_begin_server_frame(ctx, i));
            continue;
        }

        report(g_run_entity(ctx, i));
    }
}
