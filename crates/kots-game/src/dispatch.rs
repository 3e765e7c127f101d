// dispatch.rs — Callback dispatch for entity think/touch/use
//
// Entity callbacks are stored as `Option<usize>` indices into static dispatch
// tables, so an edict never holds a borrow of the context that runs it.

use crate::error::GameResult;
use crate::g_local::{CPlane, CSurface, GameCtx};
use crate::game_import::gi_error;
use crate::{g_trigger, g_utils, kots_hook};

// ============================================================
// Type aliases for callback signatures
// ============================================================

pub type ThinkFn = fn(ctx: &mut GameCtx, self_idx: usize) -> GameResult<()>;
pub type TouchFn = fn(
    ctx: &mut GameCtx,
    self_idx: usize,
    other_idx: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) -> GameResult<()>;
pub type UseFn = fn(
    ctx: &mut GameCtx,
    self_idx: usize,
    other_idx: usize,
    activator_idx: Option<usize>,
) -> GameResult<()>;

// ============================================================
// Named constants
// ============================================================

pub const THINK_DELAY: usize = 0;
pub const THINK_FREE_EDICT: usize = 1;
pub const THINK_MULTI_WAIT: usize = 2;

pub const TOUCH_GRAPPLE: usize = 0;
pub const TOUCH_MULTI: usize = 1;

pub const USE_MULTI: usize = 0;
pub const USE_TRIGGER_RELAY: usize = 1;

// Weapon think routines, indexed by `pers.weapon`
pub const WEAPON_GRAPPLE: usize = 0;

// ============================================================
// Tables
// ============================================================

static THINK_TABLE: [ThinkFn; 3] = [
    g_utils::think_delay,
    g_utils::think_free_edict,
    g_trigger::multi_wait,
];

static TOUCH_TABLE: [TouchFn; 2] = [
    kots_hook::grapple_touch,
    g_trigger::touch_multi,
];

static USE_TABLE: [UseFn; 2] = [
    g_trigger::use_multi,
    g_trigger::trigger_relay_use,
];

static WEAPON_THINK_TABLE: [ThinkFn; 1] = [
    kots_hook::weapon_grapple,
];

// ============================================================
// Callers
// ============================================================

/// Call the think_fn on an edict if set.
pub fn call_think(ctx: &mut GameCtx, self_idx: usize) -> GameResult<()> {
    match ctx.edicts[self_idx].think_fn.and_then(|i| THINK_TABLE.get(i)) {
        Some(f) => f(ctx, self_idx),
        None => Ok(()),
    }
}

/// Call the touch_fn on an edict if set.
pub fn call_touch(
    ctx: &mut GameCtx,
    self_idx: usize,
    other_idx: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) -> GameResult<()> {
    match ctx.edicts[self_idx].touch_fn.and_then(|i| TOUCH_TABLE.get(i)) {
        Some(f) => f(ctx, self_idx, other_idx, plane, surf),
        None => Ok(()),
    }
}

/// Call the use_fn on an edict if set.
pub fn call_use(
    ctx: &mut GameCtx,
    self_idx: usize,
    other_idx: usize,
    activator_idx: Option<usize>,
) -> GameResult<()> {
    match ctx.edicts[self_idx].use_fn.and_then(|i| USE_TABLE.get(i)) {
        Some(f) => f(ctx, self_idx, other_idx, activator_idx),
        None => Ok(()),
    }
}

/// Run the think routine of weapon `weapon` for player `self_idx`.
pub fn call_weapon_think(ctx: &mut GameCtx, self_idx: usize, weapon: usize) -> GameResult<()> {
    match WEAPON_THINK_TABLE.get(weapon) {
        Some(f) => f(ctx, self_idx),
        None => Ok(()),
    }
}

/// Hand a failed callback to the host's error channel.
pub fn report(result: GameResult<()>) {
    if let Err(e) = result {
        gi_error(&format!("{}\n", e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn test_empty_slots_are_noops() {
        let _gi = RecordingImport::install();
        let mut ctx = test_ctx(1);
        let e = spawn_plain(&mut ctx);
        assert!(call_think(&mut ctx, e).is_ok());
        assert!(call_touch(&mut ctx, e, 0, None, None).is_ok());
        assert!(call_use(&mut ctx, e, 0, None).is_ok());
    }

    #[test]
    fn test_unknown_index_is_ignored() {
        let _gi = RecordingImport::install();
        let mut ctx = test_ctx(1);
        let e = spawn_plain(&mut ctx);
        ctx.edicts[e].think_fn = Some(99);
        assert!(call_think(&mut ctx, e).is_ok());
        assert!(ctx.edicts[e].inuse);
    }

    #[test]
    fn test_think_free_edict_routes() {
        let _gi = RecordingImport::install();
        let mut ctx = test_ctx(1);
        fill_body_queue(&mut ctx);
        let e = spawn_plain(&mut ctx);
        ctx.edicts[e].think_fn = Some(THINK_FREE_EDICT);
        call_think(&mut ctx, e).unwrap();
        assert!(!ctx.edicts[e].inuse);
        assert_eq!(ctx.edicts[e].classname, "freed");
    }

    #[test]
    fn test_report_forwards_error_text() {
        let gi = RecordingImport::install();
        report(Err(crate::error::GameError::NullThink { ent: 3 }));
        report(Ok(()));
        assert_eq!(gi.errors(), vec!["NULL ent->think on entity 3\n".to_string()]);
    }
}
