// kots_items.rs — item state tied to entity lifetime

use crate::g_local::*;
use crate::g_utils::g_free_edict;

/// Clear item bookkeeping before an item edict is reset.
pub fn kots_free_item(ctx: &mut GameCtx, ent: usize) {
    let e = &mut ctx.edicts[ent];
    if e.item.take().is_some() {
        e.spawnflags &= !(DROPPED_ITEM | DROPPED_PLAYER_ITEM);
    }
}

/// Remove a dropped item sitting on a spawn spot. Map-placed items stay.
pub fn kots_telefrag_item(ctx: &mut GameCtx, ent: usize) {
    let e = &ctx.edicts[ent];
    if e.item.is_none() {
        return;
    }
    if e.spawnflags & (DROPPED_ITEM | DROPPED_PLAYER_ITEM) != 0 {
        g_free_edict(ctx, ent);
    }
}
