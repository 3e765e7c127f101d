// kots_character.rs — per-entity KOTS character stats

use crate::g_local::*;
use crate::g_utils::g_free_edict;

/// Character stats the hook consults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Character {
    pub cur_dexterity: i32,
    /// Time the last attached hook let go, for the refire cooldown.
    pub last_hookrelease: f32,
    /// Time an attached hook is forced off.
    pub next_hookrelease: f32,
}

/// Attach a fresh character. Players carry their dexterity over from the
/// persistent client record.
pub fn kots_character_init(ctx: &mut GameCtx, ent: usize) {
    let dexterity = ctx
        .client_of(ent)
        .map_or(0, |c| ctx.clients[c].pers.dexterity);

    ctx.edicts[ent].character = Some(Character {
        cur_dexterity: dexterity,
        ..Character::default()
    });
}

pub fn kots_character_free(ctx: &mut GameCtx, ent: usize) {
    ctx.edicts[ent].character = None;
}

/// Free every live edict `ent` owns (projectiles, hooks).
pub fn kots_character_clear_edicts(ctx: &mut GameCtx, ent: usize) {
    let owned: Vec<usize> = (0..ctx.num_edicts)
        .filter(|&i| i != ent && ctx.edicts[i].inuse && ctx.edicts[i].owner == Some(ent))
        .collect();

    for i in owned {
        // an earlier free may have taken this one with it
        if ctx.edicts[i].inuse && ctx.edicts[i].owner == Some(ent) {
            g_free_edict(ctx, i);
        }
    }
}

/// Volume of the owner's hook sounds. Skilled and silenced players are quieter.
pub fn hook_volume(ctx: &GameCtx, ent: usize) -> f32 {
    let dexterity = ctx.dexterity(ent);
    let mut volume = if dexterity >= 7 {
        0.2
    } else if dexterity >= 5 {
        0.5
    } else {
        1.0
    };

    if let Some(c) = ctx.client_of(ent) {
        if ctx.clients[c].silencer_shots > 0 {
            volume = 0.2;
        }
    }
    volume
}
