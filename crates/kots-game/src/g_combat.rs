// g_combat.rs — Damage application and visibility checks

use crate::g_local::*;
use crate::game_import::*;
use crate::g_utils::g_link_entity;
use crate::kots_hook::player_reset_grapple;

/// Health at or below which a body is gibbed rather than left as a corpse.
pub const GIB_HEALTH: i32 = -40;

/// True if `targ` can be seen from `inflictor`'s eye.
/// Any corner of the target's bbox in clear line of sight counts.
pub fn loc_can_see(ctx: &GameCtx, targ: usize, inflictor: usize) -> bool {
    let t = &ctx.edicts[targ];

    // bmodels need special checking because their origin is 0,0,0
    if t.movetype == MoveType::Push {
        return false;
    }

    let mut viewpoint = ctx.edicts[inflictor].s.origin;
    viewpoint[2] += ctx.edicts[inflictor].viewheight as f32;

    for i in 0..8 {
        let mut point = t.s.origin;
        point[0] += if i & 1 != 0 { t.maxs[0] } else { t.mins[0] };
        point[1] += if i & 2 != 0 { t.maxs[1] } else { t.mins[1] };
        point[2] += if i & 4 != 0 { t.maxs[2] } else { t.mins[2] };

        let tr = gi_trace(&viewpoint, &vec3_origin, &vec3_origin, &point, inflictor as i32, MASK_SOLID);
        if tr.fraction == 1.0 {
            return true;
        }
    }
    false
}

/// Teammates don't hurt each other.
pub fn check_team_damage(ctx: &GameCtx, targ: usize, attacker: usize) -> bool {
    match (ctx.client_of(targ), ctx.client_of(attacker)) {
        (Some(t), Some(a)) if t != a => {
            let team = ctx.clients[t].pers.team;
            team != 0 && team == ctx.clients[a].pers.team
        }
        _ => false,
    }
}

fn spawn_damage(kind: i32, origin: &Vec3, normal: &Vec3) {
    gi_write_byte(SVC_TEMP_ENTITY);
    gi_write_byte(kind);
    gi_write_position(origin);
    gi_write_dir(normal);
    gi_multicast(origin, Multicast::Pvs);
}

/// Put `targ` into its dead state.
pub fn killed(ctx: &mut GameCtx, targ: usize, attacker: usize) {
    let is_client = ctx.edicts[targ].client.is_some();
    {
        let e = &mut ctx.edicts[targ];
        if e.health < -999 {
            e.health = -999;
        }
        e.enemy = Some(attacker);
        e.deadflag = DEAD_DEAD;

        if e.is_monster() {
            e.svflags |= SVF_DEADMONSTER;
            e.touch_fn = None;
        }
    }

    if is_client {
        player_reset_grapple(ctx, targ);
    }

    if ctx.edicts[targ].health <= GIB_HEALTH {
        let e = &mut ctx.edicts[targ];
        e.solid = Solid::Not;
        e.takedamage = DAMAGE_NO;
        g_link_entity(ctx, targ);
    }
}

/// Apply `damage` to `targ`.
///
/// `dir` is the direction of the attack for knockback, `point` the impact
/// point and `normal` the surface normal there.
pub fn t_damage(
    ctx: &mut GameCtx,
    targ: usize,
    _inflictor: usize,
    attacker: usize,
    dir: &Vec3,
    point: &Vec3,
    normal: &Vec3,
    damage: i32,
    knockback: i32,
    dflags: DamageFlags,
    mod_type: i32,
) {
    if ctx.edicts[targ].takedamage == DAMAGE_NO {
        return;
    }
    ctx.means_of_death = mod_type;

    let mut dir = *dir;
    vector_normalize(&mut dir);

    let mut knockback = knockback;
    if ctx.edicts[targ].flags.contains(EntityFlags::NO_KNOCKBACK) {
        knockback = 0;
    }

    // figure momentum add
    if !dflags.contains(DamageFlags::NO_KNOCKBACK) {
        let is_client = ctx.edicts[targ].client.is_some();
        let t = &mut ctx.edicts[targ];
        if knockback != 0
            && !matches!(t.movetype, MoveType::None | MoveType::Bounce | MoveType::Push | MoveType::Stop)
        {
            let mass = t.mass.max(50) as f32;
            let kvel = if is_client && attacker == targ {
                // the rocket jump hack...
                vector_scale(&dir, 1600.0 * knockback as f32 / mass)
            } else {
                vector_scale(&dir, 500.0 * knockback as f32 / mass)
            };
            t.velocity = vector_add(&t.velocity, &kvel);
        }
    }

    let mut take = damage;

    // check for godmode
    if ctx.edicts[targ].flags.contains(EntityFlags::GODMODE) && !dflags.contains(DamageFlags::NO_PROTECTION) {
        take = 0;
        let kind = if dflags.contains(DamageFlags::BULLET) { TE_BULLET_SPARKS } else { TE_SPARKS };
        spawn_damage(kind, point, normal);
    }

    // team damage avoidance
    if !dflags.contains(DamageFlags::NO_PROTECTION) && check_team_damage(ctx, targ, attacker) {
        return;
    }

    if take != 0 {
        let t = &ctx.edicts[targ];
        if t.is_monster() || t.client.is_some() {
            spawn_damage(TE_BLOOD, point, normal);
        } else {
            let kind = if dflags.contains(DamageFlags::BULLET) { TE_BULLET_SPARKS } else { TE_SPARKS };
            spawn_damage(kind, point, normal);
        }

        ctx.edicts[targ].health -= take;
        if ctx.edicts[targ].health <= 0 {
            killed(ctx, targ, attacker);
        }
    }
}
