// kots_hook.rs — KOTS grapple hook

use crate::dispatch::{call_touch, TOUCH_GRAPPLE};
use crate::error::{GameError, GameResult};
use crate::g_combat::{check_team_damage, loc_can_see, t_damage};
use crate::g_local::*;
use crate::g_phys::sv_add_gravity;
use crate::game_import::*;
use crate::g_utils::{g_free_edict, g_link_entity, g_spawn};
use crate::kots_character::hook_volume;
use crate::p_weapon::{p_project_source, player_noise, weapon_generic};

/// Seconds after letting go before the hook can be fired again.
pub const KOTS_HOOK_COOLDOWN: f32 = 1.0;
/// Seconds an attached hook holds before it is forced off.
pub const KOTS_HOOK_MAX_TIME: f32 = 5.0;

pub const KOTS_HOOK_FIRE_SPEED: i32 = 1200;

const HOOK_PULL_SPEED: i32 = 800;
const HOOK_PULL_SPEED_LEVEL5: i32 = 1000;
const HOOK_PULL_SPEED_LEVEL7: i32 = 1200;

const HOOK_HANG_DISTANCE: f32 = 64.0;
const HOOK_HANG_SPEED: f32 = 200.0;

const HOOK_FIRE_DAMAGE: i32 = 2;

const HOOK_MODEL: &str = "models/weapons/grapple/hook/tris.md2";
const SOUND_RESET: &str = "weapons/grapple/grreset.wav";
const SOUND_PULL: &str = "weapons/grapple/grpull.wav";
const SOUND_HIT: &str = "weapons/grapple/grhit.wav";
const SOUND_HANG: &str = "weapons/grapple/grhang.wav";
const SOUND_FIRE: &str = "weapons/grapple/grfire.wav";

const PAUSE_FRAMES: [i32; 4] = [10, 18, 27, 0];
const FIRE_FRAMES: [i32; 2] = [6, 0];

fn pull_speed(dexterity: i32) -> f32 {
    let speed = if dexterity >= 7 {
        HOOK_PULL_SPEED_LEVEL7
    } else if dexterity >= 5 {
        HOOK_PULL_SPEED_LEVEL5
    } else {
        HOOK_PULL_SPEED
    };
    speed as f32
}

/// The player holding `hook` and their client record.
fn hook_owner(ctx: &GameCtx, hook: usize) -> Option<(usize, usize)> {
    let owner = ctx.edicts[hook].owner?;
    Some((owner, ctx.client_of(owner)?))
}

/// Forget a hook reference whose edict has since been freed or reused.
fn clear_stale_grapple(ctx: &mut GameCtx, client: usize) {
    let cl = &mut ctx.clients[client];
    cl.ctf_grapple = None;
    cl.ctf_grapplestate = GrappleState::Fly;
    cl.ps.pmove.pm_flags &= !PMF_NO_PREDICTION;
}

fn owns_hook(ctx: &GameCtx, player: usize, hook: usize) -> bool {
    ctx.edicts[hook].inuse && ctx.edicts[hook].owner == Some(player)
}

/// Drop the player's hook if one is out.
pub fn player_reset_grapple(ctx: &mut GameCtx, player: usize) {
    let Some(c) = ctx.client_of(player) else {
        return;
    };
    let Some(hook) = ctx.clients[c].ctf_grapple else {
        return;
    };

    if owns_hook(ctx, player, hook) {
        reset_grapple(ctx, hook);
    } else {
        clear_stale_grapple(ctx, c);
    }
}

/// Release `hook` and return its owner to the not-hooked state.
pub fn reset_grapple(ctx: &mut GameCtx, hook: usize) {
    let Some((owner, c)) = hook_owner(ctx, hook) else {
        return;
    };
    if ctx.clients[c].ctf_grapple.is_none() {
        return;
    }

    // falling damage looks at the last release
    let time = ctx.level.time;
    if ctx.clients[c].ctf_grapplestate > GrappleState::Fly {
        if let Some(ch) = ctx.edicts[owner].character.as_mut() {
            ch.last_hookrelease = time;
        }
    }

    let volume = hook_volume(ctx, owner);
    gi_sound(owner as i32, CHAN_RELIABLE | CHAN_WEAPON, gi_soundindex(SOUND_RESET), volume, ATTN_NORM, 0.0);

    let cl = &mut ctx.clients[c];
    cl.ctf_grapple = None;
    cl.ctf_grapplereleasetime = time;
    cl.ctf_grapplestate = GrappleState::Fly;
    cl.ps.pmove.pm_flags &= !PMF_NO_PREDICTION;
    g_free_edict(ctx, hook);
}

pub fn grapple_touch(
    ctx: &mut GameCtx,
    hook: usize,
    other: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) -> GameResult<()> {
    let Some((owner, c)) = hook_owner(ctx, hook) else {
        return Ok(());
    };
    if other == owner {
        return Ok(());
    }
    if ctx.clients[c].ctf_grapplestate != GrappleState::Fly {
        return Ok(());
    }

    // only the most dexterous can latch onto the sky
    let dexterity = ctx.dexterity(owner);
    if surf.is_some_and(|s| s.flags & SURF_SKY != 0) && dexterity < 10 {
        reset_grapple(ctx, hook);
        return Ok(());
    }

    ctx.edicts[hook].velocity = vec3_origin;
    let origin = ctx.edicts[hook].s.origin;
    let normal = plane.map_or(vec3_origin, |p| p.normal);

    player_noise(ctx, owner, &origin, PNOISE_IMPACT)?;

    if ctx.edicts[other].takedamage != DAMAGE_NO {
        let (dir, dmg) = (ctx.edicts[hook].velocity, ctx.edicts[hook].dmg);
        t_damage(ctx, other, hook, owner, &dir, &origin, &normal, dmg, 1, DamageFlags::empty(), MOD_GRAPPLE);

        // hanging on to other people takes dexterity 7
        if dexterity < 7 {
            reset_grapple(ctx, hook);
            return Ok(());
        }
    }

    let time = ctx.level.time;
    if let Some(ch) = ctx.edicts[owner].character.as_mut() {
        ch.next_hookrelease = time + KOTS_HOOK_MAX_TIME;
    }

    ctx.clients[c].ctf_grapplestate = GrappleState::Pull;
    ctx.edicts[hook].enemy = Some(other);
    ctx.edicts[hook].solid = Solid::Not;

    let volume = hook_volume(ctx, owner);
    gi_sound(owner as i32, CHAN_RELIABLE | CHAN_WEAPON, gi_soundindex(SOUND_PULL), volume, ATTN_NORM, 0.0);
    gi_sound(hook as i32, CHAN_WEAPON, gi_soundindex(SOUND_HIT), volume, ATTN_NORM, 0.0);

    gi_write_byte(SVC_TEMP_ENTITY);
    gi_write_byte(TE_SPARKS);
    gi_write_position(&origin);
    gi_write_dir(&normal);
    gi_multicast(&origin, Multicast::Pvs);
    Ok(())
}

/// Draw the beam between the hook and its owner's hand.
pub fn grapple_draw_cable(ctx: &GameCtx, hook: usize) {
    let Some((owner, c)) = hook_owner(ctx, hook) else {
        return;
    };
    let o = &ctx.edicts[owner];
    let cl = &ctx.clients[c];

    let (forward, right, _) = angle_vectors_tuple(&cl.v_angle);
    let offset = [16.0, 16.0, (o.viewheight - 8) as f32];
    let start = p_project_source(cl, &o.s.origin, &offset, &forward, &right);

    let end = ctx.edicts[hook].s.origin;
    let distance = vector_length(&vector_subtract(&start, &end));
    // don't draw cable if close
    if distance < HOOK_HANG_DISTANCE {
        return;
    }

    gi_write_byte(SVC_TEMP_ENTITY);
    gi_write_byte(TE_MEDIC_CABLE_ATTACK);
    gi_write_short(hook as i32);
    gi_write_position(&end);
    gi_write_position(&start);
    gi_multicast(&end, Multicast::Pvs);
}

/// Pull the player toward the hook.
pub fn grapple_pull(ctx: &mut GameCtx, hook: usize) {
    let Some((owner, c)) = hook_owner(ctx, hook) else {
        return;
    };

    if ctx.edicts[owner].health <= 0 {
        reset_grapple(ctx, hook);
        return;
    }

    if let Some(enemy) = ctx.edicts[hook].enemy {
        match ctx.edicts[enemy].solid {
            Solid::Not => {
                reset_grapple(ctx, hook);
                return;
            }
            Solid::Bbox => {
                // ride along at the centre of its box
                let en = &ctx.edicts[enemy];
                let half = vector_scale(&en.size, 0.5);
                let centre = vector_add(&vector_add(&half, &en.s.origin), &en.mins);
                ctx.edicts[hook].s.origin = centre;
                g_link_entity(ctx, hook);
            }
            _ => {
                let velocity = ctx.edicts[enemy].velocity;
                ctx.edicts[hook].velocity = velocity;
            }
        }

        if ctx.edicts[enemy].takedamage != DAMAGE_NO && !check_team_damage(ctx, enemy, owner) {
            // the cable breaks once the hook is out of sight
            if !loc_can_see(ctx, owner, hook) {
                reset_grapple(ctx, hook);
                return;
            }
            let (dir, point) = (ctx.edicts[hook].velocity, ctx.edicts[hook].s.origin);
            t_damage(ctx, enemy, hook, owner, &dir, &point, &vec3_origin, 1, 1, DamageFlags::empty(), MOD_GRAPPLE);
        }

        if ctx.edicts[enemy].deadflag != DEAD_NO {
            reset_grapple(ctx, hook);
            return;
        }
    }

    grapple_draw_cable(ctx, hook);

    let state = ctx.clients[c].ctf_grapplestate;
    if state == GrappleState::Fly {
        return;
    }

    let o = &ctx.edicts[owner];
    let mut eye = o.s.origin;
    eye[2] += o.viewheight as f32;
    let mut hookdir = vector_subtract(&ctx.edicts[hook].s.origin, &eye);
    let vlen = vector_length(&hookdir);

    if state == GrappleState::Pull && vlen < HOOK_HANG_DISTANCE {
        let volume = hook_volume(ctx, owner);
        let cl = &mut ctx.clients[c];
        cl.ps.pmove.pm_flags |= PMF_NO_PREDICTION;
        cl.ctf_grapplestate = GrappleState::Hang;
        gi_sound(owner as i32, CHAN_RELIABLE | CHAN_WEAPON, gi_soundindex(SOUND_HANG), volume, ATTN_NORM, 0.0);
    }

    vector_normalize(&mut hookdir);
    let speed = if vlen >= HOOK_HANG_DISTANCE {
        pull_speed(ctx.dexterity(owner))
    } else {
        HOOK_HANG_SPEED
    };
    ctx.edicts[owner].velocity = vector_scale(&hookdir, speed);

    if vlen >= HOOK_HANG_DISTANCE {
        sv_add_gravity(ctx, owner);
    }

    ctx.clients[c].oldvelocity = ctx.edicts[owner].velocity;
}

/// Launch a hook from `start` along `dir`.
pub fn fire_grapple(
    ctx: &mut GameCtx,
    player: usize,
    start: &Vec3,
    dir: &Vec3,
    damage: i32,
    speed: i32,
    effect: u32,
) -> GameResult<()> {
    let c = ctx.client_of(player).ok_or(GameError::NoClient { ent: player })?;

    let mut dir = *dir;
    vector_normalize(&mut dir);

    let hook = g_spawn(ctx)?;
    let modelindex = gi_modelindex(HOOK_MODEL);
    {
        let g = &mut ctx.edicts[hook];
        g.s.origin = *start;
        g.s.old_origin = *start;
        vectoangles(&dir, &mut g.s.angles);
        g.velocity = vector_scale(&dir, speed as f32);
        g.movetype = MoveType::FlyMissile;
        g.clipmask = MASK_SHOT;
        g.solid = Solid::Bbox;
        g.s.effects |= effect;
        g.mins = vec3_origin;
        g.maxs = vec3_origin;
        g.s.modelindex = modelindex;
        g.owner = Some(player);
        g.touch_fn = Some(TOUCH_GRAPPLE);
        g.dmg = damage;
    }

    let cl = &mut ctx.clients[c];
    cl.ctf_grapple = Some(hook);
    cl.ctf_grapplestate = GrappleState::Fly;
    g_link_entity(ctx, hook);

    let from = ctx.edicts[player].s.origin;
    let tr = gi_trace(&from, &vec3_origin, &vec3_origin, start, hook as i32, MASK_SHOT);
    if tr.fraction < 1.0 {
        let back = vector_ma(&ctx.edicts[hook].s.origin, -10.0, &dir);
        ctx.edicts[hook].s.origin = back;
        let other = ctx.trace_ent(&tr).unwrap_or(0);
        call_touch(ctx, hook, other, None, None)?;
    }
    Ok(())
}

/// Fire the player's hook unless one is already out or it is cooling down.
pub fn grapple_fire(ctx: &mut GameCtx, ent: usize, g_offset: &Vec3, damage: i32, effect: u32) -> GameResult<()> {
    let c = ctx.client_of(ent).ok_or(GameError::NoClient { ent })?;

    if let Some(hook) = ctx.clients[c].ctf_grapple {
        if owns_hook(ctx, ent, hook) {
            return Ok(());
        }
    }

    if ctx.clients[c].ctf_grapplestate > GrappleState::Fly {
        return Ok(()); // it's already out
    }

    let last_release = ctx.edicts[ent].character.as_ref().map_or(0.0, |ch| ch.last_hookrelease);
    if last_release + KOTS_HOOK_COOLDOWN > ctx.level.time {
        return Ok(());
    }

    let (origin, viewheight) = (ctx.edicts[ent].s.origin, ctx.edicts[ent].viewheight);
    let cl = &mut ctx.clients[c];
    let (forward, right, _) = angle_vectors_tuple(&cl.v_angle);
    let offset = vector_add(&[24.0, 8.0, (viewheight - 8 + 2) as f32], g_offset);
    let start = p_project_source(cl, &origin, &offset, &forward, &right);

    cl.kick_origin = vector_scale(&forward, -2.0);
    cl.kick_angles[0] = -1.0;

    let volume = hook_volume(ctx, ent);
    gi_sound(ent as i32, CHAN_RELIABLE | CHAN_WEAPON, gi_soundindex(SOUND_FIRE), volume, ATTN_NORM, 0.0);

    fire_grapple(ctx, ent, &start, &forward, damage, KOTS_HOOK_FIRE_SPEED, effect)?;
    player_noise(ctx, ent, &start, PNOISE_WEAPON)
}

pub fn weapon_grapple_fire(ctx: &mut GameCtx, ent: usize) -> GameResult<()> {
    grapple_fire(ctx, ent, &vec3_origin, HOOK_FIRE_DAMAGE, 0)?;
    if let Some(c) = ctx.client_of(ent) {
        ctx.clients[c].ps.gunframe += 1;
    }
    Ok(())
}

pub fn weapon_grapple(ctx: &mut GameCtx, ent: usize) -> GameResult<()> {
    let c = ctx.client_of(ent).ok_or(GameError::NoClient { ent })?;

    let attack = ctx.clients[c].buttons & BUTTON_ATTACK != 0;
    {
        // while the attack button is down, stay in the firing frame
        let cl = &mut ctx.clients[c];
        if attack && cl.weaponstate == WeaponState::Firing && cl.ctf_grapple.is_some() {
            cl.ps.gunframe = 9;
        }
    }

    if !attack && ctx.clients[c].ctf_grapple.is_some() {
        player_reset_grapple(ctx, ent);
        let cl = &mut ctx.clients[c];
        if cl.weaponstate == WeaponState::Firing {
            cl.weaponstate = WeaponState::Ready;
        }
    }

    {
        // changing weapons while grappled
        let cl = &mut ctx.clients[c];
        if cl.newweapon.is_some()
            && cl.ctf_grapplestate > GrappleState::Fly
            && cl.weaponstate == WeaponState::Firing
        {
            cl.weaponstate = WeaponState::Dropping;
            cl.ps.gunframe = 32;
        }
    }

    let prevstate = ctx.clients[c].weaponstate;
    weapon_generic(ctx, ent, 5, 9, 31, 36, &PAUSE_FRAMES, &FIRE_FRAMES, weapon_grapple_fire)?;

    // just switched back to the grapple with the hook still out
    let cl = &mut ctx.clients[c];
    if prevstate == WeaponState::Activating
        && cl.weaponstate == WeaponState::Ready
        && cl.ctf_grapplestate > GrappleState::Fly
    {
        cl.ps.gunframe = if cl.buttons & BUTTON_ATTACK == 0 { 9 } else { 5 };
        cl.weaponstate = WeaponState::Firing;
    }
    Ok(())
}

/// Per-frame hook service for a player: pull while a hook is out and let go
/// once it has been held too long.
pub fn grapple_client_frame(ctx: &mut GameCtx, ent: usize) {
    let Some(c) = ctx.client_of(ent) else {
        return;
    };
    let Some(hook) = ctx.clients[c].ctf_grapple else {
        return;
    };
    if !owns_hook(ctx, ent, hook) {
        clear_stale_grapple(ctx, c);
        return;
    }

    grapple_pull(ctx, hook);

    let cl = &ctx.clients[c];
    if cl.ctf_grapple != Some(hook) || cl.ctf_grapplestate == GrappleState::Fly {
        return;
    }
    let release = ctx.edicts[ent].character.as_ref().map_or(0.0, |ch| ch.next_hookrelease);
    if ctx.level.time > release {
        reset_grapple(ctx, hook);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    fn setup(dexterity: i32) -> (std::rc::Rc<RecordingImport>, GameCtx, usize) {
        let gi = RecordingImport::install();
        let mut ctx = test_ctx(2);
        let p = spawn_player(&mut ctx, 1, dexterity);
        fill_body_queue(&mut ctx);
        (gi, ctx, p)
    }

    fn launch(ctx: &mut GameCtx, p: usize, start: &Vec3) -> usize {
        fire_grapple(ctx, p, start, &[1.0, 0.0, 0.0], 2, KOTS_HOOK_FIRE_SPEED, 0).unwrap();
        ctx.clients[0].ctf_grapple.unwrap()
    }

    fn attach(ctx: &mut GameCtx, p: usize, start: &Vec3) -> usize {
        let hook = launch(ctx, p, start);
        grapple_touch(ctx, hook, 0, None, None).unwrap();
        assert_eq!(ctx.clients[0].ctf_grapplestate, GrappleState::Pull);
        hook
    }

    #[test]
    fn test_fire_launches_hook() {
        let (gi, mut ctx, p) = setup(0);
        grapple_fire(&mut ctx, p, &vec3_origin, 2, 0).unwrap();

        let hook = ctx.clients[0].ctf_grapple.unwrap();
        let h = &ctx.edicts[hook];
        assert_eq!(h.s.origin, [24.0, -8.0, 16.0]);
        assert_eq!(h.velocity, [1200.0, 0.0, 0.0]);
        assert_eq!(h.movetype, MoveType::FlyMissile);
        assert_eq!(h.solid, Solid::Bbox);
        assert_eq!(h.clipmask, MASK_SHOT);
        assert_eq!(h.owner, Some(p));
        assert_eq!(h.touch_fn, Some(TOUCH_GRAPPLE));
        assert_eq!(h.dmg, 2);
        assert_eq!(gi.model_name(h.s.modelindex).as_deref(), Some(HOOK_MODEL));
        assert_eq!(ctx.clients[0].ctf_grapplestate, GrappleState::Fly);
        assert_eq!(ctx.clients[0].kick_angles[0], -1.0);
        assert_eq!(ctx.clients[0].kick_origin[0], -2.0);
        assert!(gi.sounds_played().contains(&SOUND_FIRE.to_string()));
    }

    #[test]
    fn test_fire_refused_while_out_or_cooling_down() {
        let (_gi, mut ctx, p) = setup(0);
        let hook = launch(&mut ctx, p, &[24.0, 0.0, 0.0]);
        grapple_fire(&mut ctx, p, &vec3_origin, 2, 0).unwrap();
        assert_eq!(ctx.clients[0].ctf_grapple, Some(hook));

        reset_grapple(&mut ctx, hook);
        ctx.edicts[p].character.as_mut().unwrap().last_hookrelease = 9.5;
        grapple_fire(&mut ctx, p, &vec3_origin, 2, 0).unwrap();
        assert!(ctx.clients[0].ctf_grapple.is_none());

        ctx.level.time = 10.6;
        grapple_fire(&mut ctx, p, &vec3_origin, 2, 0).unwrap();
        assert!(ctx.clients[0].ctf_grapple.is_some());
    }

    #[test]
    fn test_point_blank_fire_latches_at_once() {
        let (gi, mut ctx, p) = setup(0);
        gi.push_trace(Trace::hit(0, 0.5, &[12.0, 0.0, 0.0]));
        let hook = launch(&mut ctx, p, &[24.0, 0.0, 0.0]);

        let h = &ctx.edicts[hook];
        assert_eq!(h.s.origin, [14.0, 0.0, 0.0]);
        assert_eq!(h.velocity, vec3_origin);
        assert_eq!(h.enemy, Some(0));
        assert_eq!(h.solid, Solid::Not);
        assert_eq!(ctx.clients[0].ctf_grapplestate, GrappleState::Pull);
        assert_eq!(ctx.edicts[p].character.as_ref().unwrap().next_hookrelease, 15.0);

        let calls = gi.calls();
        assert!(calls.contains(&Call::WriteByte(TE_SPARKS)));
        assert!(calls.contains(&Call::WriteDir(vec3_origin)));
        assert!(calls.contains(&Call::Multicast([14.0, 0.0, 0.0], Multicast::Pvs)));
        let sounds = gi.sounds_played();
        assert!(sounds.contains(&SOUND_PULL.to_string()));
        assert!(sounds.contains(&SOUND_HIT.to_string()));
    }

    #[test]
    fn test_point_blank_hit_outside_pool_counts_as_world() {
        let (gi, mut ctx, p) = setup(0);
        gi.push_trace(Trace::hit(5000, 0.5, &[12.0, 0.0, 0.0]));
        let hook = launch(&mut ctx, p, &[24.0, 0.0, 0.0]);
        assert_eq!(ctx.edicts[hook].enemy, Some(0));
        assert_eq!(ctx.clients[0].ctf_grapplestate, GrappleState::Pull);
    }

    #[test]
    fn test_touch_ignores_owner_and_attached() {
        let (_gi, mut ctx, p) = setup(0);
        let hook = launch(&mut ctx, p, &[24.0, 0.0, 0.0]);
        grapple_touch(&mut ctx, hook, p, None, None).unwrap();
        assert_eq!(ctx.clients[0].ctf_grapplestate, GrappleState::Fly);

        grapple_touch(&mut ctx, hook, 0, None, None).unwrap();
        ctx.edicts[hook].enemy = None;
        grapple_touch(&mut ctx, hook, 0, None, None).unwrap();
        assert!(ctx.edicts[hook].enemy.is_none());
    }

    #[test]
    fn test_sky_needs_dexterity_10() {
        let (_gi, mut ctx, p) = setup(9);
        let sky = CSurface::with_flags(SURF_SKY);
        let hook = launch(&mut ctx, p, &[24.0, 0.0, 0.0]);
        grapple_touch(&mut ctx, hook, 0, None, Some(&sky)).unwrap();
        assert!(ctx.clients[0].ctf_grapple.is_none());
        assert!(!ctx.edicts[hook].inuse);

        ctx.edicts[p].character.as_mut().unwrap().cur_dexterity = 10;
        let hook = launch(&mut ctx, p, &[24.0, 0.0, 0.0]);
        grapple_touch(&mut ctx, hook, 0, None, Some(&sky)).unwrap();
        assert_eq!(ctx.clients[0].ctf_grapplestate, GrappleState::Pull);
    }

    #[test]
    fn test_hooking_a_player_takes_dexterity_7() {
        let (_gi, mut ctx, p) = setup(5);
        let victim = spawn_player(&mut ctx, 2, 0);
        let plane = CPlane { normal: [-1.0, 0.0, 0.0], ..CPlane::default() };

        let hook = launch(&mut ctx, p, &[24.0, 0.0, 0.0]);
        grapple_touch(&mut ctx, hook, victim, Some(&plane), None).unwrap();
        assert_eq!(ctx.edicts[victim].health, 98);
        assert_eq!(ctx.means_of_death, MOD_GRAPPLE);
        assert!(ctx.clients[0].ctf_grapple.is_none());

        ctx.edicts[p].character.as_mut().unwrap().cur_dexterity = 7;
        let hook = launch(&mut ctx, p, &[24.0, 0.0, 0.0]);
        grapple_touch(&mut ctx, hook, victim, Some(&plane), None).unwrap();
        assert_eq!(ctx.edicts[victim].health, 96);
        assert_eq!(ctx.edicts[hook].enemy, Some(victim));
        assert_eq!(ctx.clients[0].ctf_grapplestate, GrappleState::Pull);
    }

    #[test]
    fn test_reset_records_release() {
        let (gi, mut ctx, p) = setup(5);
        let hook = attach(&mut ctx, p, &[100.0, 0.0, 22.0]);
        ctx.clients[0].ps.pmove.pm_flags |= PMF_NO_PREDICTION;
        gi.clear_calls();

        reset_grapple(&mut ctx, hook);
        let cl = &ctx.clients[0];
        assert!(cl.ctf_grapple.is_none());
        assert_eq!(cl.ctf_grapplestate, GrappleState::Fly);
        assert_eq!(cl.ctf_grapplereleasetime, 10.0);
        assert_eq!(cl.ps.pmove.pm_flags & PMF_NO_PREDICTION, 0);
        assert_eq!(ctx.edicts[p].character.as_ref().unwrap().last_hookrelease, 10.0);
        assert!(!ctx.edicts[hook].inuse);
        assert!(gi.calls().contains(&Call::Sound {
            ent: p as i32,
            channel: CHAN_RELIABLE | CHAN_WEAPON,
            name: SOUND_RESET.to_string(),
            volume: 0.5,
        }));
    }

    #[test]
    fn test_pull_from_afar_draws_cable() {
        let (gi, mut ctx, p) = setup(0);
        let hook = attach(&mut ctx, p, &[100.0, 0.0, 22.0]);
        gi.clear_calls();

        grapple_pull(&mut ctx, hook);
        let v = ctx.edicts[p].velocity;
        assert_eq!(v[0], 800.0);
        assert!((v[2] + 80.0).abs() < 1e-3);
        assert_eq!(ctx.clients[0].oldvelocity, v);
        assert_eq!(ctx.clients[0].ctf_grapplestate, GrappleState::Pull);

        let calls = gi.calls();
        assert!(calls.contains(&Call::WriteByte(TE_MEDIC_CABLE_ATTACK)));
        assert!(calls.contains(&Call::WriteShort(hook as i32)));
    }

    #[test]
    fn test_pull_close_switches_to_hang() {
        let (gi, mut ctx, p) = setup(7);
        let hook = attach(&mut ctx, p, &[30.0, 0.0, 22.0]);
        gi.clear_calls();

        grapple_pull(&mut ctx, hook);
        assert_eq!(ctx.clients[0].ctf_grapplestate, GrappleState::Hang);
        assert_ne!(ctx.clients[0].ps.pmove.pm_flags & PMF_NO_PREDICTION, 0);
        assert_eq!(ctx.edicts[p].velocity, [200.0, 0.0, 0.0]);
        assert!(gi.sounds_played().contains(&SOUND_HANG.to_string()));
        assert!(!gi.calls().contains(&Call::WriteByte(TE_MEDIC_CABLE_ATTACK)));
    }

    #[test]
    fn test_pull_rides_and_hurts_bbox_enemy() {
        let (_gi, mut ctx, p) = setup(7);
        let victim = spawn_player(&mut ctx, 2, 0);
        ctx.edicts[victim].s.origin = [200.0, 0.0, 18.0];
        let hook = launch(&mut ctx, p, &[24.0, 0.0, 0.0]);
        grapple_touch(&mut ctx, hook, victim, None, None).unwrap();
        assert_eq!(ctx.edicts[victim].health, 98);

        grapple_pull(&mut ctx, hook);
        assert_eq!(ctx.edicts[hook].s.origin, [200.0, 0.0, 22.0]);
        assert_eq!(ctx.edicts[victim].health, 97);
        assert_eq!(ctx.edicts[p].velocity[0], 1200.0);
    }

    #[test]
    fn test_pull_breaks_out_of_sight() {
        let (gi, mut ctx, p) = setup(7);
        let victim = spawn_player(&mut ctx, 2, 0);
        let hook = launch(&mut ctx, p, &[24.0, 0.0, 0.0]);
        grapple_touch(&mut ctx, hook, victim, None, None).unwrap();

        for _ in 0..8 {
            gi.push_trace(Trace::hit(0, 0.5, &vec3_origin));
        }
        grapple_pull(&mut ctx, hook);
        assert!(ctx.clients[0].ctf_grapple.is_none());
        assert_eq!(ctx.edicts[victim].health, 98);
    }

    #[test]
    fn test_pull_lets_go_when_owner_dies() {
        let (_gi, mut ctx, p) = setup(0);
        let hook = attach(&mut ctx, p, &[100.0, 0.0, 22.0]);
        ctx.edicts[p].health = 0;
        grapple_pull(&mut ctx, hook);
        assert!(ctx.clients[0].ctf_grapple.is_none());
    }

    #[test]
    fn test_weapon_release_resets_hook() {
        let (_gi, mut ctx, p) = setup(0);
        attach(&mut ctx, p, &[100.0, 0.0, 22.0]);
        ctx.clients[0].weaponstate = WeaponState::Firing;
        ctx.clients[0].ps.gunframe = 9;

        weapon_grapple(&mut ctx, p).unwrap();
        assert!(ctx.clients[0].ctf_grapple.is_none());
        assert_eq!(ctx.clients[0].weaponstate, WeaponState::Ready);
    }

    #[test]
    fn test_weapon_holds_fire_frame() {
        let (_gi, mut ctx, p) = setup(0);
        attach(&mut ctx, p, &[100.0, 0.0, 22.0]);
        ctx.clients[0].buttons = BUTTON_ATTACK;
        ctx.clients[0].weaponstate = WeaponState::Firing;
        ctx.clients[0].ps.gunframe = 7;

        for _ in 0..3 {
            weapon_grapple(&mut ctx, p).unwrap();
            assert_eq!(ctx.clients[0].ps.gunframe, 10);
            assert_eq!(ctx.clients[0].weaponstate, WeaponState::Firing);
        }
        assert!(ctx.clients[0].ctf_grapple.is_some());
    }

    #[test]
    fn test_weapon_fires_hook_from_ready() {
        let (_gi, mut ctx, p) = setup(0);
        ctx.clients[0].buttons = BUTTON_ATTACK;
        ctx.clients[0].weaponstate = WeaponState::Ready;
        ctx.clients[0].ps.gunframe = 12;

        weapon_grapple(&mut ctx, p).unwrap();
        assert!(ctx.clients[0].ctf_grapple.is_some());
        assert_eq!(ctx.clients[0].weaponstate, WeaponState::Firing);
        assert_eq!(ctx.clients[0].ps.gunframe, 7);
    }

    #[test]
    fn test_weapon_change_while_grappled() {
        let (_gi, mut ctx, p) = setup(0);
        attach(&mut ctx, p, &[100.0, 0.0, 22.0]);
        ctx.clients[0].buttons = BUTTON_ATTACK;
        ctx.clients[0].weaponstate = WeaponState::Firing;
        ctx.clients[0].newweapon = Some(crate::dispatch::WEAPON_GRAPPLE);

        weapon_grapple(&mut ctx, p).unwrap();
        assert_eq!(ctx.clients[0].weaponstate, WeaponState::Dropping);
        assert_eq!(ctx.clients[0].ps.gunframe, 33);
        assert!(ctx.clients[0].ctf_grapple.is_some());
    }

    #[test]
    fn test_switch_back_resumes_firing() {
        let (_gi, mut ctx, p) = setup(0);
        attach(&mut ctx, p, &[100.0, 0.0, 22.0]);
        ctx.clients[0].buttons = BUTTON_ATTACK;
        ctx.clients[0].weaponstate = WeaponState::Activating;
        ctx.clients[0].ps.gunframe = 5;

        weapon_grapple(&mut ctx, p).unwrap();
        assert_eq!(ctx.clients[0].weaponstate, WeaponState::Firing);
        assert_eq!(ctx.clients[0].ps.gunframe, 5);
    }

    #[test]
    fn test_client_frame_enforces_max_time() {
        let (_gi, mut ctx, p) = setup(0);
        let hook = attach(&mut ctx, p, &[100.0, 0.0, 22.0]);

        grapple_client_frame(&mut ctx, p);
        assert_eq!(ctx.clients[0].ctf_grapple, Some(hook));

        ctx.level.time = 15.1;
        grapple_client_frame(&mut ctx, p);
        assert!(ctx.clients[0].ctf_grapple.is_none());
        assert_eq!(ctx.edicts[p].character.as_ref().unwrap().last_hookrelease, 15.1);
    }

    #[test]
    fn test_client_frame_clears_stale_reference() {
        let (_gi, mut ctx, p) = setup(0);
        let stale = spawn_plain(&mut ctx);
        ctx.clients[0].ctf_grapple = Some(stale);
        ctx.clients[0].ctf_grapplestate = GrappleState::Hang;

        grapple_client_frame(&mut ctx, p);
        assert!(ctx.clients[0].ctf_grapple.is_none());
        assert_eq!(ctx.clients[0].ctf_grapplestate, GrappleState::Fly);
        assert!(ctx.edicts[stale].inuse);
    }
}
