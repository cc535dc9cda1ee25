// Population-capped, timed entity spawner. A chapter script declares one
// profile per pool (placement, motion, expiry, respawn policy); runtime
// bookkeeping lives in the scene context and is torn down with it.

use bevy::prelude::*;
use rand::Rng;

use crate::chapter::{PlaySet, Score};
use crate::collision::{Hitbox, Projectile};
use crate::player::Player;
use crate::scene::{SceneContext, SceneTag};

pub struct SpawnerPlugin;

impl Plugin for SpawnerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (steer_pursuers, apply_velocity).chain().in_set(PlaySet::Motion),
        )
        .add_systems(
            Update,
            (tick_spawners, expire_spawns, expire_projectiles).in_set(PlaySet::Resolve),
        );
    }
}

/// How far above the top edge falling spawns start.
const DROP_IN_OFFSET: f32 = 50.0;

/// Static configuration of one spawn pool.
pub struct SpawnProfile {
    pub sprite: &'static str,
    pub size: Vec2,
    /// Seconds between spawn attempts while active. Zero means every tick,
    /// which in practice tops a capped pool up as fast as it drains.
    pub interval: f32,
    pub cap: u32,
    /// Exhaustible pools stop permanently once this many have ever spawned.
    pub total: Option<u32>,
    /// Whether destroying a member immediately refills the slot.
    pub respawn_on_expiry: bool,
    pub placement: Placement,
    pub motion: Motion,
    pub lifetime: Option<f32>,
    /// Despawn members that leave the bounds on the side they are headed.
    pub cull_outside: bool,
    pub window: SpawnWindow,
    pub tints: &'static [Color],
}

#[derive(Clone, Copy)]
pub enum Placement {
    /// One of the four edges uniformly, then a uniform point along it.
    AnyEdge,
    /// Uniform x just above the top edge.
    TopEdge,
    /// Left or right edge at a uniform height.
    SideEdges,
}

#[derive(Clone, Copy)]
pub enum Motion {
    /// Fixed velocity rolled per spawn from the given component ranges.
    Drift { vx: (f32, f32), vy: (f32, f32) },
    /// Straight across the bounds toward the far side.
    Ferry { speed: f32 },
    /// Re-aimed at the player every tick; speed scales with the score.
    Pursue { speed: f32, spin: f32 },
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SpawnWindow {
    /// Started and stopped by narration step actions.
    Scripted,
    /// Emits only while a narration clip is actually playing.
    DuringNarration,
}

/// Runtime bookkeeping for one pool.
pub struct SpawnerState {
    pub active: bool,
    pub alive: u32,
    pub spawned: u32,
    pub clock: Timer,
}

impl SpawnerState {
    pub fn new(profile: &SpawnProfile) -> Self {
        Self {
            active: false,
            alive: 0,
            spawned: 0,
            clock: Timer::from_seconds(profile.interval, TimerMode::Repeating),
        }
    }

    pub fn exhausted(&self, profile: &SpawnProfile) -> bool {
        profile.total.is_some_and(|total| self.spawned >= total)
    }

    pub fn may_spawn(&self, profile: &SpawnProfile) -> bool {
        self.active && self.alive < profile.cap && !self.exhausted(profile)
    }

    pub fn note_spawned(&mut self) {
        self.alive += 1;
        self.spawned += 1;
    }

    /// Records one member leaving the pool. Returns true when the pool
    /// should immediately attempt a replacement.
    pub fn note_expired(&mut self, profile: &SpawnProfile) -> bool {
        self.alive = self.alive.saturating_sub(1);
        profile.respawn_on_expiry && !self.exhausted(profile)
    }
}

/// Marks a pool member with the index of its profile in the script.
#[derive(Component)]
pub struct Spawned {
    pub profile: usize,
}

#[derive(Component)]
pub struct Velocity(pub Vec2);

#[derive(Component)]
pub struct Lifespan(pub Timer);

/// Pursuit speed multiplier: a tenth more per full hundred points.
pub fn pursuit_scale(score: u32) -> f32 {
    1.0 + (score / 100) as f32 * 0.1
}

/// Spawns one member if the pool's contract allows it; otherwise a no-op.
pub fn try_spawn(
    commands: &mut Commands,
    assets: &AssetServer,
    ctx: &mut SceneContext,
    idx: usize,
) {
    if !ctx.spawners[idx].may_spawn(&ctx.script.spawners[idx]) {
        return;
    }

    let bounds = ctx.script.bounds;
    let profile = &ctx.script.spawners[idx];
    let (position, velocity) = place_and_launch(profile, bounds);
    let color = if profile.tints.is_empty() {
        Color::WHITE
    } else {
        let mut rng = rand::rng();
        profile.tints[rng.random_range(0..profile.tints.len())]
    };

    let mut spawn = commands.spawn((
        SceneTag,
        Spawned { profile: idx },
        Sprite {
            image: assets.load(profile.sprite),
            custom_size: Some(profile.size),
            color,
            ..default()
        },
        Transform::from_translation(position.extend(2.0)),
        Velocity(velocity),
        Hitbox(profile.size * 0.5),
    ));
    if let Some(lifetime) = profile.lifetime {
        spawn.insert(Lifespan(Timer::from_seconds(lifetime, TimerMode::Once)));
    }

    ctx.spawners[idx].note_spawned();
}

/// Removes a member and, for respawn-on-expiry pools, refills the slot.
pub fn retire_spawn(
    commands: &mut Commands,
    assets: &AssetServer,
    ctx: &mut SceneContext,
    entity: Entity,
    idx: usize,
) {
    commands.entity(entity).despawn();
    if ctx.spawners[idx].note_expired(&ctx.script.spawners[idx]) {
        try_spawn(commands, assets, ctx, idx);
    }
}

fn place_and_launch(profile: &SpawnProfile, bounds: Rect) -> (Vec2, Vec2) {
    let mut rng = rand::rng();

    let position = match profile.placement {
        Placement::TopEdge => Vec2::new(
            rng.random_range(bounds.min.x..=bounds.max.x),
            bounds.max.y + DROP_IN_OFFSET,
        ),
        Placement::SideEdges => {
            let x = if rng.random_bool(0.5) {
                bounds.min.x
            } else {
                bounds.max.x
            };
            Vec2::new(x, rng.random_range(bounds.min.y..=bounds.max.y))
        }
        Placement::AnyEdge => match rng.random_range(0..4) {
            0 => Vec2::new(rng.random_range(bounds.min.x..=bounds.max.x), bounds.max.y),
            1 => Vec2::new(bounds.max.x, rng.random_range(bounds.min.y..=bounds.max.y)),
            2 => Vec2::new(rng.random_range(bounds.min.x..=bounds.max.x), bounds.min.y),
            _ => Vec2::new(bounds.min.x, rng.random_range(bounds.min.y..=bounds.max.y)),
        },
    };

    let velocity = match profile.motion {
        Motion::Drift { vx, vy } => Vec2::new(
            rng.random_range(vx.0..=vx.1),
            rng.random_range(vy.0..=vy.1),
        ),
        Motion::Ferry { speed } => {
            let toward_far_side = if position.x <= bounds.center().x {
                1.0
            } else {
                -1.0
            };
            Vec2::new(speed * toward_far_side, 0.0)
        }
        Motion::Pursue { .. } => Vec2::ZERO,
    };

    (position, velocity)
}

/// True when the entity has left the bounds on the side it is headed for.
fn outside_departure(position: Vec2, velocity: Vec2, bounds: Rect) -> bool {
    (position.x < bounds.min.x && velocity.x < 0.0)
        || (position.x > bounds.max.x && velocity.x > 0.0)
        || (position.y < bounds.min.y && velocity.y < 0.0)
        || (position.y > bounds.max.y && velocity.y > 0.0)
}

fn tick_spawners(
    mut commands: Commands,
    assets: Res<AssetServer>,
    mut ctx: ResMut<SceneContext>,
    time: Res<Time>,
) {
    let narrating = ctx.narrating_now();
    for idx in 0..ctx.spawners.len() {
        if ctx.script.spawners[idx].window == SpawnWindow::DuringNarration {
            ctx.spawners[idx].active = narrating;
        }
        if !ctx.spawners[idx].active {
            continue;
        }
        ctx.spawners[idx].clock.tick(time.delta());
        if ctx.spawners[idx].clock.just_finished() {
            try_spawn(&mut commands, &assets, &mut ctx, idx);
        }
    }
}

fn steer_pursuers(
    ctx: Res<SceneContext>,
    score: Res<Score>,
    time: Res<Time>,
    player: Query<&Transform, With<Player>>,
    mut spawns: Query<(&Spawned, &mut Velocity, &mut Transform), Without<Player>>,
) {
    let Ok(player_transform) = player.single() else {
        return;
    };
    let target = player_transform.translation.truncate();
    let scale = pursuit_scale(score.0);

    for (spawned, mut velocity, mut transform) in &mut spawns {
        let Motion::Pursue { speed, spin } = ctx.script.spawners[spawned.profile].motion else {
            continue;
        };
        let position = transform.translation.truncate();
        velocity.0 = (target - position).normalize_or_zero() * speed * scale;
        transform.rotate_z(spin * time.delta_secs());
    }
}

fn apply_velocity(time: Res<Time>, mut movers: Query<(&Velocity, &mut Transform)>) {
    for (velocity, mut transform) in &mut movers {
        transform.translation += (velocity.0 * time.delta_secs()).extend(0.0);
    }
}

fn expire_spawns(
    mut commands: Commands,
    assets: Res<AssetServer>,
    mut ctx: ResMut<SceneContext>,
    time: Res<Time>,
    mut spawns: Query<(Entity, &Transform, &Velocity, &Spawned, Option<&mut Lifespan>)>,
) {
    let bounds = ctx.script.bounds;
    let mut expired = Vec::new();

    for (entity, transform, velocity, spawned, lifespan) in &mut spawns {
        let timed_out = lifespan
            .is_some_and(|mut lifespan| lifespan.0.tick(time.delta()).finished());
        let departed = ctx.script.spawners[spawned.profile].cull_outside
            && outside_departure(transform.translation.truncate(), velocity.0, bounds);
        if timed_out || departed {
            expired.push((entity, spawned.profile));
        }
    }

    for (entity, idx) in expired {
        retire_spawn(&mut commands, &assets, &mut ctx, entity, idx);
    }
}

fn expire_projectiles(
    mut commands: Commands,
    time: Res<Time>,
    mut projectiles: Query<(Entity, &mut Lifespan), (With<Projectile>, Without<Spawned>)>,
) {
    for (entity, mut lifespan) in &mut projectiles {
        if lifespan.0.tick(time.delta()).finished() {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::*;

    fn pool(cap: u32, total: Option<u32>, respawn_on_expiry: bool) -> SpawnProfile {
        SpawnProfile {
            sprite: "sprites/test.png",
            size: Vec2::splat(32.0),
            interval: 0.5,
            cap,
            total,
            respawn_on_expiry,
            placement: Placement::AnyEdge,
            motion: Motion::Drift {
                vx: (-10.0, 10.0),
                vy: (-10.0, 10.0),
            },
            lifetime: None,
            cull_outside: false,
            window: SpawnWindow::Scripted,
            tints: &[],
        }
    }

    #[test]
    fn respawning_pool_holds_population_at_cap() {
        let profile = pool(4, None, true);
        let mut state = SpawnerState::new(&profile);
        state.active = true;

        while state.may_spawn(&profile) {
            state.note_spawned();
            assert_eq!(state.alive, profile.cap.min(state.spawned));
        }
        assert_eq!(state.alive, 4);

        // Every expiry asks for a refill; the population never sags and the
        // lifetime total keeps growing without bound.
        for _ in 0..100 {
            assert!(state.note_expired(&profile));
            state.note_spawned();
            assert_eq!(state.alive, profile.cap.min(state.spawned));
        }
        assert_eq!(state.spawned, 104);
    }

    #[test]
    fn exhaustible_pool_stops_permanently() {
        let profile = pool(8, Some(8), false);
        let mut state = SpawnerState::new(&profile);
        state.active = true;

        for _ in 0..8 {
            assert!(state.may_spawn(&profile));
            state.note_spawned();
        }
        assert!(state.exhausted(&profile));
        assert!(!state.may_spawn(&profile));

        // Draining the wave does not restart it.
        for _ in 0..8 {
            assert!(!state.note_expired(&profile));
        }
        assert_eq!(state.alive, 0);
        assert!(!state.may_spawn(&profile));
    }

    #[test]
    fn inactive_pool_refuses_to_spawn() {
        let profile = pool(4, None, true);
        let state = SpawnerState::new(&profile);
        assert!(!state.may_spawn(&profile));
    }

    #[test]
    fn pursuit_scale_steps_per_hundred_points() {
        assert_eq!(pursuit_scale(0), 1.0);
        assert_eq!(pursuit_scale(90), 1.0);
        assert!((pursuit_scale(100) - 1.1).abs() < 1e-6);
        assert!((pursuit_scale(250) - 1.2).abs() < 1e-6);
    }

    #[test]
    fn departure_cull_is_directional() {
        let bounds = Rect::new(-100.0, -100.0, 100.0, 100.0);
        // Spawned above the top edge, falling in: not culled.
        assert!(!outside_departure(
            Vec2::new(0.0, 150.0),
            Vec2::new(0.0, -120.0),
            bounds
        ));
        // Fell past the bottom edge: culled.
        assert!(outside_departure(
            Vec2::new(0.0, -120.0),
            Vec2::new(0.0, -120.0),
            bounds
        ));
        // Crossed to the far side it was ferrying toward: culled.
        assert!(outside_departure(
            Vec2::new(120.0, 0.0),
            Vec2::new(150.0, 0.0),
            bounds
        ));
    }
}
