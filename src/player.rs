// Player sprite: movement from the merged input vector, stamina-gated
// sprint, horizontal facing, and the per-chapter bounds clamp.

use bevy::prelude::*;

use crate::chapter::PlaySet;
use crate::collision::{Hitbox, Projectile};
use crate::input::{AimIntent, MoveIntent, movement_speed};
use crate::meters::Meters;
use crate::scene::{SceneContext, SceneTag};
use crate::script::ChapterScript;
use crate::spawner::{Lifespan, Velocity};

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera)
            .add_systems(Update, move_player.in_set(PlaySet::Motion))
            .add_systems(Update, fire_projectiles.in_set(PlaySet::Resolve))
            .add_systems(Update, clamp_player.in_set(PlaySet::Present));
    }
}

#[derive(Component)]
pub struct Player;

const PLAYER_SPRITE: &str = "sprites/wanderer.png";
const PLAYER_SIZE: Vec2 = Vec2::new(52.0, 68.0);
/// Body is narrower than the art: half the width, most of the height.
const PLAYER_BOX: Vec2 = Vec2::new(13.0, 29.0);

const SHOT_SPRITE: &str = "sprites/star.png";
const SHOT_SIZE: Vec2 = Vec2::new(20.0, 20.0);
const SHOT_SPEED: f32 = 300.0;
const SHOT_COOLDOWN: f32 = 0.25;
const SHOT_LIFETIME: f32 = 2.0;

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

pub fn spawn_player(commands: &mut Commands, assets: &AssetServer, script: &ChapterScript) {
    commands.spawn((
        SceneTag,
        Player,
        Sprite {
            image: assets.load(PLAYER_SPRITE),
            custom_size: Some(PLAYER_SIZE),
            ..default()
        },
        Transform::from_translation(script.player_start.extend(1.0)),
        Hitbox(PLAYER_BOX),
    ));
}

fn move_player(
    mut query: Query<(&mut Transform, &mut Sprite), With<Player>>,
    intent: Res<MoveIntent>,
    mut meters: ResMut<Meters>,
    ctx: Res<SceneContext>,
    time: Res<Time>,
) {
    let Ok((mut transform, mut sprite)) = query.single_mut() else {
        return;
    };

    // Sprint resolves against the stamina meter right now; holding the
    // button with an empty meter moves at normal speed.
    let sprinting = meters.tick_stamina(
        intent.sprint_held,
        ctx.script.stamina_drain,
        ctx.script.stamina_recharge,
    );
    let speed = movement_speed(sprinting);
    transform.translation += (intent.dir * speed * time.delta_secs()).extend(0.0);

    // Face the way we move; no flip while idle or moving straight up/down.
    if intent.dir.x < 0.0 {
        sprite.flip_x = true;
    } else if intent.dir.x > 0.0 {
        sprite.flip_x = false;
    }
}

fn fire_projectiles(
    mut commands: Commands,
    assets: Res<AssetServer>,
    mut ctx: ResMut<SceneContext>,
    mut meters: ResMut<Meters>,
    aim: Res<AimIntent>,
    player: Query<&Transform, With<Player>>,
    time: Res<Time>,
) {
    ctx.since_last_shot += time.delta_secs();
    if !ctx.script.shooting {
        return;
    }
    let Some(dir) = aim.0 else {
        return;
    };
    let dir = dir.normalize_or_zero();
    if dir == Vec2::ZERO || ctx.since_last_shot < SHOT_COOLDOWN {
        return;
    }
    let Ok(transform) = player.single() else {
        return;
    };
    // An empty blue meter refuses the shot outright: no projectile.
    if !meters.spend_ammo() {
        return;
    }
    ctx.since_last_shot = 0.0;

    commands.spawn((
        SceneTag,
        Projectile,
        Sprite {
            image: assets.load(SHOT_SPRITE),
            custom_size: Some(SHOT_SIZE),
            ..default()
        },
        Transform::from_translation(transform.translation.truncate().extend(1.5)),
        Velocity(dir * SHOT_SPEED),
        Lifespan(Timer::from_seconds(SHOT_LIFETIME, TimerMode::Once)),
        Hitbox(SHOT_SIZE * 0.5),
    ));
}

fn clamp_player(ctx: Res<SceneContext>, mut query: Query<&mut Transform, With<Player>>) {
    let Ok(mut transform) = query.single_mut() else {
        return;
    };
    let bounds = ctx.script.bounds;
    transform.translation.x = transform.translation.x.clamp(bounds.min.x, bounds.max.x);
    transform.translation.y = transform.translation.y.clamp(bounds.min.y, bounds.max.y);
}
