// Per-chapter collision table, evaluated by continuous AABB overlap every
// tick. Handlers guard against re-entry: overlap re-fires while two bodies
// touch, but an entity pending despawn must not trigger twice.

use std::collections::HashSet;

use bevy::math::bounding::{Aabb2d, IntersectsVolume};
use bevy::prelude::*;

use crate::audio;
use crate::chapter::{Chapter, PlaySet, Score};
use crate::meters::{HitOutcome, Meters};
use crate::player::Player;
use crate::scene::{KeyItem, SceneContext, ScenePhase};
use crate::spawner::{Spawned, retire_spawn};

pub struct CollisionPlugin;

impl Plugin for CollisionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, resolve_collisions.in_set(PlaySet::Resolve));
    }
}

/// Collision half-extents. Sprites use loose art; bodies are tighter.
#[derive(Component)]
pub struct Hitbox(pub Vec2);

#[derive(Component)]
pub struct Projectile;

/// One row of a chapter's collision table. Rows are evaluated in script
/// order; hazard rows come first so a defeat on the same tick preempts a
/// key pickup.
#[derive(Clone, Copy)]
pub enum CollisionRule {
    /// Player touching a pool member destroys it and costs a hazard hit.
    Hazard { pool: usize },
    /// A projectile touching a pool member destroys both and scores.
    Gallery { pool: usize, points: u32 },
    /// Player touching the dropped key ends the chapter.
    KeyPickup,
}

pub fn overlaps(a_center: Vec2, a_half: Vec2, b_center: Vec2, b_half: Vec2) -> bool {
    Aabb2d::new(a_center, a_half).intersects(&Aabb2d::new(b_center, b_half))
}

fn resolve_collisions(
    mut commands: Commands,
    assets: Res<AssetServer>,
    mut ctx: ResMut<SceneContext>,
    mut meters: ResMut<Meters>,
    mut score: ResMut<Score>,
    mut next_chapter: ResMut<NextState<Chapter>>,
    player: Query<(&Transform, &Hitbox), With<Player>>,
    spawns: Query<(Entity, &Transform, &Hitbox, &Spawned)>,
    projectiles: Query<(Entity, &Transform, &Hitbox), With<Projectile>>,
    key: Query<(Entity, &Transform, &Hitbox, &KeyItem)>,
) {
    let Ok((player_transform, player_box)) = player.single() else {
        return;
    };
    let player_pos = player_transform.translation.truncate();

    // Entities already consumed by an earlier rule this tick. Despawns are
    // deferred, so without this a pair could resolve twice.
    let mut handled: HashSet<Entity> = HashSet::new();

    for rule_idx in 0..ctx.script.rules.len() {
        if !ctx.live() {
            break;
        }
        let rule = ctx.script.rules[rule_idx];
        match rule {
            CollisionRule::Hazard { pool } => {
                for (entity, transform, hitbox, spawned) in &spawns {
                    if spawned.profile != pool || handled.contains(&entity) {
                        continue;
                    }
                    if !overlaps(
                        player_pos,
                        player_box.0,
                        transform.translation.truncate(),
                        hitbox.0,
                    ) {
                        continue;
                    }
                    handled.insert(entity);
                    retire_spawn(&mut commands, &assets, &mut ctx, entity, pool);
                    if meters.apply_hazard_hit() == HitOutcome::Defeated {
                        info!("red meter depleted, game over");
                        ctx.phase = ScenePhase::Exiting;
                        next_chapter.set(Chapter::Finale);
                        break;
                    }
                }
            }
            CollisionRule::Gallery { pool, points } => {
                for (target, target_transform, target_box, spawned) in &spawns {
                    if spawned.profile != pool || handled.contains(&target) {
                        continue;
                    }
                    for (shot, shot_transform, shot_box) in &projectiles {
                        if handled.contains(&shot) {
                            continue;
                        }
                        if !overlaps(
                            shot_transform.translation.truncate(),
                            shot_box.0,
                            target_transform.translation.truncate(),
                            target_box.0,
                        ) {
                            continue;
                        }
                        handled.insert(target);
                        handled.insert(shot);
                        commands.entity(shot).despawn();
                        retire_spawn(&mut commands, &assets, &mut ctx, target, pool);
                        score.0 += points;
                        audio::play_cue(&mut commands, &assets, audio::HIT_CUE);
                        break;
                    }
                }
            }
            CollisionRule::KeyPickup => {
                let Ok((entity, transform, hitbox, key_item)) = key.single() else {
                    continue;
                };
                if !key_item.dropped || handled.contains(&entity) {
                    continue;
                }
                if overlaps(
                    player_pos,
                    player_box.0,
                    transform.translation.truncate(),
                    hitbox.0,
                ) {
                    handled.insert(entity);
                    commands.entity(entity).despawn();
                    info!("key collected, leaving {:?}", ctx.chapter);
                    ctx.phase = ScenePhase::Exiting;
                    next_chapter.set(ctx.chapter.next());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::*;

    #[test]
    fn overlap_detects_contact_and_separation() {
        let half = Vec2::splat(10.0);
        assert!(overlaps(Vec2::ZERO, half, Vec2::new(15.0, 0.0), half));
        assert!(!overlaps(Vec2::ZERO, half, Vec2::new(25.0, 0.0), half));
        // Offset on both axes still overlaps while the boxes intersect.
        assert!(overlaps(Vec2::ZERO, half, Vec2::new(12.0, -12.0), half));
        assert!(!overlaps(Vec2::ZERO, half, Vec2::new(12.0, -30.0), half));
    }
}
