// The one generic chapter runner. A chapter is its script plus this state
// machine: Narrating (audio-gated setup steps) -> Active (key in play) ->
// Exiting (transition pending). Gameplay systems run through Narrating and
// Active and stop dead at Exiting.

use bevy::audio::{AudioSink, AudioSinkPlayback};
use bevy::prelude::*;
use rand::Rng;
use strum::IntoEnumIterator;

use crate::audio::{self, NarrationVoice};
use crate::chapter::{Chapter, PlaySet};
use crate::collision::Hitbox;
use crate::player;
use crate::script::{ChapterScript, StepAction, StepGate, chapter_script};
use crate::spawner::{SpawnWindow, SpawnerState};

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        for chapter in Chapter::iter().filter(|c| c.is_playable()) {
            app.add_systems(
                OnEnter(chapter),
                move |commands: Commands, assets: Res<AssetServer>| {
                    enter_chapter(chapter, commands, assets);
                },
            );
            app.add_systems(OnExit(chapter), leave_chapter);
        }
        app.add_systems(
            Update,
            (drive_narration, settle_key).in_set(PlaySet::Resolve),
        );
    }
}

const KEY_SPRITE: &str = "sprites/key.png";
const KEY_SIZE: Vec2 = Vec2::new(40.0, 40.0);
/// Off-screen parking spot; the key only enters play when dropped.
const KEY_PARKED: Vec2 = Vec2::new(-2000.0, -2000.0);
/// Horizontal inset from the bounds for the drop position roll.
const KEY_DROP_MARGIN: f32 = 60.0;
/// The drop starts this far above the top edge.
const KEY_DROP_OFFSET: f32 = 50.0;
/// Where the key comes to rest above the bottom edge.
const KEY_REST_INSET: f32 = 30.0;
const KEY_FALL_SECS: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenePhase {
    /// Working through the narration steps, by index.
    Narrating(usize),
    /// Narration done, key in play, waiting on a terminal collision.
    Active,
    /// Transition set; no further gameplay this chapter.
    Exiting,
}

/// Where the current narration step stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStage {
    /// Gate not yet passed; the clip has not started.
    Gated,
    /// Clip playing; waiting for the sink to drain.
    Playing,
}

/// Everything one chapter needs at runtime, built on entry and torn down
/// wholesale on exit. Nothing in here survives into the next chapter.
#[derive(Resource)]
pub struct SceneContext {
    pub chapter: Chapter,
    pub script: ChapterScript,
    pub phase: ScenePhase,
    pub stage: StepStage,
    /// Armed once a SpawnerExhausted gate's pool drains.
    pub gate_wait: Option<Timer>,
    pub spawners: Vec<SpawnerState>,
    pub since_last_shot: f32,
}

impl SceneContext {
    pub fn live(&self) -> bool {
        self.phase != ScenePhase::Exiting
    }

    /// True while a narration clip is actually sounding.
    pub fn narrating_now(&self) -> bool {
        matches!(self.phase, ScenePhase::Narrating(_)) && self.stage == StepStage::Playing
    }
}

/// Run condition for the gameplay pipeline: a scene is up and not exiting.
pub fn scene_running(ctx: Option<Res<SceneContext>>) -> bool {
    ctx.is_some_and(|ctx| ctx.live())
}

/// Everything spawned for the current chapter, audio emitters included.
/// Teardown despawns the lot so stale timers cannot fire into the next
/// chapter.
#[derive(Component)]
pub struct SceneTag;

/// The chapter's goal object.
#[derive(Component)]
pub struct KeyItem {
    pub dropped: bool,
}

/// Two-second linear fall from the top of bounds to the floor.
#[derive(Component)]
pub struct KeyFall {
    pub from_y: f32,
    pub to_y: f32,
    pub timer: Timer,
}

fn enter_chapter(chapter: Chapter, mut commands: Commands, assets: Res<AssetServer>) {
    let Some(script) = chapter_script(chapter) else {
        warn!("no script for {chapter:?}");
        return;
    };
    info!("entering {chapter:?}");

    commands.spawn((
        SceneTag,
        Sprite::from_image(assets.load(script.backdrop)),
        Transform::from_xyz(0.0, 0.0, -10.0),
    ));
    commands.spawn((
        SceneTag,
        Sprite::from_image(assets.load(script.scenery)),
        Transform::from_xyz(0.0, 75.0, -9.0),
    ));

    player::spawn_player(&mut commands, &assets, &script);

    commands.spawn((
        SceneTag,
        KeyItem { dropped: false },
        Sprite {
            image: assets.load(KEY_SPRITE),
            custom_size: Some(KEY_SIZE),
            ..default()
        },
        Transform::from_translation(KEY_PARKED.extend(1.0)),
        Hitbox(KEY_SIZE * 0.5),
    ));

    audio::play_ambient(&mut commands, &assets, script.ambient);

    let spawners = script.spawners.iter().map(SpawnerState::new).collect();
    let phase = if script.narration.is_empty() {
        ScenePhase::Active
    } else {
        ScenePhase::Narrating(0)
    };
    commands.insert_resource(SceneContext {
        chapter,
        script,
        phase,
        stage: StepStage::Gated,
        gate_wait: None,
        spawners,
        since_last_shot: f32::MAX,
    });
}

fn leave_chapter(mut commands: Commands, tagged: Query<Entity, With<SceneTag>>) {
    for entity in &tagged {
        commands.entity(entity).despawn();
    }
    commands.remove_resource::<SceneContext>();
}

/// Decides the phase after a completed step: dropping the key (or running
/// out of steps) opens free play, anything else arms the next step.
pub fn phase_after_step(step: usize, step_count: usize, dropped_key: bool) -> ScenePhase {
    if dropped_key || step + 1 >= step_count {
        ScenePhase::Active
    } else {
        ScenePhase::Narrating(step + 1)
    }
}

fn drive_narration(
    mut commands: Commands,
    assets: Res<AssetServer>,
    mut ctx: ResMut<SceneContext>,
    time: Res<Time>,
    voices: Query<(Entity, &AudioSink), With<NarrationVoice>>,
    mut key: Query<(Entity, &mut Transform, &mut KeyItem)>,
) {
    let ScenePhase::Narrating(step) = ctx.phase else {
        return;
    };

    match ctx.stage {
        StepStage::Gated => {
            let gate = ctx.script.narration[step].gate;
            let ready = match gate {
                StepGate::Immediate => true,
                StepGate::SpawnerExhausted { spawner, delay } => {
                    if ctx.gate_wait.is_none()
                        && ctx.spawners[spawner].exhausted(&ctx.script.spawners[spawner])
                    {
                        ctx.gate_wait = Some(Timer::from_seconds(delay, TimerMode::Once));
                    }
                    match &mut ctx.gate_wait {
                        Some(wait) => wait.tick(time.delta()).finished(),
                        None => false,
                    }
                }
            };
            if ready {
                info!("{:?}: narration step {step}", ctx.chapter);
                ctx.gate_wait = None;
                audio::play_narration(&mut commands, &assets, ctx.script.narration[step].clip);
                ctx.stage = StepStage::Playing;
            }
        }
        StepStage::Playing => {
            // The sink component appears once playback starts; absence
            // means the clip is still spinning up.
            let Ok((voice, sink)) = voices.single() else {
                return;
            };
            if !sink.empty() {
                return;
            }
            commands.entity(voice).despawn();

            let action = ctx.script.narration[step].action;
            match action {
                StepAction::Advance => {}
                StepAction::StartSpawner(idx) => {
                    debug!("{:?}: pool {idx} started", ctx.chapter);
                    ctx.spawners[idx].active = true;
                }
                StepAction::DropKey => {
                    // The goal is in play; script-driven pools stop here.
                    for idx in 0..ctx.spawners.len() {
                        if ctx.script.spawners[idx].window == SpawnWindow::Scripted {
                            ctx.spawners[idx].active = false;
                        }
                    }
                    drop_key(&mut commands, &mut key, ctx.script.bounds);
                }
            }

            ctx.phase = phase_after_step(
                step,
                ctx.script.narration.len(),
                matches!(action, StepAction::DropKey),
            );
            ctx.stage = StepStage::Gated;
        }
    }
}

fn drop_key(
    commands: &mut Commands,
    key: &mut Query<(Entity, &mut Transform, &mut KeyItem)>,
    bounds: Rect,
) {
    let Ok((entity, mut transform, mut item)) = key.single_mut() else {
        return;
    };
    let mut rng = rand::rng();
    let x = rng.random_range(bounds.min.x + KEY_DROP_MARGIN..=bounds.max.x - KEY_DROP_MARGIN);
    let from_y = bounds.max.y + KEY_DROP_OFFSET;
    transform.translation = Vec3::new(x, from_y, 1.0);
    item.dropped = true;
    commands.entity(entity).insert(KeyFall {
        from_y,
        to_y: bounds.min.y + KEY_REST_INSET,
        timer: Timer::from_seconds(KEY_FALL_SECS, TimerMode::Once),
    });
    info!("key dropped at x = {x:.0}");
}

fn settle_key(
    mut commands: Commands,
    assets: Res<AssetServer>,
    time: Res<Time>,
    mut falling: Query<(Entity, &mut Transform, &mut KeyFall)>,
) {
    let Ok((entity, mut transform, mut fall)) = falling.single_mut() else {
        return;
    };
    fall.timer.tick(time.delta());
    let t = fall.timer.fraction();
    transform.translation.y = fall.from_y + (fall.to_y - fall.from_y) * t;
    if fall.timer.finished() {
        commands.entity(entity).remove::<KeyFall>();
        audio::play_cue(&mut commands, &assets, audio::CLINK_CUE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapter::Chapter;
    use crate::script::chapter_script;
    use crate::spawner::SpawnerState;

    #[test]
    fn steps_advance_in_order() {
        assert_eq!(phase_after_step(0, 3, false), ScenePhase::Narrating(1));
        assert_eq!(phase_after_step(1, 3, false), ScenePhase::Narrating(2));
        assert_eq!(phase_after_step(2, 3, false), ScenePhase::Active);
    }

    #[test]
    fn dropping_the_key_ends_narration_early() {
        assert_eq!(phase_after_step(0, 3, true), ScenePhase::Active);
    }

    fn context_for(chapter: Chapter) -> SceneContext {
        let script = chapter_script(chapter).unwrap();
        let spawners = script.spawners.iter().map(SpawnerState::new).collect();
        SceneContext {
            chapter,
            script,
            phase: ScenePhase::Narrating(0),
            stage: StepStage::Gated,
            gate_wait: None,
            spawners,
            since_last_shot: f32::MAX,
        }
    }

    #[test]
    fn exiting_latches_the_scene_dead() {
        let mut ctx = context_for(Chapter::Miasma);
        assert!(ctx.live());
        ctx.phase = ScenePhase::Exiting;
        assert!(!ctx.live());
        assert!(!ctx.narrating_now());
    }

    #[test]
    fn narration_window_requires_a_sounding_clip() {
        let mut ctx = context_for(Chapter::Seance);
        // Gated: the clip has not started, so the window is shut.
        assert!(!ctx.narrating_now());
        ctx.stage = StepStage::Playing;
        assert!(ctx.narrating_now());
        ctx.phase = ScenePhase::Active;
        assert!(!ctx.narrating_now());
    }
}
