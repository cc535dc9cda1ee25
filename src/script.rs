// Chapter scripts: each playable chapter is a bundle of data (bounds,
// asset keys, narration sequence, spawn pools, collision table) consumed
// by the one generic scene runner. No per-chapter code.

use bevy::prelude::*;

use crate::chapter::Chapter;
use crate::collision::CollisionRule;
use crate::meters::{STAMINA_DRAIN, STAMINA_RECHARGE};
use crate::spawner::{Motion, Placement, SpawnProfile, SpawnWindow};

pub struct ChapterScript {
    pub backdrop: &'static str,
    pub scenery: &'static str,
    pub ambient: &'static str,
    pub bounds: Rect,
    pub player_start: Vec2,
    /// Green meter drain/recharge per tick while in this chapter.
    pub stamina_drain: f32,
    pub stamina_recharge: f32,
    pub narration: Vec<NarrationStep>,
    pub spawners: Vec<SpawnProfile>,
    pub rules: Vec<CollisionRule>,
    pub shooting: bool,
}

/// One audio-gated setup phase. The gate must pass before the clip plays;
/// the action runs when the clip finishes.
pub struct NarrationStep {
    pub clip: &'static str,
    pub gate: StepGate,
    pub action: StepAction,
}

#[derive(Clone, Copy)]
pub enum StepGate {
    Immediate,
    /// Waits until the pool has spawned its full total, then a further
    /// fixed delay before the clip starts.
    SpawnerExhausted { spawner: usize, delay: f32 },
}

#[derive(Clone, Copy)]
pub enum StepAction {
    /// Nothing beyond moving to the next step.
    Advance,
    StartSpawner(usize),
    /// Drops the key into play and stops script-driven pools; narration is
    /// over after this.
    DropKey,
}

/// The seven-color tint cycle for seance spirits.
const SPIRIT_TINTS: &[Color] = &[
    Color::srgb(1.0, 0.0, 0.0),
    Color::srgb(1.0, 0.5, 0.0),
    Color::srgb(1.0, 1.0, 0.0),
    Color::srgb(0.0, 1.0, 0.0),
    Color::srgb(0.0, 0.0, 1.0),
    Color::srgb(0.29, 0.0, 0.51),
    Color::srgb(0.58, 0.0, 0.83),
];

fn playfield() -> Rect {
    Rect::new(-400.0, -600.0, 400.0, 600.0)
}

pub fn chapter_script(chapter: Chapter) -> Option<ChapterScript> {
    let script = match chapter {
        Chapter::Vestibule => ChapterScript {
            backdrop: "backdrops/manor.png",
            scenery: "scenery/vestibule.png",
            ambient: "audio/ambient_loop.ogg",
            bounds: playfield(),
            player_start: Vec2::new(290.0, -560.0),
            stamina_drain: STAMINA_DRAIN,
            stamina_recharge: STAMINA_RECHARGE,
            narration: vec![NarrationStep {
                clip: "voice/vestibule_1.ogg",
                gate: StepGate::Immediate,
                action: StepAction::DropKey,
            }],
            spawners: vec![],
            rules: vec![CollisionRule::KeyPickup],
            shooting: false,
        },
        Chapter::Miasma => ChapterScript {
            backdrop: "backdrops/manor.png",
            scenery: "scenery/conservatory.png",
            ambient: "audio/ambient_loop.ogg",
            bounds: playfield(),
            player_start: Vec2::new(-30.0, -315.0),
            stamina_drain: STAMINA_DRAIN,
            stamina_recharge: STAMINA_RECHARGE,
            narration: vec![
                NarrationStep {
                    clip: "voice/miasma_1.ogg",
                    gate: StepGate::Immediate,
                    action: StepAction::StartSpawner(0),
                },
                NarrationStep {
                    clip: "voice/miasma_2.ogg",
                    gate: StepGate::SpawnerExhausted {
                        spawner: 0,
                        delay: 5.0,
                    },
                    action: StepAction::DropKey,
                },
            ],
            spawners: vec![SpawnProfile {
                sprite: "sprites/miasma.png",
                size: Vec2::new(64.0, 48.0),
                interval: 0.5,
                cap: 8,
                total: Some(8),
                respawn_on_expiry: false,
                placement: Placement::TopEdge,
                motion: Motion::Drift {
                    vx: (-50.0, 50.0),
                    vy: (-200.0, -100.0),
                },
                lifetime: None,
                cull_outside: true,
                window: SpawnWindow::Scripted,
                tints: &[],
            }],
            rules: vec![CollisionRule::Hazard { pool: 0 }, CollisionRule::KeyPickup],
            shooting: false,
        },
        Chapter::Seance => ChapterScript {
            backdrop: "backdrops/manor.png",
            scenery: "scenery/seance_room.png",
            ambient: "audio/ambient_loop.ogg",
            bounds: playfield(),
            player_start: Vec2::new(-30.0, -315.0),
            stamina_drain: STAMINA_DRAIN,
            stamina_recharge: STAMINA_RECHARGE,
            narration: vec![NarrationStep {
                clip: "voice/seance_1.ogg",
                gate: StepGate::Immediate,
                action: StepAction::DropKey,
            }],
            spawners: vec![SpawnProfile {
                sprite: "sprites/spirit.png",
                size: Vec2::new(56.0, 56.0),
                interval: 2.0,
                cap: u32::MAX,
                total: None,
                respawn_on_expiry: false,
                placement: Placement::AnyEdge,
                motion: Motion::Pursue {
                    speed: 30.0,
                    spin: 1.2,
                },
                lifetime: None,
                cull_outside: false,
                window: SpawnWindow::DuringNarration,
                tints: SPIRIT_TINTS,
            }],
            rules: vec![
                CollisionRule::Hazard { pool: 0 },
                CollisionRule::Gallery { pool: 0, points: 10 },
                CollisionRule::KeyPickup,
            ],
            shooting: true,
        },
        Chapter::Archive => ChapterScript {
            backdrop: "backdrops/manor.png",
            scenery: "scenery/archive.png",
            ambient: "audio/library_loop.ogg",
            bounds: playfield(),
            player_start: Vec2::new(-30.0, -315.0),
            stamina_drain: STAMINA_DRAIN,
            stamina_recharge: STAMINA_RECHARGE,
            narration: vec![
                NarrationStep {
                    clip: "voice/archive_1.ogg",
                    gate: StepGate::Immediate,
                    action: StepAction::StartSpawner(0),
                },
                NarrationStep {
                    clip: "voice/archive_2.ogg",
                    gate: StepGate::Immediate,
                    action: StepAction::Advance,
                },
                NarrationStep {
                    clip: "voice/archive_3.ogg",
                    gate: StepGate::Immediate,
                    action: StepAction::DropKey,
                },
            ],
            spawners: vec![SpawnProfile {
                sprite: "sprites/tome.png",
                size: Vec2::new(60.0, 44.0),
                interval: 0.0,
                cap: 4,
                total: None,
                respawn_on_expiry: true,
                placement: Placement::SideEdges,
                motion: Motion::Ferry { speed: 150.0 },
                lifetime: Some(10.0),
                cull_outside: true,
                window: SpawnWindow::Scripted,
                tints: &[],
            }],
            rules: vec![CollisionRule::Hazard { pool: 0 }, CollisionRule::KeyPickup],
            shooting: false,
        },
        _ => return None,
    };
    Some(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    use crate::chapter::Chapter;
    use crate::collision::CollisionRule;

    fn playable_scripts() -> impl Iterator<Item = (Chapter, ChapterScript)> {
        Chapter::iter().filter_map(|c| chapter_script(c).map(|s| (c, s)))
    }

    #[test]
    fn every_playable_chapter_has_a_script() {
        for chapter in Chapter::iter() {
            assert_eq!(chapter_script(chapter).is_some(), chapter.is_playable());
        }
    }

    #[test]
    fn scripts_reference_valid_pools() {
        for (chapter, script) in playable_scripts() {
            let pools = script.spawners.len();
            for step in &script.narration {
                if let StepGate::SpawnerExhausted { spawner, .. } = step.gate {
                    assert!(spawner < pools, "{chapter:?}: gate out of range");
                }
                if let StepAction::StartSpawner(spawner) = step.action {
                    assert!(spawner < pools, "{chapter:?}: action out of range");
                }
            }
            for rule in &script.rules {
                match rule {
                    CollisionRule::Hazard { pool }
                    | CollisionRule::Gallery { pool, .. } => {
                        assert!(*pool < pools, "{chapter:?}: rule out of range");
                    }
                    CollisionRule::KeyPickup => {}
                }
            }
        }
    }

    #[test]
    fn narration_ends_with_the_key_drop() {
        for (chapter, script) in playable_scripts() {
            let last = script.narration.last();
            assert!(
                matches!(
                    last,
                    Some(NarrationStep {
                        action: StepAction::DropKey,
                        ..
                    })
                ),
                "{chapter:?}: final step must drop the key"
            );
        }
    }

    #[test]
    fn hazard_rules_precede_the_key_pickup() {
        // Defeat preempts a same-tick pickup only if hazards resolve first.
        for (chapter, script) in playable_scripts() {
            let key_at = script
                .rules
                .iter()
                .position(|r| matches!(r, CollisionRule::KeyPickup));
            let last_hazard = script
                .rules
                .iter()
                .rposition(|r| matches!(r, CollisionRule::Hazard { .. }));
            if let (Some(key_at), Some(last_hazard)) = (key_at, last_hazard) {
                assert!(last_hazard < key_at, "{chapter:?}: table out of order");
            }
        }
    }

    #[test]
    fn gallery_rules_only_appear_with_shooting_enabled() {
        for (_, script) in playable_scripts() {
            let has_gallery = script
                .rules
                .iter()
                .any(|r| matches!(r, CollisionRule::Gallery { .. }));
            assert_eq!(has_gallery, script.shooting);
        }
    }
}
