// Meter bars and the score readout. The bars are observers: arithmetic
// happens in the meter model, and the HUD redraws whenever the resource is
// change-flagged.

use bevy::prelude::*;

use crate::chapter::{PlaySet, Score};
use crate::meters::{METER_MAX, Meters};
use crate::scene::{SceneContext, SceneTag};

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (ensure_hud, sync_meter_bars, sync_score).in_set(PlaySet::Present),
        );
    }
}

const RED_BAR: Color = Color::srgb(0.80, 0.14, 0.14);
const BLUE_BAR: Color = Color::srgb(0.44, 0.64, 0.82);
const GREEN_BAR: Color = Color::srgb(0.70, 0.83, 0.71);

const BAR_FULL_WIDTH: f32 = 200.0;
const BAR_HEIGHT: f32 = 24.0;
const BAR_SPACING: f32 = 250.0;
const BAR_MARGIN: f32 = 50.0;

#[derive(Clone, Copy)]
pub enum MeterKind {
    Red,
    Blue,
    Green,
}

impl MeterKind {
    fn level(self, meters: &Meters) -> f32 {
        match self {
            MeterKind::Red => meters.red,
            MeterKind::Blue => meters.blue,
            MeterKind::Green => meters.green,
        }
    }
}

#[derive(Component)]
pub struct MeterBar(pub MeterKind);

#[derive(Component)]
pub struct ScoreReadout;

/// Builds the HUD once per chapter, after the scene context lands. Initial
/// widths come from the carried meters, not from full.
fn ensure_hud(
    mut commands: Commands,
    ctx: Res<SceneContext>,
    meters: Res<Meters>,
    existing: Query<(), With<MeterBar>>,
) {
    if !existing.is_empty() {
        return;
    }

    let bars = [
        (MeterKind::Red, RED_BAR),
        (MeterKind::Blue, BLUE_BAR),
        (MeterKind::Green, GREEN_BAR),
    ];
    for (slot, (kind, color)) in bars.into_iter().enumerate() {
        commands.spawn((
            SceneTag,
            MeterBar(kind),
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(BAR_MARGIN + BAR_SPACING * slot as f32),
                bottom: Val::Px(16.0),
                width: Val::Px(BAR_FULL_WIDTH * kind.level(&meters) / METER_MAX),
                height: Val::Px(BAR_HEIGHT),
                ..default()
            },
            BackgroundColor(color),
        ));
    }

    if ctx.script.shooting {
        commands.spawn((
            SceneTag,
            ScoreReadout,
            Text::new("Score: 0"),
            TextFont {
                font_size: 32.0,
                ..default()
            },
            TextColor(Color::WHITE),
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(16.0),
                top: Val::Px(16.0),
                ..default()
            },
        ));
    }
}

fn sync_meter_bars(meters: Res<Meters>, mut bars: Query<(&MeterBar, &mut Node)>) {
    if !meters.is_changed() {
        return;
    }
    for (bar, mut node) in &mut bars {
        node.width = Val::Px(BAR_FULL_WIDTH * bar.0.level(&meters) / METER_MAX);
    }
}

fn sync_score(score: Res<Score>, mut readouts: Query<&mut Text, With<ScoreReadout>>) {
    if !score.is_changed() {
        return;
    }
    for mut text in &mut readouts {
        text.0 = format!("Score: {}", score.0);
    }
}
