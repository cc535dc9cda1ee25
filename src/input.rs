// Unified movement/aim input: keyboard and gamepad merged per tick.

use bevy::prelude::*;

use crate::chapter::PlaySet;

pub const NORMAL_SPEED: f32 = 160.0;
pub const SPRINT_SPEED: f32 = 320.0;
/// Analog stick axes below this magnitude are ignored.
pub const STICK_DEADZONE: f32 = 0.1;

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MoveIntent>()
            .init_resource::<AimIntent>()
            .add_systems(Update, (gather_move, gather_aim).in_set(PlaySet::Input));
    }
}

/// Merged movement command for the current tick. `dir` is normalized;
/// whether the held sprint actually engages is resolved against the green
/// meter during the movement pass.
#[derive(Resource, Default)]
pub struct MoveIntent {
    pub dir: Vec2,
    pub sprint_held: bool,
}

/// Fire direction for the current tick, if any.
#[derive(Resource, Default)]
pub struct AimIntent(pub Option<Vec2>);

/// Adds the stick contribution (per-axis, deadzone-filtered) onto the
/// keyboard vector, then normalizes. Sources stack rather than replace.
pub fn merge_axes(keys: Vec2, stick: Vec2, deadzone: f32) -> Vec2 {
    let mut merged = keys;
    if stick.x.abs() > deadzone {
        merged.x += stick.x;
    }
    if stick.y.abs() > deadzone {
        merged.y += stick.y;
    }
    merged.normalize_or_zero()
}

pub fn movement_speed(sprinting: bool) -> f32 {
    if sprinting { SPRINT_SPEED } else { NORMAL_SPEED }
}

fn gather_move(
    keyboard: Res<ButtonInput<KeyCode>>,
    gamepads: Query<&Gamepad>,
    mut intent: ResMut<MoveIntent>,
) {
    let mut keys = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyA) {
        keys.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        keys.x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        keys.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyW) {
        keys.y += 1.0;
    }

    // First connected pad, if any. Absence or disconnection just leaves the
    // query empty, so keyboard-only play needs no special casing.
    let pad = gamepads.iter().next();
    let stick = pad.map(|p| p.left_stick()).unwrap_or(Vec2::ZERO);

    intent.dir = merge_axes(keys, stick, STICK_DEADZONE);
    intent.sprint_held = keyboard.pressed(KeyCode::Space)
        || pad.is_some_and(|p| p.pressed(GamepadButton::East));
}

fn gather_aim(
    keyboard: Res<ButtonInput<KeyCode>>,
    gamepads: Query<&Gamepad>,
    mut aim: ResMut<AimIntent>,
) {
    aim.0 = if keyboard.pressed(KeyCode::ArrowUp) {
        Some(Vec2::Y)
    } else if keyboard.pressed(KeyCode::ArrowDown) {
        Some(Vec2::NEG_Y)
    } else if keyboard.pressed(KeyCode::ArrowLeft) {
        Some(Vec2::NEG_X)
    } else if keyboard.pressed(KeyCode::ArrowRight) {
        Some(Vec2::X)
    } else {
        gamepads.iter().next().and_then(|pad| {
            let stick = pad.right_stick();
            (stick.length() > STICK_DEADZONE).then_some(stick)
        })
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::*;

    use crate::meters::{Meters, STAMINA_DRAIN, STAMINA_RECHARGE};

    #[test]
    fn stick_below_deadzone_is_ignored() {
        let merged = merge_axes(Vec2::ZERO, Vec2::new(0.05, -0.09), STICK_DEADZONE);
        assert_eq!(merged, Vec2::ZERO);
    }

    #[test]
    fn stick_adds_onto_keyboard() {
        // A fully opposed stick cancels the key press; a replacing merge
        // would leave the stick value instead.
        let merged = merge_axes(Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0), STICK_DEADZONE);
        assert_eq!(merged, Vec2::ZERO);

        let merged = merge_axes(Vec2::ZERO, Vec2::new(-0.5, 0.0), STICK_DEADZONE);
        assert_eq!(merged, Vec2::NEG_X);
    }

    #[test]
    fn diagonal_movement_is_normalized() {
        let merged = merge_axes(Vec2::new(1.0, 1.0), Vec2::ZERO, STICK_DEADZONE);
        assert!((merged.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sprint_speed_requires_stamina() {
        let mut meters = Meters {
            green: 0.0,
            ..Meters::default()
        };
        let sprinting = meters.tick_stamina(true, STAMINA_DRAIN, STAMINA_RECHARGE);
        assert_eq!(movement_speed(sprinting), NORMAL_SPEED);

        let mut meters = Meters::default();
        let sprinting = meters.tick_stamina(true, STAMINA_DRAIN, STAMINA_RECHARGE);
        assert_eq!(movement_speed(sprinting), SPRINT_SPEED);
    }
}
