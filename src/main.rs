// Main
mod audio;
mod chapter;
mod collision;
mod hud;
mod input;
mod menu;
mod meters;
mod player;
mod scene;
mod script;
mod spawner;

use bevy::prelude::*;

use chapter::{Chapter, PlaySet, Score};
use collision::CollisionPlugin;
use hud::HudPlugin;
use input::InputPlugin;
use menu::MenuPlugin;
use meters::Meters;
use player::PlayerPlugin;
use scene::{ScenePlugin, scene_running};
use spawner::SpawnerPlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .init_state::<Chapter>()
        .init_resource::<Meters>()
        .init_resource::<Score>()
        // One logical pass per frame: input, then motion, then collision
        // and narration resolution, then the clamp/HUD pass. The whole
        // pipeline stops while no scene is live or the scene is exiting.
        .configure_sets(
            Update,
            (
                PlaySet::Input,
                PlaySet::Motion,
                PlaySet::Resolve,
                PlaySet::Present,
            )
                .chain()
                .run_if(scene_running),
        )
        .add_plugins((
            MenuPlugin,
            InputPlugin,
            PlayerPlugin,
            SpawnerPlugin,
            CollisionPlugin,
            ScenePlugin,
            HudPlugin,
        ))
        .run();
}
