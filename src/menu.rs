// Title, briefing, and finale screens. The finale doubles as the game-over
// screen: defeat and campaign completion both land here.

use bevy::prelude::*;
use strum::IntoEnumIterator;

use crate::chapter::{Chapter, Score};
use crate::meters::Meters;

pub struct MenuPlugin;

impl Plugin for MenuPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(Chapter::Title), setup_title)
            .add_systems(OnEnter(Chapter::Briefing), setup_briefing)
            .add_systems(OnEnter(Chapter::Finale), setup_finale)
            .add_systems(
                Update,
                (button_visuals, button_actions).run_if(in_menus),
            );
    }
}

fn in_menus(chapter: Res<State<Chapter>>) -> bool {
    !chapter.get().is_playable()
}

const NORMAL_BUTTON: Color = Color::srgb(0.15, 0.15, 0.15);
const HOVERED_BUTTON: Color = Color::srgb(0.25, 0.25, 0.25);
const PRESSED_BUTTON: Color = Color::srgb(0.35, 0.35, 0.35);

#[derive(Component)]
enum MenuButton {
    Start,
    /// Chapter-select debug entry: jump straight to a named chapter with a
    /// fresh payload.
    Jump(Chapter),
    Continue,
    Return,
    #[cfg(not(target_arch = "wasm32"))]
    Exit,
}

fn setup_title(mut commands: Commands) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(24.0),
                ..default()
            },
            DespawnOnExit(Chapter::Title),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("KEYBEARER"),
                TextFont {
                    font_size: 64.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));

            spawn_button(parent, "Start", 200.0, MenuButton::Start);

            // Chapter-select row.
            parent
                .spawn(Node {
                    flex_direction: FlexDirection::Row,
                    column_gap: Val::Px(12.0),
                    ..default()
                })
                .with_children(|row| {
                    for chapter in Chapter::iter().filter(|c| c.is_playable()) {
                        spawn_button(row, chapter.label(), 60.0, MenuButton::Jump(chapter));
                    }
                });

            #[cfg(not(target_arch = "wasm32"))]
            spawn_button(parent, "Exit", 200.0, MenuButton::Exit);
        });
}

fn setup_briefing(mut commands: Commands) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(16.0),
                ..default()
            },
            DespawnOnExit(Chapter::Briefing),
        ))
        .with_children(|parent| {
            let lines = [
                "Move with WASD or the left stick.",
                "Hold Space (or East) to sprint while the green meter lasts.",
                "Shoot with the arrow keys or the right stick.",
                "Hazards drain the red meter. Three hits end the run.",
                "Find the key in every chapter.",
            ];
            for line in lines {
                parent.spawn((
                    Text::new(line),
                    TextFont {
                        font_size: 20.0,
                        ..default()
                    },
                    TextColor(Color::srgba(0.8, 0.8, 0.8, 1.0)),
                ));
            }

            spawn_button(parent, "Continue", 200.0, MenuButton::Continue);
        });
}

fn setup_finale(mut commands: Commands, score: Res<Score>) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(24.0),
                ..default()
            },
            DespawnOnExit(Chapter::Finale),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("The End"),
                TextFont {
                    font_size: 48.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));

            parent.spawn((
                Text::new(format!("Score: {}", score.0)),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(Color::srgba(0.8, 0.8, 0.8, 1.0)),
            ));

            spawn_button(parent, "Title", 200.0, MenuButton::Return);
        });
}

fn spawn_button(parent: &mut ChildSpawnerCommands, label: &str, width: f32, marker: MenuButton) {
    parent
        .spawn((
            marker,
            Button,
            Node {
                width: Val::Px(width),
                height: Val::Px(50.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                border: UiRect::all(Val::Px(2.0)),
                ..default()
            },
            BorderColor::all(Color::srgba(1.0, 1.0, 1.0, 0.3)),
            BackgroundColor(NORMAL_BUTTON),
        ))
        .with_children(|btn| {
            btn.spawn((
                Text::new(label),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

fn button_visuals(
    mut query: Query<
        (&Interaction, &mut BackgroundColor, &mut BorderColor),
        (Changed<Interaction>, With<MenuButton>),
    >,
) {
    for (interaction, mut bg, mut border) in &mut query {
        match *interaction {
            Interaction::Pressed => {
                *bg = PRESSED_BUTTON.into();
                *border = BorderColor::all(Color::WHITE);
            }
            Interaction::Hovered => {
                *bg = HOVERED_BUTTON.into();
                *border = BorderColor::all(Color::WHITE);
            }
            Interaction::None => {
                *bg = NORMAL_BUTTON.into();
                *border = BorderColor::all(Color::srgba(1.0, 1.0, 1.0, 0.3));
            }
        }
    }
}

fn button_actions(
    query: Query<(&Interaction, &MenuButton), Changed<Interaction>>,
    mut next_chapter: ResMut<NextState<Chapter>>,
    mut commands: Commands,
    #[cfg(not(target_arch = "wasm32"))] mut exit: MessageWriter<AppExit>,
) {
    for (interaction, button) in &query {
        if *interaction != Interaction::Pressed {
            continue;
        }
        match button {
            MenuButton::Start => {
                reset_campaign(&mut commands);
                next_chapter.set(Chapter::Briefing);
            }
            MenuButton::Jump(chapter) => {
                reset_campaign(&mut commands);
                next_chapter.set(*chapter);
            }
            MenuButton::Continue => {
                next_chapter.set(Chapter::Vestibule);
            }
            MenuButton::Return => {
                next_chapter.set(Chapter::Title);
            }
            #[cfg(not(target_arch = "wasm32"))]
            MenuButton::Exit => {
                exit.write(AppExit::Success);
            }
        }
    }
}

/// A campaign starts with full meters and a clean score. Every entry path
/// into the playable chapters goes through here.
fn reset_campaign(commands: &mut Commands) {
    commands.insert_resource(Meters::default());
    commands.insert_resource(Score::default());
}
