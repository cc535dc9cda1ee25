// Scene audio: ambient loops, narration voice clips, one-shot cues. All
// emitters are scene-tagged so the chapter teardown silences them as a
// unit; nothing keeps sounding across a transition.

use bevy::audio::Volume;
use bevy::prelude::*;

use crate::scene::SceneTag;

pub const CLINK_CUE: &str = "audio/key_clink.ogg";
pub const HIT_CUE: &str = "audio/spirit_hit.ogg";

const AMBIENT_VOLUME: f32 = 0.05;
const VOICE_VOLUME: f32 = 0.2;
const CUE_VOLUME: f32 = 0.3;

/// The currently sounding narration clip; at most one exists. The scene
/// runner polls its sink to detect completion.
#[derive(Component)]
pub struct NarrationVoice;

pub fn play_ambient(commands: &mut Commands, assets: &AssetServer, clip: &'static str) {
    commands.spawn((
        SceneTag,
        AudioPlayer::new(assets.load(clip)),
        PlaybackSettings::LOOP.with_volume(Volume::Linear(AMBIENT_VOLUME)),
    ));
}

pub fn play_narration(commands: &mut Commands, assets: &AssetServer, clip: &'static str) {
    commands.spawn((
        SceneTag,
        NarrationVoice,
        AudioPlayer::new(assets.load(clip)),
        PlaybackSettings::ONCE.with_volume(Volume::Linear(VOICE_VOLUME)),
    ));
}

pub fn play_cue(commands: &mut Commands, assets: &AssetServer, clip: &'static str) {
    commands.spawn((
        SceneTag,
        AudioPlayer::new(assets.load(clip)),
        PlaybackSettings::DESPAWN.with_volume(Volume::Linear(CUE_VOLUME)),
    ));
}
