//! Audio service handed to the rewind engine and the game glue.
//!
//! [`AudioMixer`] is an explicitly inserted resource: callers queue requests
//! through [`AudioCues`] and [`apply_audio_requests`] turns them into
//! `bevy_audio` entities once per frame.
//!
//! Every time body shares the mixer, so the rewind treatment follows the
//! number of bodies currently rewinding rather than any single body.

use std::collections::HashMap;

use bevy::audio::{AudioSinkPlayback, PlaybackSettings, Volume};
use bevy::prelude::*;

use crate::{
    config::{AudioConfig, GameConfigHandle},
    controller::AudioCues,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    Jump,
    Death,
    Victory,
    RewindStart,
    RewindStop,
    RewindLoop,
}

impl Cue {
    pub const ALL: [Cue; 6] = [
        Cue::Jump,
        Cue::Death,
        Cue::Victory,
        Cue::RewindStart,
        Cue::RewindStop,
        Cue::RewindLoop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::Jump => "jump",
            Cue::Death => "death",
            Cue::Victory => "victory",
            Cue::RewindStart => "rewind_start",
            Cue::RewindStop => "rewind_stop",
            Cue::RewindLoop => "rewind_loop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioChannel {
    Master,
    Music,
    Effects,
    RewindLoop,
}

impl AudioChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioChannel::Master => "master",
            AudioChannel::Music => "music",
            AudioChannel::Effects => "effects",
            AudioChannel::RewindLoop => "rewind_loop",
        }
    }
}

/// Per-channel volumes before muting and ducking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixLevels {
    pub master: f32,
    pub music: f32,
    pub effects: f32,
    pub rewind_loop: f32,
}

impl MixLevels {
    pub fn from_config(config: &AudioConfig) -> Self {
        Self {
            master: config.master_volume.clamp(0.0, 1.0),
            music: config.bgm_volume.clamp(0.0, 1.0),
            effects: config.sfx_volume.clamp(0.0, 1.0),
            rewind_loop: config.rewind_loop_volume.clamp(0.0, 1.0),
        }
    }

    pub fn get(&self, channel: AudioChannel) -> f32 {
        match channel {
            AudioChannel::Master => self.master,
            AudioChannel::Music => self.music,
            AudioChannel::Effects => self.effects,
            AudioChannel::RewindLoop => self.rewind_loop,
        }
    }

    fn set(&mut self, channel: AudioChannel, volume: f32) {
        let slot = match channel {
            AudioChannel::Master => &mut self.master,
            AudioChannel::Music => &mut self.music,
            AudioChannel::Effects => &mut self.effects,
            AudioChannel::RewindLoop => &mut self.rewind_loop,
        };
        *slot = volume.clamp(0.0, 1.0);
    }
}

impl Default for MixLevels {
    fn default() -> Self {
        Self::from_config(&AudioConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioRequest {
    PlayOneShot(Cue),
    StartLoop(Cue),
    StopLoop,
    Duck(f32),
    RestoreMix,
    /// Levels or mute changed; live sinks must be re-leveled.
    Remix,
    PauseMusic,
    ResumeMusic,
}

#[derive(Resource, Debug, Default)]
pub struct AudioMixer {
    pending: Vec<AudioRequest>,
    rewinding: u32,
    ducked_to: Option<f32>,
    levels: MixLevels,
    muted: bool,
    music_paused: bool,
}

impl AudioMixer {
    pub fn from_config(config: &AudioConfig) -> Self {
        Self {
            levels: MixLevels::from_config(config),
            ..default()
        }
    }

    pub fn pending(&self) -> &[AudioRequest] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<AudioRequest> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_looping(&self) -> bool {
        self.rewinding > 0
    }

    /// Bodies whose rewind loop is currently held.
    pub fn rewinding_bodies(&self) -> u32 {
        self.rewinding
    }

    pub fn ducked_to(&self) -> Option<f32> {
        self.ducked_to
    }

    pub fn levels(&self) -> MixLevels {
        self.levels
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_music_paused(&self) -> bool {
        self.music_paused
    }

    /// Volume a sink on `channel` should play at right now.
    pub fn output_volume(&self, channel: AudioChannel) -> f32 {
        if self.muted {
            return 0.0;
        }
        let master = self.levels.master;
        match channel {
            AudioChannel::Master => master,
            AudioChannel::Music => {
                master * self.levels.music * self.ducked_to.unwrap_or(1.0)
            }
            other => master * self.levels.get(other),
        }
    }

    pub fn set_volume(&mut self, channel: AudioChannel, volume: f32) {
        self.levels.set(channel, volume);
        self.pending.push(AudioRequest::Remix);
    }

    pub fn set_muted(&mut self, muted: bool) {
        if self.muted == muted {
            return;
        }
        self.muted = muted;
        self.pending.push(AudioRequest::Remix);
    }

    pub fn pause_music(&mut self) {
        if !self.music_paused {
            self.music_paused = true;
            self.pending.push(AudioRequest::PauseMusic);
        }
    }

    pub fn resume_music(&mut self) {
        if self.music_paused {
            self.music_paused = false;
            self.pending.push(AudioRequest::ResumeMusic);
        }
    }
}

/// Callers bracket a rewind with `duck`, `start_loop`, `play_one_shot(RewindStart)`
/// and `stop_loop`, `play_one_shot(RewindStop)`, `restore_mix`. Only the first
/// start and the last stop are audible.
impl AudioCues for AudioMixer {
    fn play_one_shot(&mut self, cue: Cue) {
        match cue {
            Cue::RewindStart if self.rewinding > 1 => return,
            Cue::RewindStop if self.rewinding > 0 => return,
            _ => {}
        }
        self.pending.push(AudioRequest::PlayOneShot(cue));
    }

    fn start_loop(&mut self, cue: Cue) {
        self.rewinding += 1;
        if self.rewinding == 1 {
            self.pending.push(AudioRequest::StartLoop(cue));
        }
    }

    fn stop_loop(&mut self) {
        if self.rewinding == 0 {
            return;
        }
        self.rewinding -= 1;
        if self.rewinding == 0 {
            self.pending.push(AudioRequest::StopLoop);
        }
    }

    fn duck(&mut self, mix_factor: f32) {
        if self.ducked_to.is_some() {
            return;
        }
        let mix_factor = mix_factor.clamp(0.0, 1.0);
        self.ducked_to = Some(mix_factor);
        self.pending.push(AudioRequest::Duck(mix_factor));
    }

    fn restore_mix(&mut self) {
        if self.rewinding > 0 {
            return;
        }
        if self.ducked_to.take().is_some() {
            self.pending.push(AudioRequest::RestoreMix);
        }
    }
}

/// Loaded clip handles. Cues without a clip are skipped silently.
#[derive(Resource, Debug, Default)]
pub struct AudioClips {
    pub bgm: Option<Handle<AudioSource>>,
    pub cues: HashMap<Cue, Handle<AudioSource>>,
}

impl AudioClips {
    pub fn get(&self, cue: Cue) -> Option<Handle<AudioSource>> {
        self.cues.get(&cue).cloned()
    }
}

#[derive(Component, Debug)]
pub struct BackgroundMusic;

#[derive(Component, Debug)]
pub struct RewindLoopSource;

pub fn load_audio_clips(
    asset_server: Option<Res<AssetServer>>,
    config: Res<GameConfigHandle>,
    mut clips: ResMut<AudioClips>,
) {
    let Some(asset_server) = asset_server else {
        tracing::debug!(target: "backtrack::audio", "audio.clips.skipped=no_asset_server");
        return;
    };
    let cfg = config.get();
    clips.bgm = cfg.audio.bgm.as_ref().map(|path| asset_server.load(path.clone()));
    for cue in Cue::ALL {
        if let Some(path) = cfg.audio.clip_path(cue) {
            clips.cues.insert(cue, asset_server.load(path.to_owned()));
        }
    }
    tracing::info!(
        target: "backtrack::audio",
        cues = clips.cues.len(),
        bgm = clips.bgm.is_some(),
        "audio.clips.loaded"
    );
}

pub fn start_background_music(
    mut commands: Commands,
    mixer: Res<AudioMixer>,
    clips: Res<AudioClips>,
) {
    let Some(bgm) = clips.bgm.clone() else {
        return;
    };
    let volume = Volume::new(mixer.output_volume(AudioChannel::Music));
    let mut settings = PlaybackSettings::LOOP.with_volume(volume);
    settings.paused = mixer.is_music_paused();
    commands.spawn((
        AudioBundle {
            source: bgm,
            settings,
        },
        BackgroundMusic,
    ));
}

/// M mutes, P pauses the music, `-` and `=` step the master volume.
pub fn read_audio_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut mixer: ResMut<AudioMixer>,
) {
    let Some(keys) = keys else {
        return;
    };
    if keys.just_pressed(KeyCode::KeyM) {
        let muted = !mixer.is_muted();
        mixer.set_muted(muted);
        tracing::info!(target: "backtrack::audio", muted, "audio.mute_toggled");
    }
    if keys.just_pressed(KeyCode::KeyP) {
        if mixer.is_music_paused() {
            mixer.resume_music();
        } else {
            mixer.pause_music();
        }
        tracing::info!(
            target: "backtrack::audio",
            paused = mixer.is_music_paused(),
            "audio.music_toggled"
        );
    }
    let step = match (
        keys.just_pressed(KeyCode::Minus),
        keys.just_pressed(KeyCode::Equal),
    ) {
        (true, false) => -0.1,
        (false, true) => 0.1,
        _ => return,
    };
    let master = mixer.levels().master + step;
    mixer.set_volume(AudioChannel::Master, master);
    tracing::info!(
        target: "backtrack::audio",
        master = mixer.levels().master,
        "audio.volume_changed"
    );
}

pub fn apply_audio_requests(
    mut commands: Commands,
    clips: Res<AudioClips>,
    mut mixer: ResMut<AudioMixer>,
    loops: Query<(Entity, Option<&AudioSink>), With<RewindLoopSource>>,
    music: Query<&AudioSink, With<BackgroundMusic>>,
) {
    let requests = mixer.drain();
    if requests.is_empty() {
        return;
    }
    let mut spawned_loop = None;

    for request in requests {
        match request {
            AudioRequest::PlayOneShot(cue) => {
                let Some(source) = clips.get(cue) else {
                    continue;
                };
                let volume = Volume::new(mixer.output_volume(AudioChannel::Effects));
                commands.spawn(AudioBundle {
                    source,
                    settings: PlaybackSettings::DESPAWN.with_volume(volume),
                });
            }
            AudioRequest::StartLoop(cue) => {
                let Some(source) = clips.get(cue) else {
                    continue;
                };
                let volume = Volume::new(mixer.output_volume(AudioChannel::RewindLoop));
                let entity = commands
                    .spawn((
                        AudioBundle {
                            source,
                            settings: PlaybackSettings::LOOP.with_volume(volume),
                        },
                        RewindLoopSource,
                    ))
                    .id();
                spawned_loop = Some(entity);
            }
            AudioRequest::StopLoop => {
                for (entity, sink) in &loops {
                    if let Some(sink) = sink {
                        sink.stop();
                    }
                    commands.entity(entity).despawn();
                }
                if let Some(entity) = spawned_loop.take() {
                    commands.entity(entity).despawn();
                }
            }
            AudioRequest::Duck(_) | AudioRequest::RestoreMix | AudioRequest::Remix => {
                let music_volume = mixer.output_volume(AudioChannel::Music);
                for sink in &music {
                    sink.set_volume(music_volume);
                }
                let loop_volume = mixer.output_volume(AudioChannel::RewindLoop);
                for (_, sink) in &loops {
                    if let Some(sink) = sink {
                        sink.set_volume(loop_volume);
                    }
                }
            }
            AudioRequest::PauseMusic => {
                for sink in &music {
                    sink.pause();
                }
            }
            AudioRequest::ResumeMusic => {
                for sink in &music {
                    sink.play();
                }
            }
        }
    }
}
