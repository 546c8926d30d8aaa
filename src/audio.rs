//! Sound cues. Gameplay code only sends `AudioCue` events; this module maps them to clips under
//! `assets/audio/`. The game ships without audio files, so a clip whose load failed or never
//! started plays nothing. One still in flight is queued and starts once it arrives, and is
//! dropped if the load fails instead.

use bevy::asset::LoadState;
use bevy::prelude::*;

pub struct GameAudioPlugin;

impl Plugin for GameAudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AudioCue>()
            .init_resource::<AudioHandles>()
            .add_systems(Startup, load_audio_handles)
            .add_systems(Update, (play_audio_cues, drop_failed_cues));
    }
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// Boot jingle.
    Coin,
    Jump,
    Stomp,
    Hit,
    Pickup,
}

impl AudioCue {
    pub const ALL: [AudioCue; 5] = [
        AudioCue::Coin,
        AudioCue::Jump,
        AudioCue::Stomp,
        AudioCue::Hit,
        AudioCue::Pickup,
    ];

    pub fn asset_path(self) -> &'static str {
        match self {
            AudioCue::Coin => "audio/coin.ogg",
            AudioCue::Jump => "audio/jump.ogg",
            AudioCue::Stomp => "audio/stomp.ogg",
            AudioCue::Hit => "audio/hit.ogg",
            AudioCue::Pickup => "audio/pickup.ogg",
        }
    }
}

/// Keeps clip handles alive for the whole run.
#[derive(Resource, Default)]
pub struct AudioHandles {
    pub coin: Option<Handle<AudioSource>>,
    pub jump: Option<Handle<AudioSource>>,
    pub stomp: Option<Handle<AudioSource>>,
    pub hit: Option<Handle<AudioSource>>,
    pub pickup: Option<Handle<AudioSource>>,
}

impl AudioHandles {
    pub fn get(&self, cue: AudioCue) -> Option<&Handle<AudioSource>> {
        match cue {
            AudioCue::Coin => self.coin.as_ref(),
            AudioCue::Jump => self.jump.as_ref(),
            AudioCue::Stomp => self.stomp.as_ref(),
            AudioCue::Hit => self.hit.as_ref(),
            AudioCue::Pickup => self.pickup.as_ref(),
        }
    }

    fn slot(&mut self, cue: AudioCue) -> &mut Option<Handle<AudioSource>> {
        match cue {
            AudioCue::Coin => &mut self.coin,
            AudioCue::Jump => &mut self.jump,
            AudioCue::Stomp => &mut self.stomp,
            AudioCue::Hit => &mut self.hit,
            AudioCue::Pickup => &mut self.pickup,
        }
    }
}

/// Tags the entity spawned for one cue until its playback despawns it.
#[derive(Component, Debug)]
pub struct CueSound(pub AudioCue);

/// A clip that is loaded or still on its way can be handed to the audio player.
fn clip_usable(state: Option<LoadState>) -> bool {
    matches!(state, Some(LoadState::Loaded | LoadState::Loading))
}

fn load_audio_handles(asset_server: Res<AssetServer>, mut handles: ResMut<AudioHandles>) {
    for cue in AudioCue::ALL {
        *handles.slot(cue) = Some(asset_server.load(cue.asset_path()));
    }

    info!("Queued audio cues. Add clips under assets/audio/ to enable playback.");
}

fn play_audio_cues(
    mut commands: Commands,
    mut cues: EventReader<AudioCue>,
    handles: Res<AudioHandles>,
    asset_server: Res<AssetServer>,
) {
    for &cue in cues.read() {
        let Some(handle) = handles.get(cue) else {
            continue;
        };
        if !clip_usable(asset_server.get_load_state(handle.id())) {
            continue;
        }

        commands.spawn((
            Name::new(format!("Sfx{cue:?}")),
            CueSound(cue),
            AudioBundle {
                source: handle.clone(),
                settings: PlaybackSettings::DESPAWN,
            },
        ));
    }
}

/// `PlaybackSettings::DESPAWN` only fires once a sink has played out; a clip that never
/// arrives would leave its cue entity behind forever.
fn drop_failed_cues(
    mut commands: Commands,
    cues: Query<(Entity, &CueSound, &Handle<AudioSource>)>,
    asset_server: Res<AssetServer>,
) {
    for (entity, cue, handle) in &cues {
        if clip_usable(asset_server.get_load_state(handle.id())) {
            continue;
        }
        debug!("Dropping {:?} cue; its clip did not load", cue.0);
        commands.entity(entity).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_cue_has_its_own_clip() {
        let paths: HashSet<_> = AudioCue::ALL.iter().map(|cue| cue.asset_path()).collect();
        assert_eq!(paths.len(), AudioCue::ALL.len());
    }

    #[test]
    fn only_loaded_or_loading_clips_are_usable() {
        assert!(clip_usable(Some(LoadState::Loaded)));
        assert!(clip_usable(Some(LoadState::Loading)));
        assert!(!clip_usable(Some(LoadState::NotLoaded)));
        assert!(!clip_usable(None));
    }

    fn audio_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<AudioSource>()
            .add_event::<AudioCue>()
            .add_systems(Update, (play_audio_cues, drop_failed_cues).chain());
        app
    }

    fn cue_entities(app: &mut App) -> usize {
        app.world_mut()
            .query::<&CueSound>()
            .iter(app.world())
            .count()
    }

    #[test]
    fn cue_without_a_clip_leaves_nothing_behind() {
        let mut app = audio_app();
        // A handle the asset server never loaded has no load state at all.
        app.insert_resource(AudioHandles {
            coin: Some(Handle::default()),
            ..default()
        });

        app.world_mut().send_event(AudioCue::Coin);
        app.update();

        assert_eq!(cue_entities(&mut app), 0);
    }

    #[test]
    fn cue_entity_whose_clip_failed_is_despawned() {
        let mut app = audio_app();
        app.init_resource::<AudioHandles>();
        let stale = app
            .world_mut()
            .spawn((
                CueSound(AudioCue::Coin),
                AudioBundle {
                    source: Handle::default(),
                    settings: PlaybackSettings::DESPAWN,
                },
            ))
            .id();

        app.update();

        assert!(app.world().get_entity(stale).is_none());
        assert_eq!(cue_entities(&mut app), 0);
    }

    #[test]
    fn unloaded_cues_have_no_handle() {
        let handles = AudioHandles::default();
        assert!(AudioCue::ALL.iter().all(|&cue| handles.get(cue).is_none()));
    }
}
