//! Ambient sound catalog and player state.
//!
//! The catalog is fixed. The player state (selected sound, playing flag,
//! volume) is kept in the key-value table so it survives restarts; turning
//! that state into actual audio output is left to whatever front end reads it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::storage::Storage;

/// Key under which the player state is persisted.
pub const AUDIO_STATE_KEY: &str = "audio.state";

/// Volume used when nothing else is configured.
pub const DEFAULT_VOLUME: f32 = 0.5;

/// A sound in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sound {
    /// Stable identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// File name under the sounds directory.
    pub file: &'static str,
    /// Icon name.
    pub icon: &'static str,
}

impl Sound {
    /// Web-style source path, e.g. `/sounds/Rain.mp3`.
    #[must_use]
    pub fn src(&self) -> String {
        format!("/sounds/{}", self.file)
    }

    /// Location of the sound file under `sounds_dir`.
    #[must_use]
    pub fn path_in(&self, sounds_dir: &Path) -> PathBuf {
        sounds_dir.join(self.file)
    }
}

/// Every available sound, in display order.
pub const SOUNDS: &[Sound] = &[
    Sound { id: "lightRain", name: "Light Rain", file: "LightRain.mp3", icon: "cloud-drizzle" },
    Sound { id: "rain", name: "Rain", file: "Rain.mp3", icon: "cloud-rain" },
    Sound { id: "forestAmbience", name: "Forest Ambience", file: "ForestAmbience.mp3", icon: "tree" },
    Sound { id: "cafeChatter", name: "Cafe Chatter", file: "CafeChatter.mp3", icon: "coffee" },
    Sound { id: "fire", name: "Crackling Fire", file: "fire.mp3", icon: "flame" },
    Sound { id: "waves", name: "Ocean Waves", file: "Waves.mp3", icon: "waves" },
    Sound { id: "river", name: "Flowing River", file: "River.mp3", icon: "droplet" },
    Sound { id: "fan", name: "Fan Sound", file: "fan.mp3", icon: "wind" },
    Sound { id: "nightAmbience", name: "Night Ambience", file: "NightAmbience.mp3", icon: "moon" },
    Sound { id: "thunderstorm", name: "Thunderstorm", file: "thunderstorm.mp3", icon: "cloud-lightning" },
    Sound { id: "whiteNoise", name: "White Noise", file: "WhiteNoise.mp3", icon: "radio" },
    Sound { id: "pinkNoise", name: "Pink Noise", file: "PinkNoise.mp3", icon: "noise-cancel" },
    Sound { id: "brownNoise", name: "Brown Noise", file: "BrownNoise.mp3", icon: "wave-square" },
    Sound { id: "greenNoise", name: "Green Noise", file: "GreenNoise.mp3", icon: "signal" },
];

/// Find a sound by id.
///
/// # Errors
///
/// Returns [`Error::UnknownSound`] if the id is not in the catalog.
pub fn find_sound(id: &str) -> Result<&'static Sound> {
    SOUNDS
        .iter()
        .find(|sound| sound.id == id)
        .ok_or_else(|| Error::UnknownSound { id: id.to_string() })
}

/// Player state.
///
/// `is_playing` is only ever `true` while a sound is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioState {
    /// Id of the selected sound.
    pub current_sound: Option<String>,
    /// Whether playback is on.
    pub is_playing: bool,
    /// Volume in `[0, 1]`.
    pub volume: f32,
}

impl Default for AudioState {
    fn default() -> Self {
        Self::with_volume(DEFAULT_VOLUME)
    }
}

impl AudioState {
    /// A stopped player with nothing selected.
    #[must_use]
    pub fn with_volume(volume: f32) -> Self {
        Self {
            current_sound: None,
            is_playing: false,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    /// Load the persisted state, or a fresh one at `default_volume`.
    ///
    /// A stored sound id that is no longer in the catalog is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored state cannot be read.
    pub fn load(storage: &Storage, default_volume: f32) -> Result<Self> {
        let Some(mut state) = storage.kv_get::<Self>(AUDIO_STATE_KEY)? else {
            return Ok(Self::with_volume(default_volume));
        };
        if let Some(id) = state.current_sound.as_deref() {
            if find_sound(id).is_err() {
                warn!("Dropping unknown stored sound '{}'", id);
                state.current_sound = None;
                state.is_playing = false;
            }
        }
        state.volume = state.volume.clamp(0.0, 1.0);
        Ok(state)
    }

    /// Persist the state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    pub fn save(&self, storage: &Storage) -> Result<()> {
        storage.kv_set(AUDIO_STATE_KEY, self)
    }

    /// The selected sound, if any.
    #[must_use]
    pub fn current(&self) -> Option<&'static Sound> {
        self.current_sound.as_deref().and_then(|id| find_sound(id).ok())
    }

    /// Select a sound.
    ///
    /// Selecting the current sound toggles playback. Selecting a different
    /// one makes it current and starts playback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSound`] if the id is not in the catalog.
    pub fn select(&mut self, id: &str) -> Result<&'static Sound> {
        let sound = find_sound(id)?;
        if self.current_sound.as_deref() == Some(sound.id) {
            self.is_playing = !self.is_playing;
        } else {
            self.current_sound = Some(sound.id.to_string());
            self.is_playing = true;
        }
        debug!("Selected {} (playing={})", sound.id, self.is_playing);
        Ok(sound)
    }

    /// Flip playback. Does nothing without a selected sound.
    ///
    /// Returns the new playing flag.
    pub fn toggle_play(&mut self) -> bool {
        if self.current_sound.is_some() {
            self.is_playing = !self.is_playing;
        }
        self.is_playing
    }

    /// Stop playback, keeping the selection.
    pub fn stop(&mut self) {
        self.is_playing = false;
    }

    /// Set the volume, clamped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVolume`] for NaN.
    pub fn set_volume(&mut self, volume: f32) -> Result<f32> {
        if volume.is_nan() {
            return Err(Error::InvalidVolume(volume));
        }
        self.volume = volume.clamp(0.0, 1.0);
        Ok(self.volume)
    }
}
