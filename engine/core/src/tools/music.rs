//! Music player
//!
//! Nothing is actually decoded or played. The player tracks selection,
//! play state and volume; the shell schedules a simulated track end and
//! advances to the next track when it fires.

use chrono::NaiveDateTime;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{export_failed, invalid_import, ToolError, EXPORT_VERSION};
use crate::mood::Mood;

/// Storage key for volume, selection and playlist
pub const SETTINGS_KEY: &str = "retrobot-music-settings";

/// Volume for a fresh install
pub const DEFAULT_VOLUME: u8 = 50;

/// Speech when play is pressed with nothing selected
pub const NO_TRACK_LINE: &str =
    "Select a track first! I can't play silence... well, I could, but that's boring! 😅";
/// Speech on pause
pub const PAUSED_LINE: &str = "Paused! The beat stops for no one... except you! ⏸️";
/// Speech after shuffling
pub const SHUFFLED_LINE: &str = "Playlist shuffled! Time for some musical surprises! 🎲🎵";

/// A playlist entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Stable identifier
    pub id: String,
    /// Title
    pub title: String,
    /// Artist
    pub artist: String,
    /// Display length, "m:ss"
    pub duration: String,
}

impl Track {
    fn new(id: &str, title: &str, artist: &str, duration: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            duration: duration.to_string(),
        }
    }
}

/// The four tracks every player starts with
#[must_use]
pub fn builtin_playlist() -> Vec<Track> {
    vec![
        Track::new("retro1", "Neon Dreams", "Synthwave Studios", "3:24"),
        Track::new("retro2", "Pixel Paradise", "Chiptune Masters", "2:47"),
        Track::new("retro3", "Synthwave Sunset", "Retro Vibes", "4:12"),
        Track::new("retro4", "8-bit Adventure", "Game Audio Co.", "3:55"),
    ]
}

/// Name written into playlist exports
pub const EXPORT_NAME: &str = "RetroBot Playlist";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistExport<'a> {
    version: &'static str,
    name: &'static str,
    export_date: NaiveDateTime,
    tracks: &'a [Track],
}

#[derive(Deserialize)]
struct PlaylistImport {
    tracks: Vec<Track>,
}

/// Persisted part of the player
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MusicSettings {
    /// 0..=100
    pub volume: u8,
    /// Selected track
    pub current_track_id: Option<String>,
    /// Playlist, including user additions and shuffle order
    pub playlist: Vec<Track>,
}

impl Default for MusicSettings {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            current_track_id: None,
            playlist: builtin_playlist(),
        }
    }
}

/// Outcome of pressing play
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    /// Now playing
    Playing,
    /// Now paused
    Paused,
}

/// Player state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MusicPlayer {
    playlist: Vec<Track>,
    current: Option<usize>,
    playing: bool,
    volume: u8,
}

impl Default for MusicPlayer {
    fn default() -> Self {
        Self::from_settings(MusicSettings::default())
    }
}

impl MusicPlayer {
    /// Player over the built-in playlist
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Player restored from saved settings
    ///
    /// An empty saved playlist falls back to the built-in one.
    #[must_use]
    pub fn from_settings(settings: MusicSettings) -> Self {
        let playlist = if settings.playlist.is_empty() {
            builtin_playlist()
        } else {
            settings.playlist
        };
        let current = settings
            .current_track_id
            .and_then(|id| playlist.iter().position(|t| t.id == id));
        Self {
            playlist,
            current,
            playing: false,
            volume: settings.volume.min(100),
        }
    }

    /// What to persist
    #[must_use]
    pub fn settings(&self) -> MusicSettings {
        MusicSettings {
            volume: self.volume,
            current_track_id: self.current_track().map(|t| t.id.clone()),
            playlist: self.playlist.clone(),
        }
    }

    /// Tracks in play order
    #[must_use]
    pub fn playlist(&self) -> &[Track] {
        &self.playlist
    }

    /// Selected track
    #[must_use]
    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.playlist.get(i))
    }

    /// Playing right now?
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Volume, 0..=100
    #[must_use]
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Select a track by id
    ///
    /// # Errors
    ///
    /// [`ToolError::NotFound`] if no track has that id.
    pub fn select(&mut self, id: &str) -> Result<&Track, ToolError> {
        let index = self
            .playlist
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ToolError::NotFound(format!("track {id}")))?;
        self.current = Some(index);
        Ok(&self.playlist[index])
    }

    /// Clear the selection and stop
    pub fn deselect(&mut self) {
        self.current = None;
        self.playing = false;
    }

    /// Play if paused, pause if playing
    ///
    /// # Errors
    ///
    /// [`ToolError::NoTrackSelected`] with nothing selected.
    pub fn toggle_play(&mut self) -> Result<PlayState, ToolError> {
        if self.current_track().is_none() {
            return Err(ToolError::NoTrackSelected);
        }
        self.playing = !self.playing;
        Ok(if self.playing {
            PlayState::Playing
        } else {
            PlayState::Paused
        })
    }

    /// Stop without deselecting
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Advance, wrapping to the first track
    pub fn next(&mut self) -> Option<&Track> {
        if self.playlist.is_empty() {
            return None;
        }
        let index = self.current.map_or(0, |i| (i + 1) % self.playlist.len());
        self.current = Some(index);
        self.playlist.get(index)
    }

    /// Go back, wrapping to the last track
    pub fn prev(&mut self) -> Option<&Track> {
        let len = self.playlist.len();
        if len == 0 {
            return None;
        }
        let index = match self.current {
            Some(i) if i > 0 => i - 1,
            _ => len - 1,
        };
        self.current = Some(index);
        self.playlist.get(index)
    }

    /// Set the volume, clamped to 100
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
    }

    /// Speaker glyph for the current volume
    #[must_use]
    pub fn volume_icon(&self) -> &'static str {
        match self.volume {
            0 => "🔇",
            1..=33 => "🔈",
            34..=66 => "🔉",
            _ => "🔊",
        }
    }

    /// Shuffle the playlist, keeping the selected track selected
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let selected = self.current_track().map(|t| t.id.clone());
        self.playlist.shuffle(rng);
        self.current = selected.and_then(|id| self.playlist.iter().position(|t| t.id == id));
    }

    /// Append a track with a caller-chosen unique suffix for its id
    pub fn add_track(&mut self, title: &str, artist: &str, suffix: u64) -> &Track {
        let title = if title.trim().is_empty() { "Unknown Track" } else { title.trim() };
        let artist = if artist.trim().is_empty() { "Unknown Artist" } else { artist.trim() };
        self.playlist
            .push(Track::new(&format!("custom_{suffix}"), title, artist, "0:00"));
        let last = self.playlist.len() - 1;
        &self.playlist[last]
    }

    /// Remove a track by id
    ///
    /// # Errors
    ///
    /// [`ToolError::NotFound`] if no track has that id.
    pub fn remove_track(&mut self, id: &str) -> Result<Track, ToolError> {
        let index = self
            .playlist
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ToolError::NotFound(format!("track {id}")))?;
        let removed = self.playlist.remove(index);
        self.current = match self.current {
            _ if self.playlist.is_empty() => None,
            Some(i) if i == index => {
                self.playing = false;
                Some(i.min(self.playlist.len() - 1))
            }
            Some(i) if i > index => Some(i - 1),
            other => other,
        };
        Ok(removed)
    }

    /// The playlist as pretty JSON
    ///
    /// # Errors
    ///
    /// [`ToolError::ExportFailed`] if serialization fails.
    pub fn export(&self, now: NaiveDateTime) -> Result<String, ToolError> {
        serde_json::to_string_pretty(&PlaylistExport {
            version: EXPORT_VERSION,
            name: EXPORT_NAME,
            export_date: now,
            tracks: &self.playlist,
        })
        .map_err(export_failed)
    }

    /// Append the tracks of an exported playlist
    ///
    /// Tracks whose id is already in the playlist are skipped. Returns how
    /// many were added.
    ///
    /// # Errors
    ///
    /// [`ToolError::InvalidImport`] if `data` is not JSON, has no `tracks`
    /// array, or a track lacks a field or has a blank id or title. Nothing
    /// is added then.
    pub fn import(&mut self, data: &str) -> Result<usize, ToolError> {
        let import: PlaylistImport = serde_json::from_str(data).map_err(invalid_import)?;
        if import
            .tracks
            .iter()
            .any(|t| t.id.trim().is_empty() || t.title.trim().is_empty())
        {
            return Err(ToolError::InvalidImport("track without id or title".into()));
        }

        let before = self.playlist.len();
        for track in import.tracks {
            if !self.playlist.iter().any(|t| t.id == track.id) {
                self.playlist.push(track);
            }
        }
        Ok(self.playlist.len() - before)
    }

    /// Pick a title suiting `mood` and select it if it is in the playlist
    pub fn recommend<R: Rng + ?Sized>(&mut self, mood: Mood, rng: &mut R) -> &'static str {
        let picks: &[&'static str] = match mood {
            Mood::Happy => &["Neon Dreams", "Pixel Paradise"],
            Mood::Annoyed => &["8-bit Adventure"],
            Mood::Sleepy => &["Synthwave Sunset"],
        };
        let title = picks[rng.gen_range(0..picks.len())];
        if let Some(index) = self.playlist.iter().position(|t| t.title == title) {
            self.current = Some(index);
        }
        title
    }
}

/// Speech after selecting a track
#[must_use]
pub fn selected_line(track: &Track) -> String {
    format!("Selected \"{}\" by {}! Let's rock! 🎸", track.title, track.artist)
}

/// Speech when playback starts
#[must_use]
pub fn playing_line(track: &Track) -> String {
    format!("🎵 Now playing: \"{}\"! Turn up the volume! 🔊", track.title)
}

/// Speech after skipping forward
#[must_use]
pub fn next_line(track: &Track) -> String {
    format!("⏭️ Next track: \"{}\"! The beat goes on! 🎵", track.title)
}

/// Speech after skipping back
#[must_use]
pub fn prev_line(track: &Track) -> String {
    format!("⏮️ Previous track: \"{}\"! Going retro! 📼", track.title)
}

/// Speech when a simulated track runs out
#[must_use]
pub fn finished_line(track: &Track) -> String {
    format!("🎵 \"{}\" finished! That was a banger! 🎤", track.title)
}

/// Speech for a recommendation
#[must_use]
pub fn recommend_line(mood: Mood, title: &str) -> String {
    format!("Feeling {mood}? Try \"{title}\"! Perfect vibes! 🎵✨")
}

/// Speech after adding a track
#[must_use]
pub fn added_line(track: &Track) -> String {
    format!("Added \"{}\" to playlist! Collection growing! 📀", track.title)
}

/// Speech after removing a track
#[must_use]
pub fn removed_line(track: &Track) -> String {
    format!("Removed \"{}\" from playlist! 🗑️", track.title)
}

/// Speech after a successful import
#[must_use]
pub fn imported_line(count: usize) -> String {
    format!("Imported playlist with {count} tracks! Music library expanded! 🎵📚")
}

/// Speech for a rejected import
pub const IMPORT_FAILED_LINE: &str = "Import failed! That doesn't look like a valid playlist! 😵";

/// Occasional volume readout
#[must_use]
pub fn volume_line(player: &MusicPlayer) -> String {
    format!("{} Volume: {}%", player.volume_icon(), player.volume())
}
