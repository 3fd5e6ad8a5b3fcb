//! Interactive shell
//!
//! Applies parsed commands to the controller and the playlist, keeping the
//! two in step through the controller's playlist hooks.

use crate::commands::{Command, HELP};
use crate::error::{CliError, Result};
use crate::probe::TrackLoader;
use aural_playback::{
    IndexedTrack, PlaybackController, PlaybackState, Playlist, SequenceModes, TrackCatalog,
};
use std::fmt::Write;
use std::sync::Arc;

/// What the shell asks of its driver after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Print(String),
    Quit,
}

pub struct Shell {
    controller: PlaybackController,
    playlist: Arc<Playlist>,
    loader: TrackLoader,
}

fn describe(track: &IndexedTrack) -> String {
    format!(
        "[{}] {} ({:.0}s)",
        track.index,
        track.track.title,
        track.track.duration_secs()
    )
}

fn skipped(track: Option<IndexedTrack>) -> String {
    match track {
        Some(track) => format!("Playing {}", describe(&track)),
        None => "No track in that direction".to_string(),
    }
}

fn describe_modes(modes: SequenceModes) -> String {
    format!("repeat {:?}, shuffle {:?}", modes.repeat, modes.shuffle).to_lowercase()
}

impl Shell {
    pub fn new(controller: PlaybackController, playlist: Arc<Playlist>, loader: TrackLoader) -> Self {
        Self {
            controller,
            playlist,
            loader,
        }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    /// Apply queued render-engine events
    pub fn tick(&mut self) {
        self.controller.process_render_events();
    }

    pub fn execute(&mut self, command: Command) -> Result<Reply> {
        let text = match command {
            Command::Play(index) => describe(&self.controller.play(index)?),
            Command::Toggle => {
                let outcome = self.controller.toggle_play_pause()?;
                match (outcome.state, outcome.playing_track) {
                    (PlaybackState::NoTrack, _) => "Nothing to play".to_string(),
                    (PlaybackState::Paused, _) => "Paused".to_string(),
                    (PlaybackState::Playing, Some(track)) => {
                        format!("Playing {}", describe(&track))
                    }
                    (PlaybackState::Playing, None) => "Playing".to_string(),
                }
            }
            Command::Stop => {
                self.controller.stop();
                "Stopped".to_string()
            }
            Command::Next => {
                let track = self.controller.next_track()?;
                skipped(track)
            }
            Command::Previous => {
                let track = self.controller.previous_track()?;
                skipped(track)
            }
            Command::SeekForward => {
                self.controller.seek_forward();
                self.position()
            }
            Command::SeekBackward => {
                self.controller.seek_backward();
                self.position()
            }
            Command::Seek(percentage) => {
                self.controller.seek_to_percentage(percentage);
                self.position()
            }
            Command::Position => self.position(),
            Command::Repeat => describe_modes(self.controller.toggle_repeat_mode()),
            Command::Shuffle => describe_modes(self.controller.toggle_shuffle_mode()),
            Command::Add(path) => {
                let track = self.loader.load(&path);
                let title = track.title.clone();
                self.playlist.add(track);
                self.controller.track_added();
                format!("Added [{}] {}", self.playlist.size() - 1, title)
            }
            Command::Remove(index) => {
                let (track, change) = self
                    .playlist
                    .remove(index)
                    .ok_or(CliError::NoSuchTrack(index))?;
                self.controller.playlist_changed(change);
                format!("Removed {}", track.title)
            }
            Command::Move(from, to) => {
                let change = self
                    .playlist
                    .reorder(from, to)
                    .ok_or(CliError::NoSuchTrack(from.max(to)))?;
                self.controller.playlist_changed(change);
                format!("Moved {from} to {to}")
            }
            Command::Sort => {
                let playing = self.controller.playing_track().map(|t| t.index);
                let change = self.playlist.sort_by_title(playing);
                self.controller.playlist_changed(change);
                self.listing()
            }
            Command::Clear => {
                self.controller.stop();
                let change = self.playlist.clear();
                self.controller.playlist_changed(change);
                "Playlist cleared".to_string()
            }
            Command::List => self.listing(),
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Reply::Quit),
        };

        Ok(Reply::Print(text))
    }

    fn position(&self) -> String {
        let position = self.controller.seek_position();
        match self.controller.playing_track() {
            Some(track) => format!(
                "{:.1}s / {:.0}s ({:.0}%) {}",
                position.seconds,
                track.track.duration_secs(),
                position.percentage,
                track.track.title
            ),
            None => "Not playing".to_string(),
        }
    }

    fn listing(&self) -> String {
        let playing = self.controller.playing_track().map(|t| t.index);
        let mut out = String::new();
        for (index, track) in self.playlist.tracks().iter().enumerate() {
            let marker = if Some(index) == playing { '>' } else { ' ' };
            let _ = writeln!(out, "{marker} {}", describe(&IndexedTrack::new(index, track.clone())));
        }
        let _ = write!(out, "({})", describe_modes(self.controller.sequence_modes()));
        out
    }

    /// Stop playback and release the controller's workers
    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }
}
