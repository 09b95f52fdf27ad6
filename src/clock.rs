// clock.rs: Playback-side glue between a host player and the lyrics model.

use std::time::{Duration, Instant};

use crate::lyrics::{Centiseconds, Lyrics};

/// What the lyrics subsystem needs from a host player. The host owns
/// playback and drives the tracker again on play/pause/stop transitions.
pub trait PlayerClock {
    /// Current playback position in milliseconds.
    fn tell(&self) -> u64;
    /// Total length in milliseconds.
    fn length(&self) -> u64;
    fn is_playing(&self) -> bool;
}

/// Time until the next phrase boundary, `None` when no boundary lies
/// ahead. The host re-arms its own timer with the returned duration;
/// nothing in the core sleeps.
pub fn next_wake(lyrics: &Lyrics, now_ms: u64) -> Option<Duration> {
    let now = (now_ms / 10) as Centiseconds;
    let end = lyrics.current(now).end?;
    Some(Duration::from_millis((end as u64 * 10).saturating_sub(now_ms)))
}

/// Remembers which phrase is highlighted and reports changes.
#[derive(Debug, Default)]
pub struct PhraseTracker {
    index: Option<usize>,
}

impl PhraseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the current phrase for `now_ms`. Returns the new index
    /// only when a different phrase became current, so a driving loop can
    /// render exactly on changes.
    pub fn advance(&mut self, lyrics: &Lyrics, now_ms: u64) -> Option<usize> {
        let index = lyrics.current((now_ms / 10) as Centiseconds).phrase;
        if index != self.index {
            self.index = index;
            index
        } else {
            None
        }
    }

    pub fn current(&self) -> Option<usize> {
        self.index
    }
}

/// A self-contained [`PlayerClock`] advancing on the process monotonic
/// clock. Hosts with a real audio engine implement the trait over it;
/// this one serves the bundled binary's follow mode and tests.
#[derive(Debug)]
pub struct SteadyClock {
    /// Position in milliseconds at the last play, pause or seek.
    anchor_ms: u64,
    /// Monotonic instant matching `anchor_ms` while playing.
    anchor_instant: Option<Instant>,
    length_ms: u64,
}

impl SteadyClock {
    pub fn new(length_ms: u64) -> Self {
        Self {
            anchor_ms: 0,
            anchor_instant: None,
            length_ms,
        }
    }

    pub fn play(&mut self) {
        if self.anchor_instant.is_none() {
            self.anchor_instant = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        self.anchor_ms = self.tell();
        self.anchor_instant = None;
    }

    pub fn seek(&mut self, position_ms: u64) {
        self.anchor_ms = position_ms.min(self.length_ms);
        if self.anchor_instant.is_some() {
            self.anchor_instant = Some(Instant::now());
        }
    }
}

impl PlayerClock for SteadyClock {
    fn tell(&self) -> u64 {
        let elapsed = self
            .anchor_instant
            .map(|since| since.elapsed().as_millis() as u64)
            .unwrap_or(0);
        (self.anchor_ms + elapsed).min(self.length_ms)
    }

    fn length(&self) -> u64 {
        self.length_ms
    }

    fn is_playing(&self) -> bool {
        self.anchor_instant.is_some() && self.tell() < self.length_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_phrases() -> Lyrics {
        let mut lyrics = Lyrics::new();
        lyrics.add_phrase("first\n", &[0]);
        lyrics.add_phrase("second\n", &[500]);
        lyrics.add_phrase("third\n", &[1200]);
        lyrics
    }

    #[test]
    fn next_wake_targets_the_next_boundary() {
        let lyrics = three_phrases();
        assert_eq!(next_wake(&lyrics, 0), Some(Duration::from_millis(5_000)));
        assert_eq!(next_wake(&lyrics, 4_990), Some(Duration::from_millis(10)));
        // Inside the open-ended last phrase nothing lies ahead.
        assert_eq!(next_wake(&lyrics, 13_000), None);
    }

    #[test]
    fn next_wake_before_the_first_phrase() {
        let mut lyrics = Lyrics::new();
        lyrics.add_phrase("late", &[100]);
        assert_eq!(next_wake(&lyrics, 0), Some(Duration::from_millis(1_000)));
    }

    #[test]
    fn next_wake_on_empty_lyrics() {
        assert_eq!(next_wake(&Lyrics::new(), 0), None);
    }

    #[test]
    fn tracker_reports_only_changes() {
        let lyrics = three_phrases();
        let mut tracker = PhraseTracker::new();
        assert_eq!(tracker.advance(&lyrics, 0), Some(0));
        assert_eq!(tracker.advance(&lyrics, 10), None);
        assert_eq!(tracker.advance(&lyrics, 5_000), Some(1));
        assert_eq!(tracker.advance(&lyrics, 5_010), None);
        assert_eq!(tracker.advance(&lyrics, 12_000), Some(2));
        assert_eq!(tracker.current(), Some(2));
    }

    #[test]
    fn tracker_is_silent_before_the_first_phrase() {
        let mut lyrics = Lyrics::new();
        lyrics.add_phrase("late", &[100]);
        let mut tracker = PhraseTracker::new();
        assert_eq!(tracker.advance(&lyrics, 0), None);
        assert_eq!(tracker.current(), None);
        assert_eq!(tracker.advance(&lyrics, 1_000), Some(0));
    }

    #[test]
    fn steady_clock_holds_position_while_paused() {
        let mut clock = SteadyClock::new(214_000);
        clock.seek(5_000);
        assert_eq!(clock.tell(), 5_000);
        assert!(!clock.is_playing());
        clock.play();
        assert!(clock.is_playing());
        clock.pause();
        let held = clock.tell();
        assert_eq!(clock.tell(), held);
        assert!(held >= 5_000);
    }

    #[test]
    fn steady_clock_clamps_to_length() {
        let mut clock = SteadyClock::new(1_000);
        clock.seek(5_000);
        assert_eq!(clock.tell(), 1_000);
        assert!(!clock.is_playing());
    }
}
