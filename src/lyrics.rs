// lyrics.rs: In-memory karaoke lyrics model and its time index.

use std::ops::Range;

/// Timestamps are whole hundredths of a second from song start.
pub type Centiseconds = u32;

/// Song metadata carried alongside the lyrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    /// Song length in whole seconds.
    pub length: Option<u32>,
}

impl Metadata {
    /// Merge `update` into `self`: present fields overwrite, absent fields
    /// keep their existing value.
    pub fn merge(&mut self, update: Metadata) {
        if update.artist.is_some() {
            self.artist = update.artist;
        }
        if update.album.is_some() {
            self.album = update.album;
        }
        if update.title.is_some() {
            self.title = update.title;
        }
        if update.length.is_some() {
            self.length = update.length;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.artist.is_none() && self.album.is_none() && self.title.is_none() && self.length.is_none()
    }
}

/// Result of a point query against the time index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Current {
    /// Index of the phrase being sung, `None` before the first timestamp.
    pub phrase: Option<usize>,
    /// Time this phrase occurrence started.
    pub start: Option<Centiseconds>,
    /// Time the next occurrence starts, `None` when the current one is
    /// open-ended (or, before the first timestamp, when there are no
    /// timestamps at all).
    pub end: Option<Centiseconds>,
}

/// Ordered phrases plus a sorted `(time, phrase index)` list answering
/// "what is sung at time T".
///
/// A phrase may recur at several times (a repeated chorus line), and several
/// phrases may share a time value. Phrases are appended, never edited in
/// place; a fresh `Lyrics` is built whenever the text form is re-parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lyrics {
    phrases: Vec<String>,
    // Sorted by (time, phrase index). Indices only grow, so entries sharing
    // a time stay in insertion order.
    times: Vec<(Centiseconds, usize)>,
    metadata: Metadata,
}

impl Lyrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a phrase sung at each of the given times.
    ///
    /// CRLF line endings inside `text` are normalized to `\n`. `times` must
    /// not be empty: a phrase without a timestamp would be unreachable from
    /// any playback position.
    pub fn add_phrase(&mut self, text: &str, times: &[Centiseconds]) {
        debug_assert!(!times.is_empty(), "phrase needs at least one timestamp");
        let index = self.phrases.len();
        self.phrases.push(text.replace("\r\n", "\n"));
        for &time in times {
            let at = self.times.partition_point(|&entry| entry <= (time, index));
            self.times.insert(at, (time, index));
        }
    }

    /// The phrase being sung at `time`.
    ///
    /// The last entry at or before `time` wins; when several entries share
    /// the query time, the last of them wins. Before the first timestamp the
    /// phrase is `None` and `end` is that first timestamp, so callers still
    /// learn when the lyrics begin.
    pub fn current(&self, time: Centiseconds) -> Current {
        let split = self.times.partition_point(|&(t, _)| t <= time);
        if split == 0 {
            return Current {
                phrase: None,
                start: None,
                end: self.times.first().map(|&(t, _)| t),
            };
        }
        let (start, phrase) = self.times[split - 1];
        Current {
            phrase: Some(phrase),
            start: Some(start),
            end: self.times.get(split).map(|&(t, _)| t),
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Timing entries, sorted ascending by `(time, phrase index)`.
    pub fn times(&self) -> &[(Centiseconds, usize)] {
        &self.times
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Merge metadata into the song; see [`Metadata::merge`].
    pub fn set_metadata(&mut self, update: Metadata) {
        self.metadata.merge(update);
    }

    /// All phrases joined in song order, as a host text widget displays them.
    pub fn full_text(&self) -> String {
        self.phrases.concat()
    }

    /// Byte range of one phrase inside `full_text()`, for host-side
    /// highlighting.
    pub fn phrase_span(&self, index: usize) -> Option<Range<usize>> {
        if index >= self.phrases.len() {
            return None;
        }
        let start: usize = self.phrases[..index].iter().map(String::len).sum();
        Some(start..start + self.phrases[index].len())
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
    fn current_walks_the_index() {
        let lyrics = three_phrases();
        assert_eq!(
            lyrics.current(0),
            Current { phrase: Some(0), start: Some(0), end: Some(500) }
        );
        assert_eq!(
            lyrics.current(499),
            Current { phrase: Some(0), start: Some(0), end: Some(500) }
        );
        assert_eq!(
            lyrics.current(500),
            Current { phrase: Some(1), start: Some(500), end: Some(1200) }
        );
        assert_eq!(
            lyrics.current(1300),
            Current { phrase: Some(2), start: Some(1200), end: None }
        );
    }

    #[test]
    fn current_before_first_timestamp() {
        let mut lyrics = Lyrics::new();
        lyrics.add_phrase("late start", &[100]);
        assert_eq!(
            lyrics.current(50),
            Current { phrase: None, start: None, end: Some(100) }
        );
    }

    #[test]
    fn current_on_empty_lyrics() {
        let lyrics = Lyrics::new();
        assert_eq!(lyrics.current(0), Current { phrase: None, start: None, end: None });
    }

    #[test]
    fn ties_resolve_to_the_last_entry() {
        let mut lyrics = Lyrics::new();
        lyrics.add_phrase("a", &[100]);
        lyrics.add_phrase("b", &[100]);
        // Both entries are <= the query; the later phrase wins.
        let current = lyrics.current(100);
        assert_eq!(current.phrase, Some(1));
        assert_eq!(current.start, Some(100));
        assert_eq!(current.end, None);
        // Before the shared time, neither phrase is current yet.
        assert_eq!(lyrics.current(99).phrase, None);
    }

    #[test]
    fn times_stay_sorted_regardless_of_insertion_order() {
        let mut lyrics = Lyrics::new();
        lyrics.add_phrase("chorus", &[900, 300]);
        lyrics.add_phrase("verse", &[600]);
        assert_eq!(lyrics.times(), &[(300, 0), (600, 1), (900, 0)]);
    }

    #[test]
    fn add_phrase_normalizes_crlf() {
        let mut lyrics = Lyrics::new();
        lyrics.add_phrase("line one\r\nline two\r\n", &[0]);
        assert_eq!(lyrics.phrases()[0], "line one\nline two\n");
    }

    #[test]
    fn phrase_span_addresses_full_text() {
        let lyrics = three_phrases();
        let text = lyrics.full_text();
        let span = lyrics.phrase_span(1).unwrap();
        assert_eq!(&text[span], "second\n");
        assert_eq!(lyrics.phrase_span(3), None);
    }

    #[test]
    fn metadata_merge_keeps_absent_fields() {
        let mut lyrics = Lyrics::new();
        lyrics.set_metadata(Metadata {
            artist: Some("someone".into()),
            length: Some(214),
            ..Metadata::default()
        });
        lyrics.set_metadata(Metadata {
            title: Some("a song".into()),
            ..Metadata::default()
        });
        let meta = lyrics.metadata();
        assert_eq!(meta.artist.as_deref(), Some("someone"));
        assert_eq!(meta.title.as_deref(), Some("a song"));
        assert_eq!(meta.length, Some(214));
        assert!(meta.album.is_none());
    }
}
