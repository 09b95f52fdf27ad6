// timedtext.rs: Text form of timed lyrics, "[mm:ss]" and "[mm:ss.xx]" markers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lyrics::{Centiseconds, Lyrics};

// Exactly two digits per component; anything else is ordinary text.
static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d{2}):(\d{2})(?:\.(\d{2}))?\]").unwrap());

/// Parse timed text into [`Lyrics`].
///
/// The parser is total: malformed markers are kept as phrase text. Text
/// before the first marker becomes a phrase at time zero. A run of markers
/// with no text between them all attach to the next phrase, and markers at
/// the very end attach to a final empty phrase so their times survive a
/// round trip.
pub fn load(text: &str) -> Lyrics {
    let mut lyrics = Lyrics::new();
    let mut pending: Vec<Centiseconds> = Vec::new();
    let mut cursor = 0;
    let mut leading = true;
    for caps in MARKER.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let term = &text[cursor..whole.start()];
        if leading {
            if !term.is_empty() {
                lyrics.add_phrase(term, &[0]);
            }
            leading = false;
        } else if !term.is_empty() {
            lyrics.add_phrase(term, &pending);
            pending.clear();
        }
        let minutes = caps
            .get(1)
            .and_then(|m| m.as_str().parse::<Centiseconds>().ok())
            .unwrap_or(0);
        let seconds = caps
            .get(2)
            .and_then(|s| s.as_str().parse::<Centiseconds>().ok())
            .unwrap_or(0);
        let hundredths = caps
            .get(3)
            .and_then(|h| h.as_str().parse::<Centiseconds>().ok())
            .unwrap_or(0);
        pending.push(minutes * 6000 + seconds * 100 + hundredths);
        cursor = whole.end();
    }
    let tail = &text[cursor..];
    if leading {
        // No markers anywhere; the whole text is a single phrase at zero.
        if !tail.is_empty() {
            lyrics.add_phrase(tail, &[0]);
        }
    } else if !tail.is_empty() {
        lyrics.add_phrase(tail, &pending);
    } else if !pending.is_empty() {
        lyrics.add_phrase("", &pending);
    }
    lyrics
}

/// Render [`Lyrics`] back to timed text.
///
/// Each phrase is preceded by all of its markers in ascending time order.
/// With `frac` true markers keep hundredths, otherwise they round to the
/// nearest second. With `crlf` true newlines inside phrases become CRLF
/// pairs, as container tags store them.
pub fn dump(lyrics: &Lyrics, frac: bool, crlf: bool) -> String {
    let mut markers: Vec<Vec<String>> = vec![Vec::new(); lyrics.phrases().len()];
    for &(time, index) in lyrics.times() {
        markers[index].push(format_time(time, frac));
    }
    let mut out = String::new();
    for (index, phrase) in lyrics.phrases().iter().enumerate() {
        for marker in &markers[index] {
            out.push_str(marker);
        }
        if crlf {
            out.push_str(&phrase.replace('\n', "\r\n"));
        } else {
            out.push_str(phrase);
        }
    }
    out
}

fn format_time(time: Centiseconds, frac: bool) -> String {
    let minutes = time / 6000;
    let seconds = time / 100 % 60;
    let hundredths = time % 100;
    if frac {
        format!("[{minutes:02}:{seconds:02}.{hundredths:02}]")
    } else {
        // Round to the nearest second. The second field may reach 60; the
        // marker grammar accepts that back, so nothing is lost.
        let seconds = if hundredths >= 50 { seconds + 1 } else { seconds };
        format!("[{minutes:02}:{seconds:02}]")
    }
}
