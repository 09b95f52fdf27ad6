// lyrics3.rs: Lyrics3 v2.00 container tag at the tail of a media file.
//
// Layout, end of file upward: container body ("LYRICSBEGIN" plus fields),
// 6-digit decimal body size, "LYRICS200", 128-byte legacy footer starting
// with "TAG". Fields are a 3-byte id, a 5-digit decimal length, then data.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::lyrics::{Lyrics, Metadata};
use crate::timedtext;

pub const START_TAG: &[u8] = b"LYRICSBEGIN";
pub const END_TAG: &[u8] = b"LYRICS200";
pub const LEGACY_START: &[u8] = b"TAG";
pub const LEGACY_LENGTH: usize = 128;

const SIZE_LENGTH: usize = 6;
const FIELD_ID_LENGTH: usize = 3;
const FIELD_SIZE_LENGTH: usize = 5;
const MAX_BODY: usize = 1_000_000;
const MAX_FIELD: usize = 100_000;

// Bytes behind the container body: size digits, end marker, legacy block.
const TRAILER_LENGTH: u64 = (SIZE_LENGTH + END_TAG.len() + LEGACY_LENGTH) as u64;

#[derive(Error, Debug)]
pub enum TagError {
    #[error("Invalid Lyrics3 data: {0}")]
    Format(String),
    #[error("{field} too large: {len} bytes (limit {limit})")]
    Capacity {
        field: &'static str,
        len: usize,
        limit: usize,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Read the container body embedded in `path`.
///
/// Returns the body bytes including the `LYRICSBEGIN` prefix but not the
/// size field or end marker. A file without a valid trailer is a
/// [`TagError::Format`], the normal outcome for media without lyrics.
pub fn read(path: &Path) -> Result<Vec<u8>, TagError> {
    let mut file = File::open(path)?;
    let end = file.seek(SeekFrom::End(0))?;
    let (start, size) = locate_body(&mut file, end)?;
    file.seek(SeekFrom::Start(start))?;
    let mut body = vec![0u8; size];
    file.read_exact(&mut body)?;
    tracing::debug!(path = %path.display(), size, "Read embedded lyrics tag");
    Ok(body)
}

/// Embed `body` in `path`, replacing any existing container.
///
/// An existing legacy footer is preserved verbatim behind the new trailer;
/// a file without one gets a fresh zero-filled block. The replacement file
/// is assembled next to the original and swapped in with a rename, so a
/// failed write leaves the original bytes intact.
pub fn write(path: &Path, body: &[u8]) -> Result<(), TagError> {
    if body.len() >= MAX_BODY {
        return Err(TagError::Capacity {
            field: "body",
            len: body.len(),
            limit: MAX_BODY,
        });
    }

    let mut file = File::open(path)?;
    let end = file.seek(SeekFrom::End(0))?;

    // How much of the file to keep, and which legacy block to append.
    let (keep, legacy) = if end >= LEGACY_LENGTH as u64 {
        file.seek(SeekFrom::End(-(LEGACY_LENGTH as i64)))?;
        let mut tail = [0u8; LEGACY_LENGTH];
        file.read_exact(&mut tail)?;
        if tail.starts_with(LEGACY_START) {
            let keep = match locate_body(&mut file, end) {
                Ok((start, _)) => start,
                Err(TagError::Format(_)) => end - LEGACY_LENGTH as u64,
                Err(err) => return Err(err),
            };
            (keep, tail)
        } else {
            (end, fresh_legacy())
        }
    } else {
        (end, fresh_legacy())
    };

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".lyrics3.tmp");
    let tmp_path = PathBuf::from(tmp_name);

    if let Err(err) = write_replacement(&mut file, keep, body, &legacy, &tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    drop(file);
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    tracing::debug!(path = %path.display(), body = body.len(), keep, "Wrote embedded lyrics tag");
    Ok(())
}

/// Parse a container body into [`Lyrics`].
///
/// `KCL` carries hundredths precision and wins over `LYR` when
/// `prefer_high_precision` is set; either way the one that exists is used.
/// Album, artist and title fields merge into the result's metadata.
pub fn load(body: &[u8], prefer_high_precision: bool) -> Result<Lyrics, TagError> {
    let Some(mut rest) = body.strip_prefix(START_TAG) else {
        return Err(TagError::Format("missing LYRICSBEGIN prefix".into()));
    };

    let mut legacy_lyrics = None;
    let mut precise_lyrics = None;
    let mut metadata = Metadata::default();

    while !rest.is_empty() {
        if rest.len() < FIELD_ID_LENGTH + FIELD_SIZE_LENGTH {
            return Err(TagError::Format("truncated field header".into()));
        }
        let (id, after_id) = rest.split_at(FIELD_ID_LENGTH);
        let (len_digits, after_len) = after_id.split_at(FIELD_SIZE_LENGTH);
        let len = parse_decimal(len_digits).ok_or_else(|| {
            TagError::Format(format!(
                "bad length for {} field",
                String::from_utf8_lossy(id)
            ))
        })?;
        if after_len.len() < len {
            return Err(TagError::Format(format!(
                "truncated {} field",
                String::from_utf8_lossy(id)
            )));
        }
        let (data, after_data) = after_len.split_at(len);
        rest = after_data;

        match id {
            b"LYR" => legacy_lyrics = Some(timedtext::load(&decode_text(data))),
            b"KCL" => precise_lyrics = Some(timedtext::load(&decode_text(data))),
            b"EAL" => metadata.album = Some(decode_text(data)),
            b"EAR" => metadata.artist = Some(decode_text(data)),
            b"ETT" => metadata.title = Some(decode_text(data)),
            _ => {
                tracing::warn!(
                    id = %String::from_utf8_lossy(id),
                    len,
                    "Skipping unknown tag field"
                );
            }
        }
    }

    let mut lyrics = match (precise_lyrics, legacy_lyrics, prefer_high_precision) {
        (Some(precise), _, true) => precise,
        (_, Some(legacy), _) => legacy,
        (Some(precise), None, false) => precise,
        (None, None, _) => return Err(TagError::Format("no LYR or KCL field".into())),
    };
    lyrics.set_metadata(metadata);
    Ok(lyrics)
}

/// Serialize [`Lyrics`] to a container body.
///
/// Always emits `LYR` (whole-second markers, the form legacy readers
/// expect), a `KCL` field when `include_high_precision` is set, and one
/// metadata field per present string.
pub fn dump(lyrics: &Lyrics, include_high_precision: bool) -> Result<Vec<u8>, TagError> {
    let mut body = Vec::from(START_TAG);
    push_field(&mut body, "LYR", timedtext::dump(lyrics, false, true).as_bytes())?;
    if include_high_precision {
        push_field(&mut body, "KCL", timedtext::dump(lyrics, true, true).as_bytes())?;
    }
    let meta = lyrics.metadata();
    if let Some(album) = &meta.album {
        push_field(&mut body, "EAL", album.as_bytes())?;
    }
    if let Some(artist) = &meta.artist {
        push_field(&mut body, "EAR", artist.as_bytes())?;
    }
    if let Some(title) = &meta.title {
        push_field(&mut body, "ETT", title.as_bytes())?;
    }
    Ok(body)
}

// Validates the trailer against an open handle and returns the body's
// start offset and size. `write` reuses this to find the block it must
// replace.
fn locate_body(file: &mut File, end: u64) -> Result<(u64, usize), TagError> {
    if end < TRAILER_LENGTH {
        return Err(TagError::Format(format!(
            "file too short for a Lyrics3 trailer ({end} bytes)"
        )));
    }
    file.seek(SeekFrom::End(-(TRAILER_LENGTH as i64)))?;
    let mut trailer = [0u8; SIZE_LENGTH + END_TAG.len()];
    file.read_exact(&mut trailer)?;
    let size = parse_decimal(&trailer[..SIZE_LENGTH])
        .ok_or_else(|| TagError::Format("size field is not decimal".into()))?;
    if &trailer[SIZE_LENGTH..] != END_TAG {
        return Err(TagError::Format("end marker not found".into()));
    }
    let body_end = end - TRAILER_LENGTH;
    if size as u64 > body_end {
        return Err(TagError::Format(format!(
            "size field larger than file ({size} bytes)"
        )));
    }
    Ok((body_end - size as u64, size))
}

// Builds the replacement file: kept prefix, body, size, end marker,
// legacy block.
fn write_replacement(
    source: &mut File,
    keep: u64,
    body: &[u8],
    legacy: &[u8; LEGACY_LENGTH],
    tmp_path: &Path,
) -> Result<(), TagError> {
    let mut tmp = File::create(tmp_path)?;
    source.seek(SeekFrom::Start(0))?;
    io::copy(&mut source.take(keep), &mut tmp)?;
    tmp.write_all(body)?;
    tmp.write_all(decimal_field(body.len(), SIZE_LENGTH).as_bytes())?;
    tmp.write_all(END_TAG)?;
    tmp.write_all(legacy)?;
    tmp.sync_all()?;
    Ok(())
}

fn fresh_legacy() -> [u8; LEGACY_LENGTH] {
    let mut block = [0u8; LEGACY_LENGTH];
    block[..LEGACY_START.len()].copy_from_slice(LEGACY_START);
    block
}

// Fixed-width fields are plain ASCII digits; anything else is malformed.
fn parse_decimal(digits: &[u8]) -> Option<usize> {
    let text = std::str::from_utf8(digits).ok()?;
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn decimal_field(value: usize, width: usize) -> String {
    format!("{value:0width$}")
}

// Tag data predates any encoding declaration. Decode as UTF-8 when valid,
// otherwise treat the bytes as Latin-1.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn push_field(body: &mut Vec<u8>, id: &'static str, data: &[u8]) -> Result<(), TagError> {
    if data.len() >= MAX_FIELD {
        return Err(TagError::Capacity {
            field: id,
            len: data.len(),
            limit: MAX_FIELD,
        });
    }
    body.extend_from_slice(id.as_bytes());
    body.extend_from_slice(decimal_field(data.len(), FIELD_SIZE_LENGTH).as_bytes());
    body.extend_from_slice(data);
    Ok(())
}
