// lib.rs - timed-lyrics subsystem: model, codecs, and playback glue

pub mod clock;
pub mod editor;
pub mod lyrics;
pub mod lyrics3;
pub mod timedtext;

pub use clock::{next_wake, PhraseTracker, PlayerClock, SteadyClock};
pub use lyrics::{Centiseconds, Current, Lyrics, Metadata};
pub use lyrics3::TagError;
