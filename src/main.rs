// main.rs: command line host around the lyrics library.

use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;

use clap::{Parser, Subcommand};

use kashi::{
    clock, editor, lyrics3, timedtext, Lyrics, Metadata, PhraseTracker, PlayerClock, SteadyClock,
    TagError,
};

#[derive(Parser)]
#[command(author, version, about = "Embedded karaoke lyrics tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the lyrics embedded in a media file
    Show {
        /// Media file with an embedded lyrics tag
        file: PathBuf,
        /// Print bare phrases without timestamp markers
        #[arg(long)]
        plain: bool,
        /// Print whole-second markers instead of hundredths
        #[arg(long)]
        no_frac: bool,
    },
    /// Embed a timed-text file into a media file
    Embed {
        /// Media file to rewrite
        file: PathBuf,
        /// Timed-text lyrics file
        lyrics: PathBuf,
        /// Write only the whole-second field legacy readers understand
        #[arg(long)]
        no_high_precision: bool,
        /// Artist stored alongside the lyrics
        #[arg(long)]
        artist: Option<String>,
        /// Album stored alongside the lyrics
        #[arg(long)]
        album: Option<String>,
        /// Title stored alongside the lyrics
        #[arg(long)]
        title: Option<String>,
    },
    /// Replay a file's lyrics in real time, printing each phrase as it
    /// becomes current
    Follow {
        /// Media file with an embedded lyrics tag
        file: PathBuf,
        /// Start position in seconds
        #[arg(long, default_value = "0")]
        from: u64,
    },
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Show {
            file,
            plain,
            no_frac,
        } => show(&file, plain, no_frac),
        Commands::Embed {
            file,
            lyrics,
            no_high_precision,
            artist,
            album,
            title,
        } => embed(
            &file,
            &lyrics,
            no_high_precision,
            Metadata {
                artist,
                album,
                title,
                length: None,
            },
        ),
        Commands::Follow { file, from } => follow(&file, from),
    }
}

fn show(file: &Path, plain: bool, no_frac: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Some(lyrics) = embedded_lyrics(file)? else {
        println!("No lyrics in {}", file.display());
        return Ok(());
    };
    let meta = lyrics.metadata();
    if let Some(artist) = &meta.artist {
        println!("Artist: {artist}");
    }
    if let Some(album) = &meta.album {
        println!("Album: {album}");
    }
    if let Some(title) = &meta.title {
        println!("Title: {title}");
    }
    let text = if plain {
        lyrics.full_text()
    } else {
        timedtext::dump(&lyrics, !no_frac, false)
    };
    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn embed(
    file: &Path,
    lyrics_path: &Path,
    no_high_precision: bool,
    meta: Metadata,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let text = fs::read_to_string(lyrics_path)?;
    let mut lyrics = timedtext::load(&editor::strip_placeholders(&text));
    if lyrics.is_empty() {
        return Err("lyrics file has no phrases".into());
    }
    lyrics.set_metadata(meta);
    let body = lyrics3::dump(&lyrics, !no_high_precision)?;
    lyrics3::write(file, &body)?;
    println!(
        "Embedded {} phrases into {}",
        lyrics.phrases().len(),
        file.display()
    );
    Ok(())
}

fn follow(file: &Path, from: u64) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Some(lyrics) = embedded_lyrics(file)? else {
        println!("No lyrics in {}", file.display());
        return Ok(());
    };

    // Run the clock to the stored song length, or to the last phrase
    // boundary when the tag carries none.
    let last_ms = lyrics
        .times()
        .last()
        .map(|&(time, _)| time as u64 * 10)
        .unwrap_or(0);
    let length_ms = lyrics
        .metadata()
        .length
        .map(|seconds| seconds as u64 * 1000)
        .unwrap_or(last_ms)
        .max(last_ms);

    let mut player = SteadyClock::new(length_ms);
    player.seek(from * 1000);
    player.play();

    let mut tracker = PhraseTracker::new();
    loop {
        let now = player.tell();
        if let Some(index) = tracker.advance(&lyrics, now) {
            print!("{}", lyrics.phrases()[index]);
            io::stdout().flush()?;
        }
        match clock::next_wake(&lyrics, now) {
            Some(wait) if player.is_playing() => thread::sleep(wait),
            _ => break,
        }
    }
    println!();
    Ok(())
}

// A file without a lyrics tag is a normal outcome, not a failure.
fn embedded_lyrics(file: &Path) -> Result<Option<Lyrics>, Box<dyn Error + Send + Sync>> {
    let body = match lyrics3::read(file) {
        Ok(body) => body,
        Err(TagError::Format(reason)) => {
            tracing::debug!(path = %file.display(), %reason, "No embedded lyrics");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    match lyrics3::load(&body, true) {
        Ok(lyrics) => Ok(Some(lyrics)),
        Err(TagError::Format(reason)) => {
            tracing::debug!(path = %file.display(), %reason, "No embedded lyrics");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}
