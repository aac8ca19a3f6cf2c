use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod config;
mod countdown;
mod error;
mod state;

use config::Config;
use countdown::{
    compute_countdown, next_target_year, world_countdowns, CountdownResult, CountdownTarget,
    CountdownTicker, SystemClock, SystemProjector,
};
use error::AppError;
use state::{Category, NewGuestMessage, NewPhoto, NewResolution, PartyState, SqliteStorage};

#[derive(Parser)]
#[command(name = "nye-party")]
#[command(
    version,
    about = "New Year's Eve countdown, guestbook, photo booth and resolutions"
)]
struct Cli {
    /// Database file (overrides NYE_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Time left until the new year
    Countdown {
        /// Year to count down to (defaults to next year)
        #[arg(long)]
        year: Option<i32>,
        /// IANA timezone, e.g. America/New_York (defaults to local time)
        #[arg(long)]
        tz: Option<String>,
        /// Keep ticking every second until midnight
        #[arg(long)]
        watch: bool,
    },
    /// Countdowns for several timezones at once
    World {
        #[arg(long)]
        year: Option<i32>,
        #[arg(required = true)]
        zones: Vec<String>,
    },
    Guestbook {
        #[command(subcommand)]
        action: GuestbookAction,
    },
    Photos {
        #[command(subcommand)]
        action: PhotoAction,
    },
    Resolutions {
        #[command(subcommand)]
        action: ResolutionAction,
    },
    Memes {
        #[command(subcommand)]
        action: MemeAction,
    },
}

#[derive(Subcommand)]
enum GuestbookAction {
    Add {
        #[arg(long)]
        author: String,
        #[arg(long, conflicts_with = "drawing", required_unless_present = "drawing")]
        text: Option<String>,
        /// Drawing as an image data URL or file path
        #[arg(long)]
        drawing: Option<String>,
    },
    List {
        #[arg(long)]
        author: Option<String>,
    },
    Delete {
        id: String,
    },
    Clear,
}

#[derive(Subcommand)]
enum PhotoAction {
    Add {
        #[arg(long)]
        image: String,
        #[arg(long)]
        filter: Option<String>,
    },
    /// Append a frame to a photo strip
    Frame {
        id: String,
        frame: String,
    },
    /// Show one photo with its frames
    Show {
        id: String,
    },
    List,
    Delete {
        id: String,
    },
    Clear,
}

#[derive(Subcommand)]
enum ResolutionAction {
    Add {
        #[arg(long)]
        text: String,
        #[arg(long, default_value_t = Category::Other)]
        category: Category,
    },
    List {
        #[arg(long)]
        category: Option<Category>,
    },
    Delete {
        id: String,
    },
    Clear,
}

#[derive(Subcommand)]
enum MemeAction {
    /// Favorite a meme, or unfavorite it if it already is one
    Toggle {
        id: String,
    },
    /// Tell whether a meme is a favorite
    Is {
        id: String,
    },
    List,
    Clear,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{}", report(&e));
        std::process::exit(1);
    }
}

/// User-facing line for a failed command
fn report(e: &anyhow::Error) -> String {
    match e.downcast_ref::<AppError>() {
        Some(AppError::SaveFailed { key, reason }) => {
            format!("⚠️  Could not save {key}: {reason}. Your change was not kept.")
        }
        _ => format!("❌ {e:#}"),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match cli.command {
        Command::Countdown { year, tz, watch } => {
            let zone = tz.or_else(|| config.timezone.clone());
            let year = resolve_year(year, &config, zone.as_deref())?;
            if watch {
                watch_countdown(year, zone, &config).await
            } else {
                let result =
                    compute_countdown(Utc::now(), year, zone.as_deref(), &SystemProjector)?;
                print_countdown(year, zone.as_deref(), &result);
                Ok(())
            }
        }
        Command::World { year, zones } => {
            let year = resolve_year(year, &config, None)?;
            for (zone, result) in world_countdowns(Utc::now(), year, &zones, &SystemProjector) {
                match result {
                    Ok(result) => println!("{zone:<32} {}", describe(&result)),
                    Err(e) => println!("{zone:<32} ⚠️  {e}"),
                }
            }
            Ok(())
        }
        Command::Guestbook { action } => {
            let mut party = open_party(cli.db, &config)?;
            run_guestbook(&mut party, action)
        }
        Command::Photos { action } => {
            let mut party = open_party(cli.db, &config)?;
            run_photos(&mut party, action)
        }
        Command::Resolutions { action } => {
            let mut party = open_party(cli.db, &config)?;
            run_resolutions(&mut party, action)
        }
        Command::Memes { action } => {
            let mut party = open_party(cli.db, &config)?;
            run_memes(&mut party, action)
        }
    }
}

fn resolve_year(year: Option<i32>, config: &Config, zone: Option<&str>) -> Result<i32> {
    if let Some(year) = year.or(config.target_year) {
        return Ok(year);
    }
    Ok(next_target_year(Utc::now(), zone, &SystemProjector)?)
}

fn open_party(db: Option<PathBuf>, config: &Config) -> Result<PartyState> {
    let storage = match db.or_else(|| config.db_path.clone()) {
        Some(path) => SqliteStorage::open(&path),
        None => SqliteStorage::open_default(),
    }
    .context("Failed to open the party database")?;

    info!("Using database {}", storage.path().display());
    PartyState::open(Rc::new(storage)).context("Failed to read the party database")
}

async fn watch_countdown(year: i32, zone: Option<String>, config: &Config) -> Result<()> {
    let ticker = CountdownTicker::spawn(
        CountdownTarget {
            year,
            zone: zone.clone(),
        },
        config.tick,
        Arc::new(SystemClock),
        Arc::new(SystemProjector),
    )?;
    let mut updates = ticker.subscribe();
    let label = zone.as_deref().unwrap_or("local time");

    loop {
        let result = *updates.borrow_and_update();
        print!("\r⏳ {year} in {label}: {}   ", result.display());
        std::io::stdout().flush()?;

        if result.is_target_reached {
            println!("\n🎆 Happy New Year {year}! 🎆");
            break;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("countdown ticker stopped unexpectedly");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    ticker.cancel();
    Ok(())
}

fn describe(result: &CountdownResult) -> String {
    if result.is_target_reached {
        "🎆 Happy New Year!".to_string()
    } else {
        format!(
            "{} days, {} hours, {} minutes, {} seconds",
            result.days, result.hours, result.minutes, result.seconds
        )
    }
}

fn print_countdown(year: i32, zone: Option<&str>, result: &CountdownResult) {
    let label = zone.unwrap_or("local time");
    println!("⏳ Countdown to {year} ({label}): {}", describe(result));
}

fn run_guestbook(party: &mut PartyState, action: GuestbookAction) -> Result<()> {
    match action {
        GuestbookAction::Add {
            author,
            text,
            drawing,
        } => {
            let draft = match (text, drawing) {
                (Some(text), _) => NewGuestMessage::text(author, text),
                (None, Some(drawing)) => NewGuestMessage::drawing(author, drawing),
                (None, None) => anyhow::bail!("either --text or --drawing is required"),
            };
            let message = party.guestbook.add(draft)?;
            println!("✍️  Added message {}", message.id);
        }
        GuestbookAction::List { author } => {
            let messages: Vec<_> = match author.as_deref() {
                Some(author) => party.guestbook.by_author(author).collect(),
                None => party.guestbook.messages().iter().collect(),
            };
            for message in messages {
                let body = message.content().unwrap_or("[drawing]");
                println!(
                    "{}  {}  {}: {}",
                    message.id,
                    message.created_at.format("%Y-%m-%d %H:%M"),
                    message.author,
                    body
                );
            }
        }
        GuestbookAction::Delete { id } => report_delete(party.guestbook.delete(&id)?, &id),
        GuestbookAction::Clear => {
            party.guestbook.clear()?;
            println!("🧹 Guestbook cleared");
        }
    }
    Ok(())
}

fn run_photos(party: &mut PartyState, action: PhotoAction) -> Result<()> {
    match action {
        PhotoAction::Add { image, filter } => {
            let photo = party.photos.add(NewPhoto { image, filter })?;
            println!("📸 Added photo {}", photo.id);
        }
        PhotoAction::Frame { id, frame } => {
            if party.photos.append_frame(&id, frame)? {
                println!("📸 Added frame to {id}");
            } else {
                println!("No photo with id {id}");
            }
        }
        PhotoAction::Show { id } => match party.photos.get(&id) {
            Some(photo) => {
                println!("{}  {}", photo.id, photo.created_at.format("%Y-%m-%d %H:%M"));
                println!("filter: {}", photo.filter.as_deref().unwrap_or("none"));
                println!("frame 1: {}", photo.image);
                for (index, frame) in photo.frames.iter().enumerate() {
                    println!("frame {}: {frame}", index + 2);
                }
            }
            None => println!("No photo with id {id}"),
        },
        PhotoAction::List => {
            for photo in party.photos.photos() {
                println!(
                    "{}  {}  filter={}  frames={}",
                    photo.id,
                    photo.created_at.format("%Y-%m-%d %H:%M"),
                    photo.filter.as_deref().unwrap_or("none"),
                    photo.frames.len() + 1
                );
            }
        }
        PhotoAction::Delete { id } => report_delete(party.photos.delete(&id)?, &id),
        PhotoAction::Clear => {
            party.photos.clear()?;
            println!("🧹 Photos cleared");
        }
    }
    Ok(())
}

fn run_resolutions(party: &mut PartyState, action: ResolutionAction) -> Result<()> {
    match action {
        ResolutionAction::Add { text, category } => {
            let resolution = party.resolutions.add(NewResolution { text, category })?;
            println!("🎯 Added resolution {}", resolution.id);
        }
        ResolutionAction::List { category } => {
            let resolutions: Vec<_> = match category {
                Some(category) => party.resolutions.by_category(category).collect(),
                None => party.resolutions.resolutions().iter().collect(),
            };
            for resolution in resolutions {
                println!(
                    "{}  [{}]  {}",
                    resolution.id, resolution.category, resolution.text
                );
            }
        }
        ResolutionAction::Delete { id } => report_delete(party.resolutions.delete(&id)?, &id),
        ResolutionAction::Clear => {
            party.resolutions.clear()?;
            println!("🧹 Resolutions cleared");
        }
    }
    Ok(())
}

fn run_memes(party: &mut PartyState, action: MemeAction) -> Result<()> {
    match action {
        MemeAction::Toggle { id } => {
            if party.memes.toggle_favorite(&id)? {
                println!("⭐ {id} added to favorites");
            } else {
                println!("☆ {id} removed from favorites");
            }
        }
        MemeAction::Is { id } => {
            if party.memes.is_favorite(&id) {
                println!("⭐ {id} is a favorite");
            } else {
                println!("☆ {id} is not a favorite");
            }
        }
        MemeAction::List => {
            let favorites = party.memes.favorites();
            if favorites.is_empty() {
                println!("No favorite memes yet");
            }
            for id in favorites.ids() {
                println!("{id}");
            }
        }
        MemeAction::Clear => {
            party.memes.clear()?;
            println!("🧹 Favorites cleared");
        }
    }
    Ok(())
}

fn report_delete(removed: bool, id: &str) {
    if removed {
        println!("🗑️  Deleted {id}");
    } else {
        println!("Nothing to delete for {id}");
    }
}
