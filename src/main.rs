use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use stream_guide_lib::assembly::{build_epg, DirectorySource};
use stream_guide_lib::config::GuideConfig;
use stream_guide_lib::reconciler::{decode_segments, reconcile_live_segments, reconcile_within};
use stream_guide_lib::records::{decode_records, parse_catalog, CatalogSummary, RawScheduleSegment};
use stream_guide_lib::{parse_duration, CatalogScheduler, GuideError};

#[derive(clap::Parser, Debug)]
#[command(version, about = "Build TV-guide schedules from streaming platform listings", long_about = None)]
struct Args {
    /// Config file (defaults to the per-user config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// IANA time zone whose midnight starts the guide day
    #[arg(long, global = true)]
    timezone: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Convert a duration token such as 1h2m3s into seconds
    Duration { token: String },

    /// Show per-video runtimes and the total runtime of a video listing
    Catalog {
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Loop a video listing into a 24 hour schedule
    Schedule {
        /// JSON array of video records
        #[arg(long)]
        catalog: PathBuf,

        /// Category id stamped on every slot
        #[arg(long)]
        category: String,

        /// Local date to fill (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Merge broadcaster schedules into one non-overlapping timeline
    Reconcile {
        /// JSON object mapping broadcaster id to its schedule segments
        #[arg(long)]
        segments: PathBuf,

        #[arg(long, requires = "till")]
        since: Option<DateTime<Utc>>,

        #[arg(long, requires = "since")]
        till: Option<DateTime<Utc>>,
    },

    /// Build today's guide for every configured channel
    Epg {
        /// Directory holding one <channel-uuid>.json video listing per channel
        #[arg(long)]
        catalogs: PathBuf,
    },
}

fn main() -> Result<(), anyhow::Error> {
    use clap::Parser;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stream_guide=info,stream_guide_lib=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(err) = run(args) {
        match err.downcast_ref::<GuideError>() {
            Some(guide_err) => eprintln!("{}", guide_err.diagnostics()),
            None => eprintln!("Error: {:#}", err),
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run(args: Args) -> Result<(), anyhow::Error> {
    let mut config = GuideConfig::load(args.config.as_deref())?;
    if let Some(tz) = args.timezone {
        config.set_timezone(tz);
    }

    match args.command {
        Command::Duration { token } => {
            let seconds = parse_duration(&token)?;
            println!("{}", seconds);
        }
        Command::Catalog { catalog } => {
            let items = parse_catalog(&read_json(&catalog)?)?;
            print_json(&CatalogSummary::from_items(&items, config.preview_artwork)?)?;
        }
        Command::Schedule {
            catalog,
            category,
            date,
        } => {
            let items = parse_catalog(&read_json(&catalog)?)?;
            let mut scheduler = CatalogScheduler::new(&config);
            tracing::info!(timezone = %scheduler.timezone(), videos = items.len(), "scheduling");
            let entries = match date {
                Some(date) => scheduler.synthesize_for_date(&items, &category, date)?,
                None => scheduler.synthesize(&items, &category)?,
            };
            print_json(&entries)?;
        }
        Command::Reconcile {
            segments,
            since,
            till,
        } => {
            let value = read_json(&segments)?;
            let by_broadcaster = value.as_object().ok_or_else(|| {
                GuideError::InvalidInput("segments file must be an object keyed by broadcaster id".into())
            })?;

            let mut all = Vec::new();
            for (broadcaster_id, raw) in by_broadcaster {
                let raw: Vec<RawScheduleSegment> = decode_records(raw, broadcaster_id)?;
                all.extend(decode_segments(broadcaster_id, raw)?);
            }

            let timeline = match (since, till) {
                (Some(since), Some(till)) => reconcile_within(all, since, till)?,
                _ => reconcile_live_segments(all)?,
            };
            print_json(&timeline)?;
        }
        Command::Epg { catalogs } => {
            let source = DirectorySource::new(catalogs);
            let mut scheduler = CatalogScheduler::new(&config);
            let epg = futures::executor::block_on(build_epg(&source, &config.channels, &mut scheduler));
            for skipped in &epg.skipped {
                eprintln!("skipped {}: {}", skipped.uuid, skipped.reason);
            }
            print_json(&epg.entries)?;
        }
    }
    Ok(())
}

fn read_json(path: &Path) -> Result<Value, anyhow::Error> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&content)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), anyhow::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
