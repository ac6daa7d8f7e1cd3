//! iptv-ingest: inspect M3U playlists and XMLTV guides from the command line

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use iptv_ingest::epg::{self, EpgParser};
use iptv_ingest::{fetch, m3u_parser, FetchConfig, Guide, Playlist, DEFAULT_UPCOMING};

#[derive(Parser, Debug)]
#[command(name = "iptv-ingest", version, about = "Parse M3U playlists and XMLTV guides")]
struct Cli {
    /// Override the configured User-Agent for HTTP sources
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Print JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a playlist (path or http(s) URL)
    Playlist { source: String },
    /// Parse an XMLTV guide (path or http(s) URL, .gz accepted)
    Guide { source: String },
    /// Show what is airing on a guide channel
    Now {
        source: String,
        channel: String,
        /// Number of upcoming programmes
        #[arg(long, default_value_t = DEFAULT_UPCOMING)]
        count: usize,
        /// Reference time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

fn load_playlist(source: &str, config: &FetchConfig) -> Result<Playlist> {
    let playlist = if fetch::is_remote(source) {
        iptv_ingest::fetch_and_parse_playlist(source, config)
    } else {
        m3u_parser::parse_file(source)
    };
    playlist.with_context(|| format!("loading playlist {}", source))
}

fn load_guide(source: &str, config: &FetchConfig) -> Result<Guide> {
    let guide = if fetch::is_remote(source) {
        iptv_ingest::fetch_and_parse_guide(source, config)
    } else {
        EpgParser::parse_file(source)
    };
    guide.with_context(|| format!("loading guide {}", source))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut config = FetchConfig::load();
    if let Some(user_agent) = &cli.user_agent {
        config = config.with_user_agent(user_agent);
    }

    match cli.command {
        Command::Playlist { source } => {
            let playlist = load_playlist(&source, &config)?;
            if cli.json {
                return print_json(&playlist);
            }
            println!("{} channels in {} groups", playlist.channels.len(), playlist.groups.len());
            if let Some(epg_url) = &playlist.epg_url {
                println!("EPG: {}", epg_url);
            }
            for group in &playlist.groups {
                println!("  {:<40} {:>6}", group.name, group.channel_count);
            }
        }
        Command::Guide { source } => {
            let guide = load_guide(&source, &config)?;
            if cli.json {
                return print_json(&guide);
            }
            println!(
                "{} channels, {} programmes, {} problems",
                guide.channels.len(),
                guide.programme_count(),
                guide.parse_error_count
            );
            for error in &guide.parse_errors {
                println!("  {}", error);
            }
        }
        Command::Now { source, channel, count, at } => {
            let guide = load_guide(&source, &config)?;
            let at = at.unwrap_or_else(Utc::now);
            let schedule = guide.schedule(&channel, at, count);
            if cli.json {
                return print_json(&schedule);
            }

            let name = guide.channel(&channel).map(|c| c.name.as_str()).unwrap_or(&channel);
            println!("{} at {}", name, epg::format_datetime(at));
            match schedule.current {
                Some(p) => println!(
                    "  NOW   {}-{}  {}",
                    epg::format_time(p.start),
                    epg::format_time(p.stop),
                    p.title
                ),
                None => println!("  NOW   (nothing scheduled)"),
            }
            for p in &schedule.upcoming {
                println!("  NEXT  {}-{}  {}", epg::format_time(p.start), epg::format_time(p.stop), p.title);
            }
        }
    }

    Ok(())
}
