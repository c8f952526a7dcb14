// src/main.rs
//
// seriesguide-stats - command line front end of the library

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;

use seriesguide_stats::application::commands::*;
use seriesguide_stats::application::dto::*;
use seriesguide_stats::application::state::AppState;
use seriesguide_stats::config::AppConfig;
use seriesguide_stats::db::{create_connection_pool, initialize_database};

fn init_logger() {
    Builder::new()
        .target(Target::Stderr)
        .filter_level(LevelFilter::Warn)
        .filter_module("seriesguide_stats", LevelFilter::Info)
        .init();
}

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Parses `SEASONxNUMBER[:STATE]`, e.g. `1x3` or `0x1:watched`
fn parse_episode(s: &str) -> Result<NewEpisodeDto, String> {
    let (numbers, state) = match s.split_once(':') {
        Some((numbers, state)) => (numbers, Some(state.to_string())),
        None => (s, None),
    };
    let (season, number) = numbers
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected SEASONxNUMBER, got '{}'", s))?;

    Ok(NewEpisodeDto {
        season: season
            .trim()
            .parse()
            .map_err(|e| format!("bad season in '{}': {}", s, e))?,
        number: number
            .trim()
            .parse()
            .map_err(|e| format!("bad episode number in '{}': {}", s, e))?,
        title: None,
        state,
    })
}

#[derive(Parser, Debug)]
#[command(name = "seriesguide-stats", version, about)]
struct CliArgs {
    /// Database file, overrides config and SERIESGUIDE_DB
    #[clap(long, global = true, value_parser = parse_path)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Computes statistics, printing progress while runtimes are summed.
    Stats {
        /// Leave season 0 out of episode counts and watched runtime.
        #[clap(long, conflicts_with = "include_specials")]
        exclude_specials: bool,

        /// Count season 0 episodes even if the config excludes them.
        #[clap(long)]
        include_specials: bool,

        /// Print one JSON object per event.
        #[clap(long)]
        json: bool,
    },

    /// Shows the statistics of the last successful run.
    Cached {
        #[clap(long)]
        json: bool,
    },

    /// Adds a show, with episodes given as `--episode 1x1:watched`.
    AddShow {
        title: String,

        /// continuing, ended or unknown
        #[clap(long, default_value = "unknown")]
        status: String,

        /// Runtime of one episode in minutes.
        #[clap(long, default_value_t = 0)]
        runtime: u32,

        #[clap(long = "episode", value_parser = parse_episode)]
        episodes: Vec<NewEpisodeDto>,
    },

    /// Adds a movie by its TMDb id.
    AddMovie {
        tmdb_id: i64,
        title: String,

        /// Runtime in minutes.
        #[clap(long, default_value_t = 0)]
        runtime: u32,

        /// Put the movie on the watchlist.
        #[clap(long)]
        watchlist: bool,
    },

    /// Sets the watch state of an episode.
    Watch {
        episode_id: String,

        /// unwatched, watched or skipped
        #[clap(long, default_value = "watched")]
        state: String,
    },

    /// Puts a movie on the watchlist, or takes it off with --remove.
    Watchlist {
        movie_id: i64,

        #[clap(long)]
        remove: bool,
    },

    /// Lists all shows.
    Shows,

    /// Lists the episodes of a show.
    Episodes { show_id: String },

    /// Lists all movies.
    Movies,

    /// Prints the settings, saving any that are given.
    Config {
        /// Count season 0 episodes by default.
        #[clap(long)]
        include_specials: Option<bool>,

        /// Minimum spacing of progress updates in milliseconds.
        #[clap(long)]
        publish_interval_ms: Option<u64>,
    },
}

fn print_stats(stats: &StatsDto) {
    let count = |value: Option<u64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());

    println!(
        "Shows:    {} ({} continuing, {} with next episode)",
        count(stats.shows),
        count(stats.shows_continuing),
        count(stats.shows_with_next_episode)
    );
    println!(
        "Episodes: {} ({} watched, {})",
        count(stats.episodes),
        count(stats.episodes_watched),
        stats.episodes_watched_runtime
    );
    println!(
        "Movies:   {} ({} on watchlist, {})",
        count(stats.movies),
        count(stats.movies_watchlist),
        stats.movies_watchlist_runtime.as_deref().unwrap_or("-")
    );
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Updates the config file; environment overrides are not written back
fn configure(include_specials: Option<bool>, publish_interval_ms: Option<u64>) -> Result<()> {
    let mut config = AppConfig::load_file().context("Failed to load configuration")?;

    if include_specials.is_some() || publish_interval_ms.is_some() {
        if let Some(include) = include_specials {
            config.include_specials = include;
        }
        if let Some(interval_ms) = publish_interval_ms {
            config.set_publish_interval_ms(interval_ms);
        }
        config.save().context("Failed to save configuration")?;
    }

    print_json(&config)
}

async fn run(command: Command, state: &AppState) -> Result<()> {
    match command {
        Command::Stats {
            exclude_specials,
            include_specials,
            json,
        } => {
            let exclude = match (exclude_specials, include_specials) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };

            let terminal = get_statistics(state, exclude, |event| {
                if json {
                    if let Ok(line) = serde_json::to_string(event) {
                        println!("{}", line);
                    }
                } else {
                    println!(
                        "... watched runtime so far: {}",
                        event.stats.episodes_watched_runtime
                    );
                }
            })
            .await?;

            if json {
                print_json(&terminal)?;
            } else {
                print_stats(&terminal.stats);
            }
            if !terminal.was_successful {
                bail!(
                    "statistics run failed: {}",
                    terminal.failure.as_deref().unwrap_or("unknown")
                );
            }
        }

        Command::Cached { json } => match get_cached_statistics(state).await? {
            Some(cached) if json => print_json(&cached)?,
            Some(cached) => {
                println!(
                    "Generated {}{}",
                    cached.generated_at,
                    if cached.stale { " (library changed since)" } else { "" }
                );
                print_stats(&cached.stats);
            }
            None => println!("No statistics computed yet, run `stats` first."),
        },

        Command::AddShow {
            title,
            status,
            runtime,
            episodes,
        } => {
            let id = add_show(
                AddShowDto {
                    title,
                    status,
                    runtime_minutes: runtime,
                    episodes,
                },
                state,
            )
            .await?;
            println!("{}", id);
        }

        Command::AddMovie {
            tmdb_id,
            title,
            runtime,
            watchlist,
        } => {
            let id = add_movie(
                AddMovieDto {
                    tmdb_id,
                    title,
                    runtime_minutes: runtime,
                    in_watchlist: watchlist,
                },
                state,
            )
            .await?;
            println!("{}", id);
        }

        Command::Watch {
            episode_id,
            state: episode_state,
        } => {
            set_episode_state(&episode_id, &episode_state, state).await?;
        }

        Command::Watchlist { movie_id, remove } => {
            set_movie_watchlist(movie_id, !remove, state).await?;
        }

        Command::Shows => {
            for show in list_shows(state).await? {
                println!(
                    "{}  {}  [{}, {}m]",
                    show.id, show.title, show.status, show.runtime_minutes
                );
            }
        }

        Command::Episodes { show_id } => {
            for episode in list_episodes(&show_id, state).await? {
                println!(
                    "{}  {}x{:02}  {}",
                    episode.id, episode.season, episode.number, episode.state
                );
            }
        }

        Command::Config { .. } => bail!("config is handled before the database is opened"),

        Command::Movies => {
            for movie in list_movies(state).await? {
                println!(
                    "{}  {}  [{}m{}]",
                    movie.id,
                    movie.title,
                    movie.runtime_minutes,
                    if movie.in_watchlist { ", watchlist" } else { "" }
                );
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        init_logger();
    } else {
        env_logger::init();
    }

    let cli_args = CliArgs::parse();
    if let Command::Config {
        include_specials,
        publish_interval_ms,
    } = cli_args.command
    {
        return configure(include_specials, publish_interval_ms);
    }

    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if let Some(db) = cli_args.db {
        config.database_path = Some(db);
    }

    let db_path = config.resolved_database_path()?;
    log::info!("Using database at {}", db_path.display());
    let pool = Arc::new(create_connection_pool(&db_path)?);
    {
        let conn = pool.get()?;
        initialize_database(&conn)?;
    }

    let state = AppState::new(pool, config);
    run(cli_args.command, &state).await
}
