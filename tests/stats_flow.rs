// tests/stats_flow.rs
//
// End-to-end: library commands feed a real SQLite file, statistics read it back.

use std::sync::{Arc, Mutex};

use seriesguide_stats::application::commands::*;
use seriesguide_stats::application::dto::*;
use seriesguide_stats::application::{AppState, ErrorType};
use seriesguide_stats::config::AppConfig;
use seriesguide_stats::db::{create_connection_pool, initialize_database};

fn open_state(dir: &tempfile::TempDir) -> AppState {
    let pool = Arc::new(create_connection_pool(&dir.path().join("library.db")).unwrap());
    {
        let conn = pool.get().unwrap();
        initialize_database(&conn).unwrap();
    }
    AppState::new(pool, AppConfig::default())
}

fn episode(season: u32, number: u32, state: &str) -> NewEpisodeDto {
    NewEpisodeDto {
        season,
        number,
        title: None,
        state: Some(state.to_string()),
    }
}

/// Three shows with runtimes 30/45/60 and 2/0/1 watched regular episodes,
/// plus one watched special on the 60 minute show.
async fn seed_library(state: &AppState) {
    add_show(
        AddShowDto {
            title: "Twin Peaks".to_string(),
            status: "continuing".to_string(),
            runtime_minutes: 30,
            episodes: vec![
                episode(1, 1, "watched"),
                episode(1, 2, "watched"),
                episode(1, 3, "unwatched"),
            ],
        },
        state,
    )
    .await
    .unwrap();

    add_show(
        AddShowDto {
            title: "Deadwood".to_string(),
            status: "ended".to_string(),
            runtime_minutes: 45,
            episodes: vec![episode(1, 1, "skipped"), episode(1, 2, "unwatched")],
        },
        state,
    )
    .await
    .unwrap();

    add_show(
        AddShowDto {
            title: "Columbo".to_string(),
            status: "ended".to_string(),
            runtime_minutes: 60,
            episodes: vec![episode(0, 1, "watched"), episode(1, 1, "watched")],
        },
        state,
    )
    .await
    .unwrap();

    add_movie(
        AddMovieDto {
            tmdb_id: 603,
            title: "The Matrix".to_string(),
            runtime_minutes: 136,
            in_watchlist: true,
        },
        state,
    )
    .await
    .unwrap();

    add_movie(
        AddMovieDto {
            tmdb_id: 78,
            title: "Blade Runner".to_string(),
            runtime_minutes: 117,
            in_watchlist: false,
        },
        state,
    )
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_counts_match_the_library() {
    let dir = tempfile::tempdir().unwrap();
    let state = open_state(&dir);
    seed_library(&state).await;

    let terminal = get_statistics(&state, Some(true), |_| {}).await.unwrap();

    assert!(terminal.is_final);
    assert!(terminal.was_successful);
    let stats = terminal.stats;
    assert_eq!(stats.shows, Some(3));
    assert_eq!(stats.shows_continuing, Some(1));
    assert_eq!(stats.shows_with_next_episode, Some(2));
    assert_eq!(stats.episodes, Some(6));
    assert_eq!(stats.episodes_watched, Some(3));
    assert_eq!(stats.episodes_watched_runtime_minutes, 120);
    assert_eq!(stats.episodes_watched_runtime, "2h 0m");
    assert_eq!(stats.movies, Some(2));
    assert_eq!(stats.movies_watchlist, Some(1));
    assert_eq!(stats.movies_watchlist_runtime_minutes, Some(136));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_specials_count_unless_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let state = open_state(&dir);
    seed_library(&state).await;

    let with_specials = get_statistics(&state, None, |_| {}).await.unwrap();

    assert_eq!(with_specials.stats.episodes, Some(7));
    assert_eq!(with_specials.stats.episodes_watched, Some(4));
    assert_eq!(with_specials.stats.episodes_watched_runtime_minutes, 180);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unchanged_library_gives_identical_results() {
    let dir = tempfile::tempdir().unwrap();
    let state = open_state(&dir);
    seed_library(&state).await;

    let first = get_statistics(&state, None, |_| {}).await.unwrap();
    let second = get_statistics(&state, None, |_| {}).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_progress_only_grows_the_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let state = open_state(&dir);
    seed_library(&state).await;

    let progress = Mutex::new(Vec::new());
    let terminal = get_statistics(&state, Some(true), |event| {
        progress.lock().unwrap().push(event.clone());
    })
    .await
    .unwrap();

    let progress = progress.into_inner().unwrap();
    assert!(!progress.is_empty());
    let mut last_runtime = 0;
    for event in &progress {
        assert!(!event.is_final);
        assert_eq!(event.stats.shows, terminal.stats.shows);
        assert_eq!(event.stats.episodes_watched, terminal.stats.episodes_watched);
        assert_eq!(event.stats.movies_watchlist, terminal.stats.movies_watchlist);
        assert!(event.stats.episodes_watched_runtime_minutes >= last_runtime);
        last_runtime = event.stats.episodes_watched_runtime_minutes;
    }
    assert!(terminal.stats.episodes_watched_runtime_minutes >= last_runtime);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cache_follows_library_changes() {
    let dir = tempfile::tempdir().unwrap();
    let state = open_state(&dir);
    seed_library(&state).await;

    assert!(get_cached_statistics(&state).await.unwrap().is_none());

    let terminal = get_statistics(&state, None, |_| {}).await.unwrap();
    let cached = get_cached_statistics(&state).await.unwrap().unwrap();
    assert!(!cached.stale);
    assert_eq!(cached.stats, terminal.stats);

    set_movie_watchlist(78, true, &state).await.unwrap();
    assert!(get_cached_statistics(&state).await.unwrap().unwrap().stale);

    let refreshed = get_statistics(&state, None, |_| {}).await.unwrap();
    assert_eq!(refreshed.stats.movies_watchlist, Some(2));
    assert_eq!(refreshed.stats.movies_watchlist_runtime, Some("4h 13m".to_string()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fresh_cache_stays_fresh_after_reopening() {
    let dir = tempfile::tempdir().unwrap();
    {
        let state = open_state(&dir);
        seed_library(&state).await;
        get_statistics(&state, None, |_| {}).await.unwrap();
    }

    let reopened = open_state(&dir);
    let cached = get_cached_statistics(&reopened).await.unwrap().unwrap();
    assert!(!cached.stale);
    assert_eq!(cached.stats.movies, Some(2));

    let other = open_state(&dir);
    set_movie_watchlist(78, true, &other).await.unwrap();
    assert!(get_cached_statistics(&reopened).await.unwrap().unwrap().stale);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watching_an_episode_changes_the_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let state = open_state(&dir);
    seed_library(&state).await;

    let deadwood = list_shows(&state)
        .await
        .unwrap()
        .into_iter()
        .find(|show| show.title == "Deadwood")
        .unwrap();
    let next = deadwood.next_episode.clone().unwrap();

    set_episode_state(&next, "watched", &state).await.unwrap();

    let terminal = get_statistics(&state, Some(true), |_| {}).await.unwrap();
    assert_eq!(terminal.stats.episodes_watched_runtime_minutes, 165);
    assert_eq!(terminal.stats.shows_with_next_episode, Some(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bad_input_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let state = open_state(&dir);

    let err = set_episode_state("not-a-uuid", "watched", &state)
        .await
        .unwrap_err();
    assert_eq!(err.error_type, ErrorType::Validation);

    let err = add_show(
        AddShowDto {
            title: "Lost".to_string(),
            status: "airing".to_string(),
            runtime_minutes: 42,
            episodes: vec![],
        },
        &state,
    )
    .await
    .unwrap_err();
    assert_eq!(err.error_type, ErrorType::Validation);

    let err = set_movie_watchlist(999, true, &state).await.unwrap_err();
    assert_eq!(err.error_type, ErrorType::NotFound);
}
