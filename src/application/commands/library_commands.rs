// src/application/commands/library_commands.rs
//
// RULES:
// - Accept DTOs
// - Call services
// - Return DTOs
// - Never contain business logic

use uuid::Uuid;

use crate::application::{dto::*, error_handling::*, state::AppState};
use crate::domain::{EpisodeState, ShowStatus};
use crate::services::{AddMovieRequest, AddShowRequest, NewEpisode};

fn parse_id(raw: &str) -> Result<Uuid, ErrorResponse> {
    Uuid::parse_str(raw).map_err(|e| ErrorResponse::validation(format!("Invalid id '{}': {}", raw, e)))
}

fn parse_state(raw: &str) -> Result<EpisodeState, ErrorResponse> {
    raw.parse::<EpisodeState>().map_err(ErrorResponse::validation)
}

/// Add a show and its episodes
pub async fn add_show(dto: AddShowDto, state: &AppState) -> Result<String, ErrorResponse> {
    let status = dto
        .status
        .parse::<ShowStatus>()
        .map_err(ErrorResponse::validation)?;

    let episodes = dto
        .episodes
        .into_iter()
        .map(|episode| {
            let state = match episode.state.as_deref() {
                Some(raw) => parse_state(raw)?,
                None => EpisodeState::Unwatched,
            };
            Ok(NewEpisode {
                season: episode.season,
                number: episode.number,
                title: episode.title,
                state,
            })
        })
        .collect::<Result<Vec<_>, ErrorResponse>>()?;

    let show_id = state
        .library_service
        .add_show(AddShowRequest {
            title: dto.title,
            status,
            runtime_minutes: dto.runtime_minutes,
            episodes,
        })
        .to_error_response()?;

    Ok(show_id.to_string())
}

pub async fn add_movie(dto: AddMovieDto, state: &AppState) -> Result<i64, ErrorResponse> {
    state
        .library_service
        .add_movie(AddMovieRequest {
            tmdb_id: dto.tmdb_id,
            title: dto.title,
            runtime_minutes: dto.runtime_minutes,
            in_watchlist: dto.in_watchlist,
        })
        .to_error_response()
}

pub async fn list_shows(state: &AppState) -> Result<Vec<ShowDto>, ErrorResponse> {
    let shows = state.library_service.list_shows().to_error_response()?;
    Ok(shows.into_iter().map(ShowDto::from).collect())
}

pub async fn list_episodes(show_id: &str, state: &AppState) -> Result<Vec<EpisodeDto>, ErrorResponse> {
    let id = parse_id(show_id)?;
    let episodes = state.library_service.list_episodes(id).to_error_response()?;
    Ok(episodes.into_iter().map(EpisodeDto::from).collect())
}

pub async fn list_movies(state: &AppState) -> Result<Vec<MovieDto>, ErrorResponse> {
    let movies = state.library_service.list_movies().to_error_response()?;
    Ok(movies.into_iter().map(MovieDto::from).collect())
}

/// Set the watch state of an episode ("unwatched", "watched" or "skipped")
pub async fn set_episode_state(
    episode_id: &str,
    episode_state: &str,
    state: &AppState,
) -> Result<(), ErrorResponse> {
    let id = parse_id(episode_id)?;
    let episode_state = parse_state(episode_state)?;

    state
        .library_service
        .set_episode_state(id, episode_state)
        .to_error_response()
}

pub async fn set_movie_watchlist(
    movie_id: i64,
    in_watchlist: bool,
    state: &AppState,
) -> Result<(), ErrorResponse> {
    state
        .library_service
        .set_movie_watchlist(movie_id, in_watchlist)
        .to_error_response()
}
