// src/services/library_service.rs
//
// Library Service - mutations of the tracked shows and movies
//
// CRITICAL RULES:
// - Validate every entity before it is persisted
// - Emit exactly one event per successful mutation
// - The next-episode marker follows the watch state of regular episodes

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    validate_episode, validate_movie, validate_show, Episode, EpisodeState, Movie, Show,
    ShowStatus,
};
use crate::error::{AppError, AppResult};
use crate::events::{EpisodeWatchedChanged, EventBus, MovieAdded, MovieWatchlistChanged, ShowAdded};
use crate::repositories::{EpisodeRepository, MovieRepository, ShowRepository};

#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub season: u32,
    pub number: u32,
    pub title: Option<String>,
    pub state: EpisodeState,
}

#[derive(Debug, Clone)]
pub struct AddShowRequest {
    pub title: String,
    pub status: ShowStatus,
    pub runtime_minutes: u32,
    pub episodes: Vec<NewEpisode>,
}

#[derive(Debug, Clone)]
pub struct AddMovieRequest {
    pub tmdb_id: i64,
    pub title: String,
    pub runtime_minutes: u32,
    pub in_watchlist: bool,
}

pub struct LibraryService {
    show_repo: Arc<dyn ShowRepository>,
    episode_repo: Arc<dyn EpisodeRepository>,
    movie_repo: Arc<dyn MovieRepository>,
    event_bus: Arc<EventBus>,
}

impl LibraryService {
    pub fn new(
        show_repo: Arc<dyn ShowRepository>,
        episode_repo: Arc<dyn EpisodeRepository>,
        movie_repo: Arc<dyn MovieRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            show_repo,
            episode_repo,
            movie_repo,
            event_bus,
        }
    }

    /// Add a show together with its episodes
    pub fn add_show(&self, request: AddShowRequest) -> AppResult<Uuid> {
        let mut show = Show::new(request.title, request.status, request.runtime_minutes);
        validate_show(&show)?;

        let episodes = request
            .episodes
            .into_iter()
            .map(|new| {
                let mut episode = Episode::new(show.id, new.season, new.number);
                if let Some(title) = new.title {
                    episode = episode.with_title(title);
                }
                episode.set_state(new.state);
                validate_episode(&episode)?;
                Ok(episode)
            })
            .collect::<AppResult<Vec<_>>>()?;

        show.set_next_episode(next_episode_of(&episodes));
        self.show_repo.save_with_episodes(&show, &episodes)?;

        log::info!("Added show '{}' with {} episodes", show.title, episodes.len());
        self.event_bus
            .emit(ShowAdded::new(show.id, show.title.clone(), episodes.len()));

        Ok(show.id)
    }

    pub fn add_movie(&self, request: AddMovieRequest) -> AppResult<i64> {
        let mut movie = Movie::new(request.tmdb_id, request.title, request.runtime_minutes);
        movie.set_in_watchlist(request.in_watchlist);
        validate_movie(&movie)?;

        self.movie_repo.save(&movie)?;

        log::info!("Added movie '{}' ({})", movie.title, movie.id);
        self.event_bus.emit(MovieAdded::new(movie.id, movie.title.clone()));

        Ok(movie.id)
    }

    /// Change the watch state of one episode and move the show's next-episode marker
    pub fn set_episode_state(&self, episode_id: Uuid, state: EpisodeState) -> AppResult<()> {
        let episode = self
            .episode_repo
            .get_by_id(episode_id)?
            .ok_or(AppError::NotFound)?;
        let show = self
            .show_repo
            .get_by_id(episode.show_id)?
            .ok_or(AppError::NotFound)?;

        let mut episodes = self.episode_repo.list_by_show(show.id)?;
        for candidate in episodes.iter_mut().filter(|e| e.id == episode_id) {
            candidate.set_state(state);
        }
        let next = next_episode_of(&episodes);

        self.show_repo
            .apply_episode_state(show.id, episode_id, state, next)?;

        self.event_bus
            .emit(EpisodeWatchedChanged::new(show.id, episode_id, state));
        Ok(())
    }

    pub fn set_movie_watchlist(&self, movie_id: i64, in_watchlist: bool) -> AppResult<()> {
        self.movie_repo.set_in_watchlist(movie_id, in_watchlist)?;

        self.event_bus
            .emit(MovieWatchlistChanged::new(movie_id, in_watchlist));
        Ok(())
    }

    pub fn get_show(&self, show_id: Uuid) -> AppResult<Option<Show>> {
        self.show_repo.get_by_id(show_id)
    }

    pub fn list_shows(&self) -> AppResult<Vec<Show>> {
        self.show_repo.list_all()
    }

    pub fn list_episodes(&self, show_id: Uuid) -> AppResult<Vec<Episode>> {
        self.episode_repo.list_by_show(show_id)
    }

    pub fn list_movies(&self) -> AppResult<Vec<Movie>> {
        self.movie_repo.list_all()
    }
}

/// First unwatched regular episode in season/number order
fn next_episode_of(episodes: &[Episode]) -> Option<Uuid> {
    episodes
        .iter()
        .filter(|episode| !episode.is_special() && episode.state == EpisodeState::Unwatched)
        .min_by_key(|episode| (episode.season, episode.number))
        .map(|episode| episode.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, ConnectionPool};
    use crate::repositories::{
        EpisodeFilter, MockMovieRepository, SqliteEpisodeRepository, SqliteMovieRepository,
        SqliteShowRepository,
    };

    fn service() -> (tempfile::TempDir, LibraryService, Arc<EventBus>) {
        let (dir, pool) = create_test_pool();
        let bus = Arc::new(EventBus::new());
        let service = LibraryService::new(
            Arc::new(SqliteShowRepository::new(Arc::clone(&pool))),
            Arc::new(SqliteEpisodeRepository::new(Arc::clone(&pool))),
            Arc::new(SqliteMovieRepository::new(pool)),
            Arc::clone(&bus),
        );
        (dir, service, bus)
    }

    fn service_over(pool: Arc<ConnectionPool>) -> (LibraryService, Arc<EventBus>) {
        let bus = Arc::new(EventBus::new());
        let service = LibraryService::new(
            Arc::new(SqliteShowRepository::new(Arc::clone(&pool))),
            Arc::new(SqliteEpisodeRepository::new(Arc::clone(&pool))),
            Arc::new(SqliteMovieRepository::new(pool)),
            Arc::clone(&bus),
        );
        (service, bus)
    }

    fn episode(season: u32, number: u32, state: EpisodeState) -> NewEpisode {
        NewEpisode {
            season,
            number,
            title: None,
            state,
        }
    }

    #[test]
    fn test_add_show_persists_episodes_and_next_marker() {
        let (_dir, service, bus) = service();

        let show_id = service
            .add_show(AddShowRequest {
                title: "Fringe".to_string(),
                status: ShowStatus::Ended,
                runtime_minutes: 45,
                episodes: vec![
                    episode(0, 1, EpisodeState::Unwatched),
                    episode(1, 2, EpisodeState::Unwatched),
                    episode(1, 1, EpisodeState::Watched),
                ],
            })
            .unwrap();

        let show = service.get_show(show_id).unwrap().unwrap();
        let episodes = service.list_episodes(show_id).unwrap();
        assert_eq!(episodes.len(), 3);
        let expected = episodes.iter().find(|e| e.season == 1 && e.number == 2).unwrap();
        assert_eq!(show.next_episode, Some(expected.id));
        assert_eq!(bus.get_event_log()[0].event_type, "ShowAdded");
    }

    #[test]
    fn test_blank_title_is_rejected_before_saving() {
        let (_dir, service, bus) = service();

        let result = service.add_show(AddShowRequest {
            title: "  ".to_string(),
            status: ShowStatus::Unknown,
            runtime_minutes: 30,
            episodes: vec![],
        });

        assert!(matches!(result, Err(AppError::Domain(_))));
        assert!(service.list_shows().unwrap().is_empty());
        assert!(bus.get_event_log().is_empty());
    }

    #[test]
    fn test_invalid_episode_rejects_whole_show() {
        let (_dir, service, _bus) = service();

        let result = service.add_show(AddShowRequest {
            title: "Dark".to_string(),
            status: ShowStatus::Ended,
            runtime_minutes: 55,
            episodes: vec![episode(1, 0, EpisodeState::Unwatched)],
        });

        assert!(result.is_err());
        assert!(service.list_shows().unwrap().is_empty());
    }

    #[test]
    fn test_watching_moves_next_marker() {
        let (_dir, service, bus) = service();
        let show_id = service
            .add_show(AddShowRequest {
                title: "Chernobyl".to_string(),
                status: ShowStatus::Ended,
                runtime_minutes: 60,
                episodes: vec![
                    episode(1, 1, EpisodeState::Unwatched),
                    episode(1, 2, EpisodeState::Unwatched),
                ],
            })
            .unwrap();
        let episodes = service.list_episodes(show_id).unwrap();

        service
            .set_episode_state(episodes[0].id, EpisodeState::Watched)
            .unwrap();
        assert_eq!(
            service.get_show(show_id).unwrap().unwrap().next_episode,
            Some(episodes[1].id)
        );

        service
            .set_episode_state(episodes[1].id, EpisodeState::Skipped)
            .unwrap();
        assert_eq!(service.get_show(show_id).unwrap().unwrap().next_episode, None);

        let log = bus.get_event_log();
        assert_eq!(log.last().unwrap().event_type, "EpisodeWatchedChanged");
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_failed_episode_save_leaves_no_show() {
        let (_dir, pool) = create_test_pool();
        pool.get()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER fail_second_episode BEFORE INSERT ON episodes
                 WHEN NEW.number = 2
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();
        let (service, bus) = service_over(pool);

        let result = service.add_show(AddShowRequest {
            title: "Babylon 5".to_string(),
            status: ShowStatus::Ended,
            runtime_minutes: 44,
            episodes: vec![
                episode(1, 1, EpisodeState::Watched),
                episode(1, 2, EpisodeState::Unwatched),
                episode(1, 3, EpisodeState::Unwatched),
            ],
        });

        assert!(matches!(result, Err(AppError::Database(_))));
        assert!(service.list_shows().unwrap().is_empty());
        assert!(bus.get_event_log().is_empty());
    }

    #[test]
    fn test_failed_marker_update_keeps_episode_state() {
        let (_dir, pool) = create_test_pool();
        let (service, bus) = service_over(Arc::clone(&pool));
        let show_id = service
            .add_show(AddShowRequest {
                title: "The Expanse".to_string(),
                status: ShowStatus::Ended,
                runtime_minutes: 45,
                episodes: vec![
                    episode(1, 1, EpisodeState::Unwatched),
                    episode(1, 2, EpisodeState::Unwatched),
                ],
            })
            .unwrap();
        let episodes = service.list_episodes(show_id).unwrap();
        pool.get()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER fail_show_update BEFORE UPDATE ON shows
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let result = service.set_episode_state(episodes[0].id, EpisodeState::Watched);

        assert!(matches!(result, Err(AppError::Database(_))));
        let first = &service.list_episodes(show_id).unwrap()[0];
        assert_eq!(first.state, EpisodeState::Unwatched);
        assert_eq!(
            service.get_show(show_id).unwrap().unwrap().next_episode,
            Some(episodes[0].id)
        );
        assert_eq!(bus.get_event_log().len(), 1);
    }

    #[test]
    fn test_unknown_episode_is_not_found() {
        let (_dir, service, bus) = service();

        let result = service.set_episode_state(Uuid::new_v4(), EpisodeState::Watched);

        assert!(matches!(result, Err(AppError::NotFound)));
        assert!(bus.get_event_log().is_empty());
    }

    #[test]
    fn test_movie_watchlist_round() {
        let (_dir, service, bus) = service();
        service
            .add_movie(AddMovieRequest {
                tmdb_id: 603,
                title: "The Matrix".to_string(),
                runtime_minutes: 136,
                in_watchlist: false,
            })
            .unwrap();

        service.set_movie_watchlist(603, true).unwrap();

        assert!(service.list_movies().unwrap()[0].in_watchlist);
        let types: Vec<_> = bus
            .get_event_log()
            .into_iter()
            .map(|entry| entry.event_type)
            .collect();
        assert_eq!(types, vec!["MovieAdded", "MovieWatchlistChanged"]);
    }

    #[test]
    fn test_failed_save_emits_nothing() {
        let (_dir, pool) = create_test_pool();
        let bus = Arc::new(EventBus::new());
        let mut movies = MockMovieRepository::new();
        movies
            .expect_save()
            .returning(|_| Err(AppError::Pool("pool exhausted".to_string())));
        let service = LibraryService::new(
            Arc::new(SqliteShowRepository::new(Arc::clone(&pool))),
            Arc::new(SqliteEpisodeRepository::new(pool)),
            Arc::new(movies),
            Arc::clone(&bus),
        );

        let result = service.add_movie(AddMovieRequest {
            tmdb_id: 1,
            title: "Alien".to_string(),
            runtime_minutes: 117,
            in_watchlist: true,
        });

        assert!(matches!(result, Err(AppError::Pool(_))));
        assert!(bus.get_event_log().is_empty());
    }

    #[test]
    fn test_specials_never_become_next() {
        let (_dir, pool) = create_test_pool();
        let bus = Arc::new(EventBus::new());
        let episodes = Arc::new(SqliteEpisodeRepository::new(Arc::clone(&pool)));
        let service = LibraryService::new(
            Arc::new(SqliteShowRepository::new(Arc::clone(&pool))),
            Arc::clone(&episodes) as Arc<dyn EpisodeRepository>,
            Arc::new(SqliteMovieRepository::new(pool)),
            bus,
        );

        let show_id = service
            .add_show(AddShowRequest {
                title: "Sherlock".to_string(),
                status: ShowStatus::Ended,
                runtime_minutes: 90,
                episodes: vec![episode(0, 1, EpisodeState::Unwatched)],
            })
            .unwrap();

        assert_eq!(service.get_show(show_id).unwrap().unwrap().next_episode, None);
        assert_eq!(
            episodes
                .count(EpisodeFilter::all().for_show(show_id).excluding_specials(true))
                .unwrap(),
            0
        );
    }
}
