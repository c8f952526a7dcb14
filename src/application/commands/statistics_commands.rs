// src/application/commands/statistics_commands.rs

use crate::application::{dto::*, error_handling::*, state::AppState};
use crate::domain::StatsEvent;

/// Compute statistics in the background and wait for the result.
///
/// `on_progress` sees every intermediate event in order; the final event is
/// returned. `exclude_specials` overrides the configured setting for this run.
pub async fn get_statistics<F>(
    state: &AppState,
    exclude_specials: Option<bool>,
    on_progress: F,
) -> Result<StatsEventDto, ErrorResponse>
where
    F: Fn(&StatsEventDto) + Send + Sync,
{
    let mut options = state.statistics_service.options();
    if let Some(exclude) = exclude_specials {
        options.exclude_specials = exclude;
    }

    let run = state
        .statistics_service
        .start_run_with(options)
        .to_error_response()?
        .ok_or_else(ErrorResponse::busy)?;

    let observer = |event: &StatsEvent| {
        if !event.is_final() {
            on_progress(&StatsEventDto::from(*event));
        }
    };
    let terminal = run.forward_to(&observer).await;

    Ok(StatsEventDto::from(terminal))
}

/// Last persisted statistics, without recomputing
pub async fn get_cached_statistics(
    state: &AppState,
) -> Result<Option<CachedStatsDto>, ErrorResponse> {
    let cached = state
        .statistics_service
        .cached_statistics()
        .to_error_response()?;

    Ok(cached.map(|cached| CachedStatsDto::new(cached.record, cached.stale)))
}
