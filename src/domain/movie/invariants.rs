use super::entity::Movie;
use crate::domain::{DomainError, DomainResult};

/// Validates all Movie invariants
pub fn validate_movie(movie: &Movie) -> DomainResult<()> {
    if movie.id <= 0 {
        return Err(DomainError::InvariantViolation(format!(
            "Movie id must be positive, got {}",
            movie.id
        )));
    }
    if movie.title.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Movie title cannot be empty".to_string(),
        ));
    }
    Ok(())
}
