use super::entity::Episode;
use crate::domain::{DomainError, DomainResult};

/// Validates all Episode invariants
pub fn validate_episode(episode: &Episode) -> DomainResult<()> {
    validate_numbering(episode)?;
    Ok(())
}

/// Numbering invariants:
/// 1. Regular episodes (season > 0) start at number 1
/// 2. Specials may use number 0 (unnumbered bonus content)
fn validate_numbering(episode: &Episode) -> DomainResult<()> {
    if !episode.is_special() && episode.number == 0 {
        return Err(DomainError::InvariantViolation(format!(
            "Episode 0 is only allowed for specials (season {})",
            episode.season
        )));
    }
    Ok(())
}

/// Critical Episode Invariants:
///
/// 1. Episode MUST belong to exactly one Show (show_id required)
/// 2. Season 0 is reserved for specials
/// 3. Episode ID is immutable
/// 4. show_id is immutable (episode cannot change parent)

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_valid_episode() {
        let episode = Episode::new(Uuid::new_v4(), 1, 1);
        assert!(validate_episode(&episode).is_ok());
    }

    #[test]
    fn test_special_may_be_unnumbered() {
        let episode = Episode::new(Uuid::new_v4(), 0, 0);
        assert!(validate_episode(&episode).is_ok());
    }

    #[test]
    fn test_regular_episode_zero_fails() {
        let episode = Episode::new(Uuid::new_v4(), 2, 0);
        assert!(validate_episode(&episode).is_err());
    }
}
