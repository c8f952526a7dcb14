use super::entity::Show;
use crate::domain::{DomainError, DomainResult};

/// Validates all Show invariants
pub fn validate_show(show: &Show) -> DomainResult<()> {
    if show.title.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Show title cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Show Invariants:
///
/// 1. Title is never blank
/// 2. Show ID is immutable
/// 3. Runtime is per episode, zero means unknown

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::show::ShowStatus;

    #[test]
    fn test_valid_show() {
        let show = Show::new("The Expanse".to_string(), ShowStatus::Ended, 45);
        assert!(validate_show(&show).is_ok());
    }

    #[test]
    fn test_blank_title_fails() {
        let show = Show::new("   ".to_string(), ShowStatus::Continuing, 30);
        assert!(validate_show(&show).is_err());
    }
}
