pub mod entity;
pub mod invariants;

pub use entity::{Show, ShowStatus};
pub use invariants::validate_show;
