//! Pure match-coordination logic, free of persistence concerns.
//!
//! The services layer loads the match aggregate, calls into these functions
//! to make decisions, and persists the results.

pub mod modes;
pub mod placement;

pub use modes::{mode_spec, required_players, ModeSpec};
pub use placement::{lowest_open_rank, missing_place, next_place, AutoFill};

#[cfg(test)]
mod tests_modes;
#[cfg(test)]
mod tests_placement;
