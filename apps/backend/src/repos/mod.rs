//! Repository functions for the domain layer.

pub mod matches;
pub mod participants;
pub mod players;
pub mod tasks;
