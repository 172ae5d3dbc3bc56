//! SeaORM adapters - generic over ConnectionTrait.
//!
//! Adapter functions return DbErr; the repos layer maps to DomainError.

pub mod matches_sea;
pub mod participants_sea;
pub mod players_sea;
pub mod settings_sea;
pub mod tasks_sea;
