pub mod finisher;
pub mod matches;
pub mod notices;
pub mod outcome;
pub mod resubmission;
pub mod settings;
pub mod submission;
pub mod votes;
