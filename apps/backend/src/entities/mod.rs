pub mod app_settings;
pub mod matches;
pub mod participants;
pub mod players;
pub mod scheduled_tasks;

pub use app_settings::Entity as AppSettings;
pub use app_settings::Model as AppSetting;
pub use matches::Entity as Matches;
pub use matches::Model as Match;
pub use participants::Entity as Participants;
pub use participants::Model as Participant;
pub use players::Entity as Players;
pub use players::Model as Player;
pub use scheduled_tasks::Entity as ScheduledTasks;
pub use scheduled_tasks::Model as ScheduledTask;
