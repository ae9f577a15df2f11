pub mod clips;
pub mod env;
pub mod health;
pub mod twitch_live;
pub mod twitch_override;
pub mod users;
