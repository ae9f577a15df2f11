#[macro_use]
extern crate lazy_static;

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod feature_flags;
pub mod link_resolver;
pub mod link_rules;
pub mod override_store;
pub mod routes;
pub mod trace;
pub mod twitch_live;
pub mod twitch_link;
pub mod twitch_username;
pub mod utility;

pub use link_resolver::{LinkResolver, ResolvedPlayer};
pub use override_store::{OverrideEntry, OverrideStore};
