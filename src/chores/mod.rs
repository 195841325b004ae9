//! Chore domain — models, scoring, rewards, toggling, and HTTP routes.

pub mod model;
pub mod rewards;
pub mod routes;
pub mod scoring;
pub mod toggle;
