//! Choreboard — chore tracking for a two-kid household.

pub mod auth;
pub mod calendar;
pub mod chores;
pub mod config;
pub mod error;
pub mod store;
