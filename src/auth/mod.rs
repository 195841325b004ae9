//! Authentication — household password, parent PIN gate, and sessions.

pub mod gate;
pub mod routes;
pub mod session;
