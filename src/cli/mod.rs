//! Terminal presentation of the session: tables, exports and setup

pub mod export;
pub mod payback;
pub mod session;
pub mod setup;
pub mod summary;
pub mod ui;
