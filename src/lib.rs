pub mod adapters;
pub mod config;
pub mod dashboard;
pub mod notifications;
pub mod ports;
pub mod preferences;
pub mod session;
pub mod state;
pub mod storage;

#[cfg(test)]
mod testutil;

pub use state::AppState;
