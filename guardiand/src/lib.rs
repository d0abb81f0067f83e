pub mod alerts;
pub mod api;
pub mod config;
pub mod insights;
pub mod metrics;
pub mod pairing;
pub mod roster;
pub mod simulator;
pub mod store;
pub mod types;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use metrics::Metrics;
pub use roster::Roster;
pub use store::MemberStore;
