pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod models;
pub mod registry;
pub mod routes;
pub mod state;

#[cfg(test)]
pub mod test_support;
