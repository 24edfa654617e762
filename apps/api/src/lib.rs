pub mod config;
pub mod errors;
pub mod matcher_client;
pub mod routes;
pub mod state;
pub mod upload;
