pub mod config;
pub mod dispatcher;
pub mod generator;
pub mod provider;
pub mod queue;
pub mod request;
pub mod scheduler;
