pub mod analyzers;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod filters;
pub mod geo;
pub mod location;
pub mod output;
pub mod publish;
pub mod record;
pub mod store;
