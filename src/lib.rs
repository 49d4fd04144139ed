pub mod capabilities;
pub mod config;
pub mod env;
pub mod error;
pub mod interactive;
pub mod interpreter;
pub mod logging;
pub mod orchestrator;
pub mod printer;
pub mod request;
pub mod response;
pub mod store;
pub mod transport;
