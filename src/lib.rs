pub mod config;
pub mod dns;
pub mod error;
pub mod resolver;
pub mod server;

pub use dns::Message;
