//! Database models, schema initialization and user queries

pub mod init;
pub mod models;
pub mod users;

pub use init::*;
pub use models::*;
