pub mod connection;
pub mod endpoints;
pub mod scripted;
