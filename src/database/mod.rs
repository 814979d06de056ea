pub mod connection;
pub mod content;
pub mod quiz;
