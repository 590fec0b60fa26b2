pub mod chat;
pub mod config;
pub mod image;
pub mod word;
