pub mod config;
pub mod database;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use database::Database;
pub use services::{Board, TaskBoard};
pub use store::MemoryStore;
