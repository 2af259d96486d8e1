pub mod manager;
pub mod models;
pub mod query_builder;
pub mod readings;
pub mod repository;
pub mod users;

pub use manager::DatabaseError;
