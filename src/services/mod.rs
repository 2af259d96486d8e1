pub mod reading_queries;
pub mod retention;

pub use reading_queries::{QueryError, ReadingQueries};
