pub mod crud;
pub mod queries;

pub use crud::{get_by_id, insert, insert_many, remove, update, update_precipitation};
pub use queries::{max_precipitation, max_temperature, station_snapshot, temperature_humidity};
