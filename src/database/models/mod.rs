pub mod reading;
pub mod user;

pub use reading::{
    MaxPrecipitationRecord, MaxTemperatureRecord, RangeScanRow, ReadingField, ReadingInput,
    ReadingUpdate, StationSnapshot, WeatherReading,
};
pub use user::{PublicUser, RegisterInput, Role, UserRecord, UserUpdateInput};

/// A rejected input field. Converted into a 400 response with a
/// per-field error map at the API boundary.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}
