use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{ReadingInput, ReadingUpdate, WeatherReading};
use crate::database::repository::Repository;

pub const READINGS_TABLE: &str = "weather_readings";

/// Persistence operations for weather readings. Filtered/projected reads go
/// through [`Repository`] handles built by [`repository`](Self::repository).
#[derive(Clone)]
pub struct ReadingStore {
    pool: PgPool,
}

impl ReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A read handle decoding rows into the projection type `T`.
    pub fn repository<T>(&self) -> Repository<T>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        Repository::new(READINGS_TABLE, self.pool.clone())
    }

    pub async fn insert(&self, input: &ReadingInput) -> Result<WeatherReading, DatabaseError> {
        let reading = sqlx::query_as::<_, WeatherReading>(
            "INSERT INTO weather_readings \
             (id, device_name, precipitation, time, latitude, longitude, temperature, \
              atmospheric_pressure, max_wind_speed, solar_radiation, vapor_pressure, \
              humidity, wind_direction) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&input.device_name)
        .bind(input.precipitation)
        .bind(input.time)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.temperature)
        .bind(input.atmospheric_pressure)
        .bind(input.max_wind_speed)
        .bind(input.solar_radiation)
        .bind(input.vapor_pressure)
        .bind(input.humidity)
        .bind(input.wind_direction)
        .fetch_one(&self.pool)
        .await?;
        Ok(reading)
    }

    /// Insert a validated batch as one multi-row statement; a single
    /// statement keeps the batch atomic.
    pub async fn insert_many(
        &self,
        inputs: &[ReadingInput],
    ) -> Result<Vec<WeatherReading>, DatabaseError> {
        if inputs.is_empty() {
            return Ok(vec![]);
        }

        let mut qb: sqlx::QueryBuilder<sqlx::Postgres> = sqlx::QueryBuilder::new(
            "INSERT INTO weather_readings \
             (id, device_name, precipitation, time, latitude, longitude, temperature, \
              atmospheric_pressure, max_wind_speed, solar_radiation, vapor_pressure, \
              humidity, wind_direction) ",
        );
        qb.push_values(inputs.iter(), |mut row, input| {
            row.push_bind(Uuid::new_v4())
                .push_bind(input.device_name.clone())
                .push_bind(input.precipitation)
                .push_bind(input.time)
                .push_bind(input.latitude)
                .push_bind(input.longitude)
                .push_bind(input.temperature)
                .push_bind(input.atmospheric_pressure)
                .push_bind(input.max_wind_speed)
                .push_bind(input.solar_radiation)
                .push_bind(input.vapor_pressure)
                .push_bind(input.humidity)
                .push_bind(input.wind_direction);
        });
        qb.push(" RETURNING *");

        let readings = qb
            .build_query_as::<WeatherReading>()
            .fetch_all(&self.pool)
            .await?;
        Ok(readings)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<WeatherReading>, DatabaseError> {
        let reading =
            sqlx::query_as::<_, WeatherReading>("SELECT * FROM weather_readings WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(reading)
    }

    /// Apply a partial update, returning the updated reading or None for an
    /// unknown id.
    pub async fn update(
        &self,
        id: Uuid,
        update: &ReadingUpdate,
    ) -> Result<Option<WeatherReading>, DatabaseError> {
        if update.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut qb: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("UPDATE weather_readings SET ");
        let mut fields = qb.separated(", ");
        if let Some(v) = &update.device_name {
            fields.push("device_name = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = update.precipitation {
            fields.push("precipitation = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.time {
            fields.push("time = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.latitude {
            fields.push("latitude = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.longitude {
            fields.push("longitude = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.temperature {
            fields.push("temperature = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.atmospheric_pressure {
            fields
                .push("atmospheric_pressure = ")
                .push_bind_unseparated(v);
        }
        if let Some(v) = update.max_wind_speed {
            fields.push("max_wind_speed = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.solar_radiation {
            fields.push("solar_radiation = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.vapor_pressure {
            fields.push("vapor_pressure = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.humidity {
            fields.push("humidity = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.wind_direction {
            fields.push("wind_direction = ").push_bind_unseparated(v);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING *");

        let reading = qb
            .build_query_as::<WeatherReading>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(reading)
    }

    /// Narrow single-column update for the precipitation value.
    pub async fn update_precipitation(
        &self,
        id: Uuid,
        precipitation: f64,
    ) -> Result<Option<WeatherReading>, DatabaseError> {
        let reading = sqlx::query_as::<_, WeatherReading>(
            "UPDATE weather_readings SET precipitation = $1 WHERE id = $2 RETURNING *",
        )
        .bind(precipitation)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reading)
    }

    /// Delete by id, returning the removed reading when one existed.
    pub async fn delete(&self, id: Uuid) -> Result<Option<WeatherReading>, DatabaseError> {
        let reading = sqlx::query_as::<_, WeatherReading>(
            "DELETE FROM weather_readings WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reading)
    }
}
