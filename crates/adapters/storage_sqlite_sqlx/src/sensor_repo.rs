//! `SQLite` implementation of [`SensorRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use daylight_app::ports::SensorRepository;
use daylight_domain::error::DaylightError;
use daylight_domain::id::SensorId;
use daylight_domain::location::Location;
use daylight_domain::sensor::{Sensor, SensorKind};

use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`Sensor`].
struct Wrapper(Sensor);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Sensor> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let sensor_id: String = row.try_get("sensor_id")?;
        let location: String = row.try_get("location")?;
        let capabilities: String = row.try_get("capabilities")?;

        let capabilities: Vec<SensorKind> = serde_json::from_str(&capabilities)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Sensor {
            sensor_id: SensorId::new(sensor_id),
            location: Location::new(location),
            capabilities,
        }))
    }
}

const INSERT: &str = "INSERT INTO sensors (sensor_id, location, capabilities) VALUES (?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM sensors WHERE sensor_id = ?";

/// `SQLite`-backed sensor repository.
pub struct SqliteSensorRepository {
    pool: SqlitePool,
}

impl SqliteSensorRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a sensor.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the sensor is invalid or the id is
    /// already taken.
    pub async fn create(&self, sensor: Sensor) -> Result<Sensor, DaylightError> {
        sensor.validate().map_err(StorageError::Invalid)?;
        let capabilities = serde_json::to_string(&sensor.capabilities).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(sensor.sensor_id.as_str())
            .bind(sensor.location.as_str())
            .bind(capabilities)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        tracing::debug!(sensor_id = %sensor.sensor_id, "sensor created");
        Ok(sensor)
    }
}

impl SensorRepository for SqliteSensorRepository {
    fn find_by_id(
        &self,
        id: &SensorId,
    ) -> impl Future<Output = Result<Option<Sensor>, DaylightError>> + Send {
        let pool = self.pool.clone();
        let id = id.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }
}
