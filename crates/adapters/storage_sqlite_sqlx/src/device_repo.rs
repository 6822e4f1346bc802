//! `SQLite` implementation of [`DeviceRepository`].

use std::collections::BTreeMap;
use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use daylight_app::ports::DeviceRepository;
use daylight_domain::device::{Device, DeviceType};
use daylight_domain::error::DaylightError;
use daylight_domain::id::DeviceId;
use daylight_domain::location::Location;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`Device`].
struct Wrapper(Device);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let device_type: String = row.try_get("device_type")?;
        let model: String = row.try_get("model")?;
        let host: String = row.try_get("host")?;
        let token: String = row.try_get("token")?;
        let did: Option<String> = row.try_get("did")?;
        let location: String = row.try_get("location")?;
        let config: String = row.try_get("config")?;

        let config: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&config).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Device {
            id: DeviceId::new(id),
            device_type: DeviceType::from(device_type),
            model,
            host,
            token,
            did,
            location: Location::new(location),
            config,
        }))
    }
}

const INSERT: &str = "INSERT INTO devices (id, device_type, model, host, token, did, location, config) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_LOCATION: &str = "SELECT * FROM devices WHERE location = ? ORDER BY id";

/// `SQLite`-backed device repository.
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a device.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the device is invalid or the id is
    /// already taken.
    pub async fn create(&self, device: Device) -> Result<Device, DaylightError> {
        device.validate().map_err(StorageError::Invalid)?;
        let config = serde_json::to_string(&device.config).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(device.id.as_str())
            .bind(device.device_type.as_str())
            .bind(&device.model)
            .bind(&device.host)
            .bind(&device.token)
            .bind(device.did.as_deref())
            .bind(device.location.as_str())
            .bind(config)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        tracing::debug!(device_id = %device.id, model = %device.model, "device created");
        Ok(device)
    }
}

impl DeviceRepository for SqliteDeviceRepository {
    fn find_by_location(
        &self,
        location: &Location,
    ) -> impl Future<Output = Result<Vec<Device>, DaylightError>> + Send {
        let pool = self.pool.clone();
        let location = location.to_string();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_LOCATION)
                .bind(location)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;

    async fn setup() -> SqliteDeviceRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteDeviceRepository::new(db.pool().clone())
    }

    fn test_device(id: &str, location: &str) -> Device {
        Device::builder()
            .id(id)
            .model("cuco.plug.v3")
            .host("192.168.1.20")
            .token("00112233445566778899aabbccddeeff")
            .location(location)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_find_devices_at_location() {
        let repo = setup().await;
        repo.create(test_device("D1", "L1")).await.unwrap();
        repo.create(test_device("D2", "L1")).await.unwrap();
        repo.create(test_device("D3", "L2")).await.unwrap();

        let found = repo.find_by_location(&Location::new("L1")).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["D1", "D2"]);
    }

    #[tokio::test]
    async fn should_return_empty_when_location_has_no_devices() {
        let repo = setup().await;
        repo.create(test_device("D1", "L1")).await.unwrap();

        let found = repo.find_by_location(&Location::new("L9")).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn should_preserve_all_fields_through_roundtrip() {
        let repo = setup().await;
        let device = Device::builder()
            .id("D1")
            .model("chuangmi.plug.212a01")
            .host("192.168.1.21")
            .token("ffeeddccbbaa99887766554433221100")
            .did("123456789")
            .location("hall")
            .config("label", serde_json::json!("porch light"))
            .build()
            .unwrap();
        repo.create(device.clone()).await.unwrap();

        let found = repo.find_by_location(&Location::new("hall")).await.unwrap();
        assert_eq!(found, vec![device]);
    }

    #[tokio::test]
    async fn should_keep_unknown_device_type_verbatim() {
        let repo = setup().await;
        let mut device = test_device("B1", "L1");
        device.device_type = DeviceType::Other("bulb".to_string());
        repo.create(device).await.unwrap();

        let found = repo.find_by_location(&Location::new("L1")).await.unwrap();
        assert_eq!(found[0].device_type, DeviceType::Other("bulb".to_string()));
    }

    #[tokio::test]
    async fn should_reject_invalid_device() {
        let repo = setup().await;
        let mut device = test_device("D1", "L1");
        device.host = String::new();

        let result = repo.create(device).await;
        assert!(matches!(result, Err(DaylightError::Storage(_))));
    }
}
