//! Smart plug drivers speaking `MIoT` properties over miIO.
//!
//! Both supported models expose the power switch as service 2, property 1.
//! They differ only in whether the vendor `did` must accompany the property
//! address.

use serde_json::{Map, Value, json};

use daylight_app::ports::{BoxFuture, DeviceDriver};
use daylight_domain::device::Device;
use daylight_domain::error::DaylightError;
use daylight_domain::power::PowerState;

use crate::client::MiioClient;
use crate::config::MiioConfig;
use crate::error::MiioError;
use crate::protocol::Token;

const POWER_SIID: u8 = 2;
const POWER_PIID: u8 = 1;

/// Address of the power property, with the `did` when the model needs it.
fn power_property(did: Option<&str>) -> Map<String, Value> {
    let mut property = Map::new();
    if let Some(did) = did {
        property.insert("did".to_string(), json!(did));
    }
    property.insert("siid".to_string(), json!(POWER_SIID));
    property.insert("piid".to_string(), json!(POWER_PIID));
    property
}

async fn read_power(client: &MiioClient, did: Option<&str>) -> Result<PowerState, MiioError> {
    let params = json!([power_property(did)]);
    let result = client.send("get_properties", params).await?;
    result
        .get(0)
        .and_then(|property| property.get("value"))
        .and_then(Value::as_bool)
        .map(PowerState::from)
        .ok_or_else(|| MiioError::UnexpectedResult(result.to_string()))
}

async fn write_power(
    client: &MiioClient,
    did: Option<&str>,
    state: PowerState,
) -> Result<(), MiioError> {
    let mut property = power_property(did);
    property.insert("value".to_string(), json!(state.is_on()));
    let result = client.send("set_properties", json!([property])).await?;

    match result.get(0).and_then(|p| p.get("code")).and_then(Value::as_i64) {
        Some(0) | None => Ok(()),
        Some(code) => Err(MiioError::Device {
            code,
            message: "set_properties rejected".to_string(),
        }),
    }
}

fn client_for(device: &Device, config: &MiioConfig) -> Result<MiioClient, MiioError> {
    let token = Token::from_hex(&device.token)?;
    Ok(MiioClient::new(
        device.host.clone(),
        config.port,
        token,
        config.timeout(),
    ))
}

/// Mi Smart Power Plug 2 (`chuangmi.plug.212a01`). Needs the vendor `did`.
pub struct ChuangmiPlug212a01 {
    client: MiioClient,
    did: String,
}

impl ChuangmiPlug212a01 {
    pub const MODEL: &'static str = "chuangmi.plug.212a01";

    /// # Errors
    ///
    /// Returns [`MiioError::InvalidToken`] for a malformed token and
    /// [`MiioError::MissingDid`] when the record carries no `did`.
    pub fn new(device: &Device, config: &MiioConfig) -> Result<Self, MiioError> {
        let did = device.did.clone().ok_or(MiioError::MissingDid)?;
        Ok(Self {
            client: client_for(device, config)?,
            did,
        })
    }

    #[must_use]
    pub fn with_client(client: MiioClient, did: impl Into<String>) -> Self {
        Self {
            client,
            did: did.into(),
        }
    }
}

impl DeviceDriver for ChuangmiPlug212a01 {
    fn query_state(&self) -> BoxFuture<'_, Result<PowerState, DaylightError>> {
        Box::pin(async move { Ok(read_power(&self.client, Some(&self.did)).await?) })
    }

    fn set_state(&self, state: PowerState) -> BoxFuture<'_, Result<(), DaylightError>> {
        Box::pin(async move { Ok(write_power(&self.client, Some(&self.did), state).await?) })
    }
}

/// Mi Smart Power Plug 3 (`cuco.plug.v3`).
pub struct CucoPlugV3 {
    client: MiioClient,
}

impl CucoPlugV3 {
    pub const MODEL: &'static str = "cuco.plug.v3";

    /// # Errors
    ///
    /// Returns [`MiioError::InvalidToken`] for a malformed token.
    pub fn new(device: &Device, config: &MiioConfig) -> Result<Self, MiioError> {
        Ok(Self {
            client: client_for(device, config)?,
        })
    }

    #[must_use]
    pub fn with_client(client: MiioClient) -> Self {
        Self { client }
    }
}

impl DeviceDriver for CucoPlugV3 {
    fn query_state(&self) -> BoxFuture<'_, Result<PowerState, DaylightError>> {
        Box::pin(async move { Ok(read_power(&self.client, None).await?) })
    }

    fn set_state(&self, state: PowerState) -> BoxFuture<'_, Result<(), DaylightError>> {
        Box::pin(async move { Ok(write_power(&self.client, None, state).await?) })
    }
}
