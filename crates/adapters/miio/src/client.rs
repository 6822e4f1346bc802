//! miIO UDP client: handshake plus one JSON-RPC call per request.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::UdpSocket;

use crate::error::MiioError;
use crate::protocol::{self, Token};

const MAX_DATAGRAM: usize = 4096;

/// Talks to a single device.
///
/// Each call opens a fresh socket, performs the hello handshake to learn the
/// device id and stamp, then sends the encrypted request and waits for the
/// matching reply.
pub struct MiioClient {
    host: String,
    port: u16,
    token: Token,
    timeout: Duration,
    next_id: AtomicU32,
}

impl MiioClient {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, token: Token, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            token,
            timeout,
            next_id: AtomicU32::new(1),
        }
    }

    /// Call `method` with `params` and return the `result` member of the reply.
    ///
    /// # Errors
    ///
    /// Returns [`MiioError`] on I/O failure, timeout, a packet that does not
    /// verify, or an error object in the reply.
    #[tracing::instrument(skip(self, params), fields(host = %self.host))]
    pub async fn send(&self, method: &str, params: Value) -> Result<Value, MiioError> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        socket.connect((self.host.as_str(), self.port)).await?;

        socket.send(&protocol::hello()).await?;
        let reply = self.receive(&socket).await?;
        let (handshake, _) = protocol::decode(&self.token, &reply)?;
        tracing::trace!(device_id = handshake.device_id, stamp = handshake.stamp, "handshake done");

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({ "id": id, "method": method, "params": params });
        let packet = protocol::encode(
            &self.token,
            handshake.device_id,
            handshake.stamp.wrapping_add(1),
            request.to_string().as_bytes(),
        )?;
        socket.send(&packet).await?;

        loop {
            let reply = self.receive(&socket).await?;
            let (_, body) = protocol::decode(&self.token, &reply)?;
            if body.is_empty() {
                continue;
            }
            let response: Value = serde_json::from_slice(&body)?;
            if response.get("id").and_then(Value::as_u64) != Some(u64::from(id)) {
                tracing::debug!(?response, "ignoring reply to another request");
                continue;
            }
            return parse_response(response);
        }
    }

    async fn receive(&self, socket: &UdpSocket) -> Result<Vec<u8>, MiioError> {
        let mut buffer = vec![0u8; MAX_DATAGRAM];
        let read = tokio::time::timeout(self.timeout, socket.recv(&mut buffer))
            .await
            .map_err(|_| MiioError::Timeout(self.timeout))??;
        buffer.truncate(read);
        Ok(buffer)
    }
}

fn parse_response(mut response: Value) -> Result<Value, MiioError> {
    if let Some(error) = response.get("error") {
        return Err(MiioError::Device {
            code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }
    match response.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(MiioError::UnexpectedResult(response.to_string())),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    pub(crate) const TOKEN: &str = "00112233445566778899aabbccddeeff";

    /// Minimal device emulator answering on a loopback socket.
    pub(crate) struct FakeDevice {
        pub(crate) port: u16,
        pub(crate) requests: Arc<Mutex<Vec<Value>>>,
    }

    impl FakeDevice {
        /// Start an emulator replying to each request with `respond(request)`.
        pub(crate) async fn start<F>(respond: F) -> Self
        where
            F: Fn(&Value) -> Value + Send + 'static,
        {
            let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
            let port = socket.local_addr().unwrap().port();
            let requests = Arc::new(Mutex::new(Vec::new()));
            let seen = Arc::clone(&requests);
            let token = Token::from_hex(TOKEN).unwrap();

            tokio::spawn(async move {
                let mut buffer = vec![0u8; MAX_DATAGRAM];
                loop {
                    let Ok((read, peer)) = socket.recv_from(&mut buffer).await else {
                        return;
                    };
                    let packet = &buffer[..read];
                    if packet == protocol::hello() {
                        let mut reply = [0u8; protocol::HEADER_LEN];
                        reply[..4].copy_from_slice(&[0x21, 0x31, 0x00, 0x20]);
                        reply[8..12].copy_from_slice(&0x0042_0042_u32.to_be_bytes());
                        reply[12..16].copy_from_slice(&1000_u32.to_be_bytes());
                        let _ = socket.send_to(&reply, peer).await;
                        continue;
                    }
                    let (header, body) = protocol::decode(&token, packet).unwrap();
                    let request: Value = serde_json::from_slice(&body).unwrap();
                    seen.lock().unwrap().push(request.clone());
                    let mut response = respond(&request);
                    response["id"] = request["id"].clone();
                    let mut payload = response.to_string().into_bytes();
                    payload.push(0);
                    let reply =
                        protocol::encode(&token, header.device_id, header.stamp, &payload).unwrap();
                    let _ = socket.send_to(&reply, peer).await;
                }
            });

            Self { port, requests }
        }

        pub(crate) fn client(&self) -> MiioClient {
            MiioClient::new(
                "127.0.0.1",
                self.port,
                Token::from_hex(TOKEN).unwrap(),
                Duration::from_secs(2),
            )
        }
    }

    #[tokio::test]
    async fn should_perform_handshake_and_return_result() {
        let device = FakeDevice::start(|_| json!({ "result": ["ok"] })).await;

        let result = device
            .client()
            .send("miIO.info", json!([]))
            .await
            .unwrap();

        assert_eq!(result, json!(["ok"]));
        let requests = device.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["method"], "miIO.info");
        assert_eq!(requests[0]["params"], json!([]));
    }

    #[tokio::test]
    async fn should_surface_device_error() {
        let device = FakeDevice::start(|_| {
            json!({ "error": { "code": -5001, "message": "command error" } })
        })
        .await;

        let result = device.client().send("set_properties", json!([])).await;

        assert!(matches!(
            result,
            Err(MiioError::Device { code: -5001, .. })
        ));
    }

    #[tokio::test]
    async fn should_time_out_when_device_is_silent() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = silent.local_addr().unwrap().port();
        let client = MiioClient::new(
            "127.0.0.1",
            port,
            Token::from_hex(TOKEN).unwrap(),
            Duration::from_millis(50),
        );

        let result = client.send("miIO.info", json!([])).await;

        assert!(matches!(result, Err(MiioError::Timeout(_))));
        drop(silent);
    }

    #[test]
    fn should_reject_reply_without_result() {
        assert!(matches!(
            parse_response(json!({ "id": 1 })),
            Err(MiioError::UnexpectedResult(_))
        ));
    }
}
