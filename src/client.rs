use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::envelope::Event;
use crate::error::RectError;
use crate::transport::Transport;

const DEFAULT_PORT: u16 = 80;
const DEFAULT_HOST_NAME: &str = "RectTestServer";
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3_000);

const HARDWARE_OPERATION_PATH: &str = "/hardware/operation";

/// Client for one Rect board.
///
/// Each request opens its own connection and blocks until the response is
/// read; a `RectClient` holds no state between requests.
#[derive(Clone, Debug)]
pub struct RectClient {
    transport: Transport,
}

#[derive(Clone, Debug)]
struct ClientConfig {
    target_ip: Option<Ipv4Addr>,
    port: u16,
    timeout: Duration,
    host_name: String,
}

/// Builder for [`RectClient`].
#[derive(Clone, Debug)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig {
                target_ip: None,
                port: DEFAULT_PORT,
                timeout: DEFAULT_TIMEOUT,
                host_name: DEFAULT_HOST_NAME.to_string(),
            },
        }
    }

    /// IPv4 address of the board. Required.
    pub fn target_ip(mut self, target_ip: Ipv4Addr) -> Self {
        self.config.target_ip = Some(target_ip);
        self
    }

    /// Port of the board's HTTP endpoint. Defaults to 80.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Connect/read/write timeout for each exchange. Defaults to 3 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Value of the mandatory `Host` request header.
    pub fn host_name(mut self, host_name: impl Into<String>) -> Self {
        self.config.host_name = host_name.into();
        self
    }

    pub fn build(self) -> Result<RectClient, RectError> {
        let target_ip = self.config.target_ip.ok_or_else(|| {
            RectError::invalid_parameter("a target IP address is required to build a client")
        })?;

        Ok(RectClient {
            transport: Transport::new(
                target_ip,
                self.config.port,
                self.config.timeout,
                self.config.host_name,
            ),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RectClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client for the board at `target_ip` with default port, timeout, and
    /// host name.
    pub fn new(target_ip: Ipv4Addr) -> Self {
        Self {
            transport: Transport::new(
                target_ip,
                DEFAULT_PORT,
                DEFAULT_TIMEOUT,
                DEFAULT_HOST_NAME.to_string(),
            ),
        }
    }

    /// The board endpoint this client talks to.
    pub fn peer(&self) -> SocketAddrV4 {
        self.transport.peer()
    }

    /// Per-exchange timeout.
    pub fn timeout(&self) -> Duration {
        self.transport.timeout()
    }

    /// Fetches the board's index page.
    pub fn fetch_index_page(&self) -> Result<String, RectError> {
        self.fetch_page("/")
    }

    /// Fetches an arbitrary page from the board and returns its body.
    pub fn fetch_page(&self, path: &str) -> Result<String, RectError> {
        let (_, body) = self.transport.exchange("GET", path, None)?;
        String::from_utf8(body).map_err(|err| RectError::BodyNotUtf8(err.to_string()))
    }

    /// Serializes `event` and submits it to the board's command endpoint,
    /// returning the decoded JSON reply.
    pub fn submit_hardware_operation(&self, event: &Event) -> Result<Value, RectError> {
        self.submit_raw_operation(&event.serialize())
    }

    /// Submits an already-serialized event payload to the command endpoint.
    pub fn submit_raw_operation(&self, payload: &str) -> Result<Value, RectError> {
        debug!(payload_len = payload.len(), "submitting hardware operation");
        let (_, body) = self.transport.exchange(
            "POST",
            HARDWARE_OPERATION_PATH,
            Some(payload.as_bytes()),
        )?;

        serde_json::from_slice(&body).map_err(|err| RectError::ResponseDecode(err.to_string()))
    }
}
