//! HTTPS chunk uploader.
//!
//! Implements [`ChunkTransport`] by POSTing each chunk to the Memfault
//! chunks endpoint for this device:
//!
//! ```text
//! POST https://chunks.memfault.com/api/v0/chunks/<device_serial>
//! Memfault-Project-Key: <key>
//! Content-Type: application/octet-stream
//! ```
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` with the ESP-IDF
//!   certificate bundle as trust anchors.
//! - **all other targets**: records posted bodies for host-side tests.

use log::{debug, info, warn};

use crate::app::ports::ChunkTransport;
use crate::error::UploadError;

#[cfg(target_os = "espidf")]
use embedded_svc::{
    http::client::Client as HttpClient,
    io::{Read, Write},
};
#[cfg(target_os = "espidf")]
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};

#[cfg(not(target_os = "espidf"))]
use std::sync::{Arc, Mutex, MutexGuard};

pub const CHUNKS_HOST: &str = "https://chunks.memfault.com";
pub const PROJECT_KEY_HEADER: &str = "Memfault-Project-Key";
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// Upload URL for `device_serial`.
pub fn chunk_url(device_serial: &str) -> String {
    format!("{}/api/v0/chunks/{}", CHUNKS_HOST, device_serial)
}

/// `2xx` counts as delivered.
pub fn status_ok(status: u16) -> bool {
    (200..300).contains(&status)
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct HttpChunkClient {
    url: String,
    project_key: &'static str,
    client: Option<HttpClient<EspHttpConnection>>,
}

#[cfg(target_os = "espidf")]
impl HttpChunkClient {
    pub fn new(device_serial: &str, project_key: &'static str) -> Self {
        Self {
            url: chunk_url(device_serial),
            project_key,
            client: None,
        }
    }
}

#[cfg(target_os = "espidf")]
fn load_root_certs() -> Result<(), UploadError> {
    use esp_idf_svc::sys::{esp_crt_bundle_attach, ESP_OK};
    // A null config only parses the embedded bundle into the global store.
    let ret = unsafe { esp_crt_bundle_attach(core::ptr::null_mut()) };
    if ret == ESP_OK as i32 {
        Ok(())
    } else {
        Err(UploadError::RootCerts(ret))
    }
}

#[cfg(target_os = "espidf")]
impl ChunkTransport for HttpChunkClient {
    fn init(&mut self) -> Result<(), UploadError> {
        let certs = load_root_certs();
        let mut config = HttpConfiguration::default();
        if certs.is_ok() {
            config.crt_bundle_attach = Some(esp_idf_svc::sys::esp_crt_bundle_attach);
        }
        let conn = EspHttpConnection::new(&config).map_err(|e| UploadError::ClientInit(e.code()))?;
        self.client = Some(HttpClient::wrap(conn));
        match certs {
            Ok(()) => info!("HTTP client ready for {}", self.url),
            // Client stays usable; TLS handshakes fail until the bundle loads.
            Err(_) => warn!("HTTP client ready for {} without root CAs", self.url),
        }
        certs
    }

    fn post_chunk(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        let client = self.client.as_mut().ok_or(UploadError::NotConnected)?;
        let content_length = chunk.len().to_string();
        let headers = [
            (PROJECT_KEY_HEADER, self.project_key),
            ("Content-Type", CONTENT_TYPE),
            ("Content-Length", content_length.as_str()),
        ];

        let mut request = client
            .post(&self.url, &headers)
            .map_err(|e| UploadError::Request(e.0.code()))?;
        request
            .write_all(chunk)
            .map_err(|e| UploadError::Request(e.0.code()))?;
        request.flush().map_err(|e| UploadError::Request(e.0.code()))?;
        let mut response = request
            .submit()
            .map_err(|e| UploadError::Request(e.0.code()))?;

        let status = response.status();
        let mut sink = [0u8; 64];
        while let Ok(n) = response.read(&mut sink) {
            if n == 0 {
                break;
            }
        }

        if !status_ok(status) {
            warn!("Chunk POST rejected: HTTP {}", status);
            return Err(UploadError::Status(status));
        }
        debug!("Chunk POST accepted ({} bytes)", chunk.len());
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct Endpoint {
    ready: bool,
    init_error: Option<UploadError>,
    /// Upcoming posts answered with this status.
    reject_next: Vec<u16>,
    posted: Vec<Vec<u8>>,
}

/// Host stand-in that records what would have been posted.
#[cfg(not(target_os = "espidf"))]
#[derive(Clone)]
pub struct HttpChunkClient {
    url: String,
    project_key: &'static str,
    endpoint: Arc<Mutex<Endpoint>>,
}

#[cfg(not(target_os = "espidf"))]
impl HttpChunkClient {
    pub fn new(device_serial: &str, project_key: &'static str) -> Self {
        Self {
            url: chunk_url(device_serial),
            project_key,
            endpoint: Arc::new(Mutex::new(Endpoint::default())),
        }
    }

    fn endpoint(&self) -> MutexGuard<'_, Endpoint> {
        self.endpoint.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn project_key(&self) -> &str {
        self.project_key
    }

    pub fn fail_init_with(&self, error: UploadError) {
        self.endpoint().init_error = Some(error);
    }

    /// Answer the next post with `status`.
    pub fn reject_next(&self, status: u16) {
        self.endpoint().reject_next.push(status);
    }

    pub fn posted(&self) -> Vec<Vec<u8>> {
        self.endpoint().posted.clone()
    }
}

#[cfg(not(target_os = "espidf"))]
impl ChunkTransport for HttpChunkClient {
    fn init(&mut self) -> Result<(), UploadError> {
        let mut ep = self.endpoint();
        match ep.init_error {
            Some(UploadError::RootCerts(code)) => {
                ep.ready = true;
                Err(UploadError::RootCerts(code))
            }
            Some(e) => Err(e),
            None => {
                ep.ready = true;
                info!("HTTP client(sim) ready for {}", self.url);
                Ok(())
            }
        }
    }

    fn post_chunk(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        let mut ep = self.endpoint();
        if !ep.ready {
            return Err(UploadError::NotConnected);
        }
        if !ep.reject_next.is_empty() {
            let status = ep.reject_next.remove(0);
            if !status_ok(status) {
                warn!("Chunk POST rejected: HTTP {}", status);
                return Err(UploadError::Status(status));
            }
        }
        ep.posted.push(chunk.to_vec());
        debug!("Chunk POST accepted ({} bytes)", chunk.len());
        Ok(())
    }
}
