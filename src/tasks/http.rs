//! Upload task: brings the network up once, then drains the diagnostic
//! queue to the cloud on a fixed interval.
//!
//! ```text
//!  boot_network: wifi init ─▶ auto-connect ─▶ HTTP client init
//!  run:          loop { post_chunks ─▶ sleep(post_interval_ms) }
//! ```

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use crate::app::auto_connect::{auto_connect, AutoConnectOutcome};
use crate::app::ports::{ChunkTransport, KvStorePort, WifiPort};
use crate::chunks::{ChunkQueue, ChunkStore};
use crate::config::{BuildConfig, RetryPolicy};
use crate::diagnostics::{fatal, queue_unreported_crashes};
use crate::error::{Error, UploadError};

pub struct HttpTask<K, W, T, D> {
    kv: K,
    wifi: W,
    transport: T,
    delay: D,
    build: BuildConfig,
    policy: RetryPolicy,
    store: &'static ChunkStore,
}

impl<K, W, T, D> HttpTask<K, W, T, D>
where
    K: KvStorePort,
    W: WifiPort,
    T: ChunkTransport,
    D: DelayNs,
{
    pub fn new(
        kv: K,
        wifi: W,
        transport: T,
        delay: D,
        build: BuildConfig,
        store: &'static ChunkStore,
    ) -> Self {
        Self {
            kv,
            wifi,
            transport,
            delay,
            build,
            policy: RetryPolicy::AUTO_CONNECT,
            store,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Bring up Wi-Fi and the HTTP client.
    ///
    /// A failed join is logged and tolerated. Errors returned here are
    /// unrecoverable for the task.
    pub fn boot_network(&mut self) -> Result<AutoConnectOutcome, Error> {
        let crashes = queue_unreported_crashes(&mut self.kv, self.store);
        if crashes > 0 {
            info!("Queued {} crash entries from previous boots", crashes);
        }

        self.wifi.init().map_err(|e| {
            error!("Failed to initialize Wi-Fi driver: {}", e);
            Error::from(e)
        })?;

        let outcome = auto_connect(
            &self.kv,
            &mut self.wifi,
            &mut self.delay,
            &self.build,
            self.policy,
        );

        match self.transport.init() {
            Ok(()) => {}
            Err(UploadError::RootCerts(code)) => {
                error!("Failed to load root CA certificates (0x{:x})", code);
            }
            Err(e) => {
                error!("Failed to initialize HTTP client: {}", e);
                return Err(e.into());
            }
        }

        Ok(outcome)
    }

    /// POST queued chunks until the queue is empty or a POST fails.
    ///
    /// Returns the number of chunks delivered.
    pub fn post_chunks(&mut self) -> usize {
        let mut sent = 0;
        while let Some(chunk) = self.store.with(ChunkQueue::next_chunk) {
            match self.transport.post_chunk(&chunk.bytes) {
                Ok(()) => {
                    self.store.with(|q| q.commit(&chunk));
                    sent += 1;
                }
                Err(e) => {
                    warn!("Chunk upload failed, will retry next cycle: {}", e);
                    break;
                }
            }
        }
        if sent > 0 {
            info!("Uploaded {} chunk(s)", sent);
        }
        sent
    }

    pub fn run(mut self) -> ! {
        if let Err(e) = self.boot_network() {
            error!("Network bring-up failed: {}", e);
            fatal("network bring-up failed");
        }

        loop {
            self.post_chunks();
            self.delay.delay_ms(self.build.post_interval_ms);
        }
    }
}
