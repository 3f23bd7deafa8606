//! Flash key-value adapter.
//!
//! Implements [`KvStorePort`] on the default NVS partition. Every call opens
//! its namespace through [`EspNvs`], so the adapter itself only carries the
//! partition handle and clones freely between the shell, the HTTP task and
//! the panic hook. The host build keeps values in a shared map.
//!
//! Namespaces in use: `app` (Wi-Fi config) and `crash` (crash ring).

use log::{info, warn};

use crate::app::ports::KvStorePort;
use crate::error::KvError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{
    EspError, ESP_ERR_NVS_CORRUPT_KEY_PART, ESP_ERR_NVS_INVALID_LENGTH,
    ESP_ERR_NVS_NOT_ENOUGH_SPACE, ESP_ERR_NVS_NOT_FOUND,
};

#[cfg(not(target_os = "espidf"))]
use std::collections::BTreeMap;
#[cfg(not(target_os = "espidf"))]
use std::sync::{Arc, Mutex, MutexGuard};

#[cfg(target_os = "espidf")]
#[derive(Clone)]
pub struct NvsAdapter {
    partition: EspDefaultNvsPartition,
}

#[cfg(target_os = "espidf")]
impl NvsAdapter {
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, KvError> {
        info!("NVS: default partition ready");
        Ok(Self { partition })
    }

    fn open(&self, namespace: &str, read_write: bool) -> Result<EspNvs<NvsDefault>, KvError> {
        EspNvs::new(self.partition.clone(), namespace, read_write).map_err(kv_err)
    }
}

#[cfg(target_os = "espidf")]
const NOT_FOUND: i32 = ESP_ERR_NVS_NOT_FOUND as i32;
#[cfg(target_os = "espidf")]
const INVALID_LENGTH: i32 = ESP_ERR_NVS_INVALID_LENGTH as i32;
#[cfg(target_os = "espidf")]
const NOT_ENOUGH_SPACE: i32 = ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32;
#[cfg(target_os = "espidf")]
const CORRUPT_KEY_PART: i32 = ESP_ERR_NVS_CORRUPT_KEY_PART as i32;

#[cfg(target_os = "espidf")]
fn kv_err(e: EspError) -> KvError {
    match e.code() {
        NOT_FOUND => KvError::NotFound,
        INVALID_LENGTH => KvError::TooLarge,
        NOT_ENOUGH_SPACE => KvError::Full,
        CORRUPT_KEY_PART => KvError::Corrupted,
        code => KvError::Io(code),
    }
}

#[cfg(target_os = "espidf")]
impl KvStorePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, KvError> {
        // A namespace that was never written cannot be opened read-only.
        let nvs = self.open(namespace, false)?;
        match nvs.blob_len(key).map_err(kv_err)? {
            None => Err(KvError::NotFound),
            Some(len) if len > buf.len() => Err(KvError::TooLarge),
            Some(_) => nvs
                .get_blob(key, buf)
                .map_err(kv_err)?
                .map(<[u8]>::len)
                .ok_or(KvError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), KvError> {
        let mut nvs = self.open(namespace, true)?;
        nvs.set_blob(key, data).map_err(|e| {
            warn!("NVS: write {}/{} failed ({})", namespace, key, e);
            kv_err(e)
        })
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), KvError> {
        let mut nvs = self.open(namespace, true)?;
        match nvs.remove(key) {
            Ok(_) => Ok(()),
            Err(e) if e.code() == NOT_FOUND => Ok(()),
            Err(e) => Err(kv_err(e)),
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.open(namespace, false)
            .and_then(|nvs| nvs.contains(key).map_err(kv_err))
            .unwrap_or(false)
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
type SimStore = BTreeMap<(String, String), Vec<u8>>;

/// In-memory store; clones share the same map.
#[cfg(not(target_os = "espidf"))]
#[derive(Clone, Default)]
pub struct NvsAdapter {
    entries: Arc<Mutex<SimStore>>,
}

#[cfg(not(target_os = "espidf"))]
impl NvsAdapter {
    pub fn new() -> Result<Self, KvError> {
        info!("NVS: simulation backend");
        Ok(Self::default())
    }

    /// Number of keys held across all namespaces.
    pub fn key_count(&self) -> usize {
        self.entries().len()
    }

    fn entries(&self) -> MutexGuard<'_, SimStore> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(not(target_os = "espidf"))]
fn sim_key(namespace: &str, key: &str) -> (String, String) {
    (namespace.to_owned(), key.to_owned())
}

#[cfg(not(target_os = "espidf"))]
impl KvStorePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, KvError> {
        let entries = self.entries();
        let value = entries
            .get(&sim_key(namespace, key))
            .ok_or(KvError::NotFound)?;
        let dst = buf.get_mut(..value.len()).ok_or(KvError::TooLarge)?;
        dst.copy_from_slice(value);
        Ok(value.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), KvError> {
        if key.len() > 15 {
            warn!("NVS: key '{}' exceeds 15 bytes", key);
            return Err(KvError::Io(-1));
        }
        self.entries().insert(sim_key(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), KvError> {
        self.entries().remove(&sim_key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.entries().contains_key(&sim_key(namespace, key))
    }
}
