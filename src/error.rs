//! Error types for the demo firmware.
//!
//! Each port has its own small `Copy` enum so adapters and domain code can
//! match on exact causes; everything funnels into [`Error`] for callers that
//! only need to log and move on. Vendor result codes travel as `i32`.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Kv(KvError),
    Wifi(WifiError),
    Console(ConsoleError),
    Upload(UploadError),
    Command(CommandError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kv(e) => write!(f, "kv: {e}"),
            Self::Wifi(e) => write!(f, "wifi: {e}"),
            Self::Console(e) => write!(f, "console: {e}"),
            Self::Upload(e) => write!(f, "upload: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Key-value store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvError {
    NotFound,
    /// Stored value does not fit the caller's buffer.
    TooLarge,
    /// Entry is damaged in flash, or its bytes are not valid for the key.
    Corrupted,
    Full,
    /// Vendor storage error code.
    Io(i32),
}

impl fmt::Display for KvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::TooLarge => write!(f, "value too large"),
            Self::Corrupted => write!(f, "stored value corrupted"),
            Self::Full => write!(f, "storage full"),
            Self::Io(code) => write!(f, "I/O error (0x{code:x})"),
        }
    }
}

impl From<KvError> for Error {
    fn from(e: KvError) -> Self {
        Self::Kv(e)
    }
}

// ---------------------------------------------------------------------------
// Wi-Fi
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiError {
    /// Auth-type string is not in the supported table.
    UnsupportedAuth,
    /// Retry policy allowed zero attempts.
    NoAttempts,
    InitFailed(i32),
    ConnectFailed(i32),
    DisconnectFailed(i32),
    ScanFailed(i32),
    ScanInProgress,
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedAuth => write!(f, "unsupported auth type"),
            Self::NoAttempts => write!(f, "no connection attempts allowed"),
            Self::InitFailed(code) => write!(f, "driver init failed (0x{code:x})"),
            Self::ConnectFailed(code) => write!(f, "connect failed (0x{code:x})"),
            Self::DisconnectFailed(code) => write!(f, "disconnect failed (0x{code:x})"),
            Self::ScanFailed(code) => write!(f, "scan failed (0x{code:x})"),
            Self::ScanInProgress => write!(f, "scan already in progress"),
        }
    }
}

impl From<WifiError> for Error {
    fn from(e: WifiError) -> Self {
        Self::Wifi(e)
    }
}

// ---------------------------------------------------------------------------
// Console (UART)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    Timeout,
    Io(i32),
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "read timed out"),
            Self::Io(code) => write!(f, "UART error (0x{code:x})"),
        }
    }
}

impl From<ConsoleError> for Error {
    fn from(e: ConsoleError) -> Self {
        Self::Console(e)
    }
}

// ---------------------------------------------------------------------------
// Chunk upload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadError {
    /// Client could not be created (TLS/socket layer).
    ClientInit(i32),
    /// Root CA bundle could not be attached.
    RootCerts(i32),
    NotConnected,
    Request(i32),
    /// Server answered with a non-2xx status.
    Status(u16),
    Encode,
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientInit(code) => write!(f, "HTTP client init failed (0x{code:x})"),
            Self::RootCerts(code) => write!(f, "root CA load failed (0x{code:x})"),
            Self::NotConnected => write!(f, "network not connected"),
            Self::Request(code) => write!(f, "request failed (0x{code:x})"),
            Self::Status(status) => write!(f, "server returned HTTP {status}"),
            Self::Encode => write!(f, "chunk encoding failed"),
        }
    }
}

impl From<UploadError> for Error {
    fn from(e: UploadError) -> Self {
        Self::Upload(e)
    }
}

// ---------------------------------------------------------------------------
// Shell commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Wrong argument count; carries the usage line.
    Usage(&'static str),
    Kv(KvError),
    Wifi(WifiError),
    /// Console output failed mid-command.
    Output,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(usage) => write!(f, "usage: {usage}"),
            Self::Kv(e) => write!(f, "{e}"),
            Self::Wifi(e) => write!(f, "{e}"),
            Self::Output => write!(f, "console write failed"),
        }
    }
}

impl From<KvError> for CommandError {
    fn from(e: KvError) -> Self {
        Self::Kv(e)
    }
}

impl From<WifiError> for CommandError {
    fn from(e: WifiError) -> Self {
        Self::Wifi(e)
    }
}

impl From<core::fmt::Error> for CommandError {
    fn from(_: core::fmt::Error) -> Self {
        Self::Output
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
