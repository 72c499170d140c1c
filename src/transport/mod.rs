//! # Printer Transport Layer
//!
//! This module provides communication backends for sending labels to
//! printers.
//!
//! ## Layers
//!
//! | Item | Role |
//! |------|------|
//! | [`PrinterLink`] | one device connection: connect, write, disconnect |
//! | [`Discovery`] | paired and nearby devices |
//! | [`ConnectorProfile`] | delimiter and charset used on a connection |
//! | [`session::PrinterSession`] | connection state machine with profile fallback |
//!
//! ## Available Transports
//!
//! - [`bluetooth`]: Bluetooth RFCOMM for wireless printing (Linux)

pub mod bluetooth;
pub mod session;

use std::collections::BTreeMap;

use encoding_rs::WINDOWS_1252;
use tracing::warn;

use crate::error::BayanError;

pub use bluetooth::{BluetoothDiscovery, BluetoothLink};
pub use session::{PrinterSession, SessionState};

/// A printer as seen by discovery. The address is its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub address: String,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Character encoding applied to the payload before it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    /// Windows-1252, the superset browsers and printers accept as latin1.
    Latin1,
}

impl Charset {
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Latin1 => {
                let (bytes, _, unmappable) = WINDOWS_1252.encode(text);
                if unmappable {
                    warn!("payload has characters outside latin1, they were replaced");
                }
                bytes.into_owned()
            }
        }
    }
}

/// Link-layer parameters for one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorProfile {
    pub name: String,
    /// Record delimiter appended to a payload that does not already end
    /// with it.
    pub delimiter: Option<String>,
    pub charset: Charset,
    /// Drop any existing serial binding and create a fresh one.
    pub rebind: bool,
}

impl Default for ConnectorProfile {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            delimiter: None,
            charset: Charset::Utf8,
            rebind: false,
        }
    }
}

impl ConnectorProfile {
    /// Alternate profile tried when the default one fails.
    pub fn rfcomm() -> Self {
        Self {
            name: "rfcomm".to_string(),
            delimiter: Some("\n".to_string()),
            charset: Charset::Utf8,
            rebind: true,
        }
    }

    /// Bytes written for `payload` on a connection using this profile.
    pub fn frame(&self, payload: &str) -> Vec<u8> {
        let mut bytes = self.charset.encode(payload);
        if let Some(delimiter) = &self.delimiter {
            let delimiter = self.charset.encode(delimiter);
            if !bytes.ends_with(&delimiter) {
                bytes.extend_from_slice(&delimiter);
            }
        }
        bytes
    }
}

/// Whether a successful connect opened a new connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    AlreadyConnected,
}

/// One connection-oriented serial link to a printer.
///
/// Calls are blocking. A link is owned by exactly one session.
pub trait PrinterLink {
    /// Hardware address of the device.
    fn address(&self) -> &str;

    fn is_connected(&self) -> bool;

    fn connect(&mut self, profile: &ConnectorProfile) -> Result<ConnectOutcome, BayanError>;

    /// Deliver the whole payload or fail.
    fn write(&mut self, payload: &[u8]) -> Result<(), BayanError>;

    fn disconnect(&mut self) -> Result<(), BayanError>;
}

/// Source of printer devices.
pub trait Discovery {
    /// Devices already paired with this host.
    fn paired(&self) -> Result<Vec<DeviceInfo>, BayanError>;

    /// Devices found by an active scan.
    fn discover(&self) -> Result<Vec<DeviceInfo>, BayanError>;
}

/// Merge device lists, de-duplicated by address (case-insensitive).
///
/// Earlier lists win, so a paired device keeps its paired name. The result
/// is ordered by address.
pub fn merge_devices<I>(lists: I) -> Vec<DeviceInfo>
where
    I: IntoIterator<Item = Vec<DeviceInfo>>,
{
    let mut merged: BTreeMap<String, DeviceInfo> = BTreeMap::new();
    for device in lists.into_iter().flatten() {
        merged.entry(device.address.to_uppercase()).or_insert(device);
    }
    merged.into_values().collect()
}

/// Paired devices plus whatever an active scan finds. A failed scan is
/// logged and the paired list is still returned.
pub fn list_devices(discovery: &dyn Discovery) -> Result<Vec<DeviceInfo>, BayanError> {
    let paired = discovery.paired()?;
    let discovered = match discovery.discover() {
        Ok(devices) => devices,
        Err(e) => {
            warn!(error = %e, "device scan failed, listing paired devices only");
            Vec::new()
        }
    };
    Ok(merge_devices([paired, discovered]))
}

// ============================================================================
// TESTS
// ============================================================================
