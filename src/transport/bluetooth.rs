//! # Bluetooth RFCOMM Transport
//!
//! Zebra mobile printers (ZQ5xx, QLn) expose a serial port over Bluetooth
//! Classic. On Linux that port is reached by binding an RFCOMM TTY
//! (`/dev/rfcommN`) to the printer's address and writing ZPL to it.
//!
//! ## Before the first print
//!
//! Pair the printer once with `bluetoothctl`; everything after that is
//! handled by [`BluetoothLink`]:
//!
//! ```bash
//! $ bluetoothctl
//! [bluetooth]# scan on            # wait for "ZQ520" or the serial number
//! [bluetooth]# pair AC:3F:A4:00:11:22
//! [bluetooth]# trust AC:3F:A4:00:11:22
//! ```
//!
//! Binding a new TTY runs `rfcomm bind`, which needs root (or
//! `CAP_NET_ADMIN`). An existing binding is reused without privileges.
//!
//! ## Connector Profiles
//!
//! | Profile | Behavior |
//! |---------|----------|
//! | `default` | reuse an existing binding for the address, bind one if none exists |
//! | `rfcomm` (`rebind`) | release the channel and bind it again from scratch |
//!
//! The TTY is switched to raw mode (`cfmakeraw`) so no byte of the label is
//! translated, echoed or swallowed as flow control, and the payload is sent
//! in paced chunks so the adapter's buffer is never flooded by large
//! graphic fields.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{ConnectOutcome, ConnectorProfile, DeviceInfo, Discovery, PrinterLink};
use crate::error::BayanError;

/// Default RFCOMM channel index (`/dev/rfcomm0`).
pub const DEFAULT_CHANNEL: u8 = 0;

/// Serial Port Profile channel on the printer side.
const SPP_CHANNEL: &str = "1";

/// Seconds an active scan runs for.
const SCAN_SECONDS: u32 = 5;

/// Time given to BlueZ to settle after a connect or bind.
const SETTLE: Duration = Duration::from_millis(500);

/// How a payload is split before it reaches the TTY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Largest single write, in bytes.
    pub chunk: usize,
    /// Pause after each chunk except the last.
    pub pause: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            chunk: 4096,
            pause: Duration::from_millis(2),
        }
    }
}

impl Pacing {
    /// Number of writes a payload of `len` bytes takes.
    pub fn writes(&self, len: usize) -> usize {
        len.div_ceil(self.chunk.max(1)).max(1)
    }
}

// ============================================================================
// RFCOMM PORT
// ============================================================================

/// An open RFCOMM TTY in raw mode.
#[derive(Debug)]
pub struct RfcommPort {
    file: File,
    pacing: Pacing,
}

impl RfcommPort {
    /// Open `device` for writing and put it into raw mode.
    ///
    /// Fails with [`BayanError::Connection`] when the node is missing, not
    /// accessible to this user (add it to the `dialout` group), or is not a
    /// terminal.
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self, BayanError> {
        let path = device.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(path)
            .map_err(|e| BayanError::Connection(format!("cannot open {}: {}", path.display(), e)))?;

        make_raw(&file).map_err(|e| {
            BayanError::Connection(format!("cannot configure {}: {}", path.display(), e))
        })?;

        Ok(Self {
            file,
            pacing: Pacing::default(),
        })
    }

    pub fn set_pacing(&mut self, pacing: Pacing) {
        self.pacing = Pacing {
            chunk: pacing.chunk.max(1),
            ..pacing
        };
    }

    /// Send the whole payload, then flush.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), BayanError> {
        let mut chunks = payload.chunks(self.pacing.chunk).peekable();
        while let Some(chunk) = chunks.next() {
            self.file
                .write_all(chunk)
                .map_err(|e| BayanError::Write(e.to_string()))?;
            if chunks.peek().is_some() && !self.pacing.pause.is_zero() {
                thread::sleep(self.pacing.pause);
            }
        }
        self.file
            .flush()
            .map_err(|e| BayanError::Write(format!("flush: {}", e)))
    }
}

/// Raw 8N1: no line discipline, no echo, no XON/XOFF.
///
/// UTF-8 continuation bytes of Arabic text fall in the range where XON/XOFF
/// handling would eat them, so software flow control must be off.
fn make_raw(file: &File) -> io::Result<()> {
    let fd = file.as_raw_fd();
    // SAFETY: termios is plain data and fully written by tcgetattr before use
    let mut attrs: libc::termios = unsafe { std::mem::zeroed() };
    if unsafe { libc::tcgetattr(fd, &mut attrs) } != 0 {
        return Err(io::Error::last_os_error());
    }
    unsafe { libc::cfmakeraw(&mut attrs) };
    attrs.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &attrs) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

// ============================================================================
// BLUETOOTH LINK
// ============================================================================

/// # Bluetooth Printer Link
///
/// A [`PrinterLink`] to one printer, addressed by its MAC.
///
/// ## Example
///
/// ```no_run
/// use bayan::transport::{BluetoothLink, PrinterSession};
///
/// let link = BluetoothLink::new("AC:3F:A4:00:11:22")?;
/// let mut session = PrinterSession::new(link);
/// session.connect()?;
/// session.write("^XA^FO50,50^A0N,30,30^FDHELLO^FS^XZ\n")?;
/// session.disconnect()?;
/// # Ok::<(), bayan::error::BayanError>(())
/// ```
#[derive(Debug)]
pub struct BluetoothLink {
    address: String,
    channel: u8,
    port: Option<RfcommPort>,
}

impl BluetoothLink {
    /// Link to `address` on RFCOMM channel index 0.
    pub fn new(address: &str) -> Result<Self, BayanError> {
        Self::with_channel(address, DEFAULT_CHANNEL)
    }

    pub fn with_channel(address: &str, channel: u8) -> Result<Self, BayanError> {
        if !is_valid_mac(address) {
            return Err(BayanError::Config(format!(
                "'{}' is not a Bluetooth address (expected six hex pairs separated by ':')",
                address
            )));
        }
        Ok(Self {
            address: address.to_uppercase(),
            channel,
            port: None,
        })
    }

    /// TTY to open for `profile`, binding one if needed.
    fn tty_for(&self, profile: &ConnectorProfile) -> Result<String, BayanError> {
        if profile.rebind {
            release_rfcomm(self.channel);
            return bind_rfcomm(&self.address, self.channel);
        }
        match find_rfcomm_for_mac(&self.address)? {
            Some(path) => {
                debug!(path = %path, "reusing RFCOMM binding");
                Ok(path)
            }
            None => bind_rfcomm(&self.address, self.channel),
        }
    }
}

impl PrinterLink for BluetoothLink {
    fn address(&self) -> &str {
        &self.address
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn connect(&mut self, profile: &ConnectorProfile) -> Result<ConnectOutcome, BayanError> {
        if self.port.is_some() {
            return Ok(ConnectOutcome::AlreadyConnected);
        }
        let path = self.tty_for(profile)?;
        self.port = Some(RfcommPort::open(&path)?);
        info!(path = %path, profile = %profile.name, "RFCOMM port open");
        Ok(ConnectOutcome::Connected)
    }

    fn write(&mut self, payload: &[u8]) -> Result<(), BayanError> {
        self.port
            .as_mut()
            .ok_or_else(|| BayanError::Write("RFCOMM port is not open".to_string()))?
            .send(payload)
    }

    fn disconnect(&mut self) -> Result<(), BayanError> {
        // Closing the TTY keeps the binding for the next job
        self.port = None;
        Ok(())
    }
}

// ============================================================================
// DISCOVERY
// ============================================================================

/// Device discovery through `bluetoothctl`.
#[derive(Debug, Clone, Default)]
pub struct BluetoothDiscovery;

impl Discovery for BluetoothDiscovery {
    fn paired(&self) -> Result<Vec<DeviceInfo>, BayanError> {
        // BlueZ >= 5.65 takes a filter argument; older versions only know paired-devices
        let devices = parse_devices(&bluetoothctl(&["devices", "Paired"])?);
        if !devices.is_empty() {
            return Ok(devices);
        }
        Ok(parse_devices(&bluetoothctl(&["paired-devices"])?))
    }

    fn discover(&self) -> Result<Vec<DeviceInfo>, BayanError> {
        let timeout = SCAN_SECONDS.to_string();
        bluetoothctl(&["--timeout", &timeout, "scan", "on"])?;
        Ok(parse_devices(&bluetoothctl(&["devices"])?))
    }
}

/// Run a Bluetooth utility, mapping a spawn failure to a connection error.
fn run(program: &str, args: &[&str]) -> Result<Output, BayanError> {
    Command::new(program)
        .args(args)
        .output()
        .map_err(|e| BayanError::Connection(format!("{} could not be started: {}", program, e)))
}

fn bluetoothctl(args: &[&str]) -> Result<String, BayanError> {
    Ok(String::from_utf8_lossy(&run("bluetoothctl", args)?.stdout).into_owned())
}

/// Parse `bluetoothctl devices` output (`Device <MAC> <name>` per line).
///
/// Lines that are not device entries (prompts, `[NEW]` notices) are skipped.
/// A device with no name is listed under its address.
pub fn parse_devices(output: &str) -> Vec<DeviceInfo> {
    output
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("Device ")?;
            let (address, name) = match rest.split_once(' ') {
                Some((address, name)) => (address, name.trim()),
                None => (rest, ""),
            };
            if !is_valid_mac(address) {
                return None;
            }
            let name = if name.is_empty() { address } else { name };
            Some(DeviceInfo::new(name, address.to_uppercase()))
        })
        .collect()
}

// ============================================================================
// RFCOMM BINDINGS
// ============================================================================

/// `true` for `XX:XX:XX:XX:XX:XX` with hex digits in either case.
pub fn is_valid_mac(mac: &str) -> bool {
    let mut groups = 0;
    for group in mac.split(':') {
        if group.len() != 2 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
            return false;
        }
        groups += 1;
    }
    groups == 6
}

/// `/dev` path of the binding described by `line` when it names `mac` and
/// the node exists. Lines look like `rfcomm0: AC:3F:A4:00:11:22 channel 1 clean`.
fn rfcomm_device_in(line: &str, mac: &str) -> Option<String> {
    let (name, rest) = line.split_once(':')?;
    if !rest.to_uppercase().contains(mac) {
        return None;
    }
    let path = format!("/dev/{}", name.trim());
    Path::new(&path).exists().then_some(path)
}

/// Existing RFCOMM TTY bound to `mac`, from `/proc/net/rfcomm` or, when
/// the kernel does not expose it, `rfcomm -a`.
pub fn find_rfcomm_for_mac(mac: &str) -> Result<Option<String>, BayanError> {
    let mac = mac.to_uppercase();
    let listing = match fs::read_to_string("/proc/net/rfcomm") {
        Ok(table) => table,
        Err(_) => String::from_utf8_lossy(&run("rfcomm", &["-a"])?.stdout).into_owned(),
    };
    Ok(listing.lines().find_map(|line| rfcomm_device_in(line, &mac)))
}

/// Release `/dev/rfcomm<channel>`. A channel that was not bound is fine.
pub fn release_rfcomm(channel: u8) {
    match run("rfcomm", &["release", &channel.to_string()]) {
        Ok(output) if output.status.success() => debug!(channel, "released RFCOMM channel"),
        Ok(_) => debug!(channel, "RFCOMM channel was not bound"),
        Err(e) => warn!(channel, error = %e, "rfcomm release failed"),
    }
}

/// Bind `/dev/rfcomm<channel>` to `mac`.
///
/// Asks BlueZ to connect, confirms the printer answers an L2CAP echo
/// (`l2ping`), then binds the SPP channel. Needs root for the bind.
pub fn bind_rfcomm(mac: &str, channel: u8) -> Result<String, BayanError> {
    let mac = mac.to_uppercase();
    let path = format!("/dev/rfcomm{}", channel);

    info!(device = %mac, "connecting");
    let reply = bluetoothctl(&["connect", &mac])?;
    if !(reply.contains("Connection successful") || reply.contains("already connected")) {
        // l2ping below is the real check
        debug!(output = %reply.trim(), "bluetoothctl did not confirm the connection");
    }
    thread::sleep(SETTLE);

    let ping = run("l2ping", &["-c", "1", &mac])?;
    if !ping.status.success() {
        return Err(BayanError::Connection(format!(
            "{} does not answer: {}",
            mac,
            String::from_utf8_lossy(&ping.stderr).trim()
        )));
    }

    let bind = run("rfcomm", &["bind", &channel.to_string(), &mac, SPP_CHANNEL])?;
    if !bind.status.success() {
        return Err(BayanError::Connection(format!(
            "rfcomm bind {} refused: {}",
            channel,
            String::from_utf8_lossy(&bind.stderr).trim()
        )));
    }
    thread::sleep(SETTLE);

    if !Path::new(&path).exists() {
        return Err(BayanError::Connection(format!("{} did not appear after bind", path)));
    }
    info!(path = %path, "bound RFCOMM device");
    Ok(path)
}

// ============================================================================
// TESTS
// ============================================================================
