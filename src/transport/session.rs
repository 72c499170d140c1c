//! # Printer Session
//!
//! Connection state machine over a [`PrinterLink`]:
//!
//! ```text
//!                 connect()
//! Disconnected ─────────────► Connecting ──── all profiles failed ───┐
//!      ▲                          │                                  │
//!      │                          │ any profile succeeded            │
//!      │ disconnect()             ▼                                  │
//!      └───────────────────── Connected ◄──┐                         │
//!                                 │        │ ok / write error        │
//!                          write()│        │                         │
//!                                 ▼        │                         │
//!                              Writing ────┘                         │
//!      ▲                                                             │
//!      └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A write failure leaves the session `Connected` so the caller can retry
//! without reconnecting. All methods take `&mut self`, which rules out
//! concurrent connects or overlapping writes on one session.

use tracing::{debug, info, instrument, warn};

use super::{ConnectOutcome, ConnectorProfile, PrinterLink};
use crate::error::BayanError;

/// Session connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Writing,
}

/// Owns one printer link for its lifetime.
#[derive(Debug)]
pub struct PrinterSession<L: PrinterLink> {
    link: L,
    profiles: Vec<ConnectorProfile>,
    active: Option<usize>,
    state: SessionState,
}

impl<L: PrinterLink> PrinterSession<L> {
    /// Session trying the default profile, then [`ConnectorProfile::rfcomm`].
    pub fn new(link: L) -> Self {
        Self::with_profiles(link, vec![ConnectorProfile::default(), ConnectorProfile::rfcomm()])
    }

    /// Session with an explicit profile order.
    pub fn with_profiles(link: L, profiles: Vec<ConnectorProfile>) -> Self {
        Self {
            link,
            profiles,
            active: None,
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Profile the current connection was made with.
    pub fn active_profile(&self) -> Option<&ConnectorProfile> {
        self.active.and_then(|i| self.profiles.get(i))
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn into_link(self) -> L {
        self.link
    }

    /// Connect, trying each profile in order.
    ///
    /// A device that already reports a connection is adopted without a new
    /// connect call. The error from the last profile is returned with
    /// recovery guidance once every profile has failed.
    #[instrument(skip(self), fields(device = %self.link.address()))]
    pub fn connect(&mut self) -> Result<(), BayanError> {
        if self.link.is_connected() {
            if self.active.is_none() {
                self.active = Some(0);
            }
            self.state = SessionState::Connected;
            debug!("device already connected");
            return Ok(());
        }

        if self.profiles.is_empty() {
            return Err(BayanError::Config("no connector profiles configured".to_string()));
        }

        self.state = SessionState::Connecting;
        let mut last_error = None;

        for (i, profile) in self.profiles.iter().enumerate() {
            match self.link.connect(profile) {
                Ok(outcome) => {
                    self.active = Some(i);
                    self.state = SessionState::Connected;
                    match outcome {
                        ConnectOutcome::Connected => info!(profile = %profile.name, "connected"),
                        ConnectOutcome::AlreadyConnected => {
                            info!(profile = %profile.name, "device reported an existing connection")
                        }
                    }
                    return Ok(());
                }
                Err(e) => {
                    warn!(profile = %profile.name, error = %e, "connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        self.state = SessionState::Disconnected;
        self.active = None;
        let cause = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(BayanError::connection_exhausted(self.link.address(), &cause))
    }

    /// Write a complete document. Returns the number of bytes sent.
    ///
    /// The payload is framed with the active profile's charset and
    /// delimiter. On failure the session stays connected.
    #[instrument(skip(self, payload), fields(device = %self.link.address(), len = payload.len()))]
    pub fn write(&mut self, payload: &str) -> Result<usize, BayanError> {
        if self.state != SessionState::Connected {
            return Err(BayanError::Write(format!(
                "session is {:?}, connect before writing",
                self.state
            )));
        }

        let bytes = match self.active_profile() {
            Some(profile) => profile.frame(payload),
            None => payload.as_bytes().to_vec(),
        };

        self.state = SessionState::Writing;
        let result = self.link.write(&bytes);
        self.state = SessionState::Connected;

        match result {
            Ok(()) => {
                info!(bytes = bytes.len(), "payload delivered");
                Ok(bytes.len())
            }
            Err(BayanError::Write(msg)) => Err(BayanError::Write(msg)),
            Err(e) => Err(BayanError::Write(e.to_string())),
        }
    }

    /// Close the connection. Disconnecting a disconnected session is a
    /// no-op.
    #[instrument(skip(self), fields(device = %self.link.address()))]
    pub fn disconnect(&mut self) -> Result<(), BayanError> {
        if self.state == SessionState::Disconnected && !self.link.is_connected() {
            return Ok(());
        }
        let result = self.link.disconnect();
        self.state = SessionState::Disconnected;
        self.active = None;
        info!("disconnected");
        result
    }

    /// Disconnect after a unit of work and hand back its outcome.
    ///
    /// A failing disconnect is logged, never returned: the outcome of the
    /// work is what the caller acts on.
    pub fn finish<T>(&mut self, outcome: Result<T, BayanError>) -> Result<T, BayanError> {
        if let Err(e) = self.disconnect() {
            warn!(device = %self.link.address(), error = %e, "disconnect failed");
        }
        outcome
    }
}

// ============================================================================
// TESTS
// ============================================================================
