// Manager-session client
//
// Owns one TCP connection to the switch's manager port and drives the
// greeting / login / action exchange. Every protocol step runs under the
// caller-supplied deadline, and responses are correlated to their action
// by `ActionID` so unsolicited event traffic never satisfies a waiter.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, trace};

use crate::error::Error;
use crate::protocol::{Action, Packet};

const GREETING_PREFIX: &str = "Asterisk Call Manager/";

/// Client for one authenticated session on the switch's manager port.
///
/// The lifecycle is `connect` → `login` → any number of reload actions →
/// `logoff`. Each action is sent with a fresh `ActionID` and the reply
/// loop discards event packets and stale responses until the correlated
/// acknowledgement arrives or the per-action deadline elapses.
pub struct AmiClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    action_timeout: Duration,
    next_action_id: u64,
    protocol_version: String,
}

impl AmiClient {
    /// Open a TCP connection and consume the protocol greeting.
    ///
    /// `action_timeout` bounds the TCP connect, the greeting read, and
    /// every subsequent action round-trip individually. The greeting is
    /// a single non-packet line (`Asterisk Call Manager/<ver>`); anything
    /// else means we are not talking to a manager port.
    pub async fn connect(host: &str, port: u16, action_timeout: Duration) -> Result<Self, Error> {
        debug!(host = %host, port, "connecting to switch manager");

        let stream = tokio::time::timeout(action_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| Error::Timeout {
                action: "Connect".to_string(),
                timeout_secs: action_timeout.as_secs(),
            })?
            .map_err(|source| Error::Connect {
                host: host.to_string(),
                port,
                source,
            })?;

        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let mut greeting = String::new();
        let read = tokio::time::timeout(action_timeout, reader.read_line(&mut greeting))
            .await
            .map_err(|_| Error::Timeout {
                action: "Greeting".to_string(),
                timeout_secs: action_timeout.as_secs(),
            })??;
        if read == 0 {
            return Err(Error::ConnectionClosed);
        }

        let greeting = greeting.trim_end();
        let Some(version) = greeting.strip_prefix(GREETING_PREFIX) else {
            return Err(Error::Protocol {
                message: format!("unexpected greeting {greeting:?}"),
            });
        };

        debug!(version = %version, "manager session established");
        Ok(Self {
            reader,
            writer: write_half,
            action_timeout,
            next_action_id: 0,
            protocol_version: version.to_string(),
        })
    }

    /// Protocol version reported in the greeting, e.g. `"5.0.2"`.
    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Authenticate with plaintext `Login`.
    ///
    /// The secret crosses the wire exactly once here and is never logged.
    pub async fn login(&mut self, username: &str, secret: &SecretString) -> Result<(), Error> {
        let response = self
            .round_trip(Action::login(username, secret.expose_secret()))
            .await?;

        if response.is_success() {
            debug!(username = %username, "authenticated");
            Ok(())
        } else {
            Err(Error::Authentication {
                message: response.message().to_string(),
            })
        }
    }

    /// Reload the PJSIP stack (endpoints, auths, AORs).
    pub async fn pjsip_reload(&mut self) -> Result<(), Error> {
        self.acknowledged(Action::pjsip_reload()).await
    }

    /// Reload the dialplan via a console `Command` action.
    pub async fn dialplan_reload(&mut self) -> Result<(), Error> {
        self.acknowledged(Action::dialplan_reload()).await
    }

    /// End the session. Best-effort: an unacknowledged `Logoff` still
    /// closes the connection, it is never worth failing a sync over.
    pub async fn logoff(mut self) {
        if let Err(error) = self.round_trip(Action::logoff()).await {
            debug!(error = %error, "logoff not acknowledged, closing anyway");
        }
    }

    /// Send an action and require a `Response: Success` acknowledgement.
    async fn acknowledged(&mut self, action: Action) -> Result<(), Error> {
        let name = action.name();
        let response = self.round_trip(action).await?;

        if response.is_success() {
            debug!(action = name, "action acknowledged");
            Ok(())
        } else {
            Err(Error::ActionFailed {
                action: name.to_string(),
                message: response.message().to_string(),
            })
        }
    }

    // ── Wire exchange ────────────────────────────────────────────────

    /// Send one action and read packets until its correlated response
    /// arrives, all under the per-action deadline.
    async fn round_trip(&mut self, action: Action) -> Result<Packet, Error> {
        self.next_action_id += 1;
        let action_id = format!("dialtone-{}", self.next_action_id);
        let name = action.name();
        trace!(action = name, action_id = %action_id, "sending action");

        let wire = action.to_wire(&action_id);
        tokio::time::timeout(self.action_timeout, self.exchange(&wire, &action_id))
            .await
            .map_err(|_| Error::Timeout {
                action: name.to_string(),
                timeout_secs: self.action_timeout.as_secs(),
            })?
    }

    async fn exchange(&mut self, wire: &str, action_id: &str) -> Result<Packet, Error> {
        self.writer.write_all(wire.as_bytes()).await?;

        loop {
            let packet = self.read_packet().await?;

            if packet.is_event() {
                trace!(
                    event = packet.get("Event").unwrap_or(""),
                    "skipping unsolicited event"
                );
                continue;
            }

            match packet.action_id() {
                Some(id) if id == action_id => return Ok(packet),
                // Stale response from an action we already gave up on.
                other => trace!(action_id = ?other, "discarding uncorrelated packet"),
            }
        }
    }

    /// Read one blank-line-terminated packet.
    async fn read_packet(&mut self) -> Result<Packet, Error> {
        let mut lines: Vec<String> = Vec::new();
        loop {
            let line = self.read_line().await?;
            if line.is_empty() {
                if !lines.is_empty() {
                    return Ok(Packet::parse(&lines));
                }
                // Stray blank between packets; keep reading.
            } else {
                lines.push(line);
            }
        }
    }

    async fn read_line(&mut self) -> Result<String, Error> {
        let mut buf = String::new();
        if self.reader.read_line(&mut buf).await? == 0 {
            return Err(Error::ConnectionClosed);
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(buf)
    }
}

impl std::fmt::Debug for AmiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmiClient")
            .field("protocol_version", &self.protocol_version)
            .field("action_timeout", &self.action_timeout)
            .finish_non_exhaustive()
    }
}
