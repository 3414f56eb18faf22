//! Manager-protocol framing: packets and actions.
//!
//! The wire format is line-oriented: a packet is a run of `Key: Value`
//! lines with CRLF endings, terminated by an empty line. The greeting
//! (`Asterisk Call Manager/<ver>`) is the only non-packet line the
//! server ever sends, and [`crate::AmiClient`] consumes it before any
//! packet parsing starts.

// ── Packet ───────────────────────────────────────────────────────────

/// A parsed manager packet: ordered `Key: Value` fields.
///
/// Field order is preserved as received. Lookup is case-insensitive to
/// match how Asterisk treats header names. Lines without a separator
/// (e.g. `--END COMMAND--` trailers from `Command` output) are kept
/// under an empty key so nothing from the switch is silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    fields: Vec<(String, String)>,
}

impl Packet {
    /// Parse a packet from its raw lines (line terminators already stripped).
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Self {
        let fields = lines
            .iter()
            .map(|line| {
                let line = line.as_ref();
                match line.split_once(':') {
                    Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
                    None => (String::new(), line.to_string()),
                }
            })
            .collect();
        Self { fields }
    }

    /// First value for `key`, compared case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// The `Response` header, if present.
    pub fn response(&self) -> Option<&str> {
        self.get("Response")
    }

    /// The `ActionID` header, if present.
    pub fn action_id(&self) -> Option<&str> {
        self.get("ActionID")
    }

    /// The `Message` header, or an empty string.
    pub fn message(&self) -> &str {
        self.get("Message").unwrap_or_default()
    }

    /// `true` if this is an unsolicited event, not an action response.
    pub fn is_event(&self) -> bool {
        self.get("Event").is_some()
    }

    /// `true` if the switch acknowledged the action.
    ///
    /// `Success` is the normal acknowledgement; `Follows` precedes
    /// multi-line `Command` output and `Goodbye` answers `Logoff`.
    pub fn is_success(&self) -> bool {
        matches!(
            self.response(),
            Some(r) if r.eq_ignore_ascii_case("Success")
                || r.eq_ignore_ascii_case("Follows")
                || r.eq_ignore_ascii_case("Goodbye")
        )
    }

    /// All fields, in wire order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// ── Action ───────────────────────────────────────────────────────────

/// An outgoing manager action.
///
/// Serialized as an `Action: <name>` line, the `ActionID` assigned by
/// the client, then the action's own fields, CRLF throughout, blank
/// line terminated.
#[derive(Debug, Clone)]
pub struct Action {
    name: &'static str,
    fields: Vec<(&'static str, String)>,
}

impl Action {
    /// A bare action with no fields beyond `Action` and `ActionID`.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Append a field. Builder-style, so constructors read as one expression.
    #[must_use]
    pub fn field(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((key, value.into()));
        self
    }

    /// `Login` with plaintext authentication.
    pub fn login(username: &str, secret: &str) -> Self {
        Self::new("Login")
            .field("Username", username)
            .field("Secret", secret)
    }

    /// `PJSIPReload`: reload the PJSIP stack (endpoints, auths, AORs).
    pub fn pjsip_reload() -> Self {
        Self::new("PJSIPReload")
    }

    /// `Command` running `dialplan reload` on the switch console.
    pub fn dialplan_reload() -> Self {
        Self::new("Command").field("Command", "dialplan reload")
    }

    /// `Logoff`: end the session cleanly.
    pub fn logoff() -> Self {
        Self::new("Logoff")
    }

    /// The action name, as sent in the `Action` header.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Serialize to wire bytes with the given correlation id.
    pub fn to_wire(&self, action_id: &str) -> String {
        let mut out = String::new();
        out.push_str("Action: ");
        out.push_str(self.name);
        out.push_str("\r\n");
        out.push_str("ActionID: ");
        out.push_str(action_id);
        out.push_str("\r\n");
        for (key, value) in &self.fields {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_response_packet() {
        let packet = Packet::parse(&[
            "Response: Success",
            "ActionID: dialtone-1",
            "Message: Authentication accepted",
        ]);

        assert_eq!(packet.response(), Some("Success"));
        assert_eq!(packet.action_id(), Some("dialtone-1"));
        assert_eq!(packet.message(), "Authentication accepted");
        assert!(packet.is_success());
        assert!(!packet.is_event());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let packet = Packet::parse(&["response: Error", "actionid: x", "message: nope"]);

        assert_eq!(packet.response(), Some("Error"));
        assert_eq!(packet.action_id(), Some("x"));
        assert_eq!(packet.message(), "nope");
        assert!(!packet.is_success());
    }

    #[test]
    fn event_packet_detected() {
        let packet = Packet::parse(&["Event: PeerStatus", "Peer: PJSIP/101"]);

        assert!(packet.is_event());
        assert_eq!(packet.response(), None);
        assert_eq!(packet.get("Peer"), Some("PJSIP/101"));
    }

    #[test]
    fn separatorless_line_kept_under_empty_key() {
        let packet = Packet::parse(&[
            "Response: Follows",
            "Dialplan reloaded.",
            "--END COMMAND--",
        ]);

        assert!(packet.is_success());
        assert_eq!(packet.get(""), Some("Dialplan reloaded."));
    }

    #[test]
    fn value_whitespace_trimmed_but_colons_kept() {
        let packet = Packet::parse(&["Message: error: no such command"]);

        // Only the first colon splits; the rest belongs to the value.
        assert_eq!(packet.message(), "error: no such command");
    }

    #[test]
    fn goodbye_counts_as_acknowledgement() {
        let packet = Packet::parse(&["Response: Goodbye", "Message: Thanks for all the fish."]);
        assert!(packet.is_success());
    }

    #[test]
    fn login_wire_format() {
        let wire = Action::login("manager", "s3cret").to_wire("dialtone-7");

        assert_eq!(
            wire,
            "Action: Login\r\n\
             ActionID: dialtone-7\r\n\
             Username: manager\r\n\
             Secret: s3cret\r\n\
             \r\n"
        );
    }

    #[test]
    fn dialplan_reload_uses_command_action() {
        let action = Action::dialplan_reload();
        assert_eq!(action.name(), "Command");

        let wire = action.to_wire("dialtone-2");
        assert!(wire.contains("Command: dialplan reload\r\n"));
        assert!(wire.ends_with("\r\n\r\n"));
    }

    #[test]
    fn bare_action_wire_format() {
        let wire = Action::pjsip_reload().to_wire("dialtone-3");
        assert_eq!(wire, "Action: PJSIPReload\r\nActionID: dialtone-3\r\n\r\n");
    }
}
