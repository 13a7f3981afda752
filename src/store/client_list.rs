//! `CLIENT LIST` reply parsing.
//!
//! Each line of the reply describes one connected client as space separated
//! `key=value` pairs, e.g.
//!
//! ```text
//! id=7 addr=10.0.0.4:51234 laddr=10.0.0.9:6379 fd=9 name=app-01 age=12 idle=0 flags=P db=0 sub=1 psub=0 cmd=subscribe user=default
//! ```

/// Command name reported for a client blocked in `SUBSCRIBE`.
pub const SUBSCRIBE_COMMAND: &str = "subscribe";

/// One client session as seen by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSession {
    /// Store-assigned client id.
    pub id: Option<u64>,
    /// Peer address of the client socket.
    pub addr: String,
    /// Name registered with `CLIENT SETNAME`; carries the owning host.
    pub name: String,
    /// Command the client is executing, or executed last.
    pub cmd: String,
}

impl ClientSession {
    /// Build a session from a host name and command.
    pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            ..Self::default()
        }
    }

    /// Host identifier the session was registered under.
    pub fn host(&self) -> &str {
        &self.name
    }

    /// True when the session is currently a channel subscriber.
    pub fn is_subscribing(&self) -> bool {
        self.cmd == SUBSCRIBE_COMMAND
    }

    /// Parse one `CLIENT LIST` line. Returns `None` for blank lines.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let mut session = ClientSession::default();
        for pair in line.split_whitespace() {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "id" => session.id = value.parse().ok(),
                "addr" => session.addr = value.to_string(),
                "name" => session.name = value.to_string(),
                "cmd" => session.cmd = value.to_string(),
                _ => {}
            }
        }
        Some(session)
    }
}

/// Parse the full `CLIENT LIST` reply body.
pub fn parse_client_list(raw: &str) -> Vec<ClientSession> {
    raw.lines().filter_map(ClientSession::parse_line).collect()
}
