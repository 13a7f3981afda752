//! A scripted store server speaking just enough of the protocol for the
//! `redis` client: AUTH, SELECT, PING, CLIENT SETINFO/SETNAME/LIST and SUBSCRIBE.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;


enum Outbound {
    Data(Vec<u8>),
    Close,
}

struct MockClient {
    addr: String,
    name: String,
    cmd: String,
    channels: Vec<String>,
    outbox: mpsc::UnboundedSender<Outbound>,
}

#[derive(Default)]
struct MockState {
    next_id: u64,
    clients: BTreeMap<u64, MockClient>,
}

/// Handle to a running mock server.
#[derive(Clone)]
pub struct MockStore {
    pub addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
}

impl MockStore {
    /// Start a server on an ephemeral port, optionally requiring `password`.
    pub async fn start(password: Option<&str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(MockState::default()));
        let password = password.map(str::to_string);

        let accept_state = state.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, peer)) => {
                        let (tx, rx) = mpsc::unbounded_channel();
                        let id = {
                            let mut state = accept_state.lock().unwrap();
                            state.next_id += 1;
                            let id = state.next_id;
                            state.clients.insert(
                                id,
                                MockClient {
                                    addr: peer.to_string(),
                                    name: String::new(),
                                    cmd: "NULL".to_string(),
                                    channels: Vec::new(),
                                    outbox: tx,
                                },
                            );
                            id
                        };
                        tokio::spawn(serve(socket, id, accept_state.clone(), rx, password.clone()));
                    }
                    Err(_) => break,
                }
            }
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("redis://{}", self.addr)
    }

    /// (name, cmd) of every connected client.
    pub fn sessions(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .unwrap()
            .clients
            .values()
            .map(|c| (c.name.clone(), c.cmd.clone()))
            .collect()
    }

    /// Number of clients of `name` currently subscribed.
    pub fn subscribers(&self, name: &str) -> usize {
        self.sessions()
            .iter()
            .filter(|(n, cmd)| n == name && cmd == "subscribe")
            .count()
    }

    /// Deliver `payload` to every subscriber of `channel`.
    pub fn publish(&self, channel: &str, payload: &[u8]) -> usize {
        let frame = redis::cmd("message")
            .arg(channel)
            .arg(payload)
            .get_packed_command();
        let state = self.state.lock().unwrap();
        let mut delivered = 0;
        for client in state.clients.values() {
            if client.channels.iter().any(|c| c == channel)
                && client.outbox.send(Outbound::Data(frame.clone())).is_ok()
            {
                delivered += 1;
            }
        }
        delivered
    }

    /// The standby takes over: every socket is closed and all state is lost.
    pub fn failover(&self) {
        let mut state = self.state.lock().unwrap();
        for client in state.clients.values() {
            let _ = client.outbox.send(Outbound::Close);
        }
        state.clients.clear();
    }
}

async fn serve(
    mut socket: TcpStream,
    id: u64,
    state: Arc<Mutex<MockState>>,
    mut outbox: mpsc::UnboundedReceiver<Outbound>,
    password: Option<String>,
) {
    let mut authed = password.is_none();
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    'conn: loop {
        tokio::select! {
            out = outbox.recv() => match out {
                Some(Outbound::Data(bytes)) => {
                    if socket.write_all(&bytes).await.is_err() {
                        break 'conn;
                    }
                }
                Some(Outbound::Close) | None => break 'conn,
            },
            read = socket.read(&mut chunk) => {
                let n = match read {
                    Ok(0) | Err(_) => break 'conn,
                    Ok(n) => n,
                };
                buf.extend_from_slice(&chunk[..n]);
                while let Some((args, used)) = next_command(&buf) {
                    buf.drain(..used);
                    let reply = handle_command(args, id, &state, &mut authed, password.as_deref());
                    if socket.write_all(&reply).await.is_err() {
                        break 'conn;
                    }
                }
            }
        }
    }

    state.lock().unwrap().clients.remove(&id);
}

/// Split one complete `*N` command off the front of `buf`.
fn next_command(buf: &[u8]) -> Option<(Vec<String>, usize)> {
    let (count, mut pos) = read_header(buf, 0, b'*')?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let (len, start) = read_header(buf, pos, b'$')?;
        let end = start + len;
        if buf.len() < end + 2 {
            return None;
        }
        args.push(String::from_utf8_lossy(&buf[start..end]).into_owned());
        pos = end + 2;
    }
    Some((args, pos))
}

fn read_header(buf: &[u8], pos: usize, marker: u8) -> Option<(usize, usize)> {
    if *buf.get(pos)? != marker {
        return None;
    }
    let line_end = pos + buf[pos..].windows(2).position(|w| w == b"\r\n")?;
    let n = std::str::from_utf8(&buf[pos + 1..line_end]).ok()?.parse().ok()?;
    Some((n, line_end + 2))
}

fn handle_command(
    args: Vec<String>,
    id: u64,
    state: &Mutex<MockState>,
    authed: &mut bool,
    password: Option<&str>,
) -> Vec<u8> {
    let Some(command) = args.first().map(|c| c.to_uppercase()) else {
        return b"-ERR empty command\r\n".to_vec();
    };

    if !*authed && command != "AUTH" {
        return b"-NOAUTH Authentication required.\r\n".to_vec();
    }

    let mut state = state.lock().unwrap();
    let state = &mut *state;
    let Some(client) = state.clients.get_mut(&id) else {
        return b"-ERR client gone\r\n".to_vec();
    };

    match command.as_str() {
        "AUTH" => {
            client.cmd = "auth".to_string();
            if args.last().map(String::as_str) == password {
                *authed = true;
                b"+OK\r\n".to_vec()
            } else {
                b"-WRONGPASS invalid username-password pair or user is disabled.\r\n".to_vec()
            }
        }
        "SELECT" => {
            client.cmd = "select".to_string();
            b"+OK\r\n".to_vec()
        }
        "PING" => {
            client.cmd = "ping".to_string();
            b"+PONG\r\n".to_vec()
        }
        "CLIENT" => match args.get(1).map(|s| s.to_uppercase()).as_deref() {
            Some("SETINFO") => b"+OK\r\n".to_vec(),
            Some("SETNAME") => {
                client.cmd = "client|setname".to_string();
                client.name = args.get(2).cloned().unwrap_or_default();
                b"+OK\r\n".to_vec()
            }
            Some("LIST") => {
                client.cmd = "client|list".to_string();
                let body: String = state
                    .clients
                    .iter()
                    .map(|(cid, c)| {
                        format!(
                            "id={} addr={} fd=8 name={} age=0 idle=0 flags=N db=0 sub={} psub=0 cmd={} user=default\n",
                            cid,
                            c.addr,
                            c.name,
                            c.channels.len(),
                            c.cmd
                        )
                    })
                    .collect();
                let mut reply = format!("${}\r\n", body.len()).into_bytes();
                reply.extend_from_slice(body.as_bytes());
                reply.extend_from_slice(b"\r\n");
                reply
            }
            _ => b"-ERR unknown CLIENT subcommand\r\n".to_vec(),
        },
        "SUBSCRIBE" => {
            let Some(channel) = args.get(1).cloned() else {
                return b"-ERR wrong number of arguments for 'subscribe' command\r\n".to_vec();
            };
            client.cmd = "subscribe".to_string();
            client.channels.push(channel.clone());
            format!(
                "*3\r\n$9\r\nsubscribe\r\n${}\r\n{}\r\n:{}\r\n",
                channel.len(),
                channel,
                client.channels.len()
            )
            .into_bytes()
        }
        other => format!("-ERR unknown command '{}'\r\n", other).into_bytes(),
    }
}
