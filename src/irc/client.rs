//! Minimal Twitch IRC-over-WebSocket client.
//!
//! Anonymous read access uses the `justinfan` guest nick convention, so no
//! OAuth token ever travels over the chat socket. Inbound lines are parsed on
//! a dedicated socket thread and delivered in arrival order over an mpsc
//! channel; reconnection policy is left to the caller.

use anyhow::Result;
use native_tls::TlsStream;
use std::collections::HashSet;
use std::net::TcpStream;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tungstenite::{Message, WebSocket};

use super::parser::{chat_message_from, parse_line, ChatMessage};

const IRC_WS_URL: &str = "wss://irc-ws.chat.twitch.tv:443";
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(60);
const READ_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Connection lifecycle as seen by the consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Registered,
    Joined,
    Closed,
}

/// Events delivered to the consumer, in arrival order.
#[derive(Clone, Debug)]
pub enum ChatEvent {
    State(ConnectionState),
    Message(ChatMessage),
}

enum SocketCommand {
    Send(String),
    Shutdown,
}

pub struct IrcClient {
    nick: String,
    joined: HashSet<String>,
    events: Sender<ChatEvent>,
    socket_tx: Option<Sender<SocketCommand>>,
    state: Arc<Mutex<ConnectionState>>,
}

impl IrcClient {
    /// Create a client and the event receiver it will feed.
    ///
    /// When `nick` is `None` a random guest identity is generated.
    pub fn new(nick: Option<String>) -> (Self, Receiver<ChatEvent>) {
        let nick = nick.unwrap_or_else(|| {
            let mut n = [0u8; 4];
            use rand::RngCore;
            rand::rngs::OsRng.fill_bytes(&mut n);
            format!("justinfan{}", u32::from_le_bytes(n) % 100_000)
        });
        let (tx, rx) = channel();
        (
            Self {
                nick,
                joined: HashSet::new(),
                events: tx,
                socket_tx: None,
                state: Arc::new(Mutex::new(ConnectionState::Idle)),
            },
            rx,
        )
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }

    /// Channels currently tracked as joined.
    pub fn joined_channels(&self) -> Vec<String> {
        self.joined.iter().cloned().collect()
    }

    /// Whether a fresh socket is required: none yet, or the previous socket
    /// thread exited (read error or server close) leaving a stale sender.
    fn needs_socket(&self) -> bool {
        self.socket_tx.is_none() || self.state() == ConnectionState::Closed
    }

    /// Establish the socket and register. No-op while a connection is live;
    /// reconnects when the previous socket thread has died.
    pub fn connect(&mut self) -> Result<()> {
        if !self.needs_socket() {
            return Ok(());
        }
        self.socket_tx = None;
        self.set_state(ConnectionState::Connecting);

        let mut socket = match connect_chat_websocket() {
            Ok(s) => s,
            Err(e) => {
                self.set_state(ConnectionState::Closed);
                return Err(e);
            }
        };

        // Twitch registration: capabilities, anonymous placeholder pass, nick.
        write_line(
            &mut socket,
            "CAP REQ :twitch.tv/tags twitch.tv/commands twitch.tv/membership",
        )?;
        write_line(&mut socket, "PASS SCHMOOPIIE")?;
        write_line(&mut socket, &format!("NICK {}", self.nick))?;

        let (cmd_tx, cmd_rx) = channel();
        let events = self.events.clone();
        let state = self.state.clone();
        thread::spawn(move || run_socket(socket, cmd_rx, events, state));
        self.socket_tx = Some(cmd_tx);

        // Tracked channels rejoin on a fresh socket.
        for ch in &self.joined {
            self.send_raw(&format!("JOIN #{}", ch));
        }
        Ok(())
    }

    /// Join a channel, lazily connecting first. Idempotent per channel.
    pub fn join(&mut self, channel: &str) -> Result<()> {
        let ch = channel.trim().trim_start_matches('#').to_lowercase();
        if ch.is_empty() || self.joined.contains(&ch) {
            return Ok(());
        }
        self.connect()?;
        self.send_raw(&format!("JOIN #{}", ch));
        self.joined.insert(ch);
        self.set_state(ConnectionState::Joined);
        Ok(())
    }

    /// Part a channel. No-op when not joined.
    pub fn part(&mut self, channel: &str) {
        let ch = channel.trim().trim_start_matches('#').to_lowercase();
        if !self.joined.remove(&ch) {
            return;
        }
        self.send_raw(&format!("PART #{}", ch));
    }

    /// Tear down the socket thread. Membership is kept for a later rejoin.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.socket_tx.take() {
            let _ = tx.send(SocketCommand::Shutdown);
        }
        self.set_state(ConnectionState::Closed);
    }

    fn send_raw(&self, line: &str) {
        if let Some(tx) = &self.socket_tx {
            let _ = tx.send(SocketCommand::Send(line.to_string()));
        }
    }

    fn set_state(&self, next: ConnectionState) {
        *self.state.lock().unwrap() = next;
        let _ = self.events.send(ChatEvent::State(next));
    }
}

impl Drop for IrcClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Create the TLS WebSocket connection to the Twitch chat endpoint.
fn connect_chat_websocket() -> Result<WebSocket<TlsStream<TcpStream>>> {
    let url = url::Url::parse(IRC_WS_URL)?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("No host in URL"))?;
    let port = url.port().unwrap_or(443);

    use std::net::ToSocketAddrs;
    let addr = format!("{}:{}", host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| anyhow::anyhow!("Failed to resolve hostname: {}", host))?;

    let tcp_stream = TcpStream::connect_timeout(&addr, Duration::from_secs(10))?;
    tcp_stream.set_read_timeout(Some(READ_POLL_TIMEOUT))?;
    tcp_stream.set_write_timeout(Some(Duration::from_secs(10)))?;
    tcp_stream.set_nodelay(true)?;

    let connector = native_tls::TlsConnector::new()?;
    let tls_stream = connector.connect(host, tcp_stream)?;

    let (socket, _response) = tungstenite::client::client(IRC_WS_URL, tls_stream)?;
    Ok(socket)
}

fn write_line(socket: &mut WebSocket<TlsStream<TcpStream>>, line: &str) -> Result<()> {
    socket.write(Message::Text(format!("{}\r\n", line).into()))?;
    socket.flush()?;
    Ok(())
}

/// Socket thread: outbound commands, inbound frames, keepalive.
fn run_socket(
    mut socket: WebSocket<TlsStream<TcpStream>>,
    commands: Receiver<SocketCommand>,
    events: Sender<ChatEvent>,
    state: Arc<Mutex<ConnectionState>>,
) {
    let mut last_ping = Instant::now();

    loop {
        // Drain pending outbound commands first so JOIN/PART are never
        // starved by a quiet socket.
        loop {
            match commands.try_recv() {
                Ok(SocketCommand::Send(line)) => {
                    if write_line(&mut socket, &line).is_err() {
                        close_socket(&mut socket, &events, &state);
                        return;
                    }
                }
                Ok(SocketCommand::Shutdown) | Err(TryRecvError::Disconnected) => {
                    let _ = socket.close(None);
                    return;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        if last_ping.elapsed() >= KEEPALIVE_INTERVAL {
            if write_line(&mut socket, "PING :tmi.twitch.tv").is_err() {
                close_socket(&mut socket, &events, &state);
                return;
            }
            last_ping = Instant::now();
        }

        match socket.read() {
            Ok(Message::Text(frame)) => {
                for line in frame.as_str().split("\r\n").filter(|l| !l.is_empty()) {
                    handle_line(&mut socket, line, &events, &state);
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = socket.write(Message::Pong(payload));
                let _ = socket.flush();
            }
            Ok(Message::Close(_)) => {
                close_socket(&mut socket, &events, &state);
                return;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                // Read timeout; loop back around for commands and keepalive.
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat socket read failed");
                close_socket(&mut socket, &events, &state);
                return;
            }
        }
    }
}

fn handle_line(
    socket: &mut WebSocket<TlsStream<TcpStream>>,
    line: &str,
    events: &Sender<ChatEvent>,
    state: &Arc<Mutex<ConnectionState>>,
) {
    // Server liveness probe: answer immediately, no further dispatch.
    if line.starts_with("PING") {
        let _ = write_line(socket, "PONG :tmi.twitch.tv");
        return;
    }

    let Some(parsed) = parse_line(line) else {
        tracing::debug!(line, "skipping unparseable line");
        return;
    };

    match parsed.command.as_str() {
        "001" => {
            let mut guard = state.lock().unwrap();
            if *guard == ConnectionState::Connecting {
                *guard = ConnectionState::Registered;
                drop(guard);
                let _ = events.send(ChatEvent::State(ConnectionState::Registered));
            }
        }
        "PRIVMSG" => {
            if let Some(msg) = chat_message_from(&parsed) {
                let _ = events.send(ChatEvent::Message(msg));
            }
        }
        _ => {}
    }
}

fn close_socket(
    socket: &mut WebSocket<TlsStream<TcpStream>>,
    events: &Sender<ChatEvent>,
    state: &Arc<Mutex<ConnectionState>>,
) {
    let _ = socket.close(None);
    *state.lock().unwrap() = ConnectionState::Closed;
    let _ = events.send(ChatEvent::State(ConnectionState::Closed));
}
