//! WebTransport server: endpoint setup, connection accept loop and the
//! per-client message loop.
//!
//! Each client opens one bidirectional stream carrying length-prefixed
//! opcode messages. The read side of that stream is this connection's task;
//! the send side is shared with the broadcast fan-out through the session's
//! writer handle.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::game::constants::net::MAX_MESSAGE_SIZE;
use crate::net::framing;
use crate::net::game_session::{start_game_loop, ArenaSession};
use crate::net::protocol::{self, ClientCommand};
use crate::net::session::SharedWriter;
use crate::net::tls::TlsConfig;

pub struct ArenaServer {
    config: ServerConfig,
    tls_config: TlsConfig,
    session: Arc<RwLock<ArenaSession>>,
}

impl ArenaServer {
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let tls_config = TlsConfig::load().await?;
        let session = Arc::new(RwLock::new(ArenaSession::new(&config)));

        Ok(Self {
            config,
            tls_config,
            session,
        })
    }

    /// Get the certificate hash for client configuration
    pub fn cert_hash(&self) -> &str {
        self.tls_config.get_cert_hash()
    }

    /// Run the server
    pub async fn run(self) -> anyhow::Result<()> {
        use wtransport::Endpoint;

        // with_bind_default gives dual-stack (IPv4 + IPv6) support
        let server_config = wtransport::ServerConfig::builder()
            .with_bind_default(self.config.port)
            .with_identity(self.tls_config.identity)
            .build();

        let endpoint = Endpoint::server(server_config)?;

        info!(
            "WebTransport server listening on port {}",
            self.config.port
        );

        start_game_loop(self.session.clone());

        loop {
            let incoming = endpoint.accept().await;

            let session = self.session.clone();
            let name_max_bytes = self.config.world.name_max_bytes;

            tokio::spawn(async move {
                if let Err(e) = handle_connection(incoming, session, name_max_bytes).await {
                    debug!("Connection ended: {}", e);
                }
            });
        }
    }
}

/// Handle a single client connection
async fn handle_connection(
    incoming: wtransport::endpoint::IncomingSession,
    session: Arc<RwLock<ArenaSession>>,
    name_max_bytes: usize,
) -> anyhow::Result<()> {
    let request = incoming.await?;
    debug!(
        "New session request: authority {}, path {}",
        request.authority(),
        request.path()
    );
    let connection = request.accept().await?;

    // one client-opened bidirectional stream carries the whole protocol
    let (send, mut recv) = connection.accept_bi().await?;
    let writer: SharedWriter = Arc::new(RwLock::new(Some(send)));

    // allocate a pid and collect the greeting sequence; a dry pool rejects
    // the connection before the client ever sees an init message
    let (pid, greetings) = {
        let mut guard = session.write().await;
        match guard.connect(writer.clone()) {
            Ok(assigned) => assigned,
            Err(e) => {
                warn!("Rejecting connection: {}", e);
                return Ok(());
            }
        }
    };

    for message in greetings {
        let mut guard = writer.write().await;
        if let Some(stream) = guard.as_mut() {
            if let Err(e) = framing::write_frame(stream, &message).await {
                warn!("Greeting send failed for pid {}: {}", pid, e);
                break;
            }
        }
    }

    let mut buffer = vec![0u8; 4096];

    loop {
        // frame header: 4-byte big-endian payload length
        let mut len_buf = [0u8; 4];
        match recv.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) => {
                debug!("Stream read ended for pid {}: {}", pid, e);
                break;
            }
        }

        let msg_len = u32::from_be_bytes(len_buf) as usize;
        if msg_len > MAX_MESSAGE_SIZE {
            warn!("Oversized message ({} bytes) from pid {}", msg_len, pid);
            break;
        }
        if msg_len > buffer.len() {
            buffer.resize(msg_len, 0);
        }

        match recv.read_exact(&mut buffer[..msg_len]).await {
            Ok(_) => {}
            Err(e) => {
                debug!("Stream read ended for pid {}: {}", pid, e);
                break;
            }
        }

        let command = match protocol::decode_command(&buffer[..msg_len], name_max_bytes) {
            Ok(command) => command,
            Err(e) => {
                // malformed input is dropped, the connection stays open
                warn!("Protocol error from pid {}: {}", pid, e);
                continue;
            }
        };

        let mut guard = session.write().await;
        match command {
            ClientCommand::Start { name } => {
                guard.handle_start(pid, name);
            }
            ClientCommand::Control(control) => guard.handle_control(pid, control),
            ClientCommand::Chat(text) => {
                guard.handle_chat(pid, &text);
            }
        }
    }

    // stream end and read failure both land here; cleanup runs exactly once
    session.write().await.disconnect(pid);
    Ok(())
}
