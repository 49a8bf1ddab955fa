//! Session task driving a [`Decoder`] from an async byte stream.
//!
//! The connection layer owns the socket, handshake and TLS; once it has a
//! readable stream it hands it to [`Session::spawn`]. The spawned task owns
//! the decoder outright and is the only writer of its tag registry:
//! registrations arrive as messages on a channel rather than through a
//! shared lock.
//!
//! ```text
//! Caller A ─┐
//! Caller B ─┼─► mpsc::Sender<Command> ─┐
//! Caller N ─┘                          ├─► Session task ─► Decoder ─► handlers
//!             AsyncRead (socket) ──────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use apiwire::{DecoderConfig, Session, SessionEnd};
//!
//! let stream = connect_and_login().await?;
//! let (reader, writer) = tokio::io::split(stream);
//! let (session, task) = Session::spawn(reader, DecoderConfig::default());
//!
//! session.register_tag("1", |packet| {
//!     println!("{:?}", packet.words());
//!     Ok(())
//! }).await?;
//!
//! match task.await?? {
//!     SessionEnd::Fatal => eprintln!("device closed the session"),
//!     _ => {}
//! }
//! ```

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::DecoderConfig;
use crate::decoder::Decoder;
use crate::error::{ApiwireError, Result};
use crate::handler::{HandlerResult, Packet, PacketHandler};

/// Why a session task stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The stream reached end of file.
    Closed,
    /// The remote end sent `!fatal`.
    Fatal,
    /// Shutdown was requested, or every handle was dropped.
    Shutdown,
}

/// Messages from handles to the session task.
enum Command {
    Register {
        tag: String,
        handler: Box<dyn PacketHandler>,
        ack: oneshot::Sender<bool>,
    },
    Unregister {
        tag: String,
        ack: oneshot::Sender<bool>,
    },
    Shutdown,
}

/// Handle for talking to a running session task.
///
/// This is cheaply cloneable and can be shared across callers.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// Install or replace the handler for `tag`.
    ///
    /// Resolves once the task has applied the registration, so bytes read
    /// afterwards are routed to the new handler. Returns `true` if a
    /// handler was replaced.
    pub async fn register_tag<F>(&self, tag: impl Into<String>, handler: F) -> Result<bool>
    where
        F: FnMut(Packet) -> HandlerResult + Send + 'static,
    {
        self.register_handler(tag, handler).await
    }

    /// Install or replace the handler for `tag` with any [`PacketHandler`].
    pub async fn register_handler<H: PacketHandler>(
        &self,
        tag: impl Into<String>,
        handler: H,
    ) -> Result<bool> {
        let (ack, done) = oneshot::channel();
        self.send(Command::Register {
            tag: tag.into(),
            handler: Box::new(handler),
            ack,
        })
        .await?;
        done.await.map_err(|_| ApiwireError::ConnectionClosed)
    }

    /// Remove the handler for `tag`. Returns `true` if one was registered.
    pub async fn unregister_tag(&self, tag: impl Into<String>) -> Result<bool> {
        let (ack, done) = oneshot::channel();
        self.send(Command::Unregister {
            tag: tag.into(),
            ack,
        })
        .await?;
        done.await.map_err(|_| ApiwireError::ConnectionClosed)
    }

    /// Ask the task to stop reading.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    /// Whether the task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| ApiwireError::ConnectionClosed)
    }
}

/// Entry point for spawning session tasks.
pub struct Session;

impl Session {
    /// Spawn a session reading from `reader` with a fresh decoder.
    pub fn spawn<R>(reader: R, config: DecoderConfig) -> (SessionHandle, JoinHandle<Result<SessionEnd>>)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let decoder = Decoder::with_config(&config);
        Self::spawn_with_decoder(reader, decoder, config)
    }

    /// Spawn a session around a prepared decoder.
    ///
    /// Use this to install handlers or a fatal callback before any bytes
    /// are read.
    pub fn spawn_with_decoder<R>(
        reader: R,
        decoder: Decoder,
        config: DecoderConfig,
    ) -> (SessionHandle, JoinHandle<Result<SessionEnd>>)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(config.command_channel_capacity.max(1));
        let task = tokio::spawn(read_loop(
            reader,
            decoder,
            rx,
            config.read_buffer_size.max(1),
        ));
        (SessionHandle { tx }, task)
    }
}

/// Main read loop - feeds chunks to the decoder and applies commands.
async fn read_loop<R>(
    mut reader: R,
    mut decoder: Decoder,
    mut rx: mpsc::Receiver<Command>,
    read_buffer_size: usize,
) -> Result<SessionEnd>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; read_buffer_size];

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Register { tag, handler, ack }) => {
                    let _ = ack.send(decoder.register_boxed(tag, handler));
                }
                Some(Command::Unregister { tag, ack }) => {
                    let _ = ack.send(decoder.unregister_tag(&tag));
                }
                Some(Command::Shutdown) | None => {
                    tracing::debug!("Session shutting down");
                    return Ok(SessionEnd::Shutdown);
                }
            },

            read = reader.read(&mut buf) => {
                let n = read?;
                if n == 0 {
                    tracing::debug!("Connection closed by peer");
                    return Ok(SessionEnd::Closed);
                }

                decoder.feed(&buf[..n])?;

                if decoder.is_fatal() {
                    return Ok(SessionEnd::Fatal);
                }
            }
        }
    }
}
