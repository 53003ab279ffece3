//! Async runtime
//!
//! Single-task event loop that owns the [`ConnectionManager`] and executes
//! its actions. Transport opens, socket readers and reconnect timers run as
//! spawned tasks that report back over an internal channel tagged with the
//! [`SocketId`] / [`TimerId`] they were started for, so the manager can
//! recognize and drop events from superseded transports.
//!
//! Handlers never await. Outbound frames are queued with `try_send`; a
//! transport that stops draining its queue is closed and reconnected rather
//! than allowed to stall the loop.

use std::{collections::HashMap, sync::Arc, time::SystemTime};

use chatline_core::{
    ConnectionManager, SessionAction, SessionConfig, SessionError, SessionEvent, SessionSnapshot,
    SocketId, TimerId,
};
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        watch,
    },
    task::AbortHandle,
};

use crate::{
    error::ClientError,
    transport::{Connector, Inbound, Link, TransportError},
};

/// Pending user commands before `ChatHandle` calls start to wait.
const COMMAND_BUFFER: usize = 32;

/// Session view published by the runtime.
pub type Snapshot = SessionSnapshot<SystemTime>;

/// User intents forwarded from [`ChatHandle`].
#[derive(Debug)]
enum Command {
    Connect(String),
    Send(String),
    Disconnect,
    Shutdown,
}

/// Completions reported by spawned tasks.
enum Signal {
    Opened { socket: SocketId, link: Link },
    OpenFailed { socket: SocketId, error: TransportError },
    Inbound { socket: SocketId, inbound: Inbound },
    Closed { socket: SocketId },
    TimerFired { timer: TimerId },
}

/// I/O resources behind one socket tag.
enum Slot {
    /// Open in flight.
    Opening(AbortHandle),
    /// Transport open. Dropping `outbound` closes it.
    Open { outbound: mpsc::Sender<String>, reader: AbortHandle },
}

/// Cloneable control surface for a running [`Runtime`].
///
/// Commands are queued; their effect shows up in the published [`Snapshot`].
#[derive(Debug, Clone)]
pub struct ChatHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Snapshot>,
}

impl ChatHandle {
    /// Join the chat as `username`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RuntimeStopped`] if the runtime has exited.
    pub async fn connect(&self, username: impl Into<String>) -> Result<(), ClientError> {
        self.command(Command::Connect(username.into())).await
    }

    /// Broadcast `text`. Dropped (with a warning) unless the session is
    /// joined.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RuntimeStopped`] if the runtime has exited.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), ClientError> {
        self.command(Command::Send(text.into())).await
    }

    /// Leave the chat and clear the session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RuntimeStopped`] if the runtime has exited.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.command(Command::Disconnect).await
    }

    /// Disconnect and stop the runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RuntimeStopped`] if the runtime has already
    /// exited.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        self.command(Command::Shutdown).await
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    async fn command(&self, command: Command) -> Result<(), ClientError> {
        self.commands.send(command).await.map_err(|_| ClientError::RuntimeStopped)
    }
}

/// Event loop driving one chat session.
///
/// Runs until [`ChatHandle::shutdown`] is called or every handle is dropped.
/// Either way the session is disconnected before `run` returns.
pub struct Runtime<C> {
    connector: Arc<C>,
    manager: ConnectionManager<SystemTime>,
    commands: mpsc::Receiver<Command>,
    signals_tx: mpsc::UnboundedSender<Signal>,
    signals: mpsc::UnboundedReceiver<Signal>,
    sockets: HashMap<SocketId, Slot>,
    timers: HashMap<TimerId, AbortHandle>,
    snapshots: watch::Sender<Snapshot>,
    /// Manager revision of the last published snapshot
    published: u64,
}

impl<C: Connector> Runtime<C> {
    /// Create a runtime and the handle that controls it.
    ///
    /// Nothing happens until [`Runtime::run`] is polled.
    pub fn new(config: SessionConfig, connector: C) -> (Self, ChatHandle) {
        let (commands_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (signals_tx, signals) = mpsc::unbounded_channel();
        let (snapshots, snapshots_rx) = watch::channel(Snapshot::default());

        let runtime = Self {
            connector: Arc::new(connector),
            manager: ConnectionManager::new(config),
            commands,
            signals_tx,
            signals,
            sockets: HashMap::new(),
            timers: HashMap::new(),
            snapshots,
            published: 0,
        };
        let handle = ChatHandle { commands: commands_tx, snapshots: snapshots_rx };

        (runtime, handle)
    }

    /// Run the event loop.
    pub async fn run(mut self) {
        tracing::debug!(endpoint = %self.manager.config().endpoint, "client runtime started");

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    if self.handle_command(command) {
                        break;
                    }
                }

                // Never closes: the runtime holds a sender.
                Some(signal) = self.signals.recv() => {
                    self.handle_signal(signal);
                }
            }

            self.publish();
        }

        let actions = self.manager.disconnect();
        self.execute(actions);
        self.publish();

        tracing::debug!("client runtime stopped");
    }

    /// Returns true if the runtime should stop.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Connect(username) => {
                let actions = self.manager.connect(&username);
                self.execute(actions);
            },
            Command::Send(text) => match self.manager.send(&text) {
                Ok(actions) => self.execute(actions),
                Err(e) => report(&e),
            },
            Command::Disconnect => {
                let actions = self.manager.disconnect();
                self.execute(actions);
            },
            Command::Shutdown => return true,
        }

        false
    }

    fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Opened { socket, link } => {
                if !matches!(self.sockets.get(&socket), Some(Slot::Opening(_))) {
                    // Closed while the open was in flight. Dropping the link
                    // closes the transport.
                    tracing::debug!(%socket, "discarding transport opened after close");
                    return;
                }

                let Link { outbound, inbound } = link;
                let reader = self.spawn_reader(socket, inbound);
                self.sockets.insert(socket, Slot::Open { outbound, reader });

                self.feed(SessionEvent::TransportOpened { socket });
            },

            Signal::OpenFailed { socket, error } => {
                if self.sockets.remove(&socket).is_none() {
                    return;
                }

                tracing::warn!(%socket, %error, "failed to open transport");
                self.feed(SessionEvent::TransportClosed { socket });
            },

            Signal::Inbound { socket, inbound: Inbound::Text(text) } => {
                #[allow(clippy::disallowed_methods)]
                let now = SystemTime::now();
                self.feed(SessionEvent::FrameReceived { socket, text, now });
            },

            Signal::Inbound { socket, inbound: Inbound::Error(reason) } => {
                self.feed(SessionEvent::TransportError { socket, reason });
            },

            Signal::Closed { socket } => {
                match self.sockets.remove(&socket) {
                    Some(Slot::Open { reader, .. }) => reader.abort(),
                    Some(Slot::Opening(task)) => task.abort(),
                    None => return,
                }

                self.feed(SessionEvent::TransportClosed { socket });
            },

            Signal::TimerFired { timer } => {
                self.timers.remove(&timer);
                self.feed(SessionEvent::ReconnectTimerFired { timer });
            },
        }
    }

    fn feed(&mut self, event: SessionEvent<SystemTime>) {
        match self.manager.handle(event) {
            Ok(actions) => self.execute(actions),
            Err(e) => report(&e),
        }
    }

    fn execute(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::OpenTransport { socket, endpoint } => {
                    let connector = Arc::clone(&self.connector);
                    let signals = self.signals_tx.clone();

                    let task = tokio::spawn(async move {
                        let signal = match connector.open(&endpoint).await {
                            Ok(link) => Signal::Opened { socket, link },
                            Err(error) => Signal::OpenFailed { socket, error },
                        };
                        let _ = signals.send(signal);
                    });

                    self.sockets.insert(socket, Slot::Opening(task.abort_handle()));
                },

                SessionAction::SendText { socket, text } => match self.sockets.get(&socket) {
                    Some(Slot::Open { outbound, .. }) => match outbound.try_send(text) {
                        Ok(()) => {},
                        Err(TrySendError::Full(_)) => {
                            // Handled as a close: the slot is dropped and the
                            // manager schedules a reconnect.
                            tracing::warn!(%socket, "transport not draining outbound frames");
                            let _ = self.signals_tx.send(Signal::Closed { socket });
                        },
                        Err(TrySendError::Closed(_)) => {
                            tracing::warn!(%socket, "transport closed before frame was written");
                        },
                    },
                    _ => tracing::warn!(%socket, "dropping frame for transport that is not open"),
                },

                SessionAction::CloseTransport { socket } => match self.sockets.remove(&socket) {
                    Some(Slot::Opening(task)) => task.abort(),
                    Some(Slot::Open { reader, .. }) => reader.abort(),
                    None => {},
                },

                SessionAction::ArmReconnectTimer { timer, delay } => {
                    let signals = self.signals_tx.clone();

                    let task = tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = signals.send(Signal::TimerFired { timer });
                    });

                    self.timers.insert(timer, task.abort_handle());
                },

                SessionAction::CancelReconnectTimer { timer } => {
                    if let Some(task) = self.timers.remove(&timer) {
                        task.abort();
                    }
                },
            }
        }
    }

    fn spawn_reader(&self, socket: SocketId, mut inbound: mpsc::Receiver<Inbound>) -> AbortHandle {
        let signals = self.signals_tx.clone();

        tokio::spawn(async move {
            while let Some(inbound) = inbound.recv().await {
                if signals.send(Signal::Inbound { socket, inbound }).is_err() {
                    return;
                }
            }
            let _ = signals.send(Signal::Closed { socket });
        })
        .abort_handle()
    }

    fn publish(&mut self) {
        let revision = self.manager.revision();
        if revision == self.published {
            return;
        }

        self.published = revision;
        self.snapshots.send_replace(self.manager.snapshot());
    }
}

fn report(err: &SessionError) {
    if err.is_dropped_frame() {
        tracing::warn!(error = %err, "dropped inbound frame");
    } else {
        tracing::warn!(error = %err, "session error");
    }
}
