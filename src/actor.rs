//! Lightweight single-process actor runtime.
//!
//! An `Actor` owns a mailbox and serves `Call` (request/reply) and `Cast`
//! (fire-and-forget) messages sequentially within a single task. An
//! `ActorRef` is the handle callers use to `cast`, `call`, or `cancel` a
//! spawned actor. Lifecycle is `init` → receive loop → `before_exit` →
//! drain any calls still waiting with a crash reply.

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::runtime::channel::{self, Rx, Tx};

/// Error surfaced to a `call` caller when the actor cannot answer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ActorError {
    /// The actor (or its mailbox) was cancelled before answering.
    #[error("actor cancelled before replying")]
    Cancelled,
    /// The actor's handler crashed while processing this call.
    #[error("actor crashed: {0}")]
    Crashed(String),
}

enum Msg<Call, Cast, Reply> {
    Cast(Cast),
    Call(Call, oneshot::Sender<Result<Reply, ActorError>>),
}

/// A hosted entity serving its mailbox sequentially within one task.
///
/// Implementors override any of `init`, `handle_cast`, `handle_call`, and
/// `before_exit`; the runtime guarantees `init` runs exactly once before the
/// first message and `before_exit` runs exactly once on termination
/// (normal shutdown, handler crash, or cancellation).
#[async_trait]
pub trait Actor: Send + 'static {
    type Call: Send + 'static;
    type Cast: Send + 'static;
    type Reply: Send + 'static;
    type Error: std::fmt::Display + Send + 'static;

    /// Called once before the receive loop starts. A failure here is routed
    /// straight to `before_exit` without processing any message.
    async fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handle a fire-and-forget message.
    async fn handle_cast(&mut self, msg: Self::Cast) -> Result<(), Self::Error>;

    /// Handle a request/reply message and produce the reply value.
    async fn handle_call(&mut self, msg: Self::Call) -> Result<Self::Reply, Self::Error>;

    /// Called exactly once on termination. May inspect `_err` and return a
    /// transformed (or cleared) error; the returned value is what pending
    /// `call`ers see via `ActorError::Crashed`.
    async fn before_exit(&mut self, err: Option<Self::Error>) -> Option<Self::Error> {
        err
    }

    /// Start the actor on a new task and return a reference to it.
    fn spawn(self) -> ActorRef<Self::Call, Self::Cast, Self::Reply>
    where
        Self: Sized,
    {
        let (tx, rx) = channel::unbounded::<Msg<Self::Call, Self::Cast, Self::Reply>>();
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let join = tokio::spawn(run_loop(self, rx, cancel_rx));
        ActorRef {
            tx,
            cancel_tx: Some(cancel_tx),
            join,
        }
    }
}

async fn run_loop<A: Actor>(
    mut actor: A,
    mut rx: Rx<Msg<A::Call, A::Cast, A::Reply>>,
    mut cancel_rx: oneshot::Receiver<()>,
) -> Option<String> {
    let mut run_err: Option<A::Error> = match actor.init().await {
        Ok(()) => None,
        Err(e) => Some(e),
    };

    if run_err.is_none() {
        'recv: loop {
            tokio::select! {
                biased;
                _ = &mut cancel_rx => break 'recv,
                msg = rx.recv() => {
                    match msg {
                        None => break 'recv,
                        Some(Msg::Cast(payload)) => {
                            if let Err(e) = actor.handle_cast(payload).await {
                                run_err = Some(e);
                                break 'recv;
                            }
                        }
                        Some(Msg::Call(payload, reply)) => {
                            match actor.handle_call(payload).await {
                                Ok(value) => {
                                    let _ = reply.send(Ok(value));
                                }
                                Err(e) => {
                                    let message = e.to_string();
                                    let _ = reply.send(Err(ActorError::Crashed(message)));
                                    run_err = Some(e);
                                    break 'recv;
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    let run_err = actor.before_exit(run_err).await;
    let message = run_err.as_ref().map(std::fmt::Display::to_string);

    rx.close();
    while let Ok(msg) = rx.try_recv() {
        if let Msg::Call(_, reply) = msg {
            match &message {
                Some(m) => {
                    let _ = reply.send(Err(ActorError::Crashed(m.clone())));
                }
                None => drop(reply),
            }
        }
    }

    message
}

/// Handle to a spawned actor. `cast`/`call` enqueue work; `cancel` requests
/// a clean shutdown. Cloning is not supported — an `ActorRef` is the unique
/// owner of its mailbox's sending half.
pub struct ActorRef<Call, Cast, Reply> {
    tx: Tx<Msg<Call, Cast, Reply>>,
    cancel_tx: Option<oneshot::Sender<()>>,
    join: tokio::task::JoinHandle<Option<String>>,
}

impl<Call, Cast, Reply> ActorRef<Call, Cast, Reply>
where
    Call: Send + 'static,
    Cast: Send + 'static,
    Reply: Send + 'static,
{
    /// Enqueue a fire-and-forget message. Silently dropped if the actor has
    /// already shut down.
    pub fn cast(&self, msg: Cast) {
        let _ = self.tx.try_send(Msg::Cast(msg));
    }

    /// Send a message and await the reply. Resolves to an error if the actor
    /// shuts down (cleanly or via crash) before answering.
    pub async fn call(&self, msg: Call) -> Result<Reply, ActorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(Msg::Call(msg, reply_tx)).await.is_err() {
            return Err(ActorError::Cancelled);
        }
        reply_rx.await.unwrap_or(Err(ActorError::Cancelled))
    }

    /// Close the mailbox and signal the actor task to stop. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Wait for the actor task to finish and return its final error message,
    /// if it exited with one.
    pub async fn join(self) -> Option<String> {
        self.join.await.unwrap_or(None)
    }
}
