//! Bounded, drop-on-full queue of pending reload signals.
//!
//! The queue only counts that something changed; it never records which file.
//! Pushing never blocks: once the queue is full, further signals are dropped,
//! because the signals already queued guarantee a dispatch on the next tick.

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

/// Default number of signals held before new ones are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

/// "At least one watched path was written since the last dispatch."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSignal;

/// Outcome of [`QueueSender::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    /// The signal was queued.
    Queued,
    /// The queue was full and the signal was absorbed.
    Dropped,
    /// The consumer is gone.
    Closed,
}

/// Outcome of [`QueueReceiver::drain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// Nothing was pending.
    Idle,
    /// This many pending signals were collapsed into one.
    Coalesced(usize),
    /// The producer is gone and nothing is left to drain.
    Closed,
}

/// Create a pending queue holding at most `capacity` signals.
///
/// # Panics
///
/// Panics if `capacity` is zero.
///
/// # Examples
///
/// ```rust
/// use provisioning_reloader::notify::{pending_queue, Drain, Push};
///
/// let (tx, mut rx) = pending_queue(2);
/// assert_eq!(tx.push(), Push::Queued);
/// assert_eq!(tx.push(), Push::Queued);
/// assert_eq!(tx.push(), Push::Dropped);
///
/// assert_eq!(rx.drain(), Drain::Coalesced(2));
/// assert_eq!(rx.drain(), Drain::Idle);
/// ```
pub fn pending_queue(capacity: usize) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (QueueSender { tx }, QueueReceiver { rx, capacity })
}

/// Producer half, owned by the event loop.
///
/// Dropping the sender closes the queue.
#[derive(Debug)]
pub struct QueueSender {
    tx: mpsc::Sender<ChangeSignal>,
}

impl QueueSender {
    /// Enqueue a signal without waiting.
    pub fn push(&self) -> Push {
        match self.tx.try_send(ChangeSignal) {
            Ok(()) => Push::Queued,
            Err(TrySendError::Full(_)) => Push::Dropped,
            Err(TrySendError::Closed(_)) => Push::Closed,
        }
    }
}

/// Consumer half, owned by the dispatch loop.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::Receiver<ChangeSignal>,
    capacity: usize,
}

impl QueueReceiver {
    /// Pop one signal, then discard everything else currently queued.
    ///
    /// Never waits, and takes at most one queue's worth of signals so a busy
    /// producer cannot keep the drain spinning.
    pub fn drain(&mut self) -> Drain {
        match self.rx.try_recv() {
            Ok(ChangeSignal) => {}
            Err(TryRecvError::Empty) => return Drain::Idle,
            Err(TryRecvError::Disconnected) => return Drain::Closed,
        }

        let mut coalesced = 1;
        while coalesced < self.capacity {
            match self.rx.try_recv() {
                Ok(ChangeSignal) => coalesced += 1,
                Err(_) => break,
            }
        }
        Drain::Coalesced(coalesced)
    }

    /// Refuse further signals. Already-queued signals are discarded on drop.
    pub fn close(&mut self) {
        self.rx.close();
    }
}
