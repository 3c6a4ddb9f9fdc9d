//! Change observation: filesystem watching and the pending-signal queue.
//!
//! The watcher produces raw write events; the queue decouples their arrival
//! from the dispatch loop's tick.

pub mod queue;
pub mod watcher;

pub use queue::{ChangeSignal, DEFAULT_QUEUE_CAPACITY, Drain, Push, QueueReceiver, QueueSender, pending_queue};
pub use watcher::{ChangeWatcher, WatchStreams};
