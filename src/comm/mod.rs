//! Point-to-point communication between time-parallel workers.
//!
//! - [`Communicator`]: blocking and non-blocking send/receive over raw `f64`
//!   buffers keyed by (peer rank, tag)
//! - [`ThreadComm`]: in-process implementation over crossbeam channels, one
//!   communicator per worker thread

mod thread;
mod traits;

pub use thread::ThreadComm;
pub use traits::{Communicator, RequestKey, RequestKind, Tag};

use thiserror::Error;

/// Error type for the communication layer.
#[derive(Debug, Error)]
pub enum CommError {
    /// The transport reported a failure.
    #[error("Communication failed: {0}")]
    Transport(String),

    /// Peer rank outside the communicator.
    #[error("Invalid rank {rank} for communicator of size {size}")]
    InvalidRank { rank: usize, size: usize },
}
