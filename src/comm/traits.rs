//! Communicator interface.

use super::CommError;

/// Message tag.
pub type Tag = u64;

/// Direction of a non-blocking operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Send,
    Recv,
}

/// Key of an outstanding non-blocking operation.
///
/// At most one operation per key may be outstanding; issuing another one
/// first completes the old one via [`Communicator::complete_or_wait`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub peer: usize,
    pub tag: Tag,
    pub kind: RequestKind,
}

impl RequestKey {
    pub fn send(peer: usize, tag: Tag) -> Self {
        Self {
            peer,
            tag,
            kind: RequestKind::Send,
        }
    }

    pub fn recv(peer: usize, tag: Tag) -> Self {
        Self {
            peer,
            tag,
            kind: RequestKind::Recv,
        }
    }
}

/// Point-to-point transport between ranks `0..size()`.
pub trait Communicator: Send {
    fn size(&self) -> usize;

    fn rank(&self) -> usize;

    fn is_first(&self) -> bool {
        self.rank() == 0
    }

    fn is_last(&self) -> bool {
        self.rank() + 1 == self.size()
    }

    /// Blocking send.
    fn send(&mut self, data: &[f64], dest: usize, tag: Tag) -> Result<(), CommError>;

    /// Blocking receive of the next message from `src` with `tag`.
    fn recv(&mut self, src: usize, tag: Tag) -> Result<Vec<f64>, CommError>;

    /// Blocking receive into a buffer of known size.
    fn recv_into(&mut self, buf: &mut [f64], src: usize, tag: Tag) -> Result<(), CommError> {
        let data = self.recv(src, tag)?;
        copy_checked(buf, &data, src, tag)
    }

    /// Non-blocking send.
    fn isend(&mut self, data: &[f64], dest: usize, tag: Tag) -> Result<(), CommError>;

    /// Post a non-blocking receive.
    fn irecv(&mut self, src: usize, tag: Tag) -> Result<(), CommError>;

    /// Wait for a receive posted with [`irecv`](Self::irecv) and return its payload.
    fn wait_recv(&mut self, src: usize, tag: Tag) -> Result<Vec<f64>, CommError>;

    /// Broadcast `data` from `root` to every rank.
    fn bcast(&mut self, data: &mut [f64], root: usize) -> Result<(), CommError>;

    /// Whether a message from `src` with `tag` is ready to be received.
    fn probe(&mut self, src: usize, tag: Tag) -> Result<bool, CommError>;

    /// Complete the outstanding operation under `key`, if any.
    fn complete_or_wait(&mut self, key: RequestKey) -> Result<(), CommError>;

    /// Wait on every outstanding operation.
    fn cleanup(&mut self) -> Result<(), CommError>;
}

pub(crate) fn copy_checked(buf: &mut [f64], data: &[f64], src: usize, tag: Tag) -> Result<(), CommError> {
    if buf.len() != data.len() {
        return Err(CommError::Transport(format!(
            "size mismatch for message from rank {} tag {}: expected {}, got {}",
            src,
            tag,
            buf.len(),
            data.len()
        )));
    }
    buf.copy_from_slice(data);
    Ok(())
}
