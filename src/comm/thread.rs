//! In-process communicator: one instance per worker thread.

use std::collections::{HashMap, HashSet, VecDeque};

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use tracing::{debug, warn};

use super::traits::copy_checked;
use super::{CommError, Communicator, RequestKey, RequestKind, Tag};

/// Tag reserved for broadcasts.
const BCAST_TAG: Tag = Tag::MAX;

#[derive(Debug)]
struct Envelope {
    tag: Tag,
    data: Vec<f64>,
}

/// Communicator over crossbeam channels, one channel per ordered rank pair.
///
/// Channels are unbounded, so sends complete immediately. Receives that find
/// a message with a different tag park it per (source, tag) until asked for.
#[derive(Debug)]
pub struct ThreadComm {
    rank: usize,
    size: usize,
    /// Indexed by destination rank.
    senders: Vec<Sender<Envelope>>,
    /// Indexed by source rank.
    receivers: Vec<Receiver<Envelope>>,
    /// Messages that arrived before they were asked for.
    parked: HashMap<(usize, Tag), VecDeque<Vec<f64>>>,
    /// Outstanding non-blocking operations.
    requests: HashSet<RequestKey>,
    /// Payloads of receives completed implicitly, oldest first.
    completed: HashMap<(usize, Tag), VecDeque<Vec<f64>>>,
}

impl ThreadComm {
    /// Create `size` connected communicators, ranks `0..size` in order.
    pub fn world(size: usize) -> Vec<ThreadComm> {
        let mut senders: Vec<Vec<Sender<Envelope>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut receivers: Vec<Vec<Receiver<Envelope>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();

        // channel src -> dst: sender kept by src (slot dst), receiver by dst (slot src)
        for src in 0..size {
            for dst in 0..size {
                let (tx, rx) = unbounded();
                senders[src].push(tx);
                receivers[dst].push(rx);
            }
        }

        senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(rank, (senders, receivers))| ThreadComm {
                rank,
                size,
                senders,
                receivers,
                parked: HashMap::new(),
                requests: HashSet::new(),
                completed: HashMap::new(),
            })
            .collect()
    }

    /// Number of outstanding non-blocking operations.
    pub fn num_outstanding(&self) -> usize {
        self.requests.len()
    }

    fn check_rank(&self, rank: usize) -> Result<(), CommError> {
        if rank >= self.size {
            return Err(CommError::InvalidRank {
                rank,
                size: self.size,
            });
        }
        Ok(())
    }

    /// Move everything currently queued from `src` into the parking area.
    fn drain_available(&mut self, src: usize) {
        loop {
            match self.receivers[src].try_recv() {
                Ok(env) => self
                    .parked
                    .entry((src, env.tag))
                    .or_default()
                    .push_back(env.data),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn reissue_guard(&mut self, key: RequestKey) -> Result<(), CommError> {
        if self.requests.contains(&key) {
            warn!(
                target: "comm",
                rank = self.rank,
                peer = key.peer,
                tag = key.tag,
                kind = ?key.kind,
                "request still outstanding, waiting for it before reissuing"
            );
            self.complete_or_wait(key)?;
        }
        Ok(())
    }
}

impl Communicator for ThreadComm {
    fn size(&self) -> usize {
        self.size
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn send(&mut self, data: &[f64], dest: usize, tag: Tag) -> Result<(), CommError> {
        self.check_rank(dest)?;
        debug!(target: "comm", rank = self.rank, dest, tag, len = data.len(), "send");
        self.senders[dest]
            .send(Envelope {
                tag,
                data: data.to_vec(),
            })
            .map_err(|_| CommError::Transport(format!("rank {} hung up", dest)))
    }

    fn recv(&mut self, src: usize, tag: Tag) -> Result<Vec<f64>, CommError> {
        self.check_rank(src)?;
        if let Some(data) = self.parked.get_mut(&(src, tag)).and_then(|q| q.pop_front()) {
            return Ok(data);
        }
        loop {
            let env = self.receivers[src].recv().map_err(|_| {
                CommError::Transport(format!(
                    "rank {} hung up before sending tag {}",
                    src, tag
                ))
            })?;
            if env.tag == tag {
                debug!(target: "comm", rank = self.rank, src, tag, len = env.data.len(), "recv");
                return Ok(env.data);
            }
            self.parked.entry((src, env.tag)).or_default().push_back(env.data);
        }
    }

    fn isend(&mut self, data: &[f64], dest: usize, tag: Tag) -> Result<(), CommError> {
        let key = RequestKey::send(dest, tag);
        self.reissue_guard(key)?;
        self.send(data, dest, tag)?;
        self.requests.insert(key);
        Ok(())
    }

    fn irecv(&mut self, src: usize, tag: Tag) -> Result<(), CommError> {
        self.check_rank(src)?;
        let key = RequestKey::recv(src, tag);
        self.reissue_guard(key)?;
        self.requests.insert(key);
        Ok(())
    }

    fn wait_recv(&mut self, src: usize, tag: Tag) -> Result<Vec<f64>, CommError> {
        if let Some(data) = self.completed.get_mut(&(src, tag)).and_then(|q| q.pop_front()) {
            return Ok(data);
        }
        if self.requests.remove(&RequestKey::recv(src, tag)) {
            return self.recv(src, tag);
        }
        Err(CommError::Transport(format!(
            "no receive posted for rank {} tag {}",
            src, tag
        )))
    }

    fn bcast(&mut self, data: &mut [f64], root: usize) -> Result<(), CommError> {
        self.check_rank(root)?;
        if self.rank == root {
            for dest in (0..self.size).filter(|&r| r != root) {
                self.send(data, dest, BCAST_TAG)?;
            }
            Ok(())
        } else {
            let received = self.recv(root, BCAST_TAG)?;
            copy_checked(data, &received, root, BCAST_TAG)
        }
    }

    fn probe(&mut self, src: usize, tag: Tag) -> Result<bool, CommError> {
        self.check_rank(src)?;
        self.drain_available(src);
        Ok(self.parked.get(&(src, tag)).is_some_and(|q| !q.is_empty()))
    }

    fn complete_or_wait(&mut self, key: RequestKey) -> Result<(), CommError> {
        if !self.requests.remove(&key) {
            return Ok(());
        }
        match key.kind {
            // channel sends are buffered and complete on issue
            RequestKind::Send => Ok(()),
            RequestKind::Recv => {
                let data = self.recv(key.peer, key.tag)?;
                self.completed
                    .entry((key.peer, key.tag))
                    .or_default()
                    .push_back(data);
                Ok(())
            }
        }
    }

    fn cleanup(&mut self) -> Result<(), CommError> {
        let keys: Vec<RequestKey> = self.requests.iter().copied().collect();
        for key in keys {
            self.complete_or_wait(key)?;
        }
        Ok(())
    }
}

impl Drop for ThreadComm {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            warn!(target: "comm", rank = self.rank, "cleanup failed: {}", e);
        }
    }
}
