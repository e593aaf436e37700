//! In-memory duplex stream pair
//!
//! Two [`PipeEndpoint`]s connected back to back: bytes written to one are
//! read from the other. Reads block until data arrives, the peer closes, or
//! the read deadline passes, which makes deadline behaviour testable without
//! sockets.
//!
//! ```rust
//! use std::io::{Read, Write};
//! use raft_wire::pipe;
//!
//! # fn main() -> std::io::Result<()> {
//! let (mut left, mut right) = pipe::pair();
//! left.write_all(b"hello")?;
//!
//! let mut buf = [0u8; 5];
//! right.read_exact(&mut buf)?;
//! assert_eq!(&buf, b"hello");
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Instant;

use crate::endpoint::{Endpoint, time_left};

/// One direction of the pipe.
#[derive(Debug)]
struct Channel {
    state: Mutex<ChannelState>,
    changed: Condvar,
}

#[derive(Debug, Default)]
struct ChannelState {
    buffer: VecDeque<u8>,
    closed: bool,
    consumed: u64,
    capacity: Option<usize>,
}

impl Channel {
    fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(ChannelState {
                capacity,
                ..ChannelState::default()
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, ChannelState>> {
        self.state
            .lock()
            .map_err(|_| io::Error::other("lock poisoned"))
    }

    /// Block until `ready` holds or `deadline` passes.
    fn wait_until<'a>(
        &self,
        mut state: MutexGuard<'a, ChannelState>,
        deadline: Option<Instant>,
        ready: impl Fn(&ChannelState) -> bool,
    ) -> io::Result<MutexGuard<'a, ChannelState>> {
        while !ready(&state) {
            state = match time_left(deadline)? {
                Some(left) => {
                    self.changed
                        .wait_timeout(state, left)
                        .map_err(|_| io::Error::other("lock poisoned"))?
                        .0
                }
                None => self
                    .changed
                    .wait(state)
                    .map_err(|_| io::Error::other("lock poisoned"))?,
            };
        }
        Ok(state)
    }

    fn close(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
        }
        self.changed.notify_all();
    }
}

/// One end of an in-memory duplex stream.
///
/// Clones share the same connection, like `TcpStream::try_clone`. The
/// connection closes when [`PipeEndpoint::close`] is called or the last
/// handle of one side is dropped.
#[derive(Debug)]
pub struct PipeEndpoint {
    incoming: Arc<Channel>,
    outgoing: Arc<Channel>,
    handles: Arc<()>,
    local: &'static str,
    peer: &'static str,
    read_deadline: Option<Instant>,
    write_deadline: Option<Instant>,
}

/// Create a connected pair of endpoints with unbounded buffers.
#[must_use]
pub fn pair() -> (PipeEndpoint, PipeEndpoint) {
    pair_with_capacity(None)
}

/// Create a connected pair whose buffers hold at most `capacity` bytes per
/// direction; writes block while the peer's buffer is full.
#[must_use]
pub fn bounded_pair(capacity: usize) -> (PipeEndpoint, PipeEndpoint) {
    pair_with_capacity(Some(capacity))
}

fn pair_with_capacity(capacity: Option<usize>) -> (PipeEndpoint, PipeEndpoint) {
    let left_to_right = Arc::new(Channel::with_capacity(capacity));
    let right_to_left = Arc::new(Channel::with_capacity(capacity));

    let left = PipeEndpoint {
        incoming: Arc::clone(&right_to_left),
        outgoing: Arc::clone(&left_to_right),
        handles: Arc::new(()),
        local: "memory:0",
        peer: "memory:1",
        read_deadline: None,
        write_deadline: None,
    };
    let right = PipeEndpoint {
        incoming: left_to_right,
        outgoing: right_to_left,
        handles: Arc::new(()),
        local: "memory:1",
        peer: "memory:0",
        read_deadline: None,
        write_deadline: None,
    };
    (left, right)
}

impl PipeEndpoint {
    /// Open a second handle on this end, without deadlines.
    #[must_use]
    pub fn try_clone(&self) -> Self {
        Self {
            incoming: Arc::clone(&self.incoming),
            outgoing: Arc::clone(&self.outgoing),
            handles: Arc::clone(&self.handles),
            local: self.local,
            peer: self.peer,
            read_deadline: None,
            write_deadline: None,
        }
    }

    /// Close both directions.
    ///
    /// The peer reads any bytes already buffered and then sees end of
    /// stream; its writes fail with `BrokenPipe`.
    pub fn close(&self) {
        self.outgoing.close();
        self.incoming.close();
    }

    /// Total bytes this end has read so far.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.incoming.lock().map_or(0, |state| state.consumed)
    }

    /// Bytes written by the peer and not yet read by this end.
    #[must_use]
    pub fn bytes_pending(&self) -> usize {
        self.incoming.lock().map_or(0, |state| state.buffer.len())
    }

    #[must_use]
    pub const fn local_addr(&self) -> &'static str {
        self.local
    }
}

impl Drop for PipeEndpoint {
    fn drop(&mut self) {
        if Arc::strong_count(&self.handles) == 1 {
            self.close();
        }
    }
}

impl Read for PipeEndpoint {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let state = self.incoming.lock()?;
        let mut state = self.incoming.wait_until(state, self.read_deadline, |state| {
            !state.buffer.is_empty() || state.closed
        })?;

        let count = buf.len().min(state.buffer.len());
        for (slot, byte) in buf.iter_mut().zip(state.buffer.drain(..count)) {
            *slot = byte;
        }
        state.consumed = state.consumed.saturating_add(count as u64);
        drop(state);

        self.incoming.changed.notify_all();
        Ok(count)
    }
}

impl Write for PipeEndpoint {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let state = self.outgoing.lock()?;
        let mut state = self.outgoing.wait_until(state, self.write_deadline, |state| {
            state.closed
                || state
                    .capacity
                    .is_none_or(|capacity| state.buffer.len() < capacity)
        })?;

        if state.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        }

        let space = state
            .capacity
            .map_or(buf.len(), |capacity| capacity.saturating_sub(state.buffer.len()));
        let count = buf.len().min(space);
        state.buffer.extend(buf.iter().take(count));
        drop(state);

        self.outgoing.changed.notify_all();
        Ok(count)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Endpoint for PipeEndpoint {
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.read_deadline = deadline;
        Ok(())
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.write_deadline = deadline;
        Ok(())
    }

    fn remote_addr(&self) -> String {
        self.peer.to_string()
    }
}
