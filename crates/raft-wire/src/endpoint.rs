//! Stream endpoints with absolute deadlines
//!
//! # Deadline semantics
//! - A deadline is an [`Instant`], not a per-syscall timeout
//! - Every read or write recomputes the time left, so one deadline bounds
//!   a whole multi-read frame
//! - Once the instant has passed, reads and writes fail with `TimedOut`
//!
//! # Thread Safety
//! - One reader and one writer may run concurrently on clones of the same
//!   connection; two readers (or two writers) must be serialized by the caller

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// A connected duplex byte stream the framing layer can borrow.
///
/// The framing layer never opens or closes an endpoint; it only sets a
/// deadline and then reads or writes.
pub trait Endpoint: Read + Write {
    /// Set the instant after which pending and future reads fail.
    ///
    /// `None` clears the deadline.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the stream refuses the deadline.
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()>;

    /// Set the instant after which pending and future writes fail.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the stream refuses the deadline.
    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()>;

    /// Peer identity, used only in diagnostics.
    fn remote_addr(&self) -> String;
}

impl<E: Endpoint + ?Sized> Endpoint for &mut E {
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_read_deadline(deadline)
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_write_deadline(deadline)
    }

    fn remote_addr(&self) -> String {
        (**self).remote_addr()
    }
}

/// Time left before `deadline`, or `TimedOut` once it has passed.
pub(crate) fn time_left(deadline: Option<Instant>) -> io::Result<Option<Duration>> {
    deadline.map_or(Ok(None), |deadline| {
        deadline
            .checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero())
            .map(Some)
            .ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "deadline elapsed"))
    })
}

/// TCP connection with deadline support.
///
/// Socket timeouts are re-armed from the stored deadline before every
/// syscall.
#[derive(Debug)]
pub struct TcpEndpoint {
    stream: TcpStream,
    peer: String,
    read_deadline: Option<Instant>,
    write_deadline: Option<Instant>,
}

impl TcpEndpoint {
    /// Wrap an established stream.
    #[must_use]
    pub fn new(stream: TcpStream) -> Self {
        let peer = stream
            .peer_addr()
            .map_or_else(|_| "unknown".to_string(), |addr| addr.to_string());
        Self {
            stream,
            peer,
            read_deadline: None,
            write_deadline: None,
        }
    }

    /// Open a connection to `addr`.
    ///
    /// # Errors
    ///
    /// Returns the connect error unchanged.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }

    /// Open a second handle on the same connection.
    ///
    /// The clone starts without deadlines, so a reader thread and a writer
    /// thread can each own one half.
    ///
    /// # Errors
    ///
    /// Returns the error from duplicating the socket.
    pub fn try_clone(&self) -> io::Result<Self> {
        Ok(Self {
            stream: self.stream.try_clone()?,
            peer: self.peer.clone(),
            read_deadline: None,
            write_deadline: None,
        })
    }

    /// Shut down one or both halves of the connection.
    ///
    /// # Errors
    ///
    /// Returns the error from the socket.
    pub fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        self.stream.shutdown(how)
    }

    #[must_use]
    pub const fn get_ref(&self) -> &TcpStream {
        &self.stream
    }

    #[must_use]
    pub fn into_inner(self) -> TcpStream {
        self.stream
    }
}

impl From<TcpStream> for TcpEndpoint {
    fn from(stream: TcpStream) -> Self {
        Self::new(stream)
    }
}

impl Read for TcpEndpoint {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let left = time_left(self.read_deadline)?;
        self.stream.set_read_timeout(left)?;
        self.stream.read(buf)
    }
}

impl Write for TcpEndpoint {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let left = time_left(self.write_deadline)?;
        self.stream.set_write_timeout(left)?;
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl Endpoint for TcpEndpoint {
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.read_deadline = deadline;
        Ok(())
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.write_deadline = deadline;
        Ok(())
    }

    fn remote_addr(&self) -> String {
        self.peer.clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use std::net::TcpListener;

    fn tcp_pair() -> (TcpEndpoint, TcpEndpoint) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpEndpoint::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, TcpEndpoint::new(server))
    }

    #[test]
    fn test_time_left_without_deadline_is_unbounded() {
        assert_eq!(time_left(None).unwrap(), None);
    }

    #[test]
    fn test_time_left_after_deadline_times_out() {
        let err = time_left(Some(Instant::now())).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_time_left_before_deadline_is_positive() {
        let left = time_left(Some(Instant::now() + Duration::from_secs(5)))
            .unwrap()
            .unwrap();
        assert!(left > Duration::from_secs(4));
    }

    #[test]
    fn test_tcp_read_honours_deadline() {
        let (mut client, _server) = tcp_pair();
        client
            .set_read_deadline(Some(Instant::now() + Duration::from_millis(50)))
            .unwrap();

        let started = Instant::now();
        let mut buf = [0u8; 8];
        let err = client.read(&mut buf).unwrap_err();

        assert!(matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_tcp_clone_shares_connection() {
        let (client, mut server) = tcp_pair();
        let mut writer = client.try_clone().unwrap();

        writer.write_all(b"ping").unwrap();
        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).unwrap();

        assert_eq!(&buf, b"ping");
        assert_eq!(writer.remote_addr(), client.remote_addr());
    }
}
