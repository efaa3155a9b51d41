//! Datagram transport between the front door and the decoder.
//!
//! The front door holds a [`Relay`] and the decoder drains an [`Inbox`].
//! Two transports implement the pair:
//!
//! - UDP ([`UdpRelay`] / [`UdpInbox`]), which also works when the two
//!   halves run in separate processes.
//! - An in-process bounded queue ([`ChannelRelay`] / [`ChannelInbox`]).
//!
//! Both deliver at most `buffer_size` bytes per payload. Longer payloads
//! are truncated, not rejected. Neither applies backpressure: a payload
//! that cannot be handed over right away is dropped.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

/// Which transport carries payloads to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Loopback UDP datagrams.
    #[default]
    Udp,
    /// In-process bounded queue.
    Channel,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp => write!(f, "udp"),
            Self::Channel => write!(f, "channel"),
        }
    }
}

/// Sending half: forwards raw form bodies to the decoder.
#[async_trait]
pub trait Relay: Send + Sync + fmt::Debug {
    /// The transport this relay uses.
    fn transport(&self) -> Transport;

    /// Forward one payload verbatim.
    ///
    /// Delivery is fire-and-forget; success only means the payload left
    /// this side.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload could not be handed to the transport.
    async fn forward(&self, payload: Vec<u8>) -> Result<()>;
}

/// Receiving half: yields payloads one at a time.
#[async_trait]
pub trait Inbox: Send + fmt::Debug {
    /// Wait for the next payload.
    ///
    /// Returns `Ok(None)` once no more payloads can arrive.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying socket fails.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Relay over UDP from an ephemeral local socket.
#[derive(Debug)]
pub struct UdpRelay {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpRelay {
    /// Bind an ephemeral socket for sending to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if no local socket can be bound.
    pub async fn bind(target: SocketAddr) -> Result<Self> {
        let local = if target.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| Error::Bind {
                addr: local,
                source,
            })?;
        debug!("UDP relay ready, sending to {}", target);
        Ok(Self { socket, target })
    }

    /// Address payloads are sent to.
    #[must_use]
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

#[async_trait]
impl Relay for UdpRelay {
    fn transport(&self) -> Transport {
        Transport::Udp
    }

    async fn forward(&self, payload: Vec<u8>) -> Result<()> {
        self.socket
            .send_to(&payload, self.target)
            .await
            .map_err(|source| Error::Send {
                addr: self.target,
                source,
            })?;
        trace!("Sent {} bytes to {}", payload.len(), self.target);
        Ok(())
    }
}

/// Inbox reading datagrams from a bound UDP socket.
#[derive(Debug)]
pub struct UdpInbox {
    socket: UdpSocket,
    buffer_size: usize,
}

impl UdpInbox {
    /// Bind the decoder's listening socket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the address is unavailable.
    pub async fn bind(addr: SocketAddr, buffer_size: usize) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        Ok(Self {
            socket,
            buffer_size,
        })
    }

    /// The address actually bound (useful when binding port 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be queried.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

#[async_trait]
impl Inbox for UdpInbox {
    async fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.buffer_size];
        let (len, peer) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(Error::Receive)?;
        buf.truncate(len);
        trace!("Received {} bytes from {}", len, peer);
        Ok(Some(buf))
    }
}

/// Relay feeding an in-process queue.
#[derive(Debug, Clone)]
pub struct ChannelRelay {
    tx: mpsc::Sender<Vec<u8>>,
}

#[async_trait]
impl Relay for ChannelRelay {
    fn transport(&self) -> Transport {
        Transport::Channel
    }

    async fn forward(&self, payload: Vec<u8>) -> Result<()> {
        self.tx.try_send(payload).map_err(|e| match e {
            TrySendError::Full(dropped) => Error::QueueFull {
                dropped: dropped.len(),
            },
            TrySendError::Closed(_) => Error::ChannelClosed,
        })
    }
}

/// Inbox draining an in-process queue.
#[derive(Debug)]
pub struct ChannelInbox {
    rx: mpsc::Receiver<Vec<u8>>,
    buffer_size: usize,
}

#[async_trait]
impl Inbox for ChannelInbox {
    async fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.rx.recv().await.map(|mut payload| {
            if payload.len() > self.buffer_size {
                warn!(
                    "Truncating {}-byte payload to {} bytes",
                    payload.len(),
                    self.buffer_size
                );
                payload.truncate(self.buffer_size);
            }
            payload
        }))
    }
}

/// Create a connected in-process relay/inbox pair.
///
/// `capacity` bounds the number of queued payloads; forwarding into a full
/// queue fails with [`Error::QueueFull`]. `buffer_size` bounds each
/// payload's length.
///
/// # Panics
///
/// Panics if `capacity` is zero.
#[must_use]
pub fn channel(capacity: usize, buffer_size: usize) -> (ChannelRelay, ChannelInbox) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChannelRelay { tx }, ChannelInbox { rx, buffer_size })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn udp_pair(buffer_size: usize) -> (UdpRelay, UdpInbox) {
        let inbox = UdpInbox::bind(SocketAddr::from(([127, 0, 0, 1], 0)), buffer_size)
            .await
            .unwrap();
        let relay = UdpRelay::bind(inbox.local_addr().unwrap()).await.unwrap();
        (relay, inbox)
    }

    async fn recv_with_timeout(inbox: &mut impl Inbox) -> Option<Vec<u8>> {
        tokio::time::timeout(Duration::from_secs(5), inbox.recv())
            .await
            .expect("timed out waiting for payload")
            .unwrap()
    }

    #[test]
    fn test_transport_display() {
        assert_eq!(Transport::Udp.to_string(), "udp");
        assert_eq!(Transport::Channel.to_string(), "channel");
    }

    #[test]
    fn test_transport_default() {
        assert_eq!(Transport::default(), Transport::Udp);
    }

    #[test]
    fn test_transport_serde() {
        let json = serde_json::to_string(&Transport::Channel).unwrap();
        assert_eq!(json, "\"channel\"");
        let parsed: Transport = serde_json::from_str("\"udp\"").unwrap();
        assert_eq!(parsed, Transport::Udp);
    }

    #[tokio::test]
    async fn test_channel_round_trip() {
        let (relay, mut inbox) = channel(4, 1024);
        assert_eq!(relay.transport(), Transport::Channel);

        relay.forward(b"a=1&b=2".to_vec()).await.unwrap();
        assert_eq!(recv_with_timeout(&mut inbox).await.unwrap(), b"a=1&b=2");
    }

    #[tokio::test]
    async fn test_channel_truncates_to_buffer_size() {
        let (relay, mut inbox) = channel(4, 8);
        relay.forward(b"name=0123456789".to_vec()).await.unwrap();
        assert_eq!(recv_with_timeout(&mut inbox).await.unwrap(), b"name=012");
    }

    #[tokio::test]
    async fn test_channel_closes_when_relay_dropped() {
        let (relay, mut inbox) = channel(4, 1024);
        relay.forward(b"a=1".to_vec()).await.unwrap();
        drop(relay);

        assert!(recv_with_timeout(&mut inbox).await.is_some());
        assert!(recv_with_timeout(&mut inbox).await.is_none());
    }

    #[tokio::test]
    async fn test_channel_full_queue_drops_instead_of_waiting() {
        let (relay, mut inbox) = channel(1, 1024);
        relay.forward(b"a=1".to_vec()).await.unwrap();

        let err = tokio::time::timeout(Duration::from_secs(2), relay.forward(b"b=2".to_vec()))
            .await
            .expect("forward waited for queue space")
            .unwrap_err();
        assert!(matches!(err, Error::QueueFull { dropped: 3 }));

        assert_eq!(recv_with_timeout(&mut inbox).await.unwrap(), b"a=1");
        relay.forward(b"c=3".to_vec()).await.unwrap();
        assert_eq!(recv_with_timeout(&mut inbox).await.unwrap(), b"c=3");
    }

    #[tokio::test]
    async fn test_channel_forward_after_inbox_dropped() {
        let (relay, inbox) = channel(4, 1024);
        drop(inbox);

        let err = relay.forward(b"a=1".to_vec()).await.unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
    }

    #[tokio::test]
    async fn test_udp_round_trip() {
        let (relay, mut inbox) = udp_pair(1024).await;
        assert_eq!(relay.transport(), Transport::Udp);
        assert_eq!(relay.target(), inbox.local_addr().unwrap());

        relay.forward(b"name=Ann".to_vec()).await.unwrap();
        assert_eq!(recv_with_timeout(&mut inbox).await.unwrap(), b"name=Ann");
    }

    #[tokio::test]
    async fn test_udp_truncates_to_buffer_size() {
        let (relay, mut inbox) = udp_pair(4).await;
        relay.forward(b"abcdefgh".to_vec()).await.unwrap();
        assert_eq!(recv_with_timeout(&mut inbox).await.unwrap(), b"abcd");
    }

    #[tokio::test]
    async fn test_udp_inbox_bind_conflict() {
        let (_relay, inbox) = udp_pair(16).await;
        let taken = inbox.local_addr().unwrap();

        let err = UdpInbox::bind(taken, 16).await.unwrap_err();
        assert!(matches!(err, Error::Bind { .. }));
    }
}
