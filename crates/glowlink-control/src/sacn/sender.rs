//! UDP transport for sACN packets

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;

use crate::Result;

/// sACN well-known UDP port
pub const SACN_PORT: u16 = 5568;

/// Multicast address for universe discovery packets (E1.31-2016 section 6.2.7)
pub const DISCOVERY_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(239, 255, 250, 214);

/// One UDP sender, unicast to a resolved host or multicast per universe
#[derive(Debug)]
pub enum SacnSender {
    /// Sends every packet to one resolved target
    Unicast {
        /// Bound local socket
        socket: UdpSocket,
        /// Resolved target address
        target: IpAddr,
    },
    /// Sends data to the per-universe multicast group
    Multicast {
        /// Bound local socket
        socket: UdpSocket,
    },
}

impl SacnSender {
    /// Create a unicast sender toward a resolved address
    pub async fn unicast(target: IpAddr) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        Ok(SacnSender::Unicast { socket, target })
    }

    /// Create a multicast sender
    pub async fn multicast() -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.set_multicast_loop_v4(false)?;
        Ok(SacnSender::Multicast { socket })
    }

    /// Multicast group for a universe: 239.255.{hi}.{lo}
    pub fn universe_multicast_addr(universe: u16) -> SocketAddr {
        let [hi, lo] = universe.to_be_bytes();
        SocketAddr::from((Ipv4Addr::new(239, 255, hi, lo), SACN_PORT))
    }

    /// Send a data packet for one universe
    pub async fn send_data(&self, universe: u16, packet: &[u8]) -> Result<()> {
        match self {
            SacnSender::Unicast { socket, target } => {
                socket
                    .send_to(packet, SocketAddr::new(*target, SACN_PORT))
                    .await?;
            }
            SacnSender::Multicast { socket } => {
                socket
                    .send_to(packet, Self::universe_multicast_addr(universe))
                    .await?;
            }
        }
        tracing::trace!("Sent sACN data packet for universe {}", universe);
        Ok(())
    }

    /// Send a universe discovery packet
    pub async fn send_discovery(&self, packet: &[u8]) -> Result<()> {
        match self {
            SacnSender::Unicast { socket, target } => {
                socket
                    .send_to(packet, SocketAddr::new(*target, SACN_PORT))
                    .await?;
            }
            SacnSender::Multicast { socket } => {
                socket
                    .send_to(
                        packet,
                        SocketAddr::from((DISCOVERY_MULTICAST_ADDR, SACN_PORT)),
                    )
                    .await?;
            }
        }
        tracing::trace!("Sent sACN universe discovery packet");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universe_multicast_addr() {
        assert_eq!(
            SacnSender::universe_multicast_addr(1),
            "239.255.0.1:5568".parse().unwrap()
        );
        assert_eq!(
            SacnSender::universe_multicast_addr(256),
            "239.255.1.0:5568".parse().unwrap()
        );
        assert_eq!(
            SacnSender::universe_multicast_addr(63999),
            "239.255.249.255:5568".parse().unwrap()
        );
    }

    #[tokio::test]
    async fn test_unicast_sender_creation() {
        let sender = SacnSender::unicast("127.0.0.1".parse().unwrap()).await;
        assert!(sender.is_ok());
    }

    #[tokio::test]
    async fn test_multicast_sender_creation() {
        let sender = SacnSender::multicast().await;
        assert!(sender.is_ok());
    }
}
