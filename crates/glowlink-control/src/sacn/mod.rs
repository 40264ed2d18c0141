//! sACN (E1.31) protocol implementation
//!
//! sACN (Streaming ACN) carries DMX512 universes over IP, unicast or
//! multicast. Two packet types matter here:
//!
//! - **Data packets** carry up to 512 channel bytes for one universe and
//!   are sent at the configured output rate.
//! - **Universe discovery packets** advertise the set of universes a source
//!   transmits and are resent every 10 seconds (E1.31-2016 section 4.3).
//!
//! Packet layout follows E1.31-2016: an ACN root layer with a fixed
//! component identifier (CID), a framing layer with a human-readable source
//! name, and a DMP (data) or universe-discovery payload layer.

pub mod packet;
pub mod sender;

pub use packet::{PacketFactory, DISCOVERY_UNIVERSES_PER_PAGE, MAX_UNIVERSE, SOURCE_NAME};
pub use sender::{SacnSender, DISCOVERY_MULTICAST_ADDR, SACN_PORT};
