//! E1.31 packet construction

use uuid::Uuid;

use crate::{ControlError, Result};

/// Highest valid sACN universe ID
pub const MAX_UNIVERSE: u16 = 63999;

/// Universe IDs carried by one discovery page
pub const DISCOVERY_UNIVERSES_PER_PAGE: usize = 512;

/// Source name embedded in every packet's framing layer
pub const SOURCE_NAME: &str = "Glowlink DMX Source";

/// Fixed component identifier for this source
pub const COMPONENT_IDENTIFIER: Uuid = Uuid::from_u128(0x29d71352_c9a8_4066_97a6_117bd10076f6);

const ACN_PACKET_IDENTIFIER: [u8; 12] = [
    0x41, 0x53, 0x43, 0x2d, 0x45, 0x31, 0x2e, 0x31, 0x37, 0x00, 0x00, 0x00,
];

const VECTOR_ROOT_E131_DATA: u32 = 0x0000_0004;
const VECTOR_ROOT_E131_EXTENDED: u32 = 0x0000_0008;
const VECTOR_E131_DATA_PACKET: u32 = 0x0000_0002;
const VECTOR_E131_EXTENDED_DISCOVERY: u32 = 0x0000_0002;
const VECTOR_UNIVERSE_DISCOVERY_UNIVERSE_LIST: u32 = 0x0000_0001;
const VECTOR_DMP_SET_PROPERTY: u8 = 0x02;

// Byte offsets shared by both packet types
const ROOT_FLAGS_OFFSET: usize = 16;
const FRAMING_FLAGS_OFFSET: usize = 38;
// Data packets: DMP layer starts after the 77-byte data framing layer
const DMP_FLAGS_OFFSET: usize = 115;
// Discovery packets: the universe list layer starts after the 74-byte
// discovery framing layer
const DISCOVERY_LAYER_OFFSET: usize = 112;

/// Builds sACN packets for one source (fixed CID + source name)
#[derive(Debug, Clone)]
pub struct PacketFactory {
    cid: [u8; 16],
    source_name: String,
    priority: u8,
}

impl PacketFactory {
    /// Create a factory with the fixed component identifier
    pub fn new(source_name: &str) -> Self {
        Self {
            cid: *COMPONENT_IDENTIFIER.as_bytes(),
            source_name: source_name.to_string(),
            priority: 100, // Default priority
        }
    }

    /// Set the priority carried by data packets (0-200, default 100)
    pub fn set_priority(&mut self, priority: u8) {
        self.priority = priority.min(200);
    }

    /// Build a data packet for one universe.
    ///
    /// `data` is the universe payload (up to 512 channel bytes); the DMX
    /// start code is prepended by the framing, not included in `data`.
    pub fn data_packet(&self, universe: u16, sequence: u8, data: &[u8]) -> Result<Vec<u8>> {
        validate_universe(universe)?;
        if data.len() > 512 {
            return Err(ControlError::DmxError(format!(
                "Universe payload too large: {} channels (max 512)",
                data.len()
            )));
        }

        let total = 126 + data.len();
        let mut packet = vec![0u8; total];
        let mut offset = write_root_layer(&mut packet, VECTOR_ROOT_E131_DATA, &self.cid, total);

        // Framing Layer
        // Flags and Length (16-bit)
        let framing_length = total - FRAMING_FLAGS_OFFSET;
        packet[offset..offset + 2]
            .copy_from_slice(&(0x7000u16 | framing_length as u16).to_be_bytes());
        offset += 2;

        // Vector (32-bit): VECTOR_E131_DATA_PACKET
        packet[offset..offset + 4].copy_from_slice(&VECTOR_E131_DATA_PACKET.to_be_bytes());
        offset += 4;

        offset = write_source_name(&mut packet, offset, &self.source_name);

        // Priority (1 byte)
        packet[offset] = self.priority;
        offset += 1;

        // Synchronization Address (16-bit) - 0 for no sync
        offset += 2;

        // Sequence Number (1 byte)
        packet[offset] = sequence;
        offset += 1;

        // Options (1 byte) - 0 for none
        offset += 1;

        // Universe (16-bit)
        packet[offset..offset + 2].copy_from_slice(&universe.to_be_bytes());
        offset += 2;

        // DMP Layer
        // Flags and Length (16-bit)
        let dmp_length = total - DMP_FLAGS_OFFSET;
        packet[offset..offset + 2].copy_from_slice(&(0x7000u16 | dmp_length as u16).to_be_bytes());
        offset += 2;

        // Vector (1 byte)
        packet[offset] = VECTOR_DMP_SET_PROPERTY;
        offset += 1;

        // Address Type & Data Type (1 byte)
        packet[offset] = 0xa1;
        offset += 1;

        // First Property Address (16-bit): 0x0000
        offset += 2;

        // Address Increment (16-bit): 0x0001
        packet[offset..offset + 2].copy_from_slice(&0x0001u16.to_be_bytes());
        offset += 2;

        // Property value count (16-bit): start code + channels
        packet[offset..offset + 2].copy_from_slice(&(data.len() as u16 + 1).to_be_bytes());
        offset += 2;

        // DMX Start Code (1 byte): 0x00
        offset += 1;

        // DMX Data
        packet[offset..offset + data.len()].copy_from_slice(data);

        Ok(packet)
    }

    /// Build universe discovery packets advertising `universe_ids`.
    ///
    /// IDs are sorted and split across pages of up to 512 universes; one
    /// packet per page.
    pub fn discovery_packets(&self, universe_ids: &[u16]) -> Vec<Vec<u8>> {
        let mut ids = universe_ids.to_vec();
        ids.sort_unstable();

        let last_page = ids.len().saturating_sub(1) / DISCOVERY_UNIVERSES_PER_PAGE;
        let pages = ids.chunks(DISCOVERY_UNIVERSES_PER_PAGE).enumerate();

        let mut packets = Vec::new();
        for (page, chunk) in pages {
            let total = 120 + 2 * chunk.len();
            let mut packet = vec![0u8; total];
            let mut offset =
                write_root_layer(&mut packet, VECTOR_ROOT_E131_EXTENDED, &self.cid, total);

            // Framing Layer
            let framing_length = total - FRAMING_FLAGS_OFFSET;
            packet[offset..offset + 2]
                .copy_from_slice(&(0x7000u16 | framing_length as u16).to_be_bytes());
            offset += 2;

            packet[offset..offset + 4]
                .copy_from_slice(&VECTOR_E131_EXTENDED_DISCOVERY.to_be_bytes());
            offset += 4;

            offset = write_source_name(&mut packet, offset, &self.source_name);

            // Reserved (4 bytes)
            offset += 4;

            // Universe Discovery Layer
            let layer_length = total - DISCOVERY_LAYER_OFFSET;
            packet[offset..offset + 2]
                .copy_from_slice(&(0x7000u16 | layer_length as u16).to_be_bytes());
            offset += 2;

            packet[offset..offset + 4]
                .copy_from_slice(&VECTOR_UNIVERSE_DISCOVERY_UNIVERSE_LIST.to_be_bytes());
            offset += 4;

            // Page / Last Page
            packet[offset] = page as u8;
            packet[offset + 1] = last_page as u8;
            offset += 2;

            // List of universes, sorted ascending
            for id in chunk {
                packet[offset..offset + 2].copy_from_slice(&id.to_be_bytes());
                offset += 2;
            }

            packets.push(packet);
        }

        packets
    }
}

fn validate_universe(universe: u16) -> Result<()> {
    if universe == 0 || universe > MAX_UNIVERSE {
        return Err(ControlError::DmxError(format!(
            "Invalid sACN universe: {} (must be 1-{})",
            universe, MAX_UNIVERSE
        )));
    }
    Ok(())
}

/// Write the ACN root layer, returning the offset of the next layer
fn write_root_layer(packet: &mut [u8], vector: u32, cid: &[u8; 16], total: usize) -> usize {
    let mut offset = 0;

    // Preamble Size (16-bit)
    packet[offset..offset + 2].copy_from_slice(&0x0010u16.to_be_bytes());
    offset += 2;

    // Post-amble Size (16-bit): 0x0000
    offset += 2;

    // ACN Packet Identifier (12 bytes)
    packet[offset..offset + 12].copy_from_slice(&ACN_PACKET_IDENTIFIER);
    offset += 12;

    // Flags and Length (16-bit)
    let root_length = total - ROOT_FLAGS_OFFSET;
    packet[offset..offset + 2].copy_from_slice(&(0x7000u16 | root_length as u16).to_be_bytes());
    offset += 2;

    // Vector (32-bit)
    packet[offset..offset + 4].copy_from_slice(&vector.to_be_bytes());
    offset += 4;

    // CID (16 bytes)
    packet[offset..offset + 16].copy_from_slice(cid);
    offset += 16;

    offset
}

/// Write the 64-byte null-terminated source name field
fn write_source_name(packet: &mut [u8], offset: usize, source_name: &str) -> usize {
    let source_bytes = source_name.as_bytes();
    let copy_len = source_bytes.len().min(63);
    packet[offset..offset + copy_len].copy_from_slice(&source_bytes[..copy_len]);
    offset + 64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_packet_structure() {
        let factory = PacketFactory::new(SOURCE_NAME);
        let data = [0u8; 510];
        let packet = factory.data_packet(1, 0, &data).unwrap();

        // 126-byte header plus payload
        assert_eq!(packet.len(), 636);

        // ACN Packet Identifier
        assert_eq!(&packet[4..16], &ACN_PACKET_IDENTIFIER);

        // Root vector: E1.31 data
        assert_eq!(&packet[18..22], &VECTOR_ROOT_E131_DATA.to_be_bytes());

        // CID
        assert_eq!(&packet[22..38], COMPONENT_IDENTIFIER.as_bytes());

        // Universe at offset 113, start code at 125
        assert_eq!(&packet[113..115], &1u16.to_be_bytes());
        assert_eq!(packet[125], 0x00);

        // Property value count = channels + start code
        assert_eq!(&packet[123..125], &511u16.to_be_bytes());
    }

    #[test]
    fn test_data_packet_carries_payload() {
        let factory = PacketFactory::new(SOURCE_NAME);
        let data: Vec<u8> = (0..180).map(|i| i as u8).collect();
        let packet = factory.data_packet(7, 42, &data).unwrap();

        assert_eq!(packet.len(), 126 + 180);
        assert_eq!(packet[111], 42); // Sequence
        assert_eq!(&packet[126..], &data[..]);
    }

    #[test]
    fn test_data_packet_priority() {
        let mut factory = PacketFactory::new(SOURCE_NAME);
        factory.set_priority(150);
        let packet = factory.data_packet(1, 0, &[0u8; 10]).unwrap();
        assert_eq!(packet[108], 150);

        factory.set_priority(255);
        let packet = factory.data_packet(1, 0, &[0u8; 10]).unwrap();
        assert_eq!(packet[108], 200); // Clamped
    }

    #[test]
    fn test_invalid_universe_rejected() {
        let factory = PacketFactory::new(SOURCE_NAME);
        assert!(factory.data_packet(0, 0, &[0u8; 10]).is_err());
        assert!(factory.data_packet(64000, 0, &[0u8; 10]).is_err());
        assert!(factory.data_packet(63999, 0, &[0u8; 10]).is_ok());
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let factory = PacketFactory::new(SOURCE_NAME);
        assert!(factory.data_packet(1, 0, &[0u8; 513]).is_err());
        assert!(factory.data_packet(1, 0, &[0u8; 512]).is_ok());
    }

    #[test]
    fn test_discovery_packet_structure() {
        let factory = PacketFactory::new(SOURCE_NAME);
        let packets = factory.discovery_packets(&[3, 1, 2]);
        assert_eq!(packets.len(), 1);

        let packet = &packets[0];
        assert_eq!(packet.len(), 126);

        // Root vector: E1.31 extended
        assert_eq!(&packet[18..22], &VECTOR_ROOT_E131_EXTENDED.to_be_bytes());
        // Framing vector: extended discovery
        assert_eq!(
            &packet[40..44],
            &VECTOR_E131_EXTENDED_DISCOVERY.to_be_bytes()
        );
        // Discovery layer vector
        assert_eq!(
            &packet[114..118],
            &VECTOR_UNIVERSE_DISCOVERY_UNIVERSE_LIST.to_be_bytes()
        );

        // Single page
        assert_eq!(packet[118], 0);
        assert_eq!(packet[119], 0);

        // Universe list is sorted
        assert_eq!(&packet[120..122], &1u16.to_be_bytes());
        assert_eq!(&packet[122..124], &2u16.to_be_bytes());
        assert_eq!(&packet[124..126], &3u16.to_be_bytes());
    }

    #[test]
    fn test_discovery_pagination() {
        let factory = PacketFactory::new(SOURCE_NAME);
        let ids: Vec<u16> = (1..=600).collect();
        let packets = factory.discovery_packets(&ids);

        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].len(), 120 + 2 * 512);
        assert_eq!(packets[1].len(), 120 + 2 * 88);

        // Page numbering
        assert_eq!(packets[0][118], 0);
        assert_eq!(packets[0][119], 1);
        assert_eq!(packets[1][118], 1);
        assert_eq!(packets[1][119], 1);

        // First universe of the second page
        assert_eq!(&packets[1][120..122], &513u16.to_be_bytes());
    }

    #[test]
    fn test_discovery_empty_universe_list() {
        let factory = PacketFactory::new(SOURCE_NAME);
        let packets = factory.discovery_packets(&[]);
        assert!(packets.is_empty());
    }

    #[test]
    fn test_source_name_truncated_to_63_bytes() {
        let long_name = "x".repeat(100);
        let factory = PacketFactory::new(&long_name);
        let packet = factory.data_packet(1, 0, &[0u8; 1]).unwrap();

        // 63 name bytes, null terminator at the end of the field
        assert!(packet[44..107].iter().all(|&b| b == b'x'));
        assert_eq!(packet[107], 0);
    }
}
