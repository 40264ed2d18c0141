//! DMX Universes and Channel-Range Sections
//!
//! A universe carries at most 510 channel bytes here (170 RGB LEDs). A
//! layout's channel stream is split across a contiguous run of universes;
//! each universe records the source ranges it carries as [`Section`]s and
//! rebuilds its payload from the layout's channel buffer before every send.

use crate::sacn::MAX_UNIVERSE;
use crate::{ControlError, Result};

/// Payload capacity of one universe in channel bytes
pub const MAX_CHANNELS_PER_UNIVERSE: usize = 510;

/// One contiguous binding from a layout channel range to a universe byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    /// First channel in the source layout's buffer
    pub layout_start: usize,
    /// First byte in the universe payload
    pub universe_start: usize,
    /// Number of channel bytes
    pub channel_count: usize,
}

/// One numbered DMX universe and the sections that fill it
#[derive(Debug, Clone)]
pub struct Universe {
    /// Universe ID on the wire
    pub id: u16,
    sequence: u8,
    data: Vec<u8>,
    sections: Vec<Section>,
}

impl Universe {
    /// Create an empty universe
    pub fn new(id: u16) -> Self {
        Self {
            id,
            sequence: 0,
            data: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Append a channel range as a new section, clamped to the spare
    /// capacity. Returns the number of channels actually added; 0 signals a
    /// full universe (the caller opens the next one).
    pub fn append(&mut self, layout_start: usize, channels_to_add: usize) -> usize {
        if self.data.len() >= MAX_CHANNELS_PER_UNIVERSE {
            // Universe is full, no channels added
            return 0;
        }

        let spare = MAX_CHANNELS_PER_UNIVERSE - self.data.len();
        let channel_count = channels_to_add.min(spare);

        self.sections.push(Section {
            layout_start,
            universe_start: self.data.len(),
            channel_count,
        });
        self.data.resize(self.data.len() + channel_count, 0);

        channel_count
    }

    /// Rebuild the payload by copying every section's bytes out of the
    /// layout channel buffer.
    ///
    /// Bindings are validated against the layout at scene load; a section
    /// past the end of the buffer is skipped, never allowed to panic the
    /// send task.
    pub fn pack(&mut self, channels: &[u8]) {
        for section in &self.sections {
            if section.layout_start + section.channel_count > channels.len() {
                tracing::warn!(
                    "Universe {} section {}..{} exceeds the {}-channel buffer, skipping",
                    self.id,
                    section.layout_start,
                    section.layout_start + section.channel_count,
                    channels.len()
                );
                continue;
            }
            self.data[section.universe_start..section.universe_start + section.channel_count]
                .copy_from_slice(
                    &channels[section.layout_start..section.layout_start + section.channel_count],
                );
        }
    }

    /// Current payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Occupied payload bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if no channels are bound
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Recorded source bindings
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Advance and return the E1.31 sequence number for the next packet
    pub fn next_sequence(&mut self) -> u8 {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        sequence
    }
}

/// Bind `channel_count` channels of a layout (starting at `layout_start`)
/// into the universe run, opening new universes as existing ones fill up.
///
/// The first universe is created with `start_universe` when the run is
/// empty; overflow universes continue with consecutive IDs.
pub fn append_channels(
    universes: &mut Vec<Universe>,
    start_universe: u16,
    layout_start: usize,
    channel_count: usize,
) -> Result<()> {
    if universes.is_empty() {
        universes.push(Universe::new(start_universe));
    }

    let mut layout_start = layout_start;
    let mut remaining = channel_count;

    while remaining > 0 {
        let last = universes.len() - 1;
        let added = universes[last].append(layout_start, remaining);
        layout_start += added;
        remaining -= added;

        if remaining > 0 {
            let next_id = universes[last].id + 1;
            if next_id > MAX_UNIVERSE {
                return Err(ControlError::DmxError(format!(
                    "Universe overflow past {} while binding {} channels",
                    MAX_UNIVERSE, channel_count
                )));
            }
            universes.push(Universe::new(next_id));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_within_capacity() {
        let mut universe = Universe::new(1);
        assert_eq!(universe.append(0, 300), 300);
        assert_eq!(universe.len(), 300);

        // Second section continues at byte 300
        assert_eq!(universe.append(300, 100), 100);
        let section = universe.sections()[1];
        assert_eq!(section.universe_start, 300);
        assert_eq!(section.layout_start, 300);
        assert_eq!(section.channel_count, 100);
    }

    #[test]
    fn test_append_clamps_to_capacity() {
        let mut universe = Universe::new(1);
        assert_eq!(universe.append(0, 600), 510);
        assert_eq!(universe.len(), 510);

        // Full universe accepts nothing more
        assert_eq!(universe.append(510, 90), 0);
        assert_eq!(universe.sections().len(), 1);
    }

    #[test]
    fn test_append_channels_exact_fit() {
        let mut universes = Vec::new();
        append_channels(&mut universes, 1, 0, 510).unwrap();
        assert_eq!(universes.len(), 1);
        assert_eq!(universes[0].len(), 510);
    }

    #[test]
    fn test_append_channels_one_over() {
        let mut universes = Vec::new();
        append_channels(&mut universes, 1, 0, 511).unwrap();
        assert_eq!(universes.len(), 2);
        assert_eq!(universes[0].len(), 510);
        assert_eq!(universes[1].len(), 1);
        assert_eq!(universes[1].id, 2);
        // The overflow section picks up where the first left off
        assert_eq!(universes[1].sections()[0].layout_start, 510);
    }

    #[test]
    fn test_append_channels_one_under() {
        let mut universes = Vec::new();
        append_channels(&mut universes, 1, 0, 509).unwrap();
        assert_eq!(universes.len(), 1);
        assert_eq!(universes[0].len(), 509);
    }

    #[test]
    fn test_universe_count_is_ceiling_division() {
        for n in [1usize, 510, 511, 1020, 1021, 3456] {
            let mut universes = Vec::new();
            append_channels(&mut universes, 1, 0, n).unwrap();
            assert_eq!(universes.len(), n.div_ceil(510), "for {} channels", n);

            let total: usize = universes
                .iter()
                .flat_map(|u| u.sections())
                .map(|s| s.channel_count)
                .sum();
            assert_eq!(total, n);
        }
    }

    #[test]
    fn test_sections_never_overlap() {
        let mut universes = Vec::new();
        append_channels(&mut universes, 5, 0, 1200).unwrap();

        for universe in &universes {
            let mut next_start = 0;
            for section in universe.sections() {
                assert_eq!(section.universe_start, next_start);
                next_start += section.channel_count;
            }
            assert!(next_start <= MAX_CHANNELS_PER_UNIVERSE);
        }

        // IDs are consecutive from the start universe
        let ids: Vec<u16> = universes.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![5, 6, 7]);
    }

    #[test]
    fn test_pack_copies_section_ranges() {
        let mut universes = Vec::new();
        append_channels(&mut universes, 1, 0, 700).unwrap();

        let channels: Vec<u8> = (0..700).map(|i| (i % 251) as u8).collect();
        for universe in &mut universes {
            universe.pack(&channels);
        }

        assert_eq!(universes[0].data(), &channels[0..510]);
        assert_eq!(universes[1].data(), &channels[510..700]);
    }

    #[test]
    fn test_pack_skips_sections_past_the_buffer() {
        let mut universes = Vec::new();
        append_channels(&mut universes, 1, 0, 600).unwrap();

        // 300-channel buffer is shorter than both bound ranges: payloads
        // stay zeroed instead of panicking
        let channels = vec![9u8; 300];
        for universe in &mut universes {
            universe.pack(&channels);
        }
        assert!(universes[0].data().iter().all(|&b| b == 0));
        assert!(universes[1].data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sequence_wraps() {
        let mut universe = Universe::new(1);
        universe.sequence = 255;
        assert_eq!(universe.next_sequence(), 255);
        assert_eq!(universe.next_sequence(), 0);
    }

    #[test]
    fn test_universe_id_overflow_is_an_error() {
        let mut universes = Vec::new();
        assert!(append_channels(&mut universes, MAX_UNIVERSE, 0, 1000).is_err());
    }
}
