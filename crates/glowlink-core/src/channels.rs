//! Channel Tables - Serpentine Wiring Between Samples and LEDs
//!
//! Physical LED strips rarely run in row-major order: panels are commonly
//! wired serpentine (alternating direction per strip) or split from the
//! center outward. A [`ChannelTable`] is a fixed permutation built once per
//! layout that maps a sample index to the LED index at its position in the
//! output channel stream. It never changes after construction.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// Wiring pattern of a pixel grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridWiring {
    /// Row-major, every row left to right
    HorizontalLines,
    /// Row-major, odd rows reversed (serpentine)
    HorizontalLinesZigZag,
    /// Columns split from the center outward, direction alternating by
    /// column parity and mirrored between the two halves
    VerticalLinesZigZagMirrored,
}

/// Immutable permutation from sample index to LED index.
///
/// Bijective over `[0, len)` for every wiring mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTable {
    table: Vec<usize>,
}

impl ChannelTable {
    /// Build the table for a grid wiring mode
    pub fn for_grid(wiring: GridWiring, horizontal: usize, vertical: usize) -> Self {
        match wiring {
            GridWiring::HorizontalLines => Self::horizontal_lines(horizontal, vertical),
            GridWiring::HorizontalLinesZigZag => Self::horizontal_zigzag(horizontal, vertical),
            GridWiring::VerticalLinesZigZagMirrored => {
                Self::vertical_zigzag_mirrored(horizontal, vertical)
            }
        }
    }

    /// Identity mapping, row-major
    pub fn horizontal_lines(horizontal: usize, vertical: usize) -> Self {
        Self {
            table: (0..horizontal * vertical).collect(),
        }
    }

    /// Row-major with odd rows traversed right to left
    pub fn horizontal_zigzag(horizontal: usize, vertical: usize) -> Self {
        let mut table = vec![0; horizontal * vertical];
        let mut led_index = 0;

        for row in 0..vertical {
            for col_offset in 0..horizontal {
                // Reverse LED direction on odd rows
                let col = if row % 2 == 1 {
                    horizontal - col_offset - 1
                } else {
                    col_offset
                };

                table[row * horizontal + col] = led_index;
                led_index += 1;
            }
        }

        Self { table }
    }

    /// Columns wired from the center outward: the left half runs toward
    /// column 0, the right half toward the last column, with the vertical
    /// direction alternating by column parity and mirrored between halves.
    pub fn vertical_zigzag_mirrored(horizontal: usize, vertical: usize) -> Self {
        let mut table = vec![0; horizontal * vertical];
        let mut led_index = 0;

        // Left half of the columns
        for col in (0..horizontal / 2).rev() {
            for row_offset in 0..vertical {
                // Reverse LED direction on odd columns
                let row = if col % 2 == 1 {
                    vertical - row_offset - 1
                } else {
                    row_offset
                };

                table[row * horizontal + col] = led_index;
                led_index += 1;
            }
        }

        // Right half of the columns
        for col in horizontal / 2..horizontal {
            for row_offset in 0..vertical {
                // Reverse LED direction on even columns
                let row = if col % 2 == 0 {
                    vertical - row_offset - 1
                } else {
                    row_offset
                };

                table[row * horizontal + col] = led_index;
                led_index += 1;
            }
        }

        Self { table }
    }

    /// Serial wiring of a stacked-panel lantern: panels in order, columns in
    /// reverse order within each panel, rows reversed on odd columns.
    pub fn lantern_serial(per_row: usize, panel_rows: usize, panels: usize) -> Self {
        let mut table = vec![0; per_row * panel_rows * panels];
        let mut led_index = 0;

        for panel in 0..panels {
            let panel_offset = per_row * panel_rows * panel;

            for col in (0..per_row).rev() {
                for row_offset in (0..panel_rows).rev() {
                    // Reverse LED direction on odd columns
                    let row = if col % 2 == 1 {
                        panel_rows - row_offset - 1
                    } else {
                        row_offset
                    };

                    table[row * per_row + col + panel_offset] = led_index;
                    led_index += 1;
                }
            }
        }

        Self { table }
    }

    /// LED index for a sample index
    pub fn led_index(&self, sample_index: usize) -> usize {
        self.table[sample_index]
    }

    /// Number of mapped samples
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if the table maps no samples
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Write sample colors into the output channel stream: sample i's R,G,B
    /// land at byte offset `table[i] * 3`.
    ///
    /// `out` must hold `len() * 3` bytes.
    pub fn write_channels(&self, colors: &[Rgb], out: &mut [u8]) {
        debug_assert_eq!(colors.len(), self.table.len());
        debug_assert_eq!(out.len(), self.table.len() * 3);

        for (sample_index, color) in colors.iter().enumerate() {
            let channel = self.table[sample_index] * 3;
            out[channel] = color.r;
            out[channel + 1] = color.g;
            out[channel + 2] = color.b;
        }
    }
}
