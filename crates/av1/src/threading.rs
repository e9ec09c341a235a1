use tracing::debug;

use crate::engine::SuperblockSize;
use crate::settings::Resolution;

const FULL_HD: Resolution = Resolution::new(1920, 1080);
const QHD: Resolution = Resolution::new(960, 540);
const NHD: Resolution = Resolution::new(640, 360);
const QNHD: Resolution = Resolution::new(320, 180);

/// Thread and tile configuration for one encode resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadingLayout {
    /// Encoder threads.
    pub threads: u32,
    /// log2 of the number of tile rows.
    pub tile_rows_log2: u8,
    /// Superblock size selection.
    pub superblock_size: SuperblockSize,
}

impl ThreadingLayout {
    /// Picks the layout by pixel count, capped at `max_threads`.
    pub fn for_resolution(resolution: Resolution, max_threads: u32) -> Self {
        let pixels = resolution.pixels();
        let (threads, tile_rows_log2) = if pixels >= FULL_HD.pixels() {
            (8, 1)
        } else if pixels >= NHD.pixels() {
            (4, 0)
        } else if pixels >= QNHD.pixels() {
            (2, 0)
        } else {
            (1, 0)
        };
        let threads = threads.min(max_threads.max(1));

        let superblock_size = if threads > 4 && pixels >= QHD.pixels() {
            SuperblockSize::Size64x64
        } else {
            SuperblockSize::Dynamic
        };

        let layout = Self {
            threads,
            tile_rows_log2,
            superblock_size,
        };
        debug!(
            width = resolution.width,
            height = resolution.height,
            ?layout,
            "selected threading layout"
        );
        layout
    }
}
