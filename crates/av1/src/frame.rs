//! Raw input pictures.

use crate::settings::Resolution;

/// An 8-bit 4:2:0 planar picture with tightly packed planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I420Buffer {
    resolution: Resolution,
    y: Vec<u8>,
    u: Vec<u8>,
    v: Vec<u8>,
}

impl I420Buffer {
    /// Creates a mid-grey picture.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_fn(width, height, |_, _| 128, |_, _| (128, 128))
    }

    /// Creates a picture from per-sample functions. `luma` is called with
    /// luma coordinates, `chroma` with chroma coordinates and returns `(u, v)`.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut luma: impl FnMut(u32, u32) -> u8,
        mut chroma: impl FnMut(u32, u32) -> (u8, u8),
    ) -> Self {
        assert!(width > 0 && height > 0, "empty picture {width}x{height}");

        let resolution = Resolution::new(width, height);
        let (chroma_width, chroma_height) = chroma_size(resolution);

        let mut y = Vec::with_capacity(resolution.pixels() as usize);
        for row in 0..height {
            for col in 0..width {
                y.push(luma(col, row));
            }
        }

        let chroma_samples = chroma_width as usize * chroma_height as usize;
        let mut u = Vec::with_capacity(chroma_samples);
        let mut v = Vec::with_capacity(chroma_samples);
        for row in 0..chroma_height {
            for col in 0..chroma_width {
                let (cb, cr) = chroma(col, row);
                u.push(cb);
                v.push(cr);
            }
        }

        Self { resolution, y, u, v }
    }

    /// Picture size.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.resolution.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.resolution.height
    }

    /// Size of the chroma planes.
    pub fn chroma_resolution(&self) -> Resolution {
        let (width, height) = chroma_size(self.resolution);
        Resolution::new(width, height)
    }

    /// Luma plane, row-major with stride [`width`](Self::width).
    pub fn y(&self) -> &[u8] {
        &self.y
    }

    /// Cb plane, row-major with the stride of [`chroma_resolution`](Self::chroma_resolution).
    pub fn u(&self) -> &[u8] {
        &self.u
    }

    /// Cr plane.
    pub fn v(&self) -> &[u8] {
        &self.v
    }

    /// Mutable access to the three planes.
    pub fn planes_mut(&mut self) -> (&mut [u8], &mut [u8], &mut [u8]) {
        (&mut self.y, &mut self.u, &mut self.v)
    }
}

fn chroma_size(resolution: Resolution) -> (u32, u32) {
    (resolution.width.div_ceil(2), resolution.height.div_ceil(2))
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_plane_sizes() {
        let frame = I420Buffer::new(5, 3);
        assert_eq!(frame.y().len(), 15);
        assert_eq!(frame.chroma_resolution(), Resolution::new(3, 2));
        assert_eq!(frame.u().len(), 6);
        assert_eq!(frame.v().len(), 6);
        assert!(frame.y().iter().all(|s| *s == 128));
    }

    #[test]
    fn test_from_fn() {
        let frame = I420Buffer::from_fn(4, 2, |x, y| (x + 10 * y) as u8, |x, _| (x as u8, 200));
        assert_eq!(frame.y(), [0, 1, 2, 3, 10, 11, 12, 13]);
        assert_eq!(frame.u(), [0, 1]);
        assert_eq!(frame.v(), [200, 200]);
    }

    #[test]
    #[should_panic(expected = "empty picture")]
    fn test_empty_picture_panics() {
        I420Buffer::new(0, 16);
    }
}
