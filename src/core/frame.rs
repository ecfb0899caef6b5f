use serde::{Deserialize, Serialize};

/// Channels per pixel (RGB)
pub const CHANNELS: usize = 3;

/// Value written to pixels that have no delivered content
pub const GRAY: [u8; CHANNELS] = [128, 128, 128];

/// Interleaved 8-bit RGB image, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * CHANNELS],
        }
    }

    pub fn filled(width: usize, height: usize, pixel: [u8; CHANNELS]) -> Self {
        let mut data = Vec::with_capacity(width * height * CHANNELS);
        for _ in 0..width * height {
            data.extend_from_slice(&pixel);
        }
        Self { width, height, data }
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * CHANNELS
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; CHANNELS] {
        let o = self.offset(x, y);
        [self.data[o], self.data[o + 1], self.data[o + 2]]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, pixel: [u8; CHANNELS]) {
        let o = self.offset(x, y);
        self.data[o..o + CHANNELS].copy_from_slice(&pixel);
    }

    /// Copy `src` into this frame with its top-left corner at (`x0`, `y0`).
    /// Parts falling outside are dropped.
    pub fn blit(&mut self, src: &Frame, x0: usize, y0: usize) {
        if x0 >= self.width || y0 >= self.height {
            return;
        }
        let w = src.width.min(self.width - x0);
        let h = src.height.min(self.height - y0);
        for row in 0..h {
            let dst = self.offset(x0, y0 + row);
            let from = src.offset(0, row);
            self.data[dst..dst + w * CHANNELS].copy_from_slice(&src.data[from..from + w * CHANNELS]);
        }
    }

    /// Single channel as f64 plane
    pub fn channel(&self, c: usize) -> Vec<f64> {
        self.data.iter().skip(c).step_by(CHANNELS).map(|&v| v as f64).collect()
    }
}
