//! Captured raster frame type
//!
//! Frames arrive from the device in its native row format: top-down rows
//! padded to `stride` bytes, either palette-indexed (1/4/8 bits per pixel)
//! or direct RGB/RGBA (24/32 bits per pixel).

use anyhow::{Context, ensure};
use image::{Rgba, RgbaImage};

/// One captured image buffer in device-native pixel format.
///
/// Ownership moves to the persistence collaborator when the transfer loop
/// hands the frame over; dropping it releases the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    width: u32,
    height: u32,
    bits_per_pixel: u16,
    stride: usize,
    palette: Option<Vec<[u8; 3]>>,
    data: Vec<u8>,
}

impl RasterFrame {
    /// Build a frame, validating the geometry against the buffer.
    ///
    /// Indexed depths require a palette with exactly `2^bpp` entries.
    pub fn new(
        width: u32,
        height: u32,
        bits_per_pixel: u16,
        stride: usize,
        palette: Option<Vec<[u8; 3]>>,
        data: Vec<u8>,
    ) -> anyhow::Result<Self> {
        let min_stride = match bits_per_pixel {
            1 => (width as usize).div_ceil(8),
            4 => (width as usize).div_ceil(2),
            8 => width as usize,
            24 => width as usize * 3,
            32 => width as usize * 4,
            other => anyhow::bail!("unsupported bit depth: {other}"),
        };
        ensure!(
            stride >= min_stride,
            "stride {stride} too small for {width} pixels at {bits_per_pixel} bpp"
        );
        let needed = stride
            .checked_mul(height as usize)
            .context("frame dimensions overflow")?;
        ensure!(
            data.len() >= needed,
            "buffer holds {} bytes, geometry needs {needed}",
            data.len()
        );
        if bits_per_pixel <= 8 {
            let palette = palette
                .as_ref()
                .context("palette required for indexed frames")?;
            let expected = 1usize << bits_per_pixel;
            ensure!(
                palette.len() == expected,
                "palette has {} entries, {bits_per_pixel} bpp needs {expected}",
                palette.len()
            );
        }
        Ok(Self {
            width,
            height,
            bits_per_pixel,
            stride,
            palette,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bits_per_pixel(&self) -> u16 {
        self.bits_per_pixel
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn palette(&self) -> Option<&[[u8; 3]]> {
        self.palette.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Expand the native rows to RGBA for encoding.
    pub fn to_rgba(&self) -> anyhow::Result<RgbaImage> {
        let mut out = RgbaImage::new(self.width, self.height);
        for y in 0..self.height {
            let row = &self.data[y as usize * self.stride..][..self.stride];
            for x in 0..self.width {
                let pixel = match self.bits_per_pixel {
                    1 => {
                        let byte = row[(x / 8) as usize];
                        let index = (byte >> (7 - (x % 8))) & 1;
                        self.palette_color(index as usize)
                    }
                    4 => {
                        let byte = row[(x / 2) as usize];
                        let index = if x % 2 == 0 { byte >> 4 } else { byte & 0x0f };
                        self.palette_color(index as usize)
                    }
                    8 => self.palette_color(row[x as usize] as usize),
                    24 => {
                        let o = x as usize * 3;
                        Rgba([row[o], row[o + 1], row[o + 2], 255])
                    }
                    32 => {
                        let o = x as usize * 4;
                        Rgba([row[o], row[o + 1], row[o + 2], row[o + 3]])
                    }
                    other => anyhow::bail!("unsupported bit depth: {other}"),
                };
                out.put_pixel(x, y, pixel);
            }
        }
        Ok(out)
    }

    fn palette_color(&self, index: usize) -> Rgba<u8> {
        let [r, g, b] = self
            .palette
            .as_deref()
            .and_then(|palette| palette.get(index).copied())
            .unwrap_or([0, 0, 0]);
        Rgba([r, g, b, 255])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unsupported_depth() {
        let err = RasterFrame::new(2, 2, 16, 4, None, vec![0; 8]).unwrap_err();
        assert!(err.to_string().contains("unsupported bit depth"));
    }

    #[test]
    fn test_rejects_short_buffer() {
        assert!(RasterFrame::new(4, 4, 24, 12, None, vec![0; 20]).is_err());
    }

    #[test]
    fn test_indexed_requires_palette() {
        assert!(RasterFrame::new(4, 1, 8, 4, None, vec![0; 4]).is_err());
        assert!(RasterFrame::new(4, 1, 8, 4, Some(vec![[0, 0, 0]; 3]), vec![0; 4]).is_err());
    }

    #[test]
    fn test_expands_indexed_rows() {
        let mut palette = vec![[0u8, 0, 0]; 256];
        palette[7] = [10, 20, 30];
        let frame = RasterFrame::new(2, 1, 8, 2, Some(palette), vec![7, 0]).unwrap();
        let rgba = frame.to_rgba().unwrap();
        assert_eq!(rgba.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
        assert_eq!(rgba.get_pixel(1, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_expands_one_bit_rows() {
        let palette = vec![[255u8, 255, 255], [0, 0, 0]];
        // 0b1010_0000: pixels 0 and 2 are black
        let frame = RasterFrame::new(4, 1, 1, 1, Some(palette), vec![0b1010_0000]).unwrap();
        let rgba = frame.to_rgba().unwrap();
        assert_eq!(rgba.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(rgba.get_pixel(1, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(rgba.get_pixel(2, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_expands_rgb_rows_with_padding() {
        // stride 8 leaves two padding bytes per row
        let data = vec![
            1, 2, 3, 4, 5, 6, 0, 0, //
            7, 8, 9, 10, 11, 12, 0, 0,
        ];
        let frame = RasterFrame::new(2, 2, 24, 8, None, data).unwrap();
        let rgba = frame.to_rgba().unwrap();
        assert_eq!(rgba.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
        assert_eq!(rgba.get_pixel(1, 1), &Rgba([10, 11, 12, 255]));
    }
}
