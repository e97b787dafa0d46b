//! DXT1 (S3TC/BC1) block compression.
//!
//! Each 4x4 pixel block becomes 8 bytes: two little-endian RGB565 endpoint
//! colors followed by 16 two-bit palette indices.
//!
//! https://www.khronos.org/opengl/wiki/S3_Texture_Compression

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DxtError {
    #[error("pixel buffer is {got} bytes, expected {expected} for {width}x{height}")]
    PixelBufferSize {
        width: usize,
        height: usize,
        expected: usize,
        got: usize,
    },
    #[error("block buffer is {got} bytes, expected {expected} for {width}x{height}")]
    BlockBufferSize {
        width: usize,
        height: usize,
        expected: usize,
        got: usize,
    },
    #[error("no external block codec available for DXT3/DXT5")]
    NoCodec,
}

/// External DXT3/DXT5 block codec collaborator.
///
/// DXT1 is implemented in this module; the 128-bit-per-block formats are
/// supplied by the caller.
pub trait BlockCodec {
    fn encode(&self, width: usize, height: usize, rgba: &[u8]) -> Result<Vec<u8>, DxtError>;
    fn decode(&self, width: usize, height: usize, blocks: &[u8]) -> Result<Vec<u8>, DxtError>;
}

/// The absent collaborator: every DXT3/DXT5 request fails.
pub struct NoBlockCodec;

impl BlockCodec for NoBlockCodec {
    fn encode(&self, _width: usize, _height: usize, _rgba: &[u8]) -> Result<Vec<u8>, DxtError> {
        Err(DxtError::NoCodec)
    }

    fn decode(&self, _width: usize, _height: usize, _blocks: &[u8]) -> Result<Vec<u8>, DxtError> {
        Err(DxtError::NoCodec)
    }
}

fn pack_rgb565(c: [u8; 3]) -> u16 {
    (((c[0] >> 3) as u16) << 11) | (((c[1] >> 2) as u16) << 5) | ((c[2] >> 3) as u16)
}

fn unpack_rgb565(c: u16) -> [u8; 3] {
    let r5 = ((c >> 11) & 0x1f) as u8;
    let g6 = ((c >> 5) & 0x3f) as u8;
    let b5 = (c & 0x1f) as u8;
    // replicate the high bits into the low ones
    [(r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2)]
}

fn dist_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    let d = |x: u8, y: u8| {
        let d = x as i32 - y as i32;
        (d * d) as u32
    };
    d(a[0], b[0]) + d(a[1], b[1]) + d(a[2], b[2])
}

fn mag_sq(c: [u8; 3]) -> u32 {
    dist_sq(c, [0, 0, 0])
}

fn mix(a: [u8; 3], b: [u8; 3], wa: u16, wb: u16) -> [u8; 3] {
    let total = wa + wb;
    std::array::from_fn(|i| ((a[i] as u16 * wa + b[i] as u16 * wb) / total) as u8)
}

/// Compresses an RGBA8 raster into DXT1 blocks.
///
/// Output is `ceil(w/4) * ceil(h/4) * 8` bytes, blocks in row-major order.
/// Images smaller than 4 pixels in either dimension produce an all-zero
/// buffer of that size; partial blocks are not encoded for undersized
/// images.
///
/// Endpoints are the pixels with the smallest and largest squared RGB
/// magnitude. That is an approximation of true endpoint fitting and is the
/// format this crate's consumers expect, keep it as is.
pub fn compress_dxt1(width: usize, height: usize, rgba: &[u8]) -> Result<Vec<u8>, DxtError> {
    let expected = width * height * 4;
    if rgba.len() != expected {
        return Err(DxtError::PixelBufferSize {
            width,
            height,
            expected,
            got: rgba.len(),
        });
    }

    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let mut out = vec![0u8; blocks_x * blocks_y * 8];

    if width < 4 || height < 4 {
        return Ok(out);
    }

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let mut pixels = [[0u8; 3]; 16];
            for (i, pixel) in pixels.iter_mut().enumerate() {
                let x = (bx * 4 + i % 4).min(width - 1);
                let y = (by * 4 + i / 4).min(height - 1);
                let o = (y * width + x) * 4;
                *pixel = [rgba[o], rgba[o + 1], rgba[o + 2]];
            }

            let mut min_color = pixels[0];
            let mut max_color = pixels[0];
            for &p in &pixels {
                if mag_sq(p) < mag_sq(min_color) {
                    min_color = p;
                }
                if mag_sq(p) > mag_sq(max_color) {
                    max_color = p;
                }
            }

            let mut c0 = pack_rgb565(max_color);
            let mut c1 = pack_rgb565(min_color);
            if c0 < c1 {
                std::mem::swap(&mut c0, &mut c1);
                std::mem::swap(&mut max_color, &mut min_color);
            }

            // c0 > c1 selects the opaque four-color palette; otherwise the
            // three-color mode where the fourth entry is unreachable.
            let (palette, usable) = if c0 > c1 {
                (
                    [
                        max_color,
                        min_color,
                        mix(max_color, min_color, 2, 1),
                        mix(max_color, min_color, 1, 2),
                    ],
                    4,
                )
            } else {
                (
                    [
                        max_color,
                        min_color,
                        mix(max_color, min_color, 1, 1),
                        [0, 0, 0],
                    ],
                    3,
                )
            };

            let mut indices = 0u32;
            for (i, &p) in pixels.iter().enumerate() {
                let mut best = 0u32;
                let mut best_dist = u32::MAX;
                for (j, &entry) in palette.iter().take(usable).enumerate() {
                    let dist = dist_sq(p, entry);
                    if dist < best_dist {
                        best_dist = dist;
                        best = j as u32;
                    }
                }
                indices |= best << (i * 2);
            }

            let o = (by * blocks_x + bx) * 8;
            out[o..o + 2].copy_from_slice(&c0.to_le_bytes());
            out[o + 2..o + 4].copy_from_slice(&c1.to_le_bytes());
            out[o + 4..o + 8].copy_from_slice(&indices.to_le_bytes());
        }
    }

    Ok(out)
}

/// Expands DXT1 blocks back into an RGBA8 raster.
///
/// Index 3 of a three-color-mode block decodes as transparent black.
pub fn decompress_dxt1(width: usize, height: usize, blocks: &[u8]) -> Result<Vec<u8>, DxtError> {
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let expected = blocks_x * blocks_y * 8;
    if blocks.len() != expected {
        return Err(DxtError::BlockBufferSize {
            width,
            height,
            expected,
            got: blocks.len(),
        });
    }

    let mut out = vec![0u8; width * height * 4];

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let o = (by * blocks_x + bx) * 8;
            let c0 = u16::from_le_bytes([blocks[o], blocks[o + 1]]);
            let c1 = u16::from_le_bytes([blocks[o + 2], blocks[o + 3]]);
            let col0 = unpack_rgb565(c0);
            let col1 = unpack_rgb565(c1);

            let palette: [([u8; 3], u8); 4] = if c0 > c1 {
                [
                    (col0, 255),
                    (col1, 255),
                    (mix(col0, col1, 2, 1), 255),
                    (mix(col0, col1, 1, 2), 255),
                ]
            } else {
                [(col0, 255), (col1, 255), (mix(col0, col1, 1, 1), 255), ([0, 0, 0], 0)]
            };

            let indices = u32::from_le_bytes([
                blocks[o + 4],
                blocks[o + 5],
                blocks[o + 6],
                blocks[o + 7],
            ]);

            for i in 0..16 {
                let x = bx * 4 + i % 4;
                let y = by * 4 + i / 4;
                if x >= width || y >= height {
                    continue;
                }
                let (rgb, a) = palette[((indices >> (i * 2)) & 0b11) as usize];
                let p = (y * width + x) * 4;
                out[p..p + 3].copy_from_slice(&rgb);
                out[p + 3] = a;
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod dxt_tests {
    use super::*;

    fn solid_raster(width: usize, height: usize, rgba: [u8; 4]) -> Vec<u8> {
        rgba.repeat(width * height)
    }

    #[test]
    fn undersized_image_is_all_zero() {
        let out = compress_dxt1(2, 2, &solid_raster(2, 2, [90, 12, 230, 255])).unwrap();
        assert_eq!(out, vec![0u8; 8]);
    }

    #[test]
    fn eight_by_eight_is_four_blocks() {
        let out = compress_dxt1(8, 8, &solid_raster(8, 8, [10, 20, 30, 255])).unwrap();
        assert_eq!(out.len(), 32);
    }

    #[test]
    fn uniform_block_collapses() {
        let out = compress_dxt1(4, 4, &solid_raster(4, 4, [200, 100, 50, 255])).unwrap();
        // both endpoints carry the same color, every index picks entry 0
        assert_eq!(out[0..2], out[2..4]);
        assert_eq!(&out[4..8], &[0, 0, 0, 0]);
    }

    #[test]
    fn two_color_block_uses_both_endpoints() {
        // top half white, bottom half black
        let mut rgba = Vec::new();
        rgba.extend_from_slice(&solid_raster(4, 2, [255, 255, 255, 255]));
        rgba.extend_from_slice(&solid_raster(4, 2, [0, 0, 0, 255]));

        let out = compress_dxt1(4, 4, &rgba).unwrap();
        let c0 = u16::from_le_bytes([out[0], out[1]]);
        let c1 = u16::from_le_bytes([out[2], out[3]]);
        assert_eq!(c0, 0xffff);
        assert_eq!(c1, 0x0000);

        // white rows map to index 0, black rows to index 1
        assert_eq!(&out[4..8], &[0b00000000, 0b00000000, 0b01010101, 0b01010101]);
    }

    #[test]
    fn primary_colors_round_trip_exactly() {
        for color in [[255u8, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]] {
            let rgba = solid_raster(4, 4, color);
            let blocks = compress_dxt1(4, 4, &rgba).unwrap();
            let back = decompress_dxt1(4, 4, &blocks).unwrap();
            assert_eq!(back, rgba, "{color:?}");
        }
    }

    #[test]
    fn buffer_size_is_validated() {
        assert!(matches!(
            compress_dxt1(4, 4, &[0u8; 3]),
            Err(DxtError::PixelBufferSize { expected: 64, got: 3, .. })
        ));
        assert!(matches!(
            decompress_dxt1(4, 4, &[0u8; 7]),
            Err(DxtError::BlockBufferSize { expected: 8, got: 7, .. })
        ));
    }
}
