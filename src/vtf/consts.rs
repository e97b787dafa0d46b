use flagset::{flags, FlagSet};
use num_derive::FromPrimitive;

use crate::dxt::{compress_dxt1, decompress_dxt1, BlockCodec};

use super::VtfError;

/// On-disk pixel format ids.
#[derive(Copy, Clone, FromPrimitive, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum ImageFormat {
    NONE = -1,
    RGBA8888 = 0,
    ABGR8888,
    RGB888,
    BGR888,
    RGB565,
    I8,
    IA88,
    P8,
    A8,
    RGB888BLUESCREEN,
    BGR888BLUESCREEN,
    ARGB8888,
    BGRA8888,
    DXT1,
    DXT3,
    DXT5,
    BGRX8888,
    BGR565,
    BGRX5551,
    BGRA4444,
    DXT1ONEBITALPHA,
    BGRA5551,
    UV88,
    UVWQ8888,
    RGBA16161616F,
    RGBA16161616,
    UVLX8888,
}

impl ImageFormat {
    /// Encoded byte size of one `width` x `height` image in this format.
    /// Block-compressed formats round dimensions up to whole 4x4 blocks.
    pub fn bytes_for_size(&self, width: usize, height: usize) -> usize {
        let block_count = (width.max(4) * height.max(4)) / 16;

        match self {
            ImageFormat::NONE => 0,
            ImageFormat::UVLX8888
            | ImageFormat::UVWQ8888
            | ImageFormat::BGRA8888
            | ImageFormat::ARGB8888
            | ImageFormat::RGBA8888
            | ImageFormat::ABGR8888
            | ImageFormat::BGRX8888 => width * height * 4,
            ImageFormat::RGB888BLUESCREEN
            | ImageFormat::BGR888BLUESCREEN
            | ImageFormat::RGB888
            | ImageFormat::BGR888 => width * height * 3,
            ImageFormat::I8 | ImageFormat::P8 | ImageFormat::A8 => width * height,
            // 4x4 block carries 64 bits of color
            ImageFormat::DXT1 | ImageFormat::DXT1ONEBITALPHA => block_count * 8,
            // 4x4 block carries 64 bits of color and 64 bits of alpha
            ImageFormat::DXT3 | ImageFormat::DXT5 => block_count * 16,
            ImageFormat::IA88
            | ImageFormat::RGB565
            | ImageFormat::UV88
            | ImageFormat::BGRA5551
            | ImageFormat::BGRX5551
            | ImageFormat::BGR565
            | ImageFormat::BGRA4444 => width * height * 2,
            ImageFormat::RGBA16161616F | ImageFormat::RGBA16161616 => width * height * 8,
        }
    }

    pub fn supports_encode(&self) -> bool {
        matches!(
            self,
            ImageFormat::RGB888
                | ImageFormat::RGBA8888
                | ImageFormat::RGB565
                | ImageFormat::BGRA5551
                | ImageFormat::DXT1
                | ImageFormat::DXT3
                | ImageFormat::DXT5
        )
    }

    pub fn supports_decode(&self) -> bool {
        self.supports_encode()
    }

    /// Flags a texture written in this format carries by default.
    pub fn default_flags(&self) -> FlagSet<VtfFlags> {
        match self {
            ImageFormat::RGBA8888 => VtfFlags::EIGHTBITALPHA.into(),
            ImageFormat::BGRA5551 => VtfFlags::ONEBITALPHA.into(),
            _ => FlagSet::default(),
        }
    }

    /// Encodes an RGBA8 raster into this format. DXT3/DXT5 are delegated to
    /// the external block codec.
    pub fn encode(
        &self,
        width: usize,
        height: usize,
        rgba: &[u8],
        codec: &dyn BlockCodec,
    ) -> Result<Vec<u8>, VtfError> {
        let pixels = width * height;
        if rgba.len() != pixels * 4 {
            return Err(VtfError::PixelBufferSize {
                expected: pixels * 4,
                got: rgba.len(),
            });
        }

        match self {
            ImageFormat::RGB888 => {
                let mut out = Vec::with_capacity(pixels * 3);
                for p in rgba.chunks_exact(4) {
                    out.extend_from_slice(&p[..3]);
                }
                Ok(out)
            }
            ImageFormat::RGBA8888 => Ok(rgba.to_vec()),
            ImageFormat::RGB565 => {
                let mut out = Vec::with_capacity(pixels * 2);
                for p in rgba.chunks_exact(4) {
                    let r5 = (p[0] >> 3) as u16;
                    let g6 = (p[1] >> 2) as u16;
                    let b5 = (p[2] >> 3) as u16;
                    out.extend_from_slice(&((b5 << 11) | (g6 << 5) | r5).to_le_bytes());
                }
                Ok(out)
            }
            ImageFormat::BGRA5551 => {
                let mut out = Vec::with_capacity(pixels * 2);
                for p in rgba.chunks_exact(4) {
                    let r5 = (p[0] >> 3) as u16;
                    let g5 = (p[1] >> 3) as u16;
                    let b5 = (p[2] >> 3) as u16;
                    let a1 = (p[3] > 128) as u16;
                    out.extend_from_slice(&((a1 << 15) | (r5 << 10) | (g5 << 5) | b5).to_le_bytes());
                }
                Ok(out)
            }
            ImageFormat::DXT1 => Ok(compress_dxt1(width, height, rgba)?),
            ImageFormat::DXT3 | ImageFormat::DXT5 => Ok(codec.encode(width, height, rgba)?),
            _ => Err(VtfError::UnsupportedEncode(*self)),
        }
    }

    /// Decodes this format back into an RGBA8 raster. DXT3/DXT5 are
    /// delegated to the external block codec.
    pub fn decode(
        &self,
        width: usize,
        height: usize,
        data: &[u8],
        codec: &dyn BlockCodec,
    ) -> Result<Vec<u8>, VtfError> {
        let expected = self.bytes_for_size(width, height);
        if data.len() != expected {
            return Err(VtfError::PixelBufferSize {
                expected,
                got: data.len(),
            });
        }

        match self {
            ImageFormat::RGB888 => {
                let mut out = Vec::with_capacity(width * height * 4);
                for p in data.chunks_exact(3) {
                    out.extend_from_slice(p);
                    out.push(255);
                }
                Ok(out)
            }
            ImageFormat::RGBA8888 => Ok(data.to_vec()),
            ImageFormat::RGB565 => {
                let mut out = Vec::with_capacity(width * height * 4);
                for p in data.chunks_exact(2) {
                    let col = u16::from_le_bytes([p[0], p[1]]);
                    let r5 = (col & 0x1f) as u8;
                    let g6 = ((col >> 5) & 0x3f) as u8;
                    let b5 = ((col >> 11) & 0x1f) as u8;
                    out.extend_from_slice(&[r5 << 3, g6 << 2, b5 << 3, 255]);
                }
                Ok(out)
            }
            ImageFormat::BGRA5551 => {
                let mut out = Vec::with_capacity(width * height * 4);
                for p in data.chunks_exact(2) {
                    let col = u16::from_le_bytes([p[0], p[1]]);
                    let r5 = ((col >> 10) & 0x1f) as u8;
                    let g5 = ((col >> 5) & 0x1f) as u8;
                    let b5 = (col & 0x1f) as u8;
                    let a = if col & 0x8000 != 0 { 255 } else { 0 };
                    out.extend_from_slice(&[r5 << 3, g5 << 3, b5 << 3, a]);
                }
                Ok(out)
            }
            ImageFormat::DXT1 => Ok(decompress_dxt1(width, height, data)?),
            ImageFormat::DXT3 | ImageFormat::DXT5 => Ok(codec.decode(width, height, data)?),
            _ => Err(VtfError::UnsupportedDecode(*self)),
        }
    }
}

flags! {
    #[repr(u32)]
    pub enum VtfFlags: u32 {
        // Flags from the *.txt config file
        POINTSAMPLE = 0x00000001,
        TRILINEAR = 0x00000002,
        CLAMPS = 0x00000004,
        CLAMPT = 0x00000008,
        ANISOTROPIC = 0x00000010,
        HINTDXT5 = 0x00000020,
        PWLCORRECTED = 0x00000040,
        NORMAL = 0x00000080,
        NOMIP = 0x00000100,
        NOLOD = 0x00000200,
        ALLMIPS = 0x00000400,
        PROCEDURAL = 0x00000800,

        // These are automatically generated by vtex from the texture data.
        ONEBITALPHA = 0x00001000,
        EIGHTBITALPHA = 0x00002000,

        // Newer flags from the *.txt config file
        ENVMAP = 0x00004000,
        RENDERTARGET = 0x00008000,
        DEPTHRENDERTARGET = 0x00010000,
        NODEBUGOVERRIDE = 0x00020000,
        SINGLECOPY	= 0x00040000,
        PRESRGB = 0x00080000,

        NODEPTHBUFFER = 0x00800000,

        CLAMPU = 0x02000000,
        VERTEXTEXTURE = 0x04000000,
        SSBUMP = 0x08000000,

        BORDER = 0x20000000,
    }
}
