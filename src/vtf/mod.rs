//! Valve Texture Format containers.
//!
//! Reads and writes v7.2 files: a fixed 80-byte header, a 16x16 DXT1
//! thumbnail, then the high-res payload laid out mip level by mip level from
//! coarsest to finest, frames in input order within each level.
//!
//! https://developer.valvesoftware.com/wiki/Valve_Texture_Format

pub mod consts;
pub mod header;

use flagset::FlagSet;
use image::{imageops, RgbaImage};
use num_traits::FromPrimitive;
use thiserror::Error;

use crate::binaries::BinaryData;
use crate::dxt::{BlockCodec, DxtError, NoBlockCodec};

use self::consts::{ImageFormat, VtfFlags};
use self::header::{VtfHeader, VTF_HEADER_SIZE, VTF_SIGNATURE};

#[derive(Debug, Error)]
pub enum VtfError {
    #[error("file is corrupted or not in VTF format")]
    InvalidSignature,
    #[error("unsupported VTF version {0}.{1}, only major version 7 is supported")]
    UnsupportedVersion(u32, u32),
    #[error("unknown image format id {0}")]
    UnknownFormat(i32),
    #[error("format {0:?} is not supported for encoding")]
    UnsupportedEncode(ImageFormat),
    #[error("format {0:?} is not supported for decoding")]
    UnsupportedDecode(ImageFormat),
    #[error("a texture needs at least 1 frame")]
    NoFrames,
    #[error("exceeding frame maximum of 65535")]
    TooManyFrames,
    #[error("not all frames have the same size")]
    FrameSizeMismatch,
    #[error("texture is too small, it needs a size of at least 4x4 pixels")]
    TooSmall,
    #[error("texture is too large")]
    TooLarge,
    #[error("texture width or height is not a power of 2")]
    NotPowerOfTwo,
    #[error("unexpected end of file")]
    Truncated,
    #[error("pixel buffer is {got} bytes, expected {expected}")]
    PixelBufferSize { expected: usize, got: usize },
    #[error(transparent)]
    Dxt(#[from] DxtError),
}

/// Texture metadata, everything the header carries apart from padding.
#[derive(Debug, Clone)]
pub struct Vtf {
    pub version: [u32; 2],
    pub width: u16,
    pub height: u16,
    pub flags: FlagSet<VtfFlags>,
    pub frames: u16,
    pub first_frame: u16,
    pub reflectivity: [f32; 3],
    pub bumpmap_scale: f32,
    pub high_res_format: ImageFormat,
    pub mipmap_count: u8,
    pub low_res_format: ImageFormat,
    pub low_res_width: u8,
    pub low_res_height: u8,
}

impl Vtf {
    /// Serializes the fixed 80-byte header, little-endian fields at their
    /// wire offsets, zero padding after the depth field.
    pub fn header_bytes(&self) -> [u8; VTF_HEADER_SIZE as usize] {
        let header = VtfHeader {
            signature: VTF_SIGNATURE,
            version: self.version,
            header_size: VTF_HEADER_SIZE,
            width: self.width,
            height: self.height,
            flags: self.flags.bits(),
            frames: self.frames,
            first_frame: self.first_frame,
            padding0: [0; 4],
            reflectivity: self.reflectivity,
            padding1: [0; 4],
            bumpmap_scale: self.bumpmap_scale,
            high_res_image_format: self.high_res_format as i32,
            mipmap_count: self.mipmap_count,
            low_res_image_format: self.low_res_format as i32,
            low_res_image_width: self.low_res_width,
            low_res_image_height: self.low_res_height,
            depth: 1,
        };

        let mut out = [0u8; VTF_HEADER_SIZE as usize];
        let bytes = bytemuck::bytes_of(&header);
        out[..bytes.len()].copy_from_slice(bytes);
        out
    }

    /// Writes a whole VTF file from RGBA frames.
    ///
    /// Equivalent to [`Vtf::encode_with`] with no DXT3/DXT5 collaborator.
    pub fn encode(format: ImageFormat, frames: &[RgbaImage]) -> Result<Vec<u8>, VtfError> {
        Self::encode_with(format, frames, &NoBlockCodec)
    }

    /// Writes a whole VTF file: header, 16x16 DXT1 thumbnail of frame 0,
    /// then every mip level from coarsest to finest with frames in input
    /// order. Validation happens before a single byte is produced.
    pub fn encode_with(
        format: ImageFormat,
        frames: &[RgbaImage],
        codec: &dyn BlockCodec,
    ) -> Result<Vec<u8>, VtfError> {
        if frames.is_empty() {
            return Err(VtfError::NoFrames);
        }
        if frames.len() > 0xFFFF {
            return Err(VtfError::TooManyFrames);
        }

        let (width, height) = frames[0].dimensions();
        if frames.iter().any(|f| f.dimensions() != (width, height)) {
            return Err(VtfError::FrameSizeMismatch);
        }
        if width < 4 || height < 4 {
            return Err(VtfError::TooSmall);
        }
        if width > 4096 || height > 4096 {
            return Err(VtfError::TooLarge);
        }
        if !width.is_power_of_two() || !height.is_power_of_two() {
            return Err(VtfError::NotPowerOfTwo);
        }

        // exact on power-of-two dimensions, and never negative once the 4x4
        // minimum has been validated
        let mipmap_count = (width.trailing_zeros().min(height.trailing_zeros()) - 2) as u8;

        let thumbnail = imageops::resize(&frames[0], 16, 16, imageops::FilterType::Triangle);
        let low_res = ImageFormat::DXT1.encode(16, 16, thumbnail.as_raw(), codec)?;

        let mut payload = Vec::new();
        for level in (0..=mipmap_count).rev() {
            let mip_width = width >> level;
            let mip_height = height >> level;
            for frame in frames {
                if level == 0 {
                    payload.extend(format.encode(
                        width as usize,
                        height as usize,
                        frame.as_raw(),
                        codec,
                    )?);
                } else {
                    let mip =
                        imageops::resize(frame, mip_width, mip_height, imageops::FilterType::Triangle);
                    payload.extend(format.encode(
                        mip_width as usize,
                        mip_height as usize,
                        mip.as_raw(),
                        codec,
                    )?);
                }
            }
        }

        let vtf = Vtf {
            version: [7, 2],
            width: width as u16,
            height: height as u16,
            flags: format.default_flags(),
            frames: frames.len() as u16,
            first_frame: 0,
            reflectivity: [1.0, 1.0, 1.0],
            bumpmap_scale: 1.0,
            high_res_format: format,
            mipmap_count,
            low_res_format: ImageFormat::DXT1,
            low_res_width: 16,
            low_res_height: 16,
        };

        let mut out = Vec::with_capacity(VTF_HEADER_SIZE as usize + low_res.len() + payload.len());
        out.extend_from_slice(&vtf.header_bytes());
        out.extend_from_slice(&low_res);
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Reads a VTF file, decoding the base mip level of every frame.
    ///
    /// Equivalent to [`Vtf::read_with`] with no DXT3/DXT5 collaborator.
    pub fn read(data: &[u8]) -> Result<(Vtf, Vec<RgbaImage>), VtfError> {
        Self::read_with(data, &NoBlockCodec)
    }

    /// Reads a VTF file. Only the finest mip level is decoded; its position
    /// is back-computed from the end of the buffer, so coarser levels
    /// between the header and the base level are skipped, not parsed.
    pub fn read_with(
        data: &[u8],
        codec: &dyn BlockCodec,
    ) -> Result<(Vtf, Vec<RgbaImage>), VtfError> {
        let header = VtfHeader::read_from(data, 0).ok_or(VtfError::Truncated)?;

        if header.signature != VTF_SIGNATURE {
            return Err(VtfError::InvalidSignature);
        }
        let version = header.version;
        if version[0] != 7 {
            return Err(VtfError::UnsupportedVersion(version[0], version[1]));
        }

        let high_res_id = header.high_res_image_format;
        let high_res_format =
            ImageFormat::from_i32(high_res_id).ok_or(VtfError::UnknownFormat(high_res_id))?;
        let low_res_id = header.low_res_image_format;
        let low_res_format =
            ImageFormat::from_i32(low_res_id).ok_or(VtfError::UnknownFormat(low_res_id))?;

        let width = header.width;
        let height = header.height;
        let frames = header.frames;

        let frame_bytes = high_res_format.bytes_for_size(width as usize, height as usize);
        let payload_bytes = frame_bytes * frames as usize;
        let offset = data
            .len()
            .checked_sub(payload_bytes)
            .ok_or(VtfError::Truncated)?;

        let mut images = Vec::with_capacity(frames as usize);
        for frame in 0..frames as usize {
            let start = offset + frame * frame_bytes;
            let rgba = high_res_format.decode(
                width as usize,
                height as usize,
                &data[start..start + frame_bytes],
                codec,
            )?;
            images.push(
                RgbaImage::from_raw(width as u32, height as u32, rgba)
                    .ok_or(VtfError::Truncated)?,
            );
        }

        let vtf = Vtf {
            version,
            width,
            height,
            flags: FlagSet::new_truncated(header.flags),
            frames,
            first_frame: header.first_frame,
            reflectivity: header.reflectivity,
            bumpmap_scale: header.bumpmap_scale,
            high_res_format,
            mipmap_count: header.mipmap_count,
            low_res_format,
            low_res_width: header.low_res_image_width,
            low_res_height: header.low_res_image_height,
        };
        Ok((vtf, images))
    }
}
