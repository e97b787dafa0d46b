//! Compiled map containers.
//!
//! A BSP file is a fixed header (magic, version), a directory of 64 lump
//! descriptors, and a trailing map revision. Lumps are offset/length
//! addressed sections of the file; this reader hands them out as borrowed
//! slices and provides typed extraction for the lumps the tooling cares
//! about: entities, cubemaps, texture names and the embedded pakfile.
//!
//! https://developer.valvesoftware.com/wiki/BSP_(Source)

pub mod consts;
pub mod entities;
pub mod header;
pub mod pak;

use thiserror::Error;

use crate::binaries::BinaryData;

use self::consts::LumpType;
use self::entities::Entity;
use self::header::{BspHeader, LumpEntry};
use self::pak::PakEntry;

/// File magic. This way around means little endian; "PSBV" on disk is a
/// big-endian file.
pub const BSP_IDENT: [u8; 4] = *b"VBSP";

#[derive(Debug, Error)]
pub enum BspError {
    #[error("file is corrupted or not in BSP format")]
    InvalidIdent,
    #[error("unexpected end of file")]
    Truncated,
    #[error("lump {lump:?} range {offset}..{end} is outside the {len} byte file")]
    LumpOutOfRange {
        lump: LumpType,
        offset: usize,
        end: usize,
        len: usize,
    },
    #[error("cubemap lump length {0} is not a multiple of 16")]
    MalformedCubemapLump(usize),
}

/// One `sCubemapSample` record of the cubemap lump.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CubemapSample {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub resolution: i32,
}

/// A parsed map header over a borrowed file buffer. Lump extraction is a
/// view into that buffer, not a copy.
pub struct Bsp<'a> {
    header: BspHeader,
    data: &'a [u8],
}

impl<'a> Bsp<'a> {
    pub fn read(data: &'a [u8]) -> Result<Self, BspError> {
        let header = BspHeader::read_from(data, 0).ok_or(BspError::Truncated)?;
        if header.ident != BSP_IDENT {
            return Err(BspError::InvalidIdent);
        }
        Ok(Self { header, data })
    }

    pub fn version(&self) -> i32 {
        self.header.version
    }

    pub fn map_revision(&self) -> i32 {
        self.header.map_revision
    }

    pub fn lump_entry(&self, lump: LumpType) -> LumpEntry {
        self.header.lumps[lump as usize]
    }

    /// The raw bytes of a lump, `[offset, offset + length)` of the original
    /// buffer.
    pub fn lump_data(&self, lump: LumpType) -> Result<&'a [u8], BspError> {
        let entry = self.lump_entry(lump);
        let offset = entry.file_ofs.max(0) as usize;
        let end = offset + entry.file_len.max(0) as usize;
        self.data
            .get(offset..end)
            .ok_or(BspError::LumpOutOfRange {
                lump,
                offset,
                end,
                len: self.data.len(),
            })
    }

    /// Entity records from lump 0, in file order.
    pub fn entities(&self) -> Result<Vec<Entity>, BspError> {
        let text = String::from_utf8_lossy(self.lump_data(LumpType::Entities)?);
        Ok(entities::parse_entities(&text))
    }

    /// Cubemap sample records from lump 42.
    pub fn cubemaps(&self) -> Result<Vec<CubemapSample>, BspError> {
        let data = self.lump_data(LumpType::Cubemaps)?;
        if data.len() % std::mem::size_of::<CubemapSample>() != 0 {
            return Err(BspError::MalformedCubemapLump(data.len()));
        }
        Ok(data
            .chunks_exact(std::mem::size_of::<CubemapSample>())
            .map(bytemuck::pod_read_unaligned)
            .collect())
    }

    /// The null-separated texture name table from lump 43.
    pub fn texture_names(&self) -> Result<Vec<String>, BspError> {
        let data = self.lump_data(LumpType::TexDataStringData)?;
        Ok(String::from_utf8_lossy(data)
            .split('\0')
            .map(str::to_string)
            .collect())
    }

    /// Files embedded in the pakfile lump (lump 40).
    pub fn pakfile(&self) -> Result<Vec<PakEntry>, BspError> {
        Ok(pak::read_pakfile(self.lump_data(LumpType::PakFile)?))
    }
}

#[cfg(test)]
mod bsp_tests {
    use bytemuck::Zeroable;

    use super::consts::{LumpType, HEADER_LUMPS};
    use super::header::{BspHeader, LumpEntry};
    use super::{Bsp, BspError, CubemapSample, BSP_IDENT};

    const HEADER_SIZE: usize = 4 + 4 + 16 * HEADER_LUMPS + 4;

    /// Builds a file from `(lump, payload)` pairs, appending payloads after
    /// the header in the order given.
    fn synthetic_bsp(lumps: &[(LumpType, &[u8])]) -> Vec<u8> {
        let mut header = BspHeader {
            ident: BSP_IDENT,
            version: 21,
            map_revision: 1804,
            ..BspHeader::zeroed()
        };

        let mut body = Vec::new();
        for (lump, payload) in lumps {
            header.lumps[*lump as usize] = LumpEntry {
                file_ofs: (HEADER_SIZE + body.len()) as i32,
                file_len: payload.len() as i32,
                version: 0,
                four_cc: [0; 4],
            };
            body.extend_from_slice(payload);
        }

        let mut file = bytemuck::bytes_of(&header).to_vec();
        assert_eq!(file.len(), HEADER_SIZE);
        file.extend_from_slice(&body);
        file
    }

    #[test]
    fn header_fields() {
        let file = synthetic_bsp(&[]);
        let bsp = Bsp::read(&file).unwrap();
        assert_eq!(bsp.version(), 21);
        assert_eq!(bsp.map_revision(), 1804);
    }

    #[test]
    fn rejects_bad_ident() {
        let mut file = synthetic_bsp(&[]);
        file[0..4].copy_from_slice(b"IBSP");
        assert!(matches!(Bsp::read(&file), Err(BspError::InvalidIdent)));
    }

    #[test]
    fn lump_extraction_is_an_exact_view() {
        // directory entry at offset 100, length 10 over a padded file
        let mut header = BspHeader {
            ident: BSP_IDENT,
            version: 21,
            ..BspHeader::zeroed()
        };
        header.lumps[LumpType::Nodes as usize] = LumpEntry {
            file_ofs: 100,
            file_len: 10,
            version: 0,
            four_cc: [0; 4],
        };

        let mut file = bytemuck::bytes_of(&header).to_vec();
        file.resize(2048, 0);
        file[100..110].copy_from_slice(b"0123456789");

        let bsp = Bsp::read(&file).unwrap();
        assert_eq!(bsp.lump_data(LumpType::Nodes).unwrap(), b"0123456789");
    }

    #[test]
    fn out_of_range_lump_is_an_error() {
        let mut header = BspHeader {
            ident: BSP_IDENT,
            ..BspHeader::zeroed()
        };
        header.lumps[LumpType::Nodes as usize] = LumpEntry {
            file_ofs: 4000,
            file_len: 100,
            version: 0,
            four_cc: [0; 4],
        };
        let file = bytemuck::bytes_of(&header).to_vec();

        let bsp = Bsp::read(&file).unwrap();
        assert!(matches!(
            bsp.lump_data(LumpType::Nodes),
            Err(BspError::LumpOutOfRange { offset: 4000, .. })
        ));
    }

    #[test]
    fn typed_lump_extraction() {
        let cubemaps: Vec<u8> = [
            CubemapSample { x: -128, y: 64, z: 32, resolution: 0 },
            CubemapSample { x: 0, y: 0, z: 256, resolution: 128 },
        ]
        .iter()
        .flat_map(|c| bytemuck::bytes_of(c).to_vec())
        .collect();

        let file = synthetic_bsp(&[
            (
                LumpType::Entities,
                b"{\n\"classname\" \"worldspawn\"\n}\n{\n\"classname\" \"env_cubemap\"\n}\n\0".as_slice(),
            ),
            (LumpType::PakFile, b"".as_slice()),
            (LumpType::Cubemaps, &cubemaps),
            (LumpType::TexDataStringData, b"BRICK/BRICKWALL003A\0TOOLS/TOOLSNODRAW\0".as_slice()),
        ]);
        let bsp = Bsp::read(&file).unwrap();

        let entities = bsp.entities().unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].class_name(), Some("worldspawn"));

        let samples = bsp.cubemaps().unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], CubemapSample { x: -128, y: 64, z: 32, resolution: 0 });

        let names = bsp.texture_names().unwrap();
        assert_eq!(
            names,
            vec![
                "BRICK/BRICKWALL003A".to_string(),
                "TOOLS/TOOLSNODRAW".to_string(),
                String::new(),
            ]
        );

        assert!(bsp.pakfile().unwrap().is_empty());
    }

    #[test]
    fn malformed_cubemap_lump() {
        let file = synthetic_bsp(&[(LumpType::Cubemaps, &[0u8; 17])]);
        let bsp = Bsp::read(&file).unwrap();
        assert!(matches!(
            bsp.cubemaps(),
            Err(BspError::MalformedCubemapLump(17))
        ));
    }
}
