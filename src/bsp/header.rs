use std::fmt;

use super::consts::HEADER_LUMPS;

/// One entry of the lump directory.
#[repr(C, packed)]
#[derive(Debug, Default, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LumpEntry {
    pub file_ofs: i32,    // offset into file (bytes)
    pub file_len: i32,    // length of lump (bytes)
    pub version: i32,     // lump format version
    pub four_cc: [u8; 4], // lump ident code
}

// https://developer.valvesoftware.com/wiki/BSP_(Source)
#[repr(C, packed)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BspHeader {
    pub ident: [u8; 4],                    // BSP file identifier
    pub version: i32,                      // BSP file version
    pub lumps: [LumpEntry; HEADER_LUMPS],  // lump directory array
    pub map_revision: i32,                 // the map's revision (iteration, version) number
}

impl Default for BspHeader {
    fn default() -> Self {
        Self {
            ident: Default::default(),
            version: Default::default(),
            lumps: [LumpEntry::default(); HEADER_LUMPS],
            map_revision: Default::default(),
        }
    }
}

impl fmt::Debug for BspHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = self.version;
        let map_revision = self.map_revision;
        f.debug_struct("BspHeader")
            .field("ident", &self.ident)
            .field("version", &version)
            .field("map_revision", &map_revision)
            .finish()
    }
}
