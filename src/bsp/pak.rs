//! Pakfile lump: a ZIP archive of loose assets embedded in the map.
//!
//! Archive parsing is the `stream-unzip` collaborator's job; this module
//! only feeds it the lump bytes and lifts the entries into a stable shape.

use stream_unzip::ZipReader;

/// One file packed into the map.
#[derive(Debug, Clone)]
pub struct PakEntry {
    pub name: String,
    pub crc32: u32,
    pub uncompressed_size: u32,
    /// Entry bytes as stored in the archive (still deflated for compressed
    /// entries).
    pub data: Vec<u8>,
}

pub fn read_pakfile(data: &[u8]) -> Vec<PakEntry> {
    let mut zip_reader = ZipReader::default();
    zip_reader.update(data.to_vec().into());
    zip_reader.finish();

    zip_reader
        .drain_entries()
        .into_iter()
        .map(|entry| PakEntry {
            name: entry.header().filename.clone(),
            crc32: entry.header().crc32,
            uncompressed_size: entry.header().uncompressed_size,
            data: entry.compressed_data().to_vec(),
        })
        .collect()
}
