/// File signature, `"VTF\0"` (little-endian integer 0x00465456).
pub const VTF_SIGNATURE: [u8; 4] = *b"VTF\0";

/// On-disk size of the v7.2 header. The packed struct below covers the
/// meaningful fields; the remainder is zero padding up to 16-byte alignment.
pub const VTF_HEADER_SIZE: u32 = 80;

// https://developer.valvesoftware.com/wiki/Valve_Texture_Format
#[repr(C, packed)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VtfHeader {
    pub signature: [u8; 4], // File signature ("VTF\0").
    pub version: [u32; 2],  // version[0].version[1] (7.2 for files written here).
    pub header_size: u32,   // Size of the header struct (16 byte aligned, 80 bytes).
    pub width: u16,         // Width of the largest mipmap in pixels. Must be a power of 2.
    pub height: u16,        // Height of the largest mipmap in pixels. Must be a power of 2.
    pub flags: u32,         // VTF flags.
    pub frames: u16,        // Number of frames, if animated (1 for no animation).
    pub first_frame: u16,   // First frame in animation (0 based).
    pub padding0: [u8; 4],  // reflectivity padding (16 byte alignment).
    pub reflectivity: [f32; 3], // reflectivity vector.
    pub padding1: [u8; 4],  // reflectivity padding (8 byte packing).
    pub bumpmap_scale: f32, // Bumpmap scale.
    pub high_res_image_format: i32, // High resolution image format id.
    pub mipmap_count: u8,   // Number of mipmaps.
    pub low_res_image_format: i32, // Low resolution image format id (always DXT1).
    pub low_res_image_width: u8, // Low resolution image width.
    pub low_res_image_height: u8, // Low resolution image height.
    pub depth: u16,         // Depth of the largest mipmap. 1 for a 2D texture.
}

impl std::fmt::Debug for VtfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // packed fields must be copied out before they can be referenced
        let version = self.version;
        let width = self.width;
        let height = self.height;
        let frames = self.frames;
        let high_res_image_format = self.high_res_image_format;
        let mipmap_count = self.mipmap_count;
        f.debug_struct("VtfHeader")
            .field("version", &version)
            .field("width", &width)
            .field("height", &height)
            .field("frames", &frames)
            .field("high_res_image_format", &high_res_image_format)
            .field("mipmap_count", &mipmap_count)
            .finish()
    }
}
