use num_derive::FromPrimitive;

/// Size of the fixed lump directory. Index meaning is assigned by
/// convention, the directory itself is not length-prefixed.
pub const HEADER_LUMPS: usize = 64;

// https://developer.valvesoftware.com/wiki/BSP_(Source)
#[derive(Copy, Clone, FromPrimitive, Debug, PartialEq, Eq)]
pub enum LumpType {
    Entities = 0,
    Planes = 1,
    TexData = 2,
    Vertexes = 3,
    Visibility = 4,
    Nodes = 5,
    TexInfo = 6,
    Faces = 7,
    Lighting = 8,
    Leafs = 10,
    Edges = 12,
    SurfEdges = 13,
    Models = 14,
    WorldLights = 15,
    LeafFaces = 16,
    DispInfo = 26,
    OriginalFaces = 27,
    VertNormals = 30,
    VertNormalIndices = 31,
    DispVerts = 33,
    GameLump = 35,
    LeafWaterData = 36,
    Primitives = 37,
    PrimIndices = 39,
    PakFile = 40,
    Cubemaps = 42,
    TexDataStringData = 43,
    TexDataStringTable = 44,
    Overlays = 45,
    LeafAmbientIndexHdr = 51,
    LeafAmbientIndex = 52,
    LightingHdr = 53,
    WorldLightsHdr = 54,
    LeafAmbientLightingHdr = 55,
    LeafAmbientLighting = 56,
    FacesHdr = 58,
}
