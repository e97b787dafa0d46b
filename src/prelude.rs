pub use crate::bsp::{
    consts::{LumpType, HEADER_LUMPS},
    entities::Entity,
    header::{BspHeader, LumpEntry},
    pak::PakEntry,
    Bsp, BspError, CubemapSample,
};
pub use crate::dxt::{compress_dxt1, decompress_dxt1, BlockCodec, DxtError, NoBlockCodec};
pub use crate::kv::KVNode;
pub use crate::vmf::{Face, Vmf, VmfEntity, VmfSide, VmfSolid};
pub use crate::vtf::{
    consts::{ImageFormat, VtfFlags},
    Vtf, VtfError,
};
