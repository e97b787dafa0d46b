//! Codecs for Source engine asset containers.
//!
//! Everything here is a pure transform over byte buffers: readers take a
//! slice and hand back typed models, writers take models and hand back the
//! exact on-disk byte layout. No I/O, no rendering.
//!
//! - [`vtf`] — Valve Texture Format containers (read + write, v7.2)
//! - [`bsp`] — compiled map containers (lump directory, entities, cubemaps,
//!   texture table, embedded pakfile)
//! - [`kv`] / [`vmf`] — KeyValues text trees and Valve Map Format generation
//! - [`dxt`] — DXT1 (BC1) block compression

pub mod binaries;
pub mod bsp;
pub mod dxt;
pub mod kv;
pub mod vmf;
pub mod vtf;

pub mod prelude;
