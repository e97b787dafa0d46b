use bytemuck::Pod;

/// Fixed-layout structs readable straight out of a file buffer.
///
/// Works on unaligned offsets, so `#[repr(C, packed)]` headers can be lifted
/// from any position in a slice without copying the whole file first.
pub trait BinaryData: Pod {
    /// Reads `Self` from `data` at `offset`, or `None` if the slice is too
    /// short.
    fn read_from(data: &[u8], offset: usize) -> Option<Self> {
        let end = offset.checked_add(std::mem::size_of::<Self>())?;
        Some(bytemuck::pod_read_unaligned(data.get(offset..end)?))
    }
}

impl<T: Pod> BinaryData for T {}
