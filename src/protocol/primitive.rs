use crate::buffer::NativeBuffer;
use crate::error::{Error, Result};

/// Round `head` up to the next word boundary.
pub fn align_word(head: u32) -> u32 {
    let rem = head % 4;
    if rem != 0 { head + (4 - rem) } else { head }
}

/// Copy `src` into the buffer at `offset` and append a NUL terminator.
///
/// Returns the offset of the first byte past the terminator. Fails with
/// `BufferOverflow` if the write would cross the buffer capacity.
pub fn copy_cstr(buf: &mut NativeBuffer, offset: u32, src: &[u8]) -> Result<u32> {
    let start = offset as usize;
    let end = start + src.len() + 1;
    if end > buf.capacity() {
        return Err(Error::BufferOverflow);
    }
    let bytes = buf.as_bytes_mut();
    bytes[start..end - 1].copy_from_slice(src);
    bytes[end - 1] = 0;
    Ok(end as u32)
}

/// Copy `src` into the buffer at `offset` as a length-prefixed value:
/// a 2-byte little-endian length, the raw bytes, a NUL terminator.
///
/// The prefix is always 2 bytes here; the engine reinterprets the prefix
/// width per column type on its side of the boundary.
pub fn copy_len_prefixed(buf: &mut NativeBuffer, offset: u32, src: &[u8]) -> Result<u32> {
    if src.len() > u16::MAX as usize {
        return Err(Error::BufferOverflow);
    }
    let start = offset as usize;
    let end = start + 2 + src.len() + 1;
    if end > buf.capacity() {
        return Err(Error::BufferOverflow);
    }
    let bytes = buf.as_bytes_mut();
    bytes[start..start + 2].copy_from_slice(&(src.len() as u16).to_le_bytes());
    bytes[start + 2..end - 1].copy_from_slice(src);
    bytes[end - 1] = 0;
    Ok(end as u32)
}
