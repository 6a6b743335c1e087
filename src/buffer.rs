use zerocopy::byteorder::little_endian::U32 as U32LE;
use zerocopy::{FromBytes, IntoBytes};

use crate::error::{Error, Result};

/// The engine addresses buffer contents with 4-byte words; every offset
/// stored inside a frame is a byte offset that must land on a word boundary.
pub const ADDRESS_SIZE: usize = 4;

/// A fixed-capacity buffer suitable for zero-copy hand-off to the engine's
/// native client library.
///
/// The backing storage is a boxed `[u32]` slice, so byte offset 0 is always
/// word aligned and the capacity is always a multiple of [`ADDRESS_SIZE`].
/// The region is interpreted simultaneously as a byte sequence and as an
/// array of little-endian 32-bit words.
#[derive(Debug)]
pub struct NativeBuffer {
    words: Box<[u32]>,
}

impl NativeBuffer {
    /// Allocate a zeroed buffer of `capacity` bytes.
    ///
    /// `capacity` must be a multiple of [`ADDRESS_SIZE`]; the configuration
    /// layer enforces this before any pool is built.
    pub fn new(capacity: usize) -> Self {
        debug_assert_eq!(capacity % ADDRESS_SIZE, 0);
        Self {
            words: vec![0_u32; capacity / ADDRESS_SIZE].into_boxed_slice(),
        }
    }

    /// Buffer capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.words.len() * ADDRESS_SIZE
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.words.as_bytes()
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.words.as_mut_bytes()
    }

    /// Raw pointer to the buffer start, for the FFI crossing.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.words.as_mut_ptr().cast()
    }

    /// Read the little-endian `u32` at byte offset `offset`.
    pub fn read_u32(&self, offset: u32) -> Result<u32> {
        debug_assert_eq!(offset as usize % ADDRESS_SIZE, 0);
        let start = offset as usize;
        let end = start + ADDRESS_SIZE;
        if end > self.capacity() {
            return Err(Error::BufferOverflow);
        }
        let word = U32LE::ref_from_bytes(&self.as_bytes()[start..end])
            .map_err(|_| Error::BufferOverflow)?;
        Ok(word.get())
    }

    /// Write `value` as a little-endian `u32` at byte offset `offset`.
    pub fn write_u32(&mut self, offset: u32, value: u32) -> Result<()> {
        debug_assert_eq!(offset as usize % ADDRESS_SIZE, 0);
        let start = offset as usize;
        let end = start + ADDRESS_SIZE;
        if end > self.capacity() {
            return Err(Error::BufferOverflow);
        }
        let word = U32LE::mut_from_bytes(&mut self.as_bytes_mut()[start..end])
            .map_err(|_| Error::BufferOverflow)?;
        word.set(value);
        Ok(())
    }

    /// Zero the first byte. A freshly acquired buffer reads as an empty
    /// C string until the engine or the encoder writes into it.
    #[inline]
    pub fn zero_first_byte(&mut self) {
        if let Some(first) = self.as_bytes_mut().first_mut() {
            *first = 0;
        }
    }

    /// The bytes from buffer start up to (excluding) the first NUL.
    ///
    /// The engine terminates its response payload with a NUL byte; if none is
    /// present the whole buffer is returned rather than reading past the end.
    pub fn payload_bytes(&self) -> &[u8] {
        let bytes = self.as_bytes();
        match bytes.iter().position(|&b| b == 0) {
            Some(nul) => &bytes[..nul],
            None => bytes,
        }
    }
}
