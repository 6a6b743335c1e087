//! Response frame handling.
//!
//! A response buffer is initialized with a minimal two-word header before
//! the native call; the engine overwrites the buffer from byte 0 with a
//! NUL-terminated JSON document. The payload is deliberately opaque to the
//! codec and relayed as-is.

use crate::buffer::NativeBuffer;
use crate::error::{Error, Result};
use crate::protocol::pk_read::{OFF_CAPACITY, OFF_OP_TYPE, OP_PK_RESPONSE};

pub const RESPONSE_HEADER_SIZE: u32 = 8;

/// Write the response frame header: op type and capacity.
pub fn init_response(buf: &mut NativeBuffer) -> Result<()> {
    let capacity = buf.capacity() as u32;
    buf.write_u32(OFF_OP_TYPE, OP_PK_RESPONSE)?;
    buf.write_u32(OFF_CAPACITY, capacity)?;
    Ok(())
}

/// The engine payload: the NUL-terminated UTF-8 document at buffer start.
pub fn relay_payload(buf: &NativeBuffer) -> Result<&str> {
    simdutf8::basic::from_utf8(buf.payload_bytes())
        .map_err(|_| Error::engine_internal("engine response payload is not valid UTF-8"))
}
