//! Primary-key read request frame.
//!
//! Layout: a fixed header of nine little-endian `u32` words, then the body
//! written contiguously, interleaving variable-length payload with
//! word-aligned offset tables.
//!
//! ```text
//! word 0  op_type           constant tag for a PK-READ request
//! word 1  capacity          buffer capacity in bytes
//! word 2  length            total bytes used including the header
//! word 3  db_offset         NUL-terminated database name
//! word 4  table_offset      NUL-terminated table name
//! word 5  pk_offset         PK-filter block
//! word 6  read_cols_offset  read-columns block, 0 if absent
//! word 7  op_id_offset      NUL-terminated operation id, 0 if absent
//! word 8  tx_id_offset      reserved, 0
//! ```

use crate::buffer::NativeBuffer;
use crate::error::Result;
use crate::protocol::primitive;
use crate::validate::ValidPkRead;

pub const OP_PK_READ: u32 = 1;
pub const OP_PK_RESPONSE: u32 = 2;

pub const REQUEST_HEADER_WORDS: u32 = 9;
pub const REQUEST_HEADER_SIZE: u32 = REQUEST_HEADER_WORDS * 4;

/// Tag for the only supported data return type.
pub const RETURN_TYPE_DEFAULT: u32 = 1;

// Byte offsets of the header words.
pub const OFF_OP_TYPE: u32 = 0;
pub const OFF_CAPACITY: u32 = 4;
pub const OFF_LENGTH: u32 = 8;
pub const OFF_DB: u32 = 12;
pub const OFF_TABLE: u32 = 16;
pub const OFF_PK: u32 = 20;
pub const OFF_READ_COLS: u32 = 24;
pub const OFF_OP_ID: u32 = 28;
pub const OFF_TX_ID: u32 = 32;

/// Encode `request` in place into `buf`.
///
/// Performs no allocation; every write is bounds-checked against the buffer
/// capacity and the first write that would cross it fails the whole encode
/// with `BufferOverflow`. On success `length` is the first byte past the
/// last payload byte.
pub fn encode_pk_read(buf: &mut NativeBuffer, request: &ValidPkRead<'_>) -> Result<()> {
    let capacity = buf.capacity() as u32;

    buf.write_u32(OFF_OP_TYPE, OP_PK_READ)?;
    buf.write_u32(OFF_CAPACITY, capacity)?;

    let mut head = REQUEST_HEADER_SIZE;

    let db_offset = head;
    head = primitive::copy_cstr(buf, head, request.db.as_bytes())?;

    let table_offset = head;
    head = primitive::copy_cstr(buf, head, request.table.as_bytes())?;

    // PK block: count, an offset per filter, then the (key, value) tuples.
    head = primitive::align_word(head);
    let pk_offset = head;
    buf.write_u32(head, request.filters.len() as u32)?;
    head += 4;
    let index_start = head;
    head += 4 * request.filters.len() as u32;
    for (i, filter) in request.filters.iter().enumerate() {
        head = primitive::align_word(head);
        let tuple_offset = head;
        head += 8;
        let key_offset = head;
        head = primitive::copy_cstr(buf, head, filter.column.as_bytes())?;
        let value_offset = head;
        head = primitive::copy_len_prefixed(buf, head, filter.value.as_bytes())?;
        buf.write_u32(index_start + 4 * i as u32, tuple_offset)?;
        buf.write_u32(tuple_offset, key_offset)?;
        buf.write_u32(tuple_offset + 4, value_offset)?;
    }

    let mut read_cols_offset = 0;
    if !request.read_columns.is_empty() {
        head = primitive::align_word(head);
        read_cols_offset = head;
        buf.write_u32(head, request.read_columns.len() as u32)?;
        head += 4;
        let index_start = head;
        head += 4 * request.read_columns.len() as u32;
        for (i, read_column) in request.read_columns.iter().enumerate() {
            head = primitive::align_word(head);
            let column_offset = head;
            buf.write_u32(head, read_column.return_type)?;
            head += 4;
            head = primitive::copy_cstr(buf, head, read_column.column.as_bytes())?;
            buf.write_u32(index_start + 4 * i as u32, column_offset)?;
        }
    }

    let mut op_id_offset = 0;
    if let Some(operation_id) = request.operation_id {
        op_id_offset = head;
        head = primitive::copy_cstr(buf, head, operation_id.as_bytes())?;
    }

    buf.write_u32(OFF_LENGTH, head)?;
    buf.write_u32(OFF_DB, db_offset)?;
    buf.write_u32(OFF_TABLE, table_offset)?;
    buf.write_u32(OFF_PK, pk_offset)?;
    buf.write_u32(OFF_READ_COLS, read_cols_offset)?;
    buf.write_u32(OFF_OP_ID, op_id_offset)?;
    buf.write_u32(OFF_TX_ID, 0)?;

    Ok(())
}
