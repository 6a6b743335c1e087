//! Bindings to the engine's C client library.
//!
//! All pointer traffic with the engine is concentrated here: frames cross
//! the boundary as (pointer, capacity) pairs, statuses come back as fixed
//! structs whose embedded strings are copied out before the call returns.

use std::ffi::{CString, c_char, c_uint};

use crate::buffer::{ADDRESS_SIZE, NativeBuffer};
use crate::engine::{EngineClient, EngineStats, Status};
use crate::error::{Error, Result};

const STATUS_TEXT_LEN: usize = 256;

// The wire format stores offsets as 4-byte words; a mismatch here would
// corrupt every frame.
const _: () = assert!(size_of::<c_uint>() == ADDRESS_SIZE);

#[repr(C)]
struct RawBuffer {
    buffer: *mut c_char,
    size: c_uint,
}

#[repr(C)]
struct RawStatus {
    http_code: c_uint,
    message: [c_char; STATUS_TEXT_LEN],
    err_line_no: c_uint,
    err_file_name: [c_char; STATUS_TEXT_LEN],
}

#[repr(C)]
struct RawEngineStats {
    objects_created: u64,
    objects_deleted: u64,
    objects_count: u64,
    objects_free: u64,
}

#[link(name = "kvengine")]
unsafe extern "C" {
    fn engine_init(conn_string: *const c_char, find_available_node_id: bool) -> RawStatus;
    fn engine_shutdown() -> RawStatus;
    fn engine_pk_read(request: *mut RawBuffer, response: *mut RawBuffer) -> RawStatus;
    fn engine_pk_batch_read(
        count: c_uint,
        requests: *mut RawBuffer,
        responses: *mut RawBuffer,
    ) -> RawStatus;
    fn engine_get_stats(out: *mut RawEngineStats) -> RawStatus;
}

fn text_from(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

impl From<RawStatus> for Status {
    fn from(raw: RawStatus) -> Self {
        Self {
            http_code: raw.http_code,
            message: text_from(&raw.message),
            err_line_no: raw.err_line_no,
            err_file_name: text_from(&raw.err_file_name),
        }
    }
}

fn raw_buffer(buffer: &mut NativeBuffer) -> RawBuffer {
    RawBuffer {
        buffer: buffer.as_mut_ptr().cast(),
        size: buffer.capacity() as c_uint,
    }
}

/// The [`EngineClient`] backed by the native library.
///
/// Constructing one runs `engine_init`; the library is assumed internally
/// thread-safe for concurrent reads, so no lock is held here.
pub struct NativeEngine {
    _connected: (),
}

impl NativeEngine {
    pub fn connect(conn_string: &str, find_available_node_id: bool) -> Result<Self> {
        let conn = CString::new(conn_string)
            .map_err(|e| Error::BadConfig(format!("bad connection string: {e}")))?;
        // SAFETY: `conn` outlives the call; the engine copies the string.
        let status: Status = unsafe { engine_init(conn.as_ptr(), find_available_node_id) }.into();
        if status.is_ok() {
            Ok(Self { _connected: () })
        } else {
            Err(Error::EngineUnavailable(status.message))
        }
    }
}

impl EngineClient for NativeEngine {
    fn pk_read(&self, request: &mut NativeBuffer, response: &mut NativeBuffer) -> Status {
        let mut raw_request = raw_buffer(request);
        let mut raw_response = raw_buffer(response);
        // SAFETY: both frames are exclusively borrowed for the whole call.
        unsafe { engine_pk_read(&mut raw_request, &mut raw_response) }.into()
    }

    fn pk_batch_read(
        &self,
        requests: &mut [&mut NativeBuffer],
        responses: &mut [&mut NativeBuffer],
    ) -> Status {
        let count = requests.len() as c_uint;
        let mut raw_requests: Vec<RawBuffer> =
            requests.iter_mut().map(|b| raw_buffer(b)).collect();
        let mut raw_responses: Vec<RawBuffer> =
            responses.iter_mut().map(|b| raw_buffer(b)).collect();
        // SAFETY: the descriptor arrays and every pointed-to frame outlive
        // the call.
        unsafe {
            engine_pk_batch_read(count, raw_requests.as_mut_ptr(), raw_responses.as_mut_ptr())
        }
        .into()
    }

    fn stats(&self) -> Result<EngineStats> {
        let mut raw_stats = RawEngineStats {
            objects_created: 0,
            objects_deleted: 0,
            objects_count: 0,
            objects_free: 0,
        };
        // SAFETY: the out pointer is valid for the duration of the call.
        let status: Status = unsafe { engine_get_stats(&mut raw_stats) }.into();
        status.into_result()?;
        Ok(EngineStats {
            objects_created: raw_stats.objects_created,
            objects_deleted: raw_stats.objects_deleted,
            objects_count: raw_stats.objects_count,
            objects_free: raw_stats.objects_free,
        })
    }

    fn shutdown(&self) -> Status {
        // SAFETY: no arguments; `connect` ran `engine_init` earlier.
        unsafe { engine_shutdown() }.into()
    }
}
