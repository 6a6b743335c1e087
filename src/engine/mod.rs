//! The seam between the gateway and the engine's native client library.
//!
//! The gateway sees the engine only through [`EngineClient`]; the
//! FFI-backed implementation lives in [`ffi`] behind the `native` feature,
//! and tests substitute their own implementation.

use serde::Serialize;

use crate::buffer::NativeBuffer;
use crate::error::{Error, Result};

#[cfg(feature = "native")]
pub mod ffi;

/// Outcome of an engine call.
///
/// `http_code == 200` is success; everything else maps onto the error
/// taxonomy via [`Status::into_result`]. For codes >= 500 the native file
/// and line locate the failure inside the engine.
#[derive(Debug, Clone)]
pub struct Status {
    pub http_code: u32,
    pub message: String,
    pub err_line_no: u32,
    pub err_file_name: String,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            http_code: 200,
            message: String::new(),
            err_line_no: 0,
            err_file_name: String::new(),
        }
    }

    pub fn error(http_code: u32, message: impl Into<String>) -> Self {
        Self {
            http_code,
            message: message.into(),
            err_line_no: 0,
            err_file_name: String::new(),
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.http_code == 200
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_ok() { Ok(()) } else { Err(self.into_error()) }
    }

    /// The typed error for a non-success status.
    pub fn into_error(self) -> Error {
        Error::Engine {
            http_code: u16::try_from(self.http_code).unwrap_or(500),
            message: self.message,
            err_line_no: self.err_line_no,
            err_file_name: self.err_file_name,
        }
    }
}

/// Object counters reported by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub objects_created: u64,
    pub objects_deleted: u64,
    pub objects_count: u64,
    pub objects_free: u64,
}

/// The narrow interface the gateway consumes.
///
/// Implementations must be safe for concurrent `pk_read` / `pk_batch_read`
/// callers; `shutdown` is called once per process.
pub trait EngineClient: Send + Sync {
    /// Execute a single primary-key read. The request frame must be fully
    /// encoded; the response frame is overwritten by the engine.
    fn pk_read(&self, request: &mut NativeBuffer, response: &mut NativeBuffer) -> Status;

    /// Execute a batch of primary-key reads. `requests[i]` pairs with
    /// `responses[i]`; response order matches request order.
    fn pk_batch_read(
        &self,
        requests: &mut [&mut NativeBuffer],
        responses: &mut [&mut NativeBuffer],
    ) -> Status;

    fn stats(&self) -> Result<EngineStats>;

    fn shutdown(&self) -> Status;
}
