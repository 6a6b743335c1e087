use std::sync::Arc;

use tracing::{debug, error};

use crate::api::{BatchRequest, PkReadBody, StatInfo};
use crate::buffer::NativeBuffer;
use crate::buffer_pool::{BufferPool, PooledBuffer};
use crate::config::RestConfig;
use crate::engine::EngineClient;
use crate::error::Result;
use crate::protocol::pk_read::encode_pk_read;
use crate::protocol::response::{init_response, relay_payload};
use crate::validate;

/// A relayed engine payload together with the HTTP status it travels under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub body: String,
}

/// The gateway runtime: one buffer pool, one engine client.
///
/// Constructed once at startup and shared across workers; tests build their
/// own with a scripted engine. Holds no other state, so every operation is
/// independent of every other.
pub struct Gateway {
    pool: Arc<BufferPool>,
    engine: Arc<dyn EngineClient>,
}

impl Gateway {
    pub fn new(config: &RestConfig, engine: Arc<dyn EngineClient>) -> Self {
        Self {
            pool: Arc::new(BufferPool::new(
                config.buffer_size_bytes,
                config.pre_alloc_buffers,
            )),
            engine,
        }
    }

    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    /// Execute a single primary-key read end-to-end.
    ///
    /// Both frame buffers are pool-owned RAII handles, so they are released
    /// on every path out of this function. A 404 from the engine is a
    /// successful reply carrying the engine's miss payload.
    pub fn pk_read(&self, db: &str, table: &str, body: &PkReadBody) -> Result<Reply> {
        let request = validate::validate_pk_read(db, table, body)?;

        let mut request_buf = self.pool.acquire();
        let mut response_buf = self.pool.acquire();

        encode_pk_read(&mut request_buf, &request)?;
        init_response(&mut response_buf)?;

        let status = self.engine.pk_read(&mut request_buf, &mut response_buf);
        debug!(db, table, code = status.http_code, "pk-read");

        match status.http_code {
            200 | 404 => Ok(Reply {
                code: status.http_code as u16,
                body: relay_payload(&response_buf)?.to_owned(),
            }),
            _ => {
                error!(db, table, code = status.http_code, message = %status.message, "pk-read failed");
                Err(status.into_error())
            }
        }
    }

    /// Execute a batch of primary-key reads and stitch the response array.
    ///
    /// Sub-responses are emitted in input order as `{"code": n, "body": ...}`
    /// elements. A batch-level engine error fails the whole call; all `2n`
    /// buffers are released on every path.
    pub fn batch(&self, request: &BatchRequest) -> Result<Reply> {
        let operations = validate::validate_batch(request)?;

        let mut request_bufs: Vec<PooledBuffer> = Vec::with_capacity(operations.len());
        let mut response_bufs: Vec<PooledBuffer> = Vec::with_capacity(operations.len());
        for operation in &operations {
            let mut request_buf = self.pool.acquire();
            encode_pk_read(&mut request_buf, operation)?;
            request_bufs.push(request_buf);

            let mut response_buf = self.pool.acquire();
            init_response(&mut response_buf)?;
            response_bufs.push(response_buf);
        }

        let status = {
            let mut requests: Vec<&mut NativeBuffer> =
                request_bufs.iter_mut().map(|b| &mut **b).collect();
            let mut responses: Vec<&mut NativeBuffer> =
                response_bufs.iter_mut().map(|b| &mut **b).collect();
            self.engine.pk_batch_read(&mut requests, &mut responses)
        };
        debug!(operations = operations.len(), code = status.http_code, "batch");

        if !status.is_ok() {
            error!(code = status.http_code, message = %status.message, "batch failed");
        }
        status.into_result()?;

        let mut body = String::from("[");
        for (i, response_buf) in response_bufs.iter().enumerate() {
            if i > 0 {
                body.push(',');
            }
            let payload = relay_payload(response_buf)?;
            body.push_str("{\"code\":200,\"body\":");
            if payload.is_empty() {
                body.push_str("null");
            } else {
                body.push_str(payload);
            }
            body.push('}');
        }
        body.push(']');

        Ok(Reply { code: 200, body })
    }

    /// Snapshot the buffer-pool and engine counters. The two sub-structures
    /// are read independently; no cross-component consistency is promised.
    pub fn stats(&self) -> Result<StatInfo> {
        Ok(StatInfo {
            native_buffer_stats: self.pool.stats(),
            engine_stats: self.engine.stats()?,
        })
    }

    pub fn shutdown(&self) -> Result<()> {
        self.engine.shutdown().into_result()
    }
}
