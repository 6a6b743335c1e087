//! Shared test harness: an in-memory engine that decodes request frames and
//! serves seeded tables, plus helpers to drive the router in-process.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Map, Value, json};
use tower::ServiceExt;

use kvrest::config::RestConfig;
use kvrest::engine::{EngineClient, EngineStats, Status};
use kvrest::{Gateway, NativeBuffer};

/// A request frame decoded back into its logical parts.
#[derive(Debug)]
pub struct DecodedPkRead {
    pub db: String,
    pub table: String,
    /// (column, raw JSON value text) in frame order.
    pub filters: Vec<(String, String)>,
    pub read_columns: Vec<String>,
    pub operation_id: Option<String>,
}

fn read_cstr(buf: &NativeBuffer, offset: u32) -> Result<String, String> {
    let bytes = buf
        .as_bytes()
        .get(offset as usize..)
        .ok_or_else(|| format!("string offset {offset} out of bounds"))?;
    let nul = bytes
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| format!("unterminated string at {offset}"))?;
    String::from_utf8(bytes[..nul].to_vec()).map_err(|e| e.to_string())
}

fn read_word(buf: &NativeBuffer, offset: u32) -> Result<u32, String> {
    if offset % 4 != 0 {
        return Err(format!("unaligned word offset {offset}"));
    }
    buf.read_u32(offset).map_err(|e| e.to_string())
}

/// Walk a request frame exactly the way the engine does: header words,
/// then the word-aligned offset tables.
pub fn decode_pk_read(buf: &NativeBuffer) -> Result<DecodedPkRead, String> {
    if read_word(buf, 0)? != 1 {
        return Err("not a pk-read frame".to_string());
    }
    if read_word(buf, 4)? as usize != buf.capacity() {
        return Err("capacity word does not match the buffer".to_string());
    }
    let length = read_word(buf, 8)?;
    if length as usize > buf.capacity() {
        return Err("length exceeds capacity".to_string());
    }

    let db = read_cstr(buf, read_word(buf, 12)?)?;
    let table = read_cstr(buf, read_word(buf, 16)?)?;

    let pk_offset = read_word(buf, 20)?;
    let filter_count = read_word(buf, pk_offset)?;
    let mut filters = Vec::with_capacity(filter_count as usize);
    for i in 0..filter_count {
        let tuple_offset = read_word(buf, pk_offset + 4 + 4 * i)?;
        let key_offset = read_word(buf, tuple_offset)?;
        let value_offset = read_word(buf, tuple_offset + 4)?;
        let column = read_cstr(buf, key_offset)?;

        let bytes = buf.as_bytes();
        let start = value_offset as usize;
        if start + 2 > bytes.len() {
            return Err("value offset out of bounds".to_string());
        }
        let value_len = u16::from_le_bytes([bytes[start], bytes[start + 1]]) as usize;
        let value_bytes = bytes
            .get(start + 2..start + 2 + value_len)
            .ok_or_else(|| "value bytes out of bounds".to_string())?;
        let value = String::from_utf8(value_bytes.to_vec()).map_err(|e| e.to_string())?;
        filters.push((column, value));
    }

    let mut read_columns = Vec::new();
    let read_cols_offset = read_word(buf, 24)?;
    if read_cols_offset != 0 {
        let count = read_word(buf, read_cols_offset)?;
        for i in 0..count {
            let column_offset = read_word(buf, read_cols_offset + 4 + 4 * i)?;
            let return_type = read_word(buf, column_offset)?;
            if return_type != 1 {
                return Err(format!("unknown return type tag {return_type}"));
            }
            read_columns.push(read_cstr(buf, column_offset + 4)?);
        }
    }

    let op_id_offset = read_word(buf, 28)?;
    let operation_id = if op_id_offset != 0 {
        Some(read_cstr(buf, op_id_offset)?)
    } else {
        None
    };

    Ok(DecodedPkRead {
        db,
        table,
        filters,
        read_columns,
        operation_id,
    })
}

struct Table {
    primary_key: Vec<String>,
    /// (primary-key value texts in `primary_key` order, non-key columns).
    rows: Vec<(Vec<String>, Map<String, Value>)>,
}

/// An engine double backed by seeded tables. Misses return 404 with a
/// payload describing the miss, like the real engine.
pub struct InMemoryEngine {
    tables: BTreeMap<(String, String), Table>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    pub fn with_table(
        mut self,
        db: &str,
        table: &str,
        primary_key: &[&str],
        rows: Vec<(Vec<&str>, Value)>,
    ) -> Self {
        self.tables.insert(
            (db.to_string(), table.to_string()),
            Table {
                primary_key: primary_key.iter().map(|c| c.to_string()).collect(),
                rows: rows
                    .into_iter()
                    .map(|(pk, data)| {
                        let columns = data.as_object().cloned().unwrap_or_default();
                        (pk.into_iter().map(str::to_string).collect(), columns)
                    })
                    .collect(),
            },
        );
        self
    }

    fn payload(operation_id: Option<&str>, data: Value) -> String {
        let mut body = Map::new();
        if let Some(operation_id) = operation_id {
            body.insert("operationId".to_string(), json!(operation_id));
        }
        body.insert("data".to_string(), data);
        Value::Object(body).to_string()
    }

    fn execute(&self, decoded: &DecodedPkRead) -> (Status, Option<String>) {
        let miss = Self::payload(decoded.operation_id.as_deref(), Value::Null);

        let Some(table) = self
            .tables
            .get(&(decoded.db.clone(), decoded.table.clone()))
        else {
            return (Status::error(404, "NOT FOUND"), Some(miss));
        };

        if decoded.filters.len() != table.primary_key.len() {
            return (Status::error(400, "primary key mismatch"), None);
        }

        let row = table.rows.iter().find(|(pk_values, _)| {
            table.primary_key.iter().zip(pk_values).all(|(column, value)| {
                decoded
                    .filters
                    .iter()
                    .any(|(filter_column, filter_value)| {
                        filter_column == column && filter_value == value
                    })
            })
        });

        match row {
            Some((_, columns)) => {
                let data: Map<String, Value> = if decoded.read_columns.is_empty() {
                    columns.clone()
                } else {
                    decoded
                        .read_columns
                        .iter()
                        .map(|column| {
                            (
                                column.clone(),
                                columns.get(column).cloned().unwrap_or(Value::Null),
                            )
                        })
                        .collect()
                };
                let payload =
                    Self::payload(decoded.operation_id.as_deref(), Value::Object(data));
                (Status::ok(), Some(payload))
            }
            None => (Status::error(404, "NOT FOUND"), Some(miss)),
        }
    }

    fn write_payload(response: &mut NativeBuffer, payload: &str) {
        let bytes = response.as_bytes_mut();
        bytes[..payload.len()].copy_from_slice(payload.as_bytes());
        bytes[payload.len()] = 0;
    }
}

impl EngineClient for InMemoryEngine {
    fn pk_read(&self, request: &mut NativeBuffer, response: &mut NativeBuffer) -> Status {
        let decoded = match decode_pk_read(request) {
            Ok(decoded) => decoded,
            Err(message) => return Status::error(500, message),
        };
        let (status, payload) = self.execute(&decoded);
        if let Some(payload) = payload {
            Self::write_payload(response, &payload);
        }
        status
    }

    fn pk_batch_read(
        &self,
        requests: &mut [&mut NativeBuffer],
        responses: &mut [&mut NativeBuffer],
    ) -> Status {
        for (request, response) in requests.iter_mut().zip(responses.iter_mut()) {
            let status = self.pk_read(request, response);
            // Per-operation misses ride inside the payload; only a broken
            // frame fails the batch.
            if status.http_code == 500 {
                return status;
            }
        }
        Status::ok()
    }

    fn stats(&self) -> kvrest::error::Result<EngineStats> {
        Ok(EngineStats {
            objects_created: 2,
            objects_deleted: 0,
            objects_count: 2,
            objects_free: 1,
        })
    }

    fn shutdown(&self) -> Status {
        Status::ok()
    }
}

/// The seed tables the scenario tests assume.
pub fn seeded_engine() -> InMemoryEngine {
    InMemoryEngine::new()
        .with_table(
            "DB004",
            "int_table",
            &["id0", "id1"],
            vec![
                (vec!["0", "0"], json!({"col0": 0, "col1": 0})),
                (
                    vec!["2147483647", "4294967295"],
                    json!({"col0": 2147483647, "col1": 4294967295_u32}),
                ),
                (vec!["-2147483648", "0"], json!({"col0": -2147483648, "col1": 0})),
            ],
        )
        .with_table(
            "DB005",
            "bigint_table",
            &["id0", "id1"],
            vec![(vec!["0", "0"], json!({"col0": 5000000000_i64, "col1": 0}))],
        )
}

pub fn test_router() -> (Router, Arc<Gateway>) {
    let gateway = Arc::new(Gateway::new(
        &RestConfig::default(),
        Arc::new(seeded_engine()),
    ));
    (
        kvrest::server::router(Arc::clone(&gateway), "1.0.0"),
        gateway,
    )
}

pub async fn post_json(router: &Router, uri: &str, body: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}
