//! JSON bodies of the REST surface.
//!
//! Every field is optional at the serde level; presence and shape are
//! enforced by [`crate::validate`] so that a missing field produces the
//! same `Field validation ...` message as any other rule, not a bare
//! deserializer error.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::buffer_pool::BufferPoolStats;
use crate::engine::EngineStats;

/// Body of `POST /<v>/<db>/<table>/pk-read`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PkReadBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,

    #[serde(default, rename = "readColumns", skip_serializing_if = "Option::is_none")]
    pub read_columns: Option<Vec<ReadColumn>>,

    #[serde(default, rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
}

/// One primary-key column filter.
///
/// `value` is kept as raw JSON text; the encoder passes it to the engine
/// verbatim, so `0` travels as the byte `b"0"` and `"a"` travels quoted.
#[derive(Debug, Deserialize, Serialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Box<RawValue>>,
}

/// The only supported data return type tag.
pub const DATA_RETURN_TYPE_DEFAULT: &str = "default";

#[derive(Debug, Deserialize, Serialize)]
pub struct ReadColumn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    #[serde(default, rename = "dataReturnType", skip_serializing_if = "Option::is_none")]
    pub data_return_type: Option<String>,
}

/// Body of `POST /<v>/batch`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BatchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<Vec<BatchSubOperation>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BatchSubOperation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, rename = "relative-url", skip_serializing_if = "Option::is_none")]
    pub relative_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<PkReadBody>,
}

/// Response of `GET /<v>/stat`.
#[derive(Debug, Serialize)]
pub struct StatInfo {
    pub native_buffer_stats: BufferPoolStats,
    pub engine_stats: EngineStats,
}

/// Body of every error response.
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
