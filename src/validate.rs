//! Request validation.
//!
//! Rules run in a fixed order and the first failure wins. Successful
//! validation produces borrowed views ([`ValidPkRead`]) with every optional
//! field resolved, so the encoder downstream never sees an `Option`.
//! Validation is side-effect-free.

use std::collections::HashSet;

use crate::api::{BatchRequest, BatchSubOperation, DATA_RETURN_TYPE_DEFAULT, PkReadBody};
use crate::error::{Error, Result};
use crate::protocol::pk_read::RETURN_TYPE_DEFAULT;

pub const MAX_IDENTIFIER_LEN: usize = 64;
pub const MAX_FILTERS: usize = 4096;
pub const MAX_READ_COLUMNS: usize = 4096;
pub const MAX_BATCH_OPERATIONS: usize = 4096;

/// A fully validated single read, borrowing from the parsed request.
#[derive(Debug)]
pub struct ValidPkRead<'a> {
    pub db: &'a str,
    pub table: &'a str,
    pub filters: Vec<ValidFilter<'a>>,
    pub read_columns: Vec<ValidReadColumn<'a>>,
    pub operation_id: Option<&'a str>,
}

/// `value` is the raw JSON text of the filter value, passed to the engine
/// verbatim.
#[derive(Debug)]
pub struct ValidFilter<'a> {
    pub column: &'a str,
    pub value: &'a str,
}

#[derive(Debug)]
pub struct ValidReadColumn<'a> {
    pub column: &'a str,
    pub return_type: u32,
}

fn field_err(field: &str, tag: &str) -> Error {
    Error::Validation(format!(
        "Error:Field validation for '{field}' failed on the '{tag}' tag"
    ))
}

/// Database, table and column identifiers admit code points in
/// `[U+0001, U+007F]` and `[U+0080, U+0FFF]`; anything else is invalid.
fn validate_identifier(field: &str, identifier: &str) -> Result<()> {
    let len = identifier.chars().count();
    if len < 1 {
        return Err(field_err(field, "min"));
    }
    if len > MAX_IDENTIFIER_LEN {
        return Err(field_err(field, "max"));
    }
    for c in identifier.chars() {
        let cp = c as u32;
        if !((0x0001..=0x007F).contains(&cp) || (0x0080..=0x0FFF).contains(&cp)) {
            return Err(Error::Validation(format!(
                "field validation failed. Invalid character '{c}' (U+{cp:04X})"
            )));
        }
    }
    Ok(())
}

/// Validate a single primary-key read and resolve it into a [`ValidPkRead`].
pub fn validate_pk_read<'a>(
    db: &'a str,
    table: &'a str,
    body: &'a PkReadBody,
) -> Result<ValidPkRead<'a>> {
    validate_identifier("DB", db)?;
    validate_identifier("Table", table)?;

    let Some(filters) = &body.filters else {
        return Err(field_err("Filters", "required"));
    };
    if filters.is_empty() {
        return Err(field_err("Filters", "min"));
    }
    if filters.len() > MAX_FILTERS {
        return Err(field_err("Filters", "max"));
    }

    let mut valid_filters = Vec::with_capacity(filters.len());
    for filter in filters {
        let Some(column) = &filter.column else {
            return Err(field_err("Column", "required"));
        };
        validate_identifier("Column", column)?;
        let Some(value) = &filter.value else {
            return Err(field_err("Value", "required"));
        };
        valid_filters.push(ValidFilter {
            column,
            value: value.get(),
        });
    }

    let mut filter_columns = HashSet::with_capacity(valid_filters.len());
    for filter in &valid_filters {
        if !filter_columns.insert(filter.column) {
            return Err(Error::Validation(
                "field validation for 'Filters' failed on the 'unique' tag".to_string(),
            ));
        }
    }

    let mut valid_read_columns = Vec::new();
    if let Some(read_columns) = &body.read_columns {
        if read_columns.is_empty() {
            return Err(field_err("ReadColumns", "min"));
        }
        if read_columns.len() > MAX_READ_COLUMNS {
            return Err(field_err("ReadColumns", "max"));
        }

        for read_column in read_columns {
            let Some(column) = &read_column.column else {
                return Err(field_err("Column", "required"));
            };
            validate_identifier("Column", column)?;
            match read_column.data_return_type.as_deref() {
                None | Some(DATA_RETURN_TYPE_DEFAULT) => {}
                Some(other) => return Err(Error::UnsupportedReturnType(other.to_string())),
            }
            valid_read_columns.push(ValidReadColumn {
                column,
                return_type: RETURN_TYPE_DEFAULT,
            });
        }

        let mut read_column_names = HashSet::with_capacity(valid_read_columns.len());
        for read_column in &valid_read_columns {
            if !read_column_names.insert(read_column.column) {
                return Err(Error::Validation(
                    "field validation for 'ReadColumns' failed on the 'unique' tag".to_string(),
                ));
            }
        }

        for read_column in &valid_read_columns {
            if filter_columns.contains(read_column.column) {
                return Err(Error::Validation(format!(
                    "field validation for read columns failed. '{}' already included in filter",
                    read_column.column
                )));
            }
        }
    }

    if let Some(operation_id) = &body.operation_id {
        let len = operation_id.chars().count();
        if len < 1 {
            return Err(field_err("OperationID", "min"));
        }
        if len > MAX_IDENTIFIER_LEN {
            return Err(field_err("OperationID", "max"));
        }
    }

    Ok(ValidPkRead {
        db,
        table,
        filters: valid_filters,
        read_columns: valid_read_columns,
        operation_id: body.operation_id.as_deref(),
    })
}

/// Validate a batch envelope and every embedded sub-operation, preserving
/// input order.
pub fn validate_batch(request: &BatchRequest) -> Result<Vec<ValidPkRead<'_>>> {
    let Some(operations) = &request.operations else {
        return Err(field_err("Operations", "required"));
    };
    if operations.is_empty() {
        return Err(field_err("Operations", "min"));
    }
    if operations.len() > MAX_BATCH_OPERATIONS {
        return Err(field_err("Operations", "max"));
    }

    let mut seen = HashSet::with_capacity(operations.len());
    for operation in operations {
        let key = serde_json::to_string(operation)
            .map_err(|e| Error::Validation(format!("cannot canonicalize operation: {e}")))?;
        if !seen.insert(key) {
            return Err(field_err("Operations", "unique"));
        }
    }

    operations.iter().map(validate_sub_operation).collect()
}

fn validate_sub_operation(operation: &BatchSubOperation) -> Result<ValidPkRead<'_>> {
    let Some(method) = &operation.method else {
        return Err(field_err("Method", "required"));
    };
    if method != "POST" {
        return Err(field_err("Method", "oneof"));
    }

    let Some(relative_url) = &operation.relative_url else {
        return Err(field_err("RelativeURL", "required"));
    };
    let trimmed = relative_url.strip_prefix('/').unwrap_or(relative_url);
    let (db, table) = split_pk_read_url(trimmed)
        .ok_or_else(|| Error::Validation(format!("Invalid Relative URL: {relative_url}")))?;

    let Some(body) = &operation.body else {
        return Err(field_err("Body", "required"));
    };

    validate_pk_read(db, table, body)
}

/// Match `<db>/<table>/pk-read` where both segments are non-empty
/// `[A-Za-z0-9$_]+`.
fn split_pk_read_url(url: &str) -> Option<(&str, &str)> {
    let mut segments = url.split('/');
    let db = segments.next()?;
    let table = segments.next()?;
    let operation = segments.next()?;
    if segments.next().is_some() || operation != "pk-read" || db.is_empty() || table.is_empty() {
        return None;
    }
    let segment_ok =
        |s: &str| s.chars().all(|c| c.is_ascii_alphanumeric() || c == '$' || c == '_');
    (segment_ok(db) && segment_ok(table)).then_some((db, table))
}
