//! Request types for the JSON-lines protocol
//!
//! ```text
//! {"op":"find","record_space":"customers","query":{"age":"30"},"conjunction":"And"}
//! {"op":"create","record_space":"customers","body":{"email":"a@x.com"}}
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::errors::{CliError, CliResult};
use crate::predicate::Conjunction;

/// Query part shared by find, find_one, update and delete
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub record_space: String,
    #[serde(default)]
    pub query: Map<String, Value>,
    #[serde(default)]
    pub conjunction: Conjunction,
}

impl QueryRequest {
    /// Flat `name -> string` query; non-string values use their JSON text
    pub fn flat_query(&self) -> BTreeMap<String, String> {
        self.query
            .iter()
            .map(|(key, value)| {
                let raw = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), raw)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    pub record_space: String,
    pub body: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    #[serde(flatten)]
    pub target: QueryRequest,
    pub body: Map<String, Value>,
}

/// Unified request envelope, tagged by `op`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Find(QueryRequest),
    FindOne(QueryRequest),
    Create(CreateRequest),
    Update(UpdateRequest),
    Delete(QueryRequest),
}

impl Request {
    /// Parse a request from a JSON value
    pub fn parse(value: Value) -> CliResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| CliError::invalid_request(format!("Invalid request: {}", e)))
    }

    /// Operation name for logs
    pub fn op(&self) -> &'static str {
        match self {
            Request::Find(_) => "find",
            Request::FindOne(_) => "find_one",
            Request::Create(_) => "create",
            Request::Update(_) => "update",
            Request::Delete(_) => "delete",
        }
    }
}
