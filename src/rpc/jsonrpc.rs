/* This file is part of pubdao (https://codeberg.org/pubdao/pubdao)
 *
 * Copyright (C) 2025-2026 pubdao developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! JSON-RPC 2.0 object definitions
use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// JSON-RPC error codes.
/// The error codes `[-32768, -32000]` are reserved for predefined errors.
#[derive(Copy, Clone, Debug)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// The JSON sent is not a valid Request object.
    InvalidRequest,
    /// The method does not exist / is not available.
    MethodNotFound,
    /// Invalid method parameter(s).
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
    /// Reserved for implementation-defined server-errors.
    ServerError(i64),
}

impl ErrorCode {
    pub fn code(&self) -> i64 {
        match *self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ServerError(c) => c,
        }
    }

    pub fn description(&self) -> String {
        let desc = match *self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
            Self::ServerError(_) => "Server error",
        };
        desc.to_string()
    }
}

/// Wrapping enum around the available JSON-RPC object types
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum JsonResult {
    Response(JsonResponse),
    Error(JsonError),
    Notification(JsonNotification),
}

/// A JSON-RPC request object
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct JsonRequest {
    /// JSON-RPC version
    pub jsonrpc: Value,
    /// Request method
    pub method: Value,
    /// Request parameters
    pub params: Value,
    /// Request ID
    pub id: Value,
}

impl JsonRequest {
    /// Create a new [`JsonRequest`] object with the given method and
    /// parameters. The request ID is chosen randomly.
    pub fn new(method: &str, params: Value) -> Self {
        assert!(params.is_object() || params.is_array());
        Self {
            jsonrpc: json!("2.0"),
            method: json!(method),
            params,
            id: json!(OsRng.gen::<u32>()),
        }
    }
}

/// A JSON-RPC response object
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct JsonResponse {
    /// JSON-RPC version
    pub jsonrpc: Value,
    /// Response result
    pub result: Value,
    /// Response ID
    pub id: Value,
}

impl JsonResponse {
    pub fn new(result: Value, id: Value) -> Self {
        Self { jsonrpc: json!("2.0"), result, id }
    }
}

/// A JSON-RPC error value, held inside [`JsonError`]
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct JsonErrorVal {
    /// Error code
    pub code: Value,
    /// Error message
    pub message: Value,
}

/// A JSON-RPC error reply object
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct JsonError {
    /// JSON-RPC version
    pub jsonrpc: Value,
    /// Error object
    pub error: JsonErrorVal,
    /// Reply ID
    pub id: Value,
}

impl JsonError {
    pub fn new(code: ErrorCode, message: Option<String>, id: Value) -> Self {
        let error = JsonErrorVal {
            code: json!(code.code()),
            message: match message {
                Some(m) => json!(m),
                None => json!(code.description()),
            },
        };

        Self { jsonrpc: json!("2.0"), error, id }
    }
}

/// A JSON-RPC notification object (no reply expected)
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct JsonNotification {
    /// JSON-RPC version
    pub jsonrpc: Value,
    /// Notification method
    pub method: Value,
    /// Notification parameters
    pub params: Value,
}
