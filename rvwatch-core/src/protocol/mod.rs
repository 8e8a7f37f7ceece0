//! JSON-RPC Protocol definitions
//!
//! Defines the communication protocol between a debugger front end and
//! rvwatch-server.

use serde::{Deserialize, Serialize};

use crate::machine::WORD_BYTES;
use crate::watch::{WatchChange, Watchpoint, WatchpointId};

/// Request from the front end to rvwatch-server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum Request {
    /// Evaluate an expression
    #[serde(rename = "eval")]
    Eval { expr: String },

    /// Create a watchpoint
    #[serde(rename = "watch")]
    Watch { expr: String },

    /// Delete a watchpoint
    #[serde(rename = "delete")]
    Delete { id: WatchpointId },

    /// List active watchpoints
    #[serde(rename = "watches")]
    Watches,

    /// Re-check all watchpoints (sent after each execution step)
    #[serde(rename = "sweep")]
    Sweep,

    /// Delete all watchpoints
    #[serde(rename = "clear")]
    Clear,

    /// Dump the register file
    #[serde(rename = "registers")]
    Registers,

    /// Read `count` words starting at the address `addr` evaluates to
    #[serde(rename = "scan")]
    Scan { count: u32, addr: String },

    /// Write a register
    #[serde(rename = "set_register")]
    SetRegister { name: String, value: u32 },

    /// Write the low `width` bytes (1, 2 or 4) of `value` to memory
    #[serde(rename = "write_memory")]
    WriteMemory {
        address: u32,
        value: u32,
        #[serde(default = "default_width")]
        width: u32,
    },

    /// Shutdown the server
    #[serde(rename = "shutdown")]
    Shutdown,
}

fn default_width() -> u32 {
    WORD_BYTES
}

/// A register and its current value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterValue {
    pub name: String,
    pub value: u32,
}

/// A memory word read by a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryValue {
    pub address: u32,
    pub value: u32,
}

/// Response from rvwatch-server to the front end
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    EvalResult { value: u32, hex: String },
    Watch { id: WatchpointId, value: u32, expr: String },
    Watches { watchpoints: Vec<Watchpoint> },
    Changes { changes: Vec<WatchChange> },
    Registers { registers: Vec<RegisterValue> },
    Memory { words: Vec<MemoryValue> },
    Success { ok: bool },
    Error { error: String },
}

impl Response {
    pub fn success() -> Self {
        Response::Success { ok: true }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Response::Error { error: msg.into() }
    }

    pub fn eval_result(value: u32) -> Self {
        Response::EvalResult {
            value,
            hex: format!("{:#010x}", value),
        }
    }
}

/// JSON-RPC message wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcMessage<T> {
    pub jsonrpc: String,
    pub id: Option<u64>,
    #[serde(flatten)]
    pub content: T,
}

impl<T> RpcMessage<T> {
    pub fn new(id: u64, content: T) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            content,
        }
    }
}
