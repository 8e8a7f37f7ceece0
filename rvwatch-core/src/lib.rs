//! rvwatch Core Library
//!
//! Expression and watchpoint support for a RISC-V machine monitor:
//! - Expression tokenizing and evaluation over registers and memory
//! - Fixed-capacity watchpoint pool with change detection
//! - Monitor facade used by front ends
//! - Configuration and JSON-RPC protocol types

pub mod config;
pub mod expr;
pub mod machine;
pub mod monitor;
pub mod protocol;
pub mod watch;

pub use config::{ConfigError, MonitorConfig};
pub use expr::{tokenize, EvalError, Evaluator, LexError, Token, TokenKind};
pub use machine::{Machine, SimpleMachine, UnknownRegister};
pub use monitor::{Monitor, MonitorError};
pub use protocol::{Request, Response};
pub use watch::{WatchChange, WatchError, Watchpoint, WatchpointId, WatchpointPool};
