//! rvwatch Server
//!
//! JSON-RPC server that exposes the monitor's expression and watchpoint
//! operations. Communicates via stdin/stdout for easy subprocess management.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use rvwatch_core::protocol::RpcMessage;
use rvwatch_core::{MonitorConfig, Request, Response};
use tracing::{debug, error, info};

mod handler;

/// Environment variable naming a TOML config file
const CONFIG_ENV: &str = "RVWATCH_CONFIG";

fn load_config() -> Result<MonitorConfig> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            info!("Loading config from {:?}", path);
            MonitorConfig::load(&path).with_context(|| format!("loading {:?}", path))
        }
        None => Ok(MonitorConfig::default()),
    }
}

fn main() -> Result<()> {
    // Initialize logging to stderr (stdout is for JSON-RPC)
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    info!("rvwatch-server starting...");

    let config = load_config()?;
    let mut handler = handler::Handler::new(&config)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to read line: {}", e);
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        debug!("Received: {}", line);

        let (response, shutdown) = match serde_json::from_str::<RpcMessage<Request>>(&line) {
            Ok(msg) => {
                let shutdown = matches!(msg.content, Request::Shutdown);
                let result = handler.handle(&msg.content);
                (RpcMessage::new(msg.id.unwrap_or(0), result), shutdown)
            }
            Err(e) => (
                RpcMessage::new(0, Response::error(format!("Parse error: {}", e))),
                false,
            ),
        };

        let response_json = serde_json::to_string(&response)?;
        debug!("Sending: {}", response_json);
        writeln!(stdout, "{}", response_json)?;
        stdout.flush()?;

        if shutdown {
            break;
        }
    }

    info!("rvwatch-server shutting down");
    Ok(())
}
