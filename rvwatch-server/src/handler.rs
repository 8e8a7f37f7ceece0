//! Request handler for rvwatch-server

use rvwatch_core::protocol::{MemoryValue, RegisterValue};
use rvwatch_core::{
    ConfigError, EvalError, LexError, Monitor, MonitorConfig, Request, Response, SimpleMachine,
    WatchpointId,
};
use tracing::{debug, info, warn};

pub struct Handler {
    monitor: Monitor<SimpleMachine>,
}

impl Handler {
    pub fn new(config: &MonitorConfig) -> Result<Self, ConfigError> {
        let machine = config.build_machine()?;
        Ok(Self {
            monitor: Monitor::with_config(machine, config),
        })
    }

    pub fn handle(&mut self, request: &Request) -> Response {
        match request {
            Request::Eval { expr } => self.handle_eval(expr),
            Request::Watch { expr } => self.handle_watch(expr),
            Request::Delete { id } => self.handle_delete(*id),
            Request::Watches => Response::Watches {
                watchpoints: self.monitor.watch_list(),
            },
            Request::Sweep => self.handle_sweep(),
            Request::Clear => {
                self.monitor.watch_clear();
                Response::success()
            }
            Request::Registers => self.handle_registers(),
            Request::Scan { count, addr } => self.handle_scan(*count, addr),
            Request::SetRegister { name, value } => self.handle_set_register(name, *value),
            Request::WriteMemory {
                address,
                value,
                width,
            } => self.handle_write_memory(*address, *value, *width),
            Request::Shutdown => {
                info!("Shutdown requested");
                Response::success()
            }
        }
    }

    fn handle_eval(&self, expr: &str) -> Response {
        debug!("Eval request: expr={}", expr);

        match self.monitor.evaluate(expr) {
            Ok(value) => Response::eval_result(value),
            Err(e) => Response::error(describe(&e, expr)),
        }
    }

    fn handle_watch(&mut self, expr: &str) -> Response {
        debug!("Watch request: expr={}", expr);

        match self.monitor.watch_create(expr) {
            Ok((id, value)) => {
                info!("Watchpoint {}: {}", id, expr);
                Response::Watch {
                    id,
                    value,
                    expr: expr.to_string(),
                }
            }
            Err(e) => Response::error(e.to_string()),
        }
    }

    fn handle_delete(&mut self, id: WatchpointId) -> Response {
        match self.monitor.watch_delete(id) {
            Ok(()) => Response::success(),
            Err(e) => Response::error(e.to_string()),
        }
    }

    fn handle_sweep(&mut self) -> Response {
        match self.monitor.watch_sweep() {
            Ok(changes) => {
                for change in &changes {
                    info!(
                        "Watchpoint {}: {} (old value = {}, new value = {})",
                        change.id, change.expression, change.old_value, change.new_value
                    );
                }
                Response::Changes { changes }
            }
            Err(e) => {
                // A watch expression that evaluated before no longer does
                warn!("Watchpoint sweep failed: {}", e);
                Response::error(format!("Invalid watch expression: {}", e))
            }
        }
    }

    fn handle_registers(&self) -> Response {
        let registers = self
            .monitor
            .registers()
            .into_iter()
            .map(|(name, value)| RegisterValue {
                name: name.to_string(),
                value,
            })
            .collect();
        Response::Registers { registers }
    }

    fn handle_scan(&self, count: u32, addr: &str) -> Response {
        debug!("Scan request: count={}, addr={}", count, addr);

        match self.monitor.scan_memory(count, addr) {
            Ok(words) => Response::Memory {
                words: words
                    .into_iter()
                    .map(|(address, value)| MemoryValue { address, value })
                    .collect(),
            },
            Err(e) => Response::error(describe(&e, addr)),
        }
    }

    fn handle_write_memory(&mut self, address: u32, value: u32, width: u32) -> Response {
        debug!("Write request: address={:#x}, width={}", address, width);

        match self.monitor.machine_mut().write_memory(address, width, value) {
            Ok(()) => Response::success(),
            Err(e) => Response::error(e.to_string()),
        }
    }

    fn handle_set_register(&mut self, name: &str, value: u32) -> Response {
        let name = name.strip_prefix('$').filter(|n| !n.is_empty() && *n != "0").unwrap_or(name);
        match self.monitor.machine_mut().set_register(name, value) {
            Ok(()) => Response::success(),
            Err(e) => Response::error(e.to_string()),
        }
    }
}

/// Error text for an expression, with a caret under lexing failures
fn describe(err: &EvalError, expr: &str) -> String {
    match err {
        EvalError::Lex(lex @ LexError::NoMatch { .. }) => lex.render(expr),
        other => other.to_string(),
    }
}
