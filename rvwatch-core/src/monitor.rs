//! Monitor facade
//!
//! The operations a debugger front end calls: evaluate an expression,
//! manage watchpoints, sweep them after each execution step, and inspect
//! registers and memory.

use log::debug;
use thiserror::Error;

use crate::config::MonitorConfig;
use crate::expr::{EvalError, Evaluator, Lexer};
use crate::machine::{Machine, REGISTER_NAMES, WORD_BYTES};
use crate::watch::{WatchChange, WatchError, Watchpoint, WatchpointId, WatchpointPool};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Expression evaluation and watchpoints over a machine
pub struct Monitor<M> {
    machine: M,
    lexer: Lexer,
    watchpoints: WatchpointPool,
}

impl<M: Machine> Monitor<M> {
    pub fn new(machine: M) -> Self {
        Self {
            machine,
            lexer: Lexer::new(),
            watchpoints: WatchpointPool::new(),
        }
    }

    pub fn with_config(machine: M, config: &MonitorConfig) -> Self {
        Self {
            machine,
            lexer: Lexer::with_limits(config.limits.max_tokens, config.limits.max_token_len),
            watchpoints: WatchpointPool::with_capacity(config.watch.capacity),
        }
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut M {
        &mut self.machine
    }

    pub fn watchpoints(&self) -> &WatchpointPool {
        &self.watchpoints
    }

    fn evaluator(&self) -> Evaluator<&M> {
        Evaluator::with_lexer(&self.machine, self.lexer)
    }

    pub fn evaluate(&self, expr: &str) -> Result<u32, EvalError> {
        self.evaluator().evaluate(expr)
    }

    /// Create a watchpoint on `expr`, returning its id and current value.
    ///
    /// The expression is evaluated first; if that fails no watchpoint is
    /// taken from the pool.
    pub fn watch_create(&mut self, expr: &str) -> Result<(WatchpointId, u32), MonitorError> {
        let value = self.evaluate(expr)?;
        let wp = self.watchpoints.allocate()?;
        wp.expression.clear();
        wp.expression.push_str(expr);
        wp.last_value = value;
        debug!("watchpoint {}: {} = {}", wp.id, expr, value);
        Ok((wp.id, value))
    }

    pub fn watch_delete(&mut self, id: WatchpointId) -> Result<(), WatchError> {
        self.watchpoints.release(id)
    }

    /// Active watchpoints, most recently created first.
    pub fn watch_list(&self) -> Vec<Watchpoint> {
        self.watchpoints.list()
    }

    /// Re-evaluate every watchpoint and report value changes.
    pub fn watch_sweep(&mut self) -> Result<Vec<WatchChange>, EvalError> {
        let evaluator = Evaluator::with_lexer(&self.machine, self.lexer);
        self.watchpoints.sweep(|expr| evaluator.evaluate(expr))
    }

    pub fn watch_clear(&mut self) {
        debug!("clearing {} watchpoints", self.watchpoints.active_len());
        self.watchpoints.clear();
    }

    /// All general-purpose registers in x0..x31 order.
    pub fn registers(&self) -> Vec<(&'static str, u32)> {
        REGISTER_NAMES
            .iter()
            .map(|name| (*name, self.machine.read_register(name).unwrap_or(0)))
            .collect()
    }

    /// Read `count` consecutive words starting at the value of `addr_expr`.
    pub fn scan_memory(&self, count: u32, addr_expr: &str) -> Result<Vec<(u32, u32)>, EvalError> {
        let base = self.evaluate(addr_expr)?;
        Ok((0..count)
            .map(|i| {
                let address = base.wrapping_add(i.wrapping_mul(WORD_BYTES));
                (address, self.machine.read_memory(address, WORD_BYTES))
            })
            .collect())
    }
}
