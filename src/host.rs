//! Runs an emitted program and drives its `Update` hook on a fixed period.
//!
//! The host owns at most one live instance and one schedule. A new run only
//! replaces them once the new program has compiled and its bootstrap has
//! finished; a failing run leaves whatever was running untouched.
pub mod rhai_backend;
pub mod schedule;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use thiserror::Error;

use crate::console::SharedConsole;
use crate::ir::{EmittedProgram, UPDATE_HOOK};
pub use rhai_backend::{RhaiInstance, RhaiRuntime};
pub use schedule::PeriodicTask;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(333);
pub const DEFAULT_MAX_OPERATIONS: u64 = 1_000_000;

// ————————————————————————————————————————————————————————————————————————————
// ERRORS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Error)]
pub enum HostError {
    #[error("compile error: {0}")]
    Compile(String),
    #[error("runtime error: {0}")]
    Execution(String),
    #[error("program did not publish an instance as `{slot}`")]
    MissingInstance { slot: &'static str },
    #[error("{hook}() failed: {message}")]
    Hook { hook: String, message: String },
}

// ————————————————————————————————————————————————————————————————————————————
// CONFIG
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub tick_interval: Duration,
    /// Per-call operation budget; guards against runaway loops.
    pub max_operations: u64,
    pub strict_variables: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            max_operations: DEFAULT_MAX_OPERATIONS,
            strict_variables: true,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BACKEND SEAM
// ————————————————————————————————————————————————————————————————————————————

/// Something that can evaluate an emitted program.
pub trait Runtime {
    type Instance: Instance + 'static;

    /// Compile `program`, run it once (bootstrap included), and return the
    /// instance it published. Program output goes to `console`.
    fn launch(&self, program: &EmittedProgram, console: &SharedConsole) -> Result<Self::Instance, HostError>;
}

pub trait Instance {
    fn class_name(&self) -> &str;
    /// Whether the program defines a zero-argument function called `hook`.
    fn has_hook(&self, hook: &str) -> bool;
    fn call_hook(&mut self, hook: &str) -> Result<(), HostError>;
}

// ————————————————————————————————————————————————————————————————————————————
// HOST
// ————————————————————————————————————————————————————————————————————————————

pub struct ExecutionHost<R: Runtime = RhaiRuntime> {
    runtime: R,
    console: SharedConsole,
    tick_interval: Duration,
    current: Option<Rc<RefCell<R::Instance>>>,
    schedule: PeriodicTask,
}

impl ExecutionHost<RhaiRuntime> {
    pub fn from_config(config: &HostConfig, console: SharedConsole) -> Self {
        Self::new(RhaiRuntime::from_config(config), console, config.tick_interval)
    }
}

impl<R: Runtime> ExecutionHost<R> {
    pub fn new(runtime: R, console: SharedConsole, tick_interval: Duration) -> Self {
        Self {
            runtime,
            console,
            tick_interval,
            current: None,
            schedule: PeriodicTask::new(),
        }
    }

    /// Launch `program` and schedule its `Update` hook. Errors are returned
    /// to the caller; the previous run, if any, keeps ticking.
    ///
    /// Must be called from inside a `tokio::task::LocalSet`.
    pub fn run(&mut self, program: &EmittedProgram) -> Result<(), HostError> {
        let instance = self.runtime.launch(program, &self.console)?;
        tracing::info!(class = instance.class_name(), "program started");

        let instance = Rc::new(RefCell::new(instance));
        self.current = Some(Rc::clone(&instance));
        let console = Rc::clone(&self.console);
        self.schedule
            .start(self.tick_interval, move || tick(&instance, &console));
        Ok(())
    }

    /// Cancel the schedule and forget the instance. Returns whether anything
    /// was running.
    pub fn stop(&mut self) -> bool {
        self.current = None;
        let was_running = self.schedule.cancel();
        if was_running {
            tracing::info!("program stopped");
        }
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.schedule.is_active()
    }

    pub fn current(&self) -> Option<Rc<RefCell<R::Instance>>> {
        self.current.clone()
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

fn tick<I: Instance>(instance: &RefCell<I>, console: &SharedConsole) {
    let mut instance = instance.borrow_mut();
    if !instance.has_hook(UPDATE_HOOK) {
        return;
    }
    if let Err(error) = instance.call_hook(UPDATE_HOOK) {
        tracing::warn!(%error, "update tick failed");
        console.borrow_mut().error(error.to_string());
    }
}

// ------------------------------- Tests ------------------------------------ //
