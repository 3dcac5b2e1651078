//! Command dispatch over one input buffer, one console and one host.
use crate::console::SharedConsole;
use crate::editor::InputBuffer;
use crate::host::{ExecutionHost, HostConfig, RhaiRuntime, Runtime};
use crate::ir::EmittedProgram;
use crate::transform::{transpile, TranspileOptions};

pub const STOPPED_MESSAGE: &str = "program stopped";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run,
    Stop,
    ResetInput,
    ResetOutput,
}

pub struct Session<R: Runtime = RhaiRuntime> {
    input: InputBuffer,
    console: SharedConsole,
    host: ExecutionHost<R>,
    options: TranspileOptions,
    last_program: Option<EmittedProgram>,
}

impl Session<RhaiRuntime> {
    pub fn new(console: SharedConsole, host: &HostConfig, options: TranspileOptions) -> Self {
        let host = ExecutionHost::from_config(host, SharedConsole::clone(&console));
        Self::with_host(console, host, options)
    }
}

impl<R: Runtime> Session<R> {
    pub fn with_host(console: SharedConsole, host: ExecutionHost<R>, options: TranspileOptions) -> Self {
        Self {
            input: InputBuffer::default(),
            console,
            host,
            options,
            last_program: None,
        }
    }

    pub fn execute(&mut self, command: Command) {
        match command {
            Command::Run => {
                self.run();
            }
            Command::Stop => {
                self.stop();
            }
            Command::ResetInput => self.reset_input(),
            Command::ResetOutput => self.reset_output(),
        }
    }

    /// Clear the console, transform the buffer and hand it to the host.
    /// A host fault becomes a single console error; returns whether the
    /// program started.
    pub fn run(&mut self) -> bool {
        self.console.borrow_mut().clear();
        let program = transpile(self.input.text(), &self.options);
        tracing::debug!(source = %program.source, "emitted program");

        let started = match self.host.run(&program) {
            Ok(()) => true,
            Err(error) => {
                tracing::debug!(%error, "run abandoned");
                self.console.borrow_mut().error(error.to_string());
                false
            }
        };
        self.last_program = Some(program);
        started
    }

    pub fn stop(&mut self) -> bool {
        let stopped = self.host.stop();
        if stopped {
            self.console.borrow_mut().error(STOPPED_MESSAGE);
        }
        stopped
    }

    pub fn reset_input(&mut self) {
        self.input.reset_to_template();
    }

    pub fn reset_output(&mut self) {
        self.console.borrow_mut().clear();
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputBuffer {
        &mut self.input
    }

    pub fn console(&self) -> &SharedConsole {
        &self.console
    }

    pub fn options(&self) -> TranspileOptions {
        self.options
    }

    pub fn host(&self) -> &ExecutionHost<R> {
        &self.host
    }

    /// Program produced by the most recent `run`, successful or not.
    pub fn last_program(&self) -> Option<&EmittedProgram> {
        self.last_program.as_ref()
    }
}

// ------------------------------- Tests ------------------------------------ //
