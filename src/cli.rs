//! CLI: transpile | run | shell | template
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use tokio::task::LocalSet;

use crate::console::Console;
use crate::editor::{InputBuffer, TEMPLATE};
use crate::host::{HostConfig, DEFAULT_MAX_OPERATIONS};
use crate::ir::EmittedProgram;
use crate::session::Session;
use crate::transform::{transpile, LiteralPolicy, TranspileOptions};

const EMITTED_EXTENSION: &str = "rhai";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// transform Unity-style C# behaviour scripts into Rhai and run them on a tick loop
#[derive(Parser, Debug)]
#[command(name = "unisim", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// transform scripts and print or write the emitted programs
    Transpile(TranspileOut),
    /// transform one script, run it, then call Update on a fixed period
    Run(RunSettings),
    /// interactive session: edit, run, stop, inspect
    Shell(ShellSettings),
    /// print the starter script
    Template,
}

#[derive(Args, Debug, Clone)]
struct TransformSettings {
    /// also qualify field names found inside string literals and comments
    #[arg(long, default_value_t = false)]
    qualify_inside_literals: bool,
}

#[derive(Args, Debug, Clone)]
struct HostSettings {
    /// milliseconds between Update calls
    #[arg(long, default_value_t = 333)]
    interval_ms: u64,

    /// operation budget for each call into the script
    #[arg(long, default_value_t = DEFAULT_MAX_OPERATIONS)]
    max_operations: u64,

    /// prefix console lines with the wall-clock time
    #[arg(long, default_value_t = false)]
    timestamps: bool,
}

#[derive(clap::Parser, Debug)]
struct TranspileOut {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    #[command(flatten)]
    transform: TransformSettings,

    /// output directory, one `<stem>.rhai` per input (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// print a JSON report (class, fields, methods, source) instead of raw text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Parser, Debug)]
struct RunSettings {
    /// script to run
    #[arg(long, short)]
    input: PathBuf,

    /// stop after this many ticks (runs until Ctrl-C if omitted)
    #[arg(long)]
    ticks: Option<u32>,

    #[command(flatten)]
    host: HostSettings,

    #[command(flatten)]
    transform: TransformSettings,
}

#[derive(clap::Parser, Debug)]
struct ShellSettings {
    /// initial buffer contents (the starter script if omitted)
    file: Option<PathBuf>,

    #[command(flatten)]
    host: HostSettings,

    #[command(flatten)]
    transform: TransformSettings,
}

#[derive(Debug, Serialize)]
struct TranspiledFile {
    path: PathBuf,
    #[serde(flatten)]
    program: EmittedProgram,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TransformSettings {
    fn options(&self) -> TranspileOptions {
        let literal_policy = match self.qualify_inside_literals {
            true => LiteralPolicy::Qualify,
            false => LiteralPolicy::Exempt,
        };
        TranspileOptions { literal_policy }
    }
}

impl HostSettings {
    fn config(&self) -> HostConfig {
        HostConfig {
            tick_interval: Duration::from_millis(self.interval_ms),
            max_operations: self.max_operations,
            ..HostConfig::default()
        }
    }

    fn session(&self, transform: &TransformSettings) -> Session {
        let console = Console::echoing(self.timestamps).shared();
        Session::new(console, &self.config(), transform.options())
    }
}

impl TranspileOut {
    fn execute(&self) -> anyhow::Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let options = self.transform.options();
        let files = source_paths
            .par_iter()
            .map(|path| {
                let source = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read source file {}", path.display()))?;
                Ok(TranspiledFile { path: path.clone(), program: transpile(&source, &options) })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        tracing::info!(files = files.len(), "transpiled");

        if let Some(dir) = self.out.as_ref() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            for file in &files {
                let target = emitted_path(dir, &file.path);
                std::fs::write(&target, &file.program.source)
                    .with_context(|| format!("failed to write {}", target.display()))?;
            }
        }
        if self.json {
            println!("{}", serde_json::to_string_pretty(&files)?);
        } else if self.out.is_none() {
            for file in &files {
                if files.len() > 1 {
                    println!("// ==> {}", file.path.display());
                }
                println!("{}", file.program.source);
            }
        }
        Ok(())
    }
}

impl RunSettings {
    fn execute(&self) -> anyhow::Result<()> {
        let source = std::fs::read_to_string(&self.input)
            .with_context(|| format!("failed to read source file {}", self.input.display()))?;
        let runtime = current_thread_runtime()?;
        LocalSet::new().block_on(&runtime, self.drive(source))
    }

    async fn drive(&self, source: String) -> anyhow::Result<()> {
        let mut session = self.host.session(&self.transform);
        session.input_mut().set_text(source);
        if !session.run() {
            return Err(anyhow!("{} did not start", self.input.display()));
        }

        let interval = session.host().tick_interval();
        let deadline = async {
            match self.ticks {
                // land between the last wanted tick and the next one
                Some(ticks) => tokio::time::sleep(interval * ticks + interval / 2).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = deadline => {}
            signal = tokio::signal::ctrl_c() => signal.context("failed to listen for Ctrl-C")?,
        }
        session.stop();
        Ok(())
    }
}

impl ShellSettings {
    fn execute(&self) -> anyhow::Result<()> {
        let runtime = current_thread_runtime()?;
        LocalSet::new().block_on(&runtime, self.serve())
    }

    async fn serve(&self) -> anyhow::Result<()> {
        let mut session = self.host.session(&self.transform);
        if let Some(path) = self.file.as_ref() {
            *session.input_mut() = InputBuffer::load(path)
                .with_context(|| format!("failed to read source file {}", path.display()))?;
        }
        crate::shell::serve(&mut session).await.context("shell input failed")
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Transpile(target) => target.execute(),
            Command::Run(target) => target.execute(),
            Command::Shell(target) => target.execute(),
            Command::Template => {
                println!("{TEMPLATE}");
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn current_thread_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")
}

fn emitted_path(dir: &Path, source: &Path) -> PathBuf {
    let stem = source.file_stem().unwrap_or(source.as_os_str());
    dir.join(stem).with_extension(EMITTED_EXTENSION)
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let before = out.len();
            for entry in glob::glob(pattern)? {
                out.push(entry?);
            }
            if out.len() == before {
                // an explicit glob that matched nothing is almost always a typo
                return Err(anyhow!("glob pattern matched no files: {pattern}"));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //
