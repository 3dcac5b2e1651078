//! Append-only output log.
//!
//! Program output (`host_log`, `print`) lands as `Log` entries; host faults
//! land as `Error` entries and render in red. With echo enabled every entry
//! is written to stdout as it arrives, newest last.
use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Local};
use colored::Colorize;

pub type SharedConsole = Rc<RefCell<Console>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Log,
    Error,
}

#[derive(Debug, Clone)]
pub struct ConsoleEntry {
    pub kind: EntryKind,
    pub text: String,
    pub at: DateTime<Local>,
}

#[derive(Debug, Default)]
pub struct Console {
    entries: Vec<ConsoleEntry>,
    echo: bool,
    timestamps: bool,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// Console that also prints each entry to stdout.
    pub fn echoing(timestamps: bool) -> Self {
        Self { entries: Vec::new(), echo: true, timestamps }
    }

    pub fn shared(self) -> SharedConsole {
        Rc::new(RefCell::new(self))
    }

    pub fn log(&mut self, text: impl Into<String>) {
        self.push(EntryKind::Log, text.into());
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(EntryKind::Error, text.into());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[ConsoleEntry] {
        &self.entries
    }

    pub fn errors(&self) -> impl Iterator<Item = &ConsoleEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Error)
    }

    pub fn lines(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.text.as_str()).collect()
    }

    pub fn render(&self, entry: &ConsoleEntry) -> String {
        let body = match entry.kind {
            EntryKind::Log => entry.text.normal(),
            EntryKind::Error => format!("error: {}", entry.text).red(),
        };
        if self.timestamps {
            format!("{} {body}", entry.at.format("[%H:%M:%S]").to_string().dimmed())
        } else {
            body.to_string()
        }
    }

    fn push(&mut self, kind: EntryKind, text: String) {
        let entry = ConsoleEntry { kind, text, at: Local::now() };
        if self.echo {
            println!("{}", self.render(&entry));
        }
        self.entries.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_append_in_order_and_clear() {
        let mut console = Console::new();
        console.log("one");
        console.error("boom");
        console.log("two");
        assert_eq!(console.lines(), vec!["one", "boom", "two"]);
        assert_eq!(console.errors().count(), 1);
        console.clear();
        assert!(console.entries().is_empty());
    }

    #[test]
    fn errors_render_with_prefix() {
        colored::control::set_override(false);
        let mut console = Console::new();
        console.error("bad token");
        let rendered = console.render(&console.entries()[0]);
        assert_eq!(rendered, "error: bad token");
    }
}
