//! Scripted [`ProcessRunner`] that records invocations instead of spawning.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};

use crate::runner::{CommandLine, ProcessError, ProcessRunner};

/// Runner whose behaviour per command line is configured up front.
///
/// Each call is recorded before the optional delay, so observers polling
/// [`ScriptedRunner::count`] see a command as soon as it "starts".
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    failures: HashSet<String>,
    creates: HashMap<String, Utf8PathBuf>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `line` exit with status 1.
    #[must_use]
    pub fn failing_on(mut self, line: &str) -> Self {
        self.failures.insert(line.to_owned());
        self
    }

    /// Makes `line` create the directory `path` before returning.
    #[must_use]
    pub fn creating_on(mut self, line: &str, path: impl Into<Utf8PathBuf>) -> Self {
        self.creates.insert(line.to_owned(), path.into());
        self
    }

    /// Makes every command take `delay` to complete.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `line` was run.
    pub fn count(&self, line: &str) -> usize {
        self.calls()
            .iter()
            .filter(|recorded| recorded.as_str() == line)
            .count()
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("runner calls mutex poisoned").clone()
    }
}

fn render(command: &CommandLine) -> String {
    std::iter::once(command.program())
        .chain(command.args().iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, command: &CommandLine, _working_dir: &Utf8Path) -> Result<(), ProcessError> {
        let line = render(command);
        self.calls
            .lock()
            .expect("runner calls mutex poisoned")
            .push(line.clone());
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        if let Some(path) = self.creates.get(&line) {
            fs::create_dir_all(path).expect("failed to create scripted output");
        }
        if self.failures.contains(&line) {
            return Err(ProcessError::Exit {
                command: command.to_string(),
                code: Some(1),
            });
        }
        Ok(())
    }
}
