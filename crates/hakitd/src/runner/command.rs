//! Parsed representation of a configured command line.

use std::fmt;

use super::errors::ProcessError;

/// Program, arguments, and extra environment for one external command.
///
/// Configured command lines are split on whitespace; no shell is involved, so
/// quoting and redirection are not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl CommandLine {
    /// Splits a configured command line into program and arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::EmptyCommand`] when the line is blank.
    pub fn parse(line: &str) -> Result<Self, ProcessError> {
        let mut parts = line.split_whitespace().map(str::to_owned);
        let program = parts.next().ok_or_else(|| ProcessError::EmptyCommand {
            line: line.to_owned(),
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
            env: Vec::new(),
        })
    }

    /// Adds an environment variable passed to this command only.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program to execute.
    #[must_use]
    pub const fn program(&self) -> &str {
        self.program.as_str()
    }

    /// Arguments passed to the program.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Extra environment variables.
    #[must_use]
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Builds a `std::process::Command` for this line.
    pub(crate) fn to_command(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.program);
        command.args(&self.args);
        command.envs(self.env.iter().map(|(key, value)| (key, value)));
        command
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(formatter, "{key}={value} ")?;
        }
        formatter.write_str(&self.program)?;
        for arg in &self.args {
            write!(formatter, " {arg}")?;
        }
        Ok(())
    }
}
