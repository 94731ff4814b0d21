//! `hakitd` binary: runs the application host in the foreground.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match hakitd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            drop(writeln!(io::stderr().lock(), "hakitd: {error}"));
            ExitCode::FAILURE
        }
    }
}
