//! Binary entrypoint for the `care` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    match carework::cli::run() {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
