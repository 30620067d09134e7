//! taskgraph - dependency analysis for task lists

use std::process::ExitCode;

fn main() -> ExitCode {
    match taskgraph::cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
