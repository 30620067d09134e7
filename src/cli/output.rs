//! Output formatting for CLI commands
//!
//! Text goes to stdout for people; `--format json` prints exactly one JSON
//! document per command so the output can be piped into other tools.
//! Diagnostics never go through here: they are `tracing` events on stderr.

use serde::Serialize;

pub use crate::storage::OutputFormat;

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints a warning for people (text only; JSON callers embed warnings in data)
    pub fn warning(&self, message: &str) {
        if self.format == OutputFormat::Text {
            eprintln!("Warning: {}", message);
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        let rendered = match self.format {
            OutputFormat::Text => serde_json::to_string_pretty(data),
            OutputFormat::Json => serde_json::to_string(data),
        };
        match rendered {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!(error = %e, "failed to serialize output"),
        }
    }

    /// Prints a table header with an underline (text only)
    pub fn header(&self, columns: &str, width: usize) {
        if self.format == OutputFormat::Text {
            println!("{}", columns);
            println!("{}", "-".repeat(width));
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
