use std::io::{self, Write};

use serde::Serialize;

use crate::app::{AnnotateResult, ListResult, ProgressEvent, ProgressSink, ViewResult};
use crate::compare::Assembled;
use crate::reshape::ReshapedTable;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_annotate(result: &AnnotateResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_view(result: &ViewResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_tables(tables: &[ReshapedTable]) -> io::Result<()> {
        Self::print_json(&tables)
    }

    pub fn print_assembled(assembled: &Assembled) -> io::Result<()> {
        Self::print_json(assembled)
    }

    fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({:.1}s)", event.message, elapsed.as_secs_f64()),
            None => eprintln!("{}", event.message),
        }
    }
}
