use std::io::{self, Write};

use serde::Serialize;

use crate::ena::EnaSlimReport;
use crate::merge::MergeReport;
use crate::sra::{RunInfoMergeReport, SraSlimReport};
use crate::unify::UnifyReport;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_merge(report: &MergeReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_ena_slim(report: &EnaSlimReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_sra_slim(report: &SraSlimReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_unify(report: &UnifyReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_runinfo(report: &RunInfoMergeReport) -> io::Result<()> {
        Self::print_json(report)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
