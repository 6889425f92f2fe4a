//! The periodic CSV report: one snapshot of the whole pond, emitted every
//! `report_frequency` ticks, plus the secondary population-transition event
//! sink wired through `tracing` in [`crate::scheduler`].

use std::io::Write;

use crate::error::ReportError;

/// One reporting window's aggregate snapshot, produced by a single atomic
/// scan of the pond (§6).
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub clock: u64,
    pub total_energy: u128,
    pub alive_count: u64,
    pub viable_count: u64,
    pub max_generation: u64,
    pub viable_replaced: u64,
    pub viable_killed: u64,
    pub viable_shares: u64,
    pub instr: [u64; 16],
    pub cell_executions: u64,
}

impl Snapshot {
    /// Render the documented 25-field, no-header CSV row.
    ///
    /// Fields 9-24 are each codon's share of total executions and field 25
    /// is the aggregate "metabolism"; both guard on `cell_executions == 0`
    /// to avoid a division by zero, rendering `0.0000` instead.
    pub fn to_csv_row(&self) -> String {
        let ratio = |n: u64| -> f64 {
            if self.cell_executions == 0 {
                0.0
            } else {
                n as f64 / self.cell_executions as f64
            }
        };
        let mut fields = vec![
            self.clock.to_string(),
            self.total_energy.to_string(),
            self.alive_count.to_string(),
            self.viable_count.to_string(),
            self.max_generation.to_string(),
            self.viable_replaced.to_string(),
            self.viable_killed.to_string(),
            self.viable_shares.to_string(),
        ];
        for count in self.instr.iter() {
            fields.push(format!("{:.4}", ratio(*count)));
        }
        let total_instr: u64 = self.instr.iter().sum();
        fields.push(format!("{:.4}", ratio(total_instr)));
        fields.join(",")
    }
}

/// Destination for periodic report rows.
pub trait ReportSink {
    fn emit(&mut self, snapshot: &Snapshot) -> Result<(), ReportError>;
}

/// Writes one CSV line per report to any `Write` destination (a file or
/// stdout, selected by [`crate::config::Config::csv_path`]).
pub struct CsvSink<W: Write> {
    writer: W,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        CsvSink { writer }
    }
}

impl<W: Write> ReportSink for CsvSink<W> {
    fn emit(&mut self, snapshot: &Snapshot) -> Result<(), ReportError> {
        writeln!(self.writer, "{}", snapshot.to_csv_row()).map_err(ReportError::Csv)?;
        self.writer.flush().map_err(ReportError::Csv)?;
        Ok(())
    }
}

/// Discards every report; used by tests that only care about scheduler
/// control flow.
pub struct NullSink;

impl ReportSink for NullSink {
    fn emit(&mut self, _snapshot: &Snapshot) -> Result<(), ReportError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot {
            clock: 200_000,
            total_energy: 12_345,
            alive_count: 10,
            viable_count: 2,
            max_generation: 7,
            viable_replaced: 3,
            viable_killed: 1,
            viable_shares: 4,
            instr: [10; 16],
            cell_executions: 100,
        }
    }

    #[test]
    fn csv_row_has_25_fields() {
        let row = sample().to_csv_row();
        assert_eq!(row.split(',').count(), 25);
    }

    #[test]
    fn ratio_fields_are_four_decimals() {
        let row = sample().to_csv_row();
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields[8], "0.1000"); // instr[0] / cell_executions = 10/100
        assert_eq!(fields[24], "1.6000"); // sum(instr)=160 / 100
    }

    #[test]
    fn zero_executions_guards_against_division_by_zero() {
        let mut snap = sample();
        snap.cell_executions = 0;
        let row = snap.to_csv_row();
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields[8], "0.0000");
        assert_eq!(fields[24], "0.0000");
    }

    #[test]
    fn leading_fields_match_snapshot() {
        let row = sample().to_csv_row();
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields[0], "200000");
        assert_eq!(fields[1], "12345");
        assert_eq!(fields[2], "10");
        assert_eq!(fields[3], "2");
        assert_eq!(fields[4], "7");
        assert_eq!(fields[5], "3");
        assert_eq!(fields[6], "1");
        assert_eq!(fields[7], "4");
    }

    #[test]
    fn null_sink_always_succeeds() {
        let mut sink = NullSink;
        assert!(sink.emit(&sample()).is_ok());
    }
}
