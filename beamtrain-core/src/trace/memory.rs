//! In-memory and null trace sinks

use std::collections::BTreeMap;

use crate::error::Result;

use super::{TraceRecord, TraceSink, TraceTable};

/// Keeps every record in memory, grouped by table
///
/// Used by tests and by runs that only want the summary report.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTraceSink {
    records: Vec<TraceRecord>,
}

impl InMemoryTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in write order
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn records_in(&self, table: TraceTable) -> Vec<&TraceRecord> {
        self.records.iter().filter(|r| r.table() == table).collect()
    }

    /// Row counts per output file name
    pub fn file_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.file_name()).or_insert(0) += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl TraceSink for InMemoryTraceSink {
    fn record(&mut self, record: TraceRecord) -> Result<()> {
        self.records.push(record);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Discards every record
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTraceSink;

impl NullTraceSink {
    pub fn new() -> Self {
        Self
    }
}

impl TraceSink for NullTraceSink {
    fn record(&mut self, _record: TraceRecord) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Phase;
    use crate::model::StationId;
    use crate::timing::SimTime;

    fn phase_record(src: u32) -> TraceRecord {
        TraceRecord::PhaseCompletion {
            src: StationId(src),
            dst: StationId(0),
            from: Phase::SisoFeedback,
            to: Phase::CandidateSelection,
            time: SimTime(10),
        }
    }

    #[test]
    fn test_in_memory_sink() {
        let mut sink = InMemoryTraceSink::new();
        sink.record(phase_record(1)).unwrap();
        sink.record(phase_record(2)).unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.records_in(TraceTable::PhaseCompletion).len(), 2);
        assert_eq!(sink.file_counts().get("phase_log.csv"), Some(&2));

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_null_sink() {
        let mut sink = NullTraceSink::new();
        sink.record(phase_record(1)).unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.name(), "null");
    }
}
