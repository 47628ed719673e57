use crate::collectors::{CpuDescriptor, MemoryTotals, ResourceProbe, ResourceQueryFailure};
use std::io::{self, Write};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("resource query failed: {0}")]
    Query(#[from] ResourceQueryFailure),
    #[error("failed to write usage record: {0}")]
    Write(#[source] io::Error),
}

pub trait RecordSink {
    fn write_record(&mut self, record: &str) -> io::Result<()>;
}

pub struct LineSink<W: Write> {
    inner: W,
}

impl<W: Write> LineSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> RecordSink for LineSink<W> {
    fn write_record(&mut self, record: &str) -> io::Result<()> {
        writeln!(self.inner, "{record}")?;
        self.inner.flush()
    }
}

impl RecordSink for Vec<String> {
    fn write_record(&mut self, record: &str) -> io::Result<()> {
        self.push(record.to_string());
        Ok(())
    }
}

pub struct UsageReporter<P> {
    probe: P,
}

impl<P: ResourceProbe> UsageReporter<P> {
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    // All three queries run before the first write.
    pub fn report_usage<S: RecordSink>(&self, sink: &mut S) -> Result<(), ReportError> {
        let cpus = self.probe.cpu_descriptors()?;
        let memory = MemoryTotals {
            total_bytes: self.probe.total_memory_bytes()?,
            free_bytes: self.probe.free_memory_bytes()?,
        };
        debug!(
            cores = cpus.len(),
            total_bytes = memory.total_bytes,
            free_bytes = memory.free_bytes,
            "usage snapshot taken"
        );

        sink.write_record(&render_cpus(&cpus)).map_err(ReportError::Write)?;
        sink.write_record(&memory.total_bytes.to_string()).map_err(ReportError::Write)?;
        sink.write_record(&memory.free_bytes.to_string()).map_err(ReportError::Write)?;
        Ok(())
    }
}

pub fn report_usage<P: ResourceProbe, S: RecordSink>(
    probe: P,
    sink: &mut S,
) -> Result<(), ReportError> {
    UsageReporter::new(probe).report_usage(sink)
}

fn render_cpus(cpus: &[CpuDescriptor]) -> String {
    let entries: Vec<String> = cpus.iter().map(ToString::to_string).collect();
    format!("[{}]", entries.join(", "))
}
