pub mod system;

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuDescriptor {
    pub model: String,
    pub speed_mhz: u64,
    pub times: Option<CpuTimes>,
}

// Milliseconds since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub sys: u64,
    pub idle: u64,
    pub irq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryTotals {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

#[derive(Debug, Error)]
pub enum ResourceQueryFailure {
    #[error("host reported no cpu descriptors")]
    NoCpus,
    #[error("host reported no physical memory")]
    MemoryUnavailable,
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {detail}")]
    Parse { path: String, detail: String },
}

// Every call is a fresh query, nothing is cached between calls.
pub trait ResourceProbe {
    fn cpu_descriptors(&self) -> Result<Vec<CpuDescriptor>, ResourceQueryFailure>;
    fn total_memory_bytes(&self) -> Result<u64, ResourceQueryFailure>;
    fn free_memory_bytes(&self) -> Result<u64, ResourceQueryFailure>;
}

impl<P: ResourceProbe + ?Sized> ResourceProbe for &P {
    fn cpu_descriptors(&self) -> Result<Vec<CpuDescriptor>, ResourceQueryFailure> {
        (**self).cpu_descriptors()
    }

    fn total_memory_bytes(&self) -> Result<u64, ResourceQueryFailure> {
        (**self).total_memory_bytes()
    }

    fn free_memory_bytes(&self) -> Result<u64, ResourceQueryFailure> {
        (**self).free_memory_bytes()
    }
}

impl fmt::Display for CpuDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {} MHz ", self.model, self.speed_mhz)?;
        match &self.times {
            Some(t) => write!(
                f,
                "(user {} ms, nice {} ms, sys {} ms, idle {} ms, irq {} ms)",
                t.user, t.nice, t.sys, t.idle, t.irq
            ),
            None => f.write_str("(times n/a)"),
        }
    }
}
