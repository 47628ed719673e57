use crate::collectors::{CpuDescriptor, CpuTimes, ResourceProbe, ResourceQueryFailure};
use std::collections::BTreeMap;
#[cfg(target_os = "linux")]
use std::fs;
use std::path::{Path, PathBuf};
use sysinfo::{CpuExt, CpuRefreshKind, System, SystemExt};
use tracing::debug;

// USER_HZ
#[cfg(any(target_os = "linux", test))]
const USER_HZ: u64 = 100;

#[derive(Debug, Clone)]
pub struct SysinfoProbe {
    proc_root: PathBuf,
}

impl SysinfoProbe {
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ResourceProbe for SysinfoProbe {
    fn cpu_descriptors(&self) -> Result<Vec<CpuDescriptor>, ResourceQueryFailure> {
        let mut system = System::new();
        system.refresh_cpu_specifics(CpuRefreshKind::new().with_frequency());
        if system.cpus().is_empty() {
            return Err(ResourceQueryFailure::NoCpus);
        }

        let times = read_cpu_times(&self.proc_root)?;
        let cpus = join_cpu_times(
            system
                .cpus()
                .iter()
                .map(|cpu| (cpu.name(), cpu.brand(), cpu.frequency())),
            times.as_ref(),
        );

        debug!(
            cores = cpus.len(),
            with_times = times.is_some(),
            "collected cpu descriptors"
        );
        Ok(cpus)
    }

    fn total_memory_bytes(&self) -> Result<u64, ResourceQueryFailure> {
        let mut system = System::new();
        system.refresh_memory();
        let total = system.total_memory();
        if total == 0 {
            return Err(ResourceQueryFailure::MemoryUnavailable);
        }
        debug!(total_bytes = total, "collected total memory");
        Ok(total)
    }

    fn free_memory_bytes(&self) -> Result<u64, ResourceQueryFailure> {
        let mut system = System::new();
        system.refresh_memory();
        if system.total_memory() == 0 {
            return Err(ResourceQueryFailure::MemoryUnavailable);
        }
        let free = system.free_memory();
        debug!(free_bytes = free, "collected free memory");
        Ok(free)
    }
}

// Times are keyed by the N in `cpuN`, not by position.
fn join_cpu_times<'a>(
    cpus: impl Iterator<Item = (&'a str, &'a str, u64)>,
    times: Option<&BTreeMap<usize, CpuTimes>>,
) -> Vec<CpuDescriptor> {
    cpus.map(|(name, brand, speed_mhz)| CpuDescriptor {
        model: brand.trim().to_string(),
        speed_mhz,
        times: core_number(name).and_then(|n| times.and_then(|t| t.get(&n).copied())),
    })
    .collect()
}

fn core_number(name: &str) -> Option<usize> {
    name.strip_prefix("cpu")?.parse().ok()
}

#[cfg(target_os = "linux")]
fn read_cpu_times(
    proc_root: &Path,
) -> Result<Option<BTreeMap<usize, CpuTimes>>, ResourceQueryFailure> {
    let path = proc_root.join("stat");
    let content = fs::read_to_string(&path).map_err(|source| ResourceQueryFailure::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_proc_stat(&content, &path).map(Some)
}

#[cfg(not(target_os = "linux"))]
fn read_cpu_times(
    _proc_root: &Path,
) -> Result<Option<BTreeMap<usize, CpuTimes>>, ResourceQueryFailure> {
    Ok(None)
}

#[cfg(any(target_os = "linux", test))]
fn parse_proc_stat(
    content: &str,
    source_path: &Path,
) -> Result<BTreeMap<usize, CpuTimes>, ResourceQueryFailure> {
    let parse_err = |detail: String| ResourceQueryFailure::Parse {
        path: source_path.display().to_string(),
        detail,
    };

    let mut out = BTreeMap::new();
    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let Some(label) = fields.next() else {
            continue;
        };
        let Some(index) = label.strip_prefix("cpu").filter(|rest| !rest.is_empty()) else {
            continue;
        };
        let index: usize = index
            .parse()
            .map_err(|_| parse_err(format!("bad cpu label '{label}'")))?;

        // user nice system idle iowait irq [softirq steal ...]
        let values = fields
            .take(6)
            .map(|v| v.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| parse_err(format!("non-numeric counter on '{label}' line")))?;
        if values.len() < 6 {
            return Err(parse_err(format!(
                "expected at least 6 counters on '{label}' line, got {}",
                values.len()
            )));
        }

        let ms = |ticks: u64| ticks.saturating_mul(1000 / USER_HZ);
        out.insert(
            index,
            CpuTimes {
                user: ms(values[0]),
                nice: ms(values[1]),
                sys: ms(values[2]),
                idle: ms(values[3]),
                irq: ms(values[5]),
            },
        );
    }

    if out.is_empty() {
        return Err(parse_err("no per-core cpu lines found".to_string()));
    }
    Ok(out)
}
