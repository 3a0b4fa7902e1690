//! Hardware parallelism probing and worker-count configuration
//!
//! The batch engine asks a [`ProcessorCounter`] how many logical processors the
//! host reports, fresh on every call. Two strategies exist and the one that
//! fits the target platform is chosen at build time as [`HostCounter`]; both
//! apply the same floor of one processor.

use crate::errors::{Result, SensorStatsError};

/// Source of the host's logical processor count.
///
/// Implementations must never return less than 1, whatever the platform query
/// reports.
pub trait ProcessorCounter {
    fn processor_count(&self) -> usize;
}

impl<P: ProcessorCounter + ?Sized> ProcessorCounter for &P {
    fn processor_count(&self) -> usize {
        (**self).processor_count()
    }
}

/// Queries online logical processors, falling back to the configured logical
/// processor count when the online reading fails or is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlineProcessors;

impl OnlineProcessors {
    /// Picks the first usable reading: online, then configured, then 1.
    pub fn from_readings(online: Option<usize>, configured: Option<usize>) -> usize {
        online
            .filter(|&n| n >= 1)
            .or_else(|| configured.filter(|&n| n >= 1))
            .unwrap_or(1)
    }
}

#[cfg(unix)]
fn sysconf_reading(name: libc::c_int) -> Option<usize> {
    // SAFETY: sysconf only reads a system variable and has no preconditions.
    let value = unsafe { libc::sysconf(name) };
    usize::try_from(value).ok()
}

#[cfg(unix)]
fn online_logical() -> Option<usize> {
    sysconf_reading(libc::_SC_NPROCESSORS_ONLN)
}

#[cfg(unix)]
fn configured_logical() -> Option<usize> {
    sysconf_reading(libc::_SC_NPROCESSORS_CONF)
}

// No online/configured split outside unix; num_cpus reports the active count.
#[cfg(not(unix))]
fn online_logical() -> Option<usize> {
    Some(num_cpus::get())
}

#[cfg(not(unix))]
fn configured_logical() -> Option<usize> {
    None
}

impl ProcessorCounter for OnlineProcessors {
    fn processor_count(&self) -> usize {
        let online = online_logical();
        let count = if online.is_some_and(|n| n >= 1) {
            Self::from_readings(online, None)
        } else {
            let configured = configured_logical();
            log::debug!(
                "online processor query gave {:?}, using configured count {:?}",
                online,
                configured
            );
            Self::from_readings(None, configured)
        };
        log::debug!("num_cpus => {} (online processors)", count);
        count
    }
}

/// Queries the sysconf-style processor count exposed through
/// [`std::thread::available_parallelism`], which also honours affinity masks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailableParallelism;

impl ProcessorCounter for AvailableParallelism {
    fn processor_count(&self) -> usize {
        let count = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1);
        log::debug!("num_cpus => {} (available parallelism)", count);
        count
    }
}

/// Counter used when none is injected.
#[cfg(any(target_os = "macos", target_os = "ios", windows))]
pub type HostCounter = OnlineProcessors;

/// Counter used when none is injected.
#[cfg(not(any(target_os = "macos", target_os = "ios", windows)))]
pub type HostCounter = AvailableParallelism;

/// Number of logical processors reported by the host, at least 1.
pub fn processor_count() -> usize {
    HostCounter::default().processor_count().max(1)
}

/// Configuration for parallel processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Forced worker count; `None` asks the processor counter on every batch.
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Create a configuration that uses all available CPU cores
    pub fn all_cores() -> Self {
        Self {
            num_threads: Some(processor_count()),
        }
    }

    /// Create a configuration that uses a specific number of threads
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }

    /// Reject configurations that can never run a worker.
    pub fn validate(&self) -> Result<()> {
        match self.num_threads {
            Some(0) => Err(SensorStatsError::ThreadPoolError(
                "thread count must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Worker count before capping by batch size: the forced count if any,
    /// otherwise a fresh counter reading.
    pub fn resolve_threads<P: ProcessorCounter>(&self, counter: &P) -> usize {
        self.num_threads
            .unwrap_or_else(|| counter.processor_count())
            .max(1)
    }
}

/// Get information about the current parallel environment
pub fn get_parallel_info() -> ParallelInfo {
    ParallelInfo {
        host_processors: processor_count(),
        online_processors: OnlineProcessors.processor_count(),
        physical_cores: num_cpus::get_physical(),
        available_parallelism: AvailableParallelism.processor_count(),
    }
}

/// Information about the parallel processing environment
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub host_processors: usize,
    pub online_processors: usize,
    pub physical_cores: usize,
    pub available_parallelism: usize,
}

impl ParallelInfo {
    /// Log parallel processing information
    pub fn log_info(&self) {
        log::info!("Parallel processing information:");
        log::info!("   Host processors: {}", self.host_processors);
        log::info!("   Online processors: {}", self.online_processors);
        log::info!("   Physical cores: {}", self.physical_cores);
        log::info!("   Available parallelism: {}", self.available_parallelism);
    }
}
