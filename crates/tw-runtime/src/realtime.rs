//! Real-time thread setup for the executor.
//!
//! Optional, Linux only:
//! - Memory locking (mlockall) so page faults never land inside a cycle
//! - SCHED_FIFO priority for the executor thread
//! - CPU pinning
//!
//! Missing privileges are logged and tolerated: the executor still runs,
//! just with weaker timing guarantees.

use tracing::{debug, info, warn};
use tw_common::config::RealtimeConfig;
use tw_common::error::TwResult;
#[cfg(target_os = "linux")]
use tw_common::error::TwError;

/// What real-time setup actually achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealtimeStatus {
    /// Memory is locked.
    pub memory_locked: bool,
    /// SCHED_FIFO priority in effect.
    pub priority: Option<u8>,
    /// CPU the thread is pinned to.
    pub cpu: Option<usize>,
}

/// Apply the configured real-time settings to the calling thread.
///
/// # Errors
///
/// Returns an error if a setting fails for a reason other than missing
/// privileges (e.g. a CPU index the kernel rejects outright).
pub fn init_realtime(config: &RealtimeConfig) -> TwResult<RealtimeStatus> {
    if !config.enabled {
        info!("Real-time scheduling disabled in configuration");
        return Ok(RealtimeStatus::default());
    }

    info!("Initializing real-time environment");

    let memory_locked = if config.lock_memory {
        lock_memory()?
    } else {
        false
    };
    let priority = set_fifo_priority(config.priority)?;
    let cpu = match config.cpu {
        Some(cpu) => pin_to_cpu(cpu)?,
        None => None,
    };

    let status = RealtimeStatus {
        memory_locked,
        priority,
        cpu,
    };
    info!(?status, "Real-time initialization complete");
    Ok(status)
}

#[cfg(target_os = "linux")]
fn lock_memory() -> TwResult<bool> {
    use nix::sys::mman::{mlockall, MlockAllFlags};

    debug!("Locking memory pages with mlockall");
    match mlockall(MlockAllFlags::MCL_CURRENT | MlockAllFlags::MCL_FUTURE) {
        Ok(()) => {
            info!("Memory locked");
            Ok(true)
        }
        Err(nix::errno::Errno::EPERM | nix::errno::Errno::ENOMEM) => {
            warn!("mlockall not permitted (needs CAP_IPC_LOCK); page faults may occur");
            Ok(false)
        }
        Err(e) => Err(TwError::Realtime(format!("mlockall failed: {e}"))),
    }
}

#[cfg(not(target_os = "linux"))]
fn lock_memory() -> TwResult<bool> {
    warn!("mlockall not available on this platform");
    Ok(false)
}

#[cfg(target_os = "linux")]
#[allow(unsafe_code)]
fn set_fifo_priority(priority: u8) -> TwResult<Option<u8>> {
    let priority = priority.clamp(1, 99);
    debug!(priority, "Setting SCHED_FIFO");

    let param = libc::sched_param {
        sched_priority: i32::from(priority),
    };
    // SAFETY: pid 0 targets the calling thread and `param` outlives the call.
    let result = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };

    if result == -1 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EPERM) {
            warn!("sched_setscheduler not permitted (needs CAP_SYS_NICE); running SCHED_OTHER");
            return Ok(None);
        }
        return Err(TwError::Realtime(format!("sched_setscheduler failed: {err}")));
    }

    info!(priority, "SCHED_FIFO configured");
    Ok(Some(priority))
}

#[cfg(not(target_os = "linux"))]
fn set_fifo_priority(priority: u8) -> TwResult<Option<u8>> {
    warn!(priority, "Real-time scheduling not available on this platform");
    Ok(None)
}

#[cfg(target_os = "linux")]
fn pin_to_cpu(cpu: usize) -> TwResult<Option<usize>> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut set = CpuSet::new();
    set.set(cpu)
        .map_err(|e| TwError::Realtime(format!("invalid CPU index {cpu}: {e}")))?;

    match sched_setaffinity(Pid::from_raw(0), &set) {
        Ok(()) => {
            info!(cpu, "CPU affinity set");
            Ok(Some(cpu))
        }
        Err(nix::errno::Errno::EINVAL) => {
            warn!(cpu, "CPU not available, affinity unchanged");
            Ok(None)
        }
        Err(e) => Err(TwError::Realtime(format!("sched_setaffinity failed: {e}"))),
    }
}

#[cfg(not(target_os = "linux"))]
fn pin_to_cpu(cpu: usize) -> TwResult<Option<usize>> {
    warn!(cpu, "CPU affinity not available on this platform");
    Ok(None)
}
