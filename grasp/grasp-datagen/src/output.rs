//! Output directory coordination between parallel workers.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DirWaitPolicy;
use crate::error::{GenerationError, Result};

/// Makes sure `root` exists before any sample is written.
///
/// Rank 0 creates the directory (and its parents). Every other rank only
/// waits for it, checking up to `policy.max_attempts` times with a delay
/// that starts at `policy.initial_backoff_ms` and doubles after each miss,
/// capped at `policy.max_backoff_ms`.
///
/// # Errors
///
/// Returns an IO error if rank 0 cannot create the directory, or
/// [`GenerationError::OutputDirUnavailable`] if it never appears for another
/// rank.
pub fn prepare_output_dir(root: &Path, rank: usize, policy: &DirWaitPolicy) -> Result<()> {
    if rank == 0 {
        std::fs::create_dir_all(root)?;
        info!(path = %root.display(), "Output directory ready");
        return Ok(());
    }

    let attempts = policy.max_attempts.max(1);
    let mut backoff = policy.initial_backoff_ms;
    for attempt in 1..=attempts {
        if root.is_dir() {
            debug!(rank, attempt, path = %root.display(), "Output directory found");
            return Ok(());
        }
        if attempt < attempts {
            thread::sleep(Duration::from_millis(backoff.min(policy.max_backoff_ms)));
            backoff = backoff.saturating_mul(2);
        }
    }

    Err(GenerationError::OutputDirUnavailable {
        path: root.to_path_buf(),
        attempts,
    })
}

/// A fresh archive path `root/<uuid>.npz` using a random 128-bit identifier.
#[must_use]
pub fn sample_path(root: &Path) -> PathBuf {
    root.join(format!("{}.npz", Uuid::new_v4().simple()))
}
