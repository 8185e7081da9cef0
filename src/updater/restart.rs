//! Best-effort process relaunch after an install.

use std::ffi::OsString;
use tracing::{error, info};

/// Launch a fresh process image of the application with the original
/// arguments, so the caller can exit and let the new version take over.
///
/// Returns `false` when the spawn fails; that is reported but does not
/// stop the caller from exiting — this is a convenience, not a
/// guaranteed hand-off.
pub fn relaunch() -> bool {
    let exe = match std::env::current_exe() {
        Ok(path) => path,
        Err(e) => {
            error!("cannot determine current executable for relaunch: {e}");
            return false;
        }
    };
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();

    match std::process::Command::new(&exe).args(&args).spawn() {
        Ok(child) => {
            info!("relaunched {} as pid {}", exe.display(), child.id());
            true
        }
        Err(e) => {
            error!("failed to relaunch {}: {e}", exe.display());
            false
        }
    }
}
