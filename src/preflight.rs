//! Pre-flight checks before provisioning
//!
//! Fails fast with a clear message instead of dying halfway through the
//! checklist on a missing binary or a permission error.

use crate::error::{DevstrapError, Result};

/// Binaries every run needs before the first step.
pub const REQUIRED_BINARIES: &[&str] = &["bash", "apt-get", "curl"];

/// Run all checks.
pub fn verify() -> Result<()> {
    verify_root()?;
    verify_binaries(REQUIRED_BINARIES)?;
    Ok(())
}

/// Writing /etc and installing packages needs root.
pub fn verify_root() -> Result<()> {
    #[cfg(unix)]
    {
        if !nix::unistd::Uid::effective().is_root() {
            return Err(DevstrapError::Preflight(
                "devstrap must run as root (try: sudo devstrap)".to_string(),
            ));
        }
    }

    Ok(())
}

/// Every name must resolve on PATH.
pub fn verify_binaries(names: &[&str]) -> Result<()> {
    let missing = missing_binaries(names);
    if missing.is_empty() {
        return Ok(());
    }

    Err(DevstrapError::Preflight(format!(
        "Required commands not found on PATH: {}. \
         devstrap targets Debian/Ubuntu hosts with curl installed.",
        missing.join(", ")
    )))
}

pub fn missing_binaries<'a>(names: &[&'a str]) -> Vec<&'a str> {
    names
        .iter()
        .copied()
        .filter(|name| which::which(name).is_err())
        .collect()
}
