//! Program runtime information.

use core::fmt;

/// Program runtime information.
///
/// # Fields
///
/// - `version` - The framework version from `Cargo.toml`
/// - `debug` - Whether the program was compiled in debug mode
///
/// # Example
///
/// ```
/// use strata_core::ProgramInfo;
///
/// let info = ProgramInfo::default();
/// tracing::info!(version = info.version, debug = info.debug, "starting program");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramInfo {
    /// Framework version string.
    pub version: &'static str,
    /// Whether running in debug mode.
    pub debug: bool,
}

impl Default for ProgramInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            debug: cfg!(debug_assertions),
        }
    }
}

impl fmt::Display for ProgramInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "strata v{}", self.version)?;
        if self.debug {
            f.write_str(" (debug)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_info_default() {
        let info = ProgramInfo::default();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(info.debug, cfg!(debug_assertions));
    }

    #[test]
    fn program_info_display() {
        let info = ProgramInfo {
            version: "1.2.3",
            debug: false,
        };
        assert_eq!(info.to_string(), "strata v1.2.3");
    }
}
