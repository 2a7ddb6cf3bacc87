//! Configuration types for logging and process execution

/// Output and logging configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Suppress error output
    pub quiet: bool,
    /// Verbosity level: 0=ERROR, 1=INFO, 2=DEBUG, 3=TRACE
    pub verbose: u8,
    /// Print summary at the end
    pub print_summary: bool,
}

impl OutputConfig {
    /// Log filter directive for the configured verbosity
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            return "off";
        }
        match self.verbose {
            0 => "error",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Execution limits applied to every spawned process
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecConfig {
    /// Kill a command still running after this long (None = no limit)
    pub command_timeout: Option<std::time::Duration>,
}

impl ExecConfig {
    pub fn runner(&self) -> crate::runner::SystemRunner {
        crate::runner::SystemRunner::new().with_timeout(self.command_timeout)
    }
}
