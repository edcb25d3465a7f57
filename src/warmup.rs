//! Site warm-up before live statistics are read

use crate::error::{QuerydiffError, Result};
use std::process::Command;

/// Generates traffic against a site so the query store has something to report
pub trait SiteWarmer {
    fn warm_up(&self, url: &str) -> Result<()>;
}

impl<F> SiteWarmer for F
where
    F: Fn(&str) -> anyhow::Result<()>,
{
    fn warm_up(&self, url: &str) -> Result<()> {
        self(url).map_err(|e| QuerydiffError::warm_up(format!("{}: {}", url, e)))
    }
}

/// Runs an external program with the site URL as its final argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandWarmer {
    program: String,
    args: Vec<String>,
}

impl CommandWarmer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Split a whitespace-separated command line such as `curl -fsS`
    pub fn parse(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| QuerydiffError::invalid_input("Warm-up command is empty"))?;

        Ok(parts.fold(Self::new(program), |warmer, arg| warmer.arg(arg)))
    }
}

impl SiteWarmer for CommandWarmer {
    fn warm_up(&self, url: &str) -> Result<()> {
        log::info!("Warming up {} with {}", url, self.program);

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .output()
            .map_err(|e| {
                QuerydiffError::warm_up(format!("Failed to start '{}': {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(QuerydiffError::warm_up(format!(
                "'{}' exited with {} for {}: {}",
                self.program,
                output.status,
                url,
                stderr.trim()
            )));
        }

        log::debug!("Warm-up output: {}", String::from_utf8_lossy(&output.stdout).trim());
        Ok(())
    }
}
