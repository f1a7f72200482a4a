use tracing::warn;

use crate::error::TaxoError;

pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Bounded, immediate re-invocation of a fallible lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    display_warning: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, display_warning: bool) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            display_warning,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn display_warning(&self) -> bool {
        self.display_warning
    }

    pub fn run<T, F>(&self, file: &str, mut op: F) -> Result<T, TaxoError>
    where
        F: FnMut() -> Result<T, TaxoError>,
    {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if self.display_warning {
                        warn!("Attempt {attempt} to retrieve species name for {file} failed: {err}");
                    }
                    if attempt >= self.max_attempts {
                        warn!(
                            "Failed to retrieve species name for {file} after {} retries.",
                            self.max_attempts
                        );
                        return Err(TaxoError::ResolutionExhausted {
                            file: file.to_string(),
                            attempts: self.max_attempts,
                            source: Box::new(err),
                        });
                    }
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, true)
    }
}
