//! Runtime configuration.

/// How [`Signal::set`](crate::reactive::Signal::set) treats writes of a value
/// equal to the one already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteEquality {
    /// Skip notification when the new value equals the stored one.
    #[default]
    SkipEqual,
    /// Notify dependents on every write.
    Always,
}

/// Configuration for a [`Runtime`](crate::reactive::Runtime).
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Equality policy for signal writes.
    pub write_equality: WriteEquality,
    /// Upper bound on effect executions within one flush.
    pub max_effect_runs: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            write_equality: WriteEquality::default(),
            max_effect_runs: 10_000,
        }
    }
}

impl RuntimeConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the write equality policy (builder).
    pub fn with_write_equality(mut self, policy: WriteEquality) -> Self {
        self.write_equality = policy;
        self
    }

    /// Set the per-flush effect run limit (builder).
    pub fn with_max_effect_runs(mut self, runs: usize) -> Self {
        self.max_effect_runs = runs.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.write_equality, WriteEquality::SkipEqual);
        assert_eq!(cfg.max_effect_runs, 10_000);
    }

    #[test]
    fn builder_chain() {
        let cfg = RuntimeConfig::new()
            .with_write_equality(WriteEquality::Always)
            .with_max_effect_runs(0);
        assert_eq!(cfg.write_equality, WriteEquality::Always);
        assert_eq!(cfg.max_effect_runs, 1);
    }
}
