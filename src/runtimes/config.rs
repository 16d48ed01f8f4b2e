use crate::graphs::CompileCache;

/// Runtime configuration for a [`ScenarioRunner`](super::ScenarioRunner).
///
/// # Examples
///
/// ```
/// use chatweave::runtimes::RuntimeConfig;
///
/// let config = RuntimeConfig::default()
///     .with_max_steps_per_turn(16)
///     .with_cache_capacity(8);
/// assert_eq!(config.max_steps_per_turn, 16);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Upper bound on nodes executed within one turn. Turn-chaining is
    /// deliberate (a linear message sequence plays out in one call), but
    /// a cyclic graph must not spin forever; when the bound fires the
    /// run suspends resumably instead.
    pub max_steps_per_turn: usize,
    /// Capacity of the compiled-flow cache.
    pub cache_capacity: usize,
}

impl RuntimeConfig {
    /// Default per-turn node limit.
    pub const DEFAULT_MAX_STEPS_PER_TURN: usize = 64;

    /// Builds a configuration from the environment, falling back to
    /// defaults for anything unset or unparsable. Reads
    /// `CHATWEAVE_MAX_STEPS_PER_TURN` and `CHATWEAVE_CACHE_CAPACITY`,
    /// loading a `.env` file first when one exists.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            max_steps_per_turn: env_usize("CHATWEAVE_MAX_STEPS_PER_TURN")
                .unwrap_or(defaults.max_steps_per_turn),
            cache_capacity: env_usize("CHATWEAVE_CACHE_CAPACITY")
                .unwrap_or(defaults.cache_capacity),
        }
    }

    /// Sets the per-turn node limit (minimum 1).
    #[must_use]
    pub fn with_max_steps_per_turn(mut self, max_steps: usize) -> Self {
        self.max_steps_per_turn = max_steps.max(1);
        self
    }

    /// Sets the compiled-flow cache capacity (minimum 1).
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_steps_per_turn: Self::DEFAULT_MAX_STEPS_PER_TURN,
            cache_capacity: CompileCache::DEFAULT_CAPACITY,
        }
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok()?.trim().parse().ok()
}
