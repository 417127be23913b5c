use crate::discovery::DiscoveryConfig;

/// Runtime-level configuration for the dispatch framework.
///
/// Controls the default dispatch deadline and the discovery sweep. Transport
/// adapters may override the deadline per event; this value applies when an
/// event carries none.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Default deadline for a dispatch in milliseconds.
    pub default_deadline_ms: u64,
    /// Where and what the discovery sweep loads.
    pub discovery: DiscoveryConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_deadline_ms: 30_000,
            discovery: DiscoveryConfig::default(),
        }
    }
}
