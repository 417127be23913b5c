//! Startup discovery sweep.
//!
//! Handler-definition units form an explicit registration list resolved at
//! startup: each unit carries a path-like location and a loader closure
//! that declares its handlers into a [`TagBuffer`]. The sweep filters units
//! by root and include/exclude globs, loads each exactly once in lexical
//! location order, and applies a unit's tags only when its loader succeeds.
//!
//! Lexical ordering is load-bearing: tagging is commutative except for
//! same-identity collisions, where the last successfully loaded unit wins,
//! so the processing order determines overwrite winners deterministically.
//!
//! A failing unit never aborts the sweep; it is recorded in the report and
//! the remaining units still load.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{info, warn};

use crate::registry::HandlerRegistry;
use crate::tagging::TagBuffer;

// ---------------------------------------------------------------------------
// HandlerUnit
// ---------------------------------------------------------------------------

type UnitLoader = Box<dyn Fn(&mut TagBuffer) -> anyhow::Result<()> + Send + Sync>;

/// One handler-definition unit: a location plus the loader that runs its
/// tagging side effects.
pub struct HandlerUnit {
    location: String,
    loader: UnitLoader,
}

impl HandlerUnit {
    /// A unit at `location` (a relative, path-like identifier such as
    /// `"handlers/users.rs"`) with the given loader.
    pub fn new<F>(location: impl Into<String>, loader: F) -> Self
    where
        F: Fn(&mut TagBuffer) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            location: location.into(),
            loader: Box::new(loader),
        }
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl std::fmt::Debug for HandlerUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerUnit")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// DiscoveryConfig
// ---------------------------------------------------------------------------

/// Root and include/exclude patterns selecting which units the sweep loads.
///
/// Globs are matched against the unit location relative to `root`. An empty
/// include set matches everything; a root no unit lives under yields zero
/// candidates rather than an error.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Location prefix units must live under. `"."` means all units.
    pub root: PathBuf,
    /// Include globs (e.g. `"**/*_handlers.rs"`). Empty matches all.
    pub include: Vec<String>,
    /// Exclude globs, applied after include.
    pub exclude: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

/// Configuration errors detected before the sweep starts.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("invalid discovery glob pattern: {0}")]
    InvalidPattern(#[from] globset::Error),
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}

// ---------------------------------------------------------------------------
// DiscoveryReport
// ---------------------------------------------------------------------------

/// A unit whose loader returned an error. Recorded, never fatal.
#[derive(Debug)]
pub struct FailedUnit {
    pub location: String,
    pub error: anyhow::Error,
}

/// Outcome of one discovery sweep.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Locations of successfully loaded units, in processing order.
    pub loaded: Vec<String>,
    /// Units whose loaders failed, in processing order.
    pub failed: Vec<FailedUnit>,
}

impl DiscoveryReport {
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

/// Runs the discovery sweep against `registry`.
///
/// Single-threaded; must complete before any adapter starts dispatching.
/// Candidates are processed in lexical location order (byte order), which
/// fixes overwrite winners deterministically.
///
/// # Errors
///
/// Returns `DiscoveryError::InvalidPattern` if an include/exclude glob does
/// not parse. Unit load failures are not errors; they land in the report.
pub fn run_discovery(
    config: &DiscoveryConfig,
    units: Vec<HandlerUnit>,
    registry: &HandlerRegistry,
) -> Result<DiscoveryReport, DiscoveryError> {
    let include = build_globset(&config.include)?;
    let exclude = build_globset(&config.exclude)?;

    let mut candidates: Vec<HandlerUnit> = units
        .into_iter()
        .filter(|unit| selects(config, &include, &exclude, unit.location()))
        .collect();
    candidates.sort_by(|a, b| a.location.as_bytes().cmp(b.location.as_bytes()));

    let mut report = DiscoveryReport::default();
    for unit in candidates {
        let mut buffer = TagBuffer::new();
        match (unit.loader)(&mut buffer) {
            Ok(()) => {
                let tags = buffer.len();
                buffer.apply(registry);
                info!(location = unit.location(), tags, "handler unit loaded");
                report.loaded.push(unit.location);
            }
            Err(error) => {
                // None of the unit's tags are applied; the buffer is dropped.
                warn!(
                    location = unit.location(),
                    %error,
                    "handler unit failed to load; continuing sweep"
                );
                report.failed.push(FailedUnit {
                    location: unit.location,
                    error,
                });
            }
        }
    }

    info!(
        loaded = report.loaded_count(),
        failed = report.failed_count(),
        handlers = registry.len(),
        "discovery sweep complete"
    );
    Ok(report)
}

/// Whether a unit location falls under the root and survives the globs.
fn selects(config: &DiscoveryConfig, include: &GlobSet, exclude: &GlobSet, location: &str) -> bool {
    let path = Path::new(location);
    let relative = if config.root == Path::new(".") || config.root.as_os_str().is_empty() {
        path
    } else {
        match path.strip_prefix(&config.root) {
            Ok(rel) => rel,
            // Not under the root: not a candidate.
            Err(_) => return false,
        }
    };

    if !config.include.is_empty() && !include.is_match(relative) {
        return false;
    }
    !exclude.is_match(relative)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
