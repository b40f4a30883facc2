//! Noise filters applied before identity lookup.
//!
//! Both filters are built once from configuration and shared read-only by
//! their pipeline for its whole lifetime.

pub mod exclusion;
pub mod health;

pub use exclusion::ExclusionFilter;
pub use health::HealthCheckFilter;

/// Split a comma-separated config value into trimmed, lowercased entries,
/// dropping empty ones.
pub(crate) fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
}
