use std::collections::HashSet;

use super::split_list;

/// Process name prefix that is always excluded.
pub const DEFAULT_EXCLUDE_COMMS: &[&str] = &["kubelet"];

/// Drops connection events from processes whose comm starts with one of a
/// set of lowercase prefixes.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    prefixes: HashSet<String>,
}

impl ExclusionFilter {
    /// Built-in prefixes plus the comma-separated `custom` entries.
    pub fn new(custom: &str) -> Self {
        let prefixes = DEFAULT_EXCLUDE_COMMS
            .iter()
            .map(|p| p.to_string())
            .chain(split_list(custom))
            .collect();
        Self { prefixes }
    }

    /// Case-insensitive prefix match. Returns the matched prefix; when
    /// several prefixes match, which one is reported is unspecified.
    pub fn should_exclude(&self, comm: &str) -> Option<&str> {
        let comm = comm.to_lowercase();
        self.prefixes
            .iter()
            .find(|prefix| comm.starts_with(prefix.as_str()))
            .map(String::as_str)
    }

    /// Configured prefixes, for startup logging only.
    pub fn prefixes(&self) -> Vec<&str> {
        let mut list: Vec<&str> = self.prefixes.iter().map(String::as_str).collect();
        list.sort_unstable();
        list
    }
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self::new("")
    }
}
