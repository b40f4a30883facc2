use super::split_list;

/// Path prefixes treated as infrastructure probes.
pub const DEFAULT_HEALTH_CHECK_PATTERNS: &[&str] = &[
    "/healthz", "/readyz", "/livez", "/health", "/ready", "/live", "/ping", "/status", "/_health",
];

/// Drops HTTP requests aimed at liveness/readiness endpoints.
///
/// Patterns match as plain string prefixes, not path segments, so
/// `/health` also covers `/health-data`.
#[derive(Debug, Clone)]
pub struct HealthCheckFilter {
    patterns: Vec<String>,
    enabled: bool,
}

impl HealthCheckFilter {
    pub fn new(enabled: bool, custom: &str) -> Self {
        let patterns = DEFAULT_HEALTH_CHECK_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .chain(split_list(custom))
            .collect();
        Self { patterns, enabled }
    }

    pub fn is_health_check(&self, path: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let path = path.to_lowercase();
        self.patterns
            .iter()
            .any(|pattern| path.starts_with(pattern.as_str()))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for HealthCheckFilter {
    fn default() -> Self {
        Self::new(true, "")
    }
}
