use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::identity::{WorkloadIdentity, WorkloadTable};

/// Agent configuration loaded from TOML. Every field has a default, so a
/// partial file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub ebpf: EbpfConfig,
    /// Static address table used to seed the identity resolver.
    #[serde(default)]
    pub workloads: Vec<WorkloadEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Comma-separated comm prefixes dropped from the L4 pipeline, on top
    /// of the built-in ones.
    #[serde(default)]
    pub exclude_comms: String,
    #[serde(default = "default_true")]
    pub health_check_enabled: bool,
    /// Comma-separated path prefixes added to the built-in health checks.
    #[serde(default)]
    pub health_check_patterns: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_comms: String::new(),
            health_check_enabled: true,
            health_check_patterns: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_address: default_listen_address(),
            port: default_metrics_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EbpfConfig {
    /// Compiled BPF object containing the probes and ring buffers.
    #[serde(default = "default_object_path")]
    pub object_path: PathBuf,
    #[serde(default = "default_connect_map")]
    pub connect_map: String,
    #[serde(default = "default_http_map")]
    pub http_map: String,
    #[serde(default = "default_kprobes")]
    pub kprobes: Vec<ProbeConfig>,
}

impl Default for EbpfConfig {
    fn default() -> Self {
        Self {
            object_path: default_object_path(),
            connect_map: default_connect_map(),
            http_map: default_http_map(),
            kprobes: default_kprobes(),
        }
    }
}

/// A kprobe program in the object and the kernel function it attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub program: String,
    pub function: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadEntry {
    pub ip: String,
    #[serde(flatten)]
    pub identity: WorkloadIdentity,
}

fn default_true() -> bool {
    true
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_object_path() -> PathBuf {
    PathBuf::from("/usr/lib/kubetraffic/kubetraffic-ebpf.o")
}

fn default_connect_map() -> String {
    "L4_EVENTS".to_string()
}

fn default_http_map() -> String {
    "HTTP_EVENTS".to_string()
}

fn default_kprobes() -> Vec<ProbeConfig> {
    vec![ProbeConfig {
        program: "tcp_v4_connect_enter".to_string(),
        function: "tcp_v4_connect".to_string(),
    }]
}

impl Config {
    /// Load from `path` if given (it must exist), otherwise from the default
    /// location, falling back to defaults when that file is absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    bail!("config file {} does not exist", path.display());
                }
                Self::load_from(path)
            }
            None => {
                let path = config_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config from {}", path.display()))?;
        Ok(config)
    }

    /// Build the identity table from the `[[workloads]]` entries.
    pub fn workload_table(&self) -> WorkloadTable {
        self.workloads
            .iter()
            .map(|entry| (entry.ip.clone(), entry.identity.clone()))
            .collect()
    }
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join("kubetraffic")
        .join("config.toml")
}
