use aya::maps::RingBuf;
use aya::programs::KProbe;
use aya::Ebpf;
use thiserror::Error;

use super::ringbuf::RingBufSource;
use crate::config::{EbpfConfig, ProbeConfig};

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("loading BPF object {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: aya::EbpfError,
    },
    #[error("program {0} not found in BPF object")]
    MissingProgram(String),
    #[error("attaching {program} to {function}: {source}")]
    Attach {
        program: String,
        function: String,
        #[source]
        source: aya::programs::ProgramError,
    },
    #[error("map {0} not found in BPF object")]
    MissingMap(String),
    #[error("map {name} is not a ring buffer: {source}")]
    Map {
        name: String,
        #[source]
        source: aya::maps::MapError,
    },
    #[error("registering ring buffer {name} with the runtime: {source}")]
    Poll {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Owns the loaded BPF object. Probes stay attached for as long as this
/// value is alive.
pub struct EbpfLoader {
    bpf: Ebpf,
}

impl EbpfLoader {
    /// Load the object named in `config` and attach its kprobes.
    pub fn load(config: &EbpfConfig) -> Result<Self, LoaderError> {
        let bpf = Ebpf::load_file(&config.object_path).map_err(|source| LoaderError::Load {
            path: config.object_path.display().to_string(),
            source,
        })?;
        let mut loader = Self { bpf };

        for probe in &config.kprobes {
            loader.attach_kprobe(probe)?;
            log::info!("attached {} to {}", probe.program, probe.function);
        }
        Ok(loader)
    }

    fn attach_kprobe(&mut self, probe: &ProbeConfig) -> Result<(), LoaderError> {
        let attach_err = |source| LoaderError::Attach {
            program: probe.program.clone(),
            function: probe.function.clone(),
            source,
        };

        let program: &mut KProbe = self
            .bpf
            .program_mut(&probe.program)
            .ok_or_else(|| LoaderError::MissingProgram(probe.program.clone()))?
            .try_into()
            .map_err(attach_err)?;
        program.load().map_err(attach_err)?;
        program.attach(&probe.function, 0).map_err(attach_err)?;
        Ok(())
    }

    /// Take ownership of the ring buffer map `name` as an event source.
    /// Each map can be taken once.
    pub fn ring_buffer(&mut self, name: &str) -> Result<RingBufSource, LoaderError> {
        let map = self
            .bpf
            .take_map(name)
            .ok_or_else(|| LoaderError::MissingMap(name.to_string()))?;
        let ring = RingBuf::try_from(map).map_err(|source| LoaderError::Map {
            name: name.to_string(),
            source,
        })?;
        RingBufSource::new(name, ring).map_err(|source| LoaderError::Poll {
            name: name.to_string(),
            source,
        })
    }
}
