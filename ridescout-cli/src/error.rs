//! Error types emitted by the ridescout CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use ridescout_core::ConfigError;
use ridescout_data::ProviderBuildError;
use ridescout_dispatch::DiscoveryError;
use thiserror::Error;

/// Errors emitted by the ridescout CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Merged engine settings are out of range.
    #[error("invalid engine configuration: {0}")]
    InvalidEngineConfig(#[from] ConfigError),
    /// Opening the discovery input file failed.
    #[error("failed to open discovery input at {path:?}: {source}")]
    OpenDiscoveryInput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Discovery input JSON could not be decoded.
    #[error("failed to parse discovery input JSON at {path:?}: {source}")]
    ParseDiscoveryInput {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Constructing the routing provider failed.
    #[error("failed to build routing provider for {base_url:?}: {source}")]
    BuildRoutingProvider {
        base_url: String,
        #[source]
        source: ProviderBuildError,
    },
    /// The async runtime could not be started.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The discovery cycle failed as a whole.
    #[error("discovery failed: {source}")]
    Discover { source: DiscoveryError },
    /// Serialising the discovery result failed.
    #[error("failed to serialise discovery result: {0}")]
    SerialiseDiscoveryResult(#[source] serde_json::Error),
    /// Writing the discovery output failed.
    #[error("failed to write discovery output: {0}")]
    WriteDiscoveryOutput(#[source] std::io::Error),
}
