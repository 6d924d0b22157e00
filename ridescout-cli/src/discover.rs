//! Discover command implementation for the ridescout CLI.

use std::io::{BufReader, Write};
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use ridescout_core::{
    ConfigError, Decimal, DiscoveryInput, DiscoveryResult, EngineConfig, PricingConfig,
    RoutingProvider,
};
use ridescout_data::{OsrmRoutingClient, OsrmRoutingConfig};
use ridescout_dispatch::DiscoveryEngine;
use serde::{Deserialize, Serialize};

use crate::fs::{file_is_file, open_utf8_file};
use crate::{
    ARG_BASE_PRICE, ARG_CONCURRENCY_LIMIT, ARG_DEFAULT_SPAN_DEGREES, ARG_DISCOVER_INPUT,
    ARG_OSRM_BASE_URL, ARG_OSRM_PROFILE, ARG_OVERALL_TIMEOUT_MS, ARG_PER_CALL_TIMEOUT_MS,
    ARG_PER_METER_RATE, ARG_PER_SECOND_RATE, ARG_REGION_PADDING, CliError, ENV_DISCOVER_INPUT,
};

/// Routing provider type the CLI hands to the engine.
pub(crate) type SharedProvider = Arc<dyn RoutingProvider>;

/// CLI arguments for the `discover` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Run one discovery cycle: frame the map, build driver \
                 markers, rank drivers by road travel time to the rider and \
                 fetch the trip route. The input is a JSON-encoded \
                 DiscoveryInput; the result is printed as JSON.",
    about = "Rank nearby drivers for a rider"
)]
#[ortho_config(prefix = "RIDESCOUT")]
pub(crate) struct DiscoverArgs {
    /// Path to a JSON file containing a DiscoveryInput.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input_path: Option<Utf8PathBuf>,
    /// Base URL for the OSRM server (e.g. "http://localhost:5000").
    #[arg(long = ARG_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// OSRM profile segment, usually "driving".
    #[arg(long = ARG_OSRM_PROFILE, value_name = "profile")]
    #[serde(default)]
    pub(crate) osrm_profile: Option<String>,
    /// Maximum routing calls in flight at once.
    #[arg(long = ARG_CONCURRENCY_LIMIT, value_name = "count")]
    #[serde(default)]
    pub(crate) concurrency_limit: Option<usize>,
    /// Upper bound on each routing call in milliseconds.
    #[arg(long = ARG_PER_CALL_TIMEOUT_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) per_call_timeout_ms: Option<u64>,
    /// Upper bound on ranking all drivers in milliseconds.
    #[arg(long = ARG_OVERALL_TIMEOUT_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) overall_timeout_ms: Option<u64>,
    /// Multiplier applied to the bounding box of everything on the map.
    #[arg(long = ARG_REGION_PADDING, value_name = "factor")]
    #[serde(default)]
    pub(crate) region_padding: Option<f64>,
    /// Span in degrees used when only the rider is on the map.
    #[arg(long = ARG_DEFAULT_SPAN_DEGREES, value_name = "degrees")]
    #[serde(default)]
    pub(crate) default_span_degrees: Option<f64>,
    /// Flat amount added to every fare.
    #[arg(long = ARG_BASE_PRICE, value_name = "amount")]
    #[serde(default)]
    pub(crate) base_price: Option<Decimal>,
    /// Fare charged per metre of the driver's route.
    #[arg(long = ARG_PER_METER_RATE, value_name = "amount")]
    #[serde(default)]
    pub(crate) per_meter_rate: Option<Decimal>,
    /// Fare charged per second of the driver's route.
    #[arg(long = ARG_PER_SECOND_RATE, value_name = "amount")]
    #[serde(default)]
    pub(crate) per_second_rate: Option<Decimal>,
}

impl DiscoverArgs {
    pub(crate) fn into_config(self) -> Result<DiscoverConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        DiscoverConfig::try_from(merged)
    }
}

/// Resolved `discover` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DiscoverConfig {
    /// Path to the JSON input file.
    pub(crate) input_path: Utf8PathBuf,
    /// Base URL for the OSRM route service.
    pub(crate) osrm_base_url: String,
    /// OSRM profile segment.
    pub(crate) osrm_profile: String,
    /// Validated engine settings.
    pub(crate) engine: EngineConfig,
    /// Validated fare rates.
    pub(crate) pricing: PricingConfig,
}

impl DiscoverConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        let path = &self.input_path;
        match file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field: ARG_DISCOVER_INPUT,
                path: path.clone(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field: ARG_DISCOVER_INPUT,
                    path: path.clone(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_DISCOVER_INPUT,
                path: path.clone(),
                source,
            }),
        }
    }
}

impl TryFrom<DiscoverArgs> for DiscoverConfig {
    type Error = CliError;

    fn try_from(args: DiscoverArgs) -> Result<Self, Self::Error> {
        let input_path = args.input_path.ok_or(CliError::MissingArgument {
            field: ARG_DISCOVER_INPUT,
            env: ENV_DISCOVER_INPUT,
        })?;

        let osrm_defaults = OsrmRoutingConfig::default();
        let defaults = EngineConfig::default();
        let engine = EngineConfig {
            concurrency_limit: args.concurrency_limit.unwrap_or(defaults.concurrency_limit),
            per_call_timeout: args
                .per_call_timeout_ms
                .map_or(defaults.per_call_timeout, Duration::from_millis),
            overall_timeout: args
                .overall_timeout_ms
                .map_or(defaults.overall_timeout, Duration::from_millis),
            region_padding: args.region_padding.unwrap_or(defaults.region_padding),
            default_span_degrees: args
                .default_span_degrees
                .unwrap_or(defaults.default_span_degrees),
        };
        engine.validate()?;

        let rates = PricingConfig::default();
        let pricing = PricingConfig {
            base_price: args.base_price.unwrap_or(rates.base_price),
            per_meter_rate: args.per_meter_rate.unwrap_or(rates.per_meter_rate),
            per_second_rate: args.per_second_rate.unwrap_or(rates.per_second_rate),
        };
        pricing.validate().map_err(ConfigError::from)?;

        Ok(Self {
            input_path,
            osrm_base_url: args.osrm_base_url.unwrap_or(osrm_defaults.base_url),
            osrm_profile: args.osrm_profile.unwrap_or(osrm_defaults.profile),
            engine,
            pricing,
        })
    }
}

/// Builds the discovery engine for the current invocation.
pub(crate) trait DiscoverEngineBuilder {
    fn build(&self, config: &DiscoverConfig) -> Result<DiscoveryEngine<SharedProvider>, CliError>;
}

pub(crate) struct DefaultDiscoverEngineBuilder;

impl DiscoverEngineBuilder for DefaultDiscoverEngineBuilder {
    fn build(&self, config: &DiscoverConfig) -> Result<DiscoveryEngine<SharedProvider>, CliError> {
        let osrm = OsrmRoutingConfig::new(config.osrm_base_url.clone())
            .with_profile(config.osrm_profile.clone());
        let client = OsrmRoutingClient::with_config(osrm).map_err(|source| {
            CliError::BuildRoutingProvider {
                base_url: config.osrm_base_url.clone(),
                source,
            }
        })?;
        let provider: SharedProvider = Arc::new(client);
        Ok(DiscoveryEngine::new(
            provider,
            config.engine.clone(),
            config.pricing.clone(),
        )?)
    }
}

pub(crate) fn run_discover(args: DiscoverArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_discover_with(args, &DefaultDiscoverEngineBuilder, &mut stdout)
}

pub(crate) fn run_discover_with(
    args: DiscoverArgs,
    builder: &dyn DiscoverEngineBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let result = execute_discover(args, builder)?;
    write_discovery_result(writer, &result)
}

fn execute_discover(
    args: DiscoverArgs,
    builder: &dyn DiscoverEngineBuilder,
) -> Result<DiscoveryResult, CliError> {
    let config = resolve_discover_config(args)?;
    let input = load_discovery_input(&config.input_path)?;
    let engine = builder.build(&config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let result = runtime
        .block_on(engine.discover(&input))
        .map_err(|source| CliError::Discover { source })?;
    info!(
        "discovered {} ranked drivers from {}",
        result.ranked.len(),
        config.input_path
    );
    Ok(result)
}

fn resolve_discover_config(args: DiscoverArgs) -> Result<DiscoverConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

/// Loads a JSON-encoded [`DiscoveryInput`] from disk.
pub(crate) fn load_discovery_input(path: &Utf8Path) -> Result<DiscoveryInput, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenDiscoveryInput {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseDiscoveryInput {
        path: path.to_path_buf(),
        source,
    })
}

fn write_discovery_result(writer: &mut dyn Write, result: &DiscoveryResult) -> Result<(), CliError> {
    let payload =
        serde_json::to_string_pretty(result).map_err(CliError::SerialiseDiscoveryResult)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteDiscoveryOutput)?;
    writer
        .write_all(b"\n")
        .map_err(CliError::WriteDiscoveryOutput)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<DiscoverConfig, CliError> {
    let merged = DiscoverArgs::merge_from_layers(layers).map_err(CliError::from)?;
    DiscoverConfig::try_from(merged)
}
