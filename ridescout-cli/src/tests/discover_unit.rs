//! Focused unit tests covering discover CLI configuration and input parsing.

use std::time::Duration;

use super::helpers::{ScriptedEngineBuilder, sample_input, write_input, write_utf8};
use super::*;
use crate::discover::{
    DefaultDiscoverEngineBuilder, DiscoverArgs, DiscoverConfig, DiscoverEngineBuilder,
    config_from_layers_for_test, load_discovery_input, run_discover_with,
};
use camino::Utf8PathBuf;
use clap::Parser;
use ridescout_core::{ConfigError, Decimal, EngineConfig, PricingConfig, PricingError};
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct Workspace {
    _tmp: TempDir,
    root: Utf8PathBuf,
}

#[fixture]
fn workspace() -> Workspace {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    Workspace { _tmp: tmp, root }
}

#[rstest]
fn converting_discover_without_input_errors() {
    let err = DiscoverConfig::try_from(DiscoverArgs::default())
        .expect_err("missing input should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_DISCOVER_INPUT);
            assert_eq!(env, ENV_DISCOVER_INPUT);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn discover_config_applies_defaults() {
    let args = DiscoverArgs {
        input_path: Some(Utf8PathBuf::from("input.json")),
        ..DiscoverArgs::default()
    };

    let config = DiscoverConfig::try_from(args).expect("config should build");
    assert_eq!(config.osrm_base_url, "https://router.project-osrm.org");
    assert_eq!(config.osrm_profile, "driving");
    assert_eq!(config.engine, EngineConfig::default());
    assert_eq!(config.pricing, PricingConfig::default());
}

#[rstest]
fn discover_config_overrides_engine_limits() {
    let args = DiscoverArgs {
        input_path: Some(Utf8PathBuf::from("input.json")),
        concurrency_limit: Some(2),
        per_call_timeout_ms: Some(750),
        overall_timeout_ms: Some(3_000),
        region_padding: Some(1.5),
        default_span_degrees: Some(0.05),
        ..DiscoverArgs::default()
    };

    let config = DiscoverConfig::try_from(args).expect("config should build");
    assert_eq!(config.engine.concurrency_limit, 2);
    assert_eq!(config.engine.per_call_timeout, Duration::from_millis(750));
    assert_eq!(config.engine.overall_timeout, Duration::from_secs(3));
    assert_eq!(config.engine.region_padding, 1.5);
    assert_eq!(config.engine.default_span_degrees, 0.05);
}

#[rstest]
fn discover_flags_set_the_fare_rates() {
    let cli = Cli::try_parse_from([
        "ridescout",
        "discover",
        "input.json",
        "--base-price",
        "2.0",
        "--per-meter-rate",
        "0.0005",
        "--per-second-rate",
        "0.01",
    ])
    .expect("flags parse");
    let Command::Discover(args) = cli.command;

    let config = DiscoverConfig::try_from(args).expect("config should build");
    assert_eq!(
        config.pricing,
        PricingConfig {
            base_price: Decimal::new(2, 0),
            per_meter_rate: Decimal::new(5, 4),
            per_second_rate: Decimal::new(1, 2),
        }
    );
}

#[rstest]
fn discover_config_rejects_negative_rates() {
    let args = DiscoverArgs {
        input_path: Some(Utf8PathBuf::from("input.json")),
        per_second_rate: Some(Decimal::new(-1, 2)),
        ..DiscoverArgs::default()
    };

    let err = DiscoverConfig::try_from(args).expect_err("negative rate should be rejected");
    match err {
        CliError::InvalidEngineConfig(ConfigError::Pricing(PricingError::NegativeRate {
            name,
            ..
        })) => assert_eq!(name, "per_second_rate"),
        other => panic!("expected a negative rate error, found {other:?}"),
    }
}

#[rstest]
fn discover_config_rejects_tight_region_padding() {
    let args = DiscoverArgs {
        input_path: Some(Utf8PathBuf::from("input.json")),
        region_padding: Some(1.0),
        ..DiscoverArgs::default()
    };

    let err = DiscoverConfig::try_from(args).expect_err("padding below minimum");
    assert!(
        matches!(
            err,
            CliError::InvalidEngineConfig(ConfigError::RegionPadding { .. })
        ),
        "got {err:?}"
    );
}

#[rstest]
#[case::zero_concurrency(Some(0), None, ConfigError::ZeroConcurrency)]
#[case::zero_timeout(None, Some(0), ConfigError::ZeroTimeout { name: "per_call_timeout" })]
fn discover_config_rejects_invalid_limits(
    #[case] concurrency_limit: Option<usize>,
    #[case] per_call_timeout_ms: Option<u64>,
    #[case] expected: ConfigError,
) {
    let args = DiscoverArgs {
        input_path: Some(Utf8PathBuf::from("input.json")),
        concurrency_limit,
        per_call_timeout_ms,
        ..DiscoverArgs::default()
    };

    let err = DiscoverConfig::try_from(args).expect_err("limits should be rejected");
    match err {
        CliError::InvalidEngineConfig(source) => assert_eq!(source, expected),
        other => panic!("expected InvalidEngineConfig, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_missing_input(workspace: Workspace) {
    let config = DiscoverConfig {
        input_path: workspace.root.join("absent.json"),
        osrm_base_url: "http://localhost:5000".to_owned(),
        osrm_profile: "driving".to_owned(),
        engine: EngineConfig::default(),
        pricing: PricingConfig::default(),
    };

    let err = config.validate_sources().expect_err("expected failure");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_DISCOVER_INPUT),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_not_file(workspace: Workspace) {
    let input_path = workspace.root.join("input.json");
    std::fs::create_dir(&input_path).expect("input directory");
    let config = DiscoverConfig {
        input_path: input_path.clone(),
        osrm_base_url: "http://localhost:5000".to_owned(),
        osrm_profile: "driving".to_owned(),
        engine: EngineConfig::default(),
        pricing: PricingConfig::default(),
    };

    let err = config
        .validate_sources()
        .expect_err("expected directory path to fail validation");
    match err {
        CliError::SourcePathNotFile { field, path } => {
            assert_eq!(field, ARG_DISCOVER_INPUT);
            assert_eq!(path, input_path);
        }
        other => panic!("expected SourcePathNotFile, found {other:?}"),
    }
}

#[rstest]
fn load_discovery_input_decodes_json(workspace: Workspace) {
    let input_path = workspace.root.join("input.json");
    write_input(&input_path, &sample_input());

    let input = load_discovery_input(&input_path).expect("input should load");
    assert_eq!(input, sample_input());
}

#[rstest]
fn load_discovery_input_reports_invalid_json(workspace: Workspace) {
    let input_path = workspace.root.join("input.json");
    write_utf8(&input_path, b"{ not valid json");

    let err = load_discovery_input(&input_path).expect_err("invalid JSON");
    match err {
        CliError::ParseDiscoveryInput { path, .. } => assert_eq!(path, input_path),
        other => panic!("expected ParseDiscoveryInput, found {other:?}"),
    }
}

#[rstest]
fn discover_prints_ranked_drivers_as_json(workspace: Workspace) {
    let input_path = workspace.root.join("input.json");
    write_input(&input_path, &sample_input());
    let args = DiscoverArgs {
        input_path: Some(input_path),
        ..DiscoverArgs::default()
    };
    let mut stdout = Vec::new();

    run_discover_with(args, &ScriptedEngineBuilder, &mut stdout).expect("discover succeeds");

    let output: serde_json::Value =
        serde_json::from_slice(&stdout).expect("output should be JSON");
    let ranked: Vec<_> = output["ranked"]
        .as_array()
        .expect("ranked list")
        .iter()
        .map(|driver| driver["driver_id"].as_str().expect("driver id"))
        .collect();
    assert_eq!(ranked, vec!["quick", "slow"]);
    assert_eq!(output["destination_marker"]["title"], "Destination");
}

#[rstest]
fn discover_reports_missing_rider_position(workspace: Workspace) {
    let input_path = workspace.root.join("input.json");
    write_utf8(&input_path, br#"{ "drivers": [] }"#);
    let args = DiscoverArgs {
        input_path: Some(input_path),
        ..DiscoverArgs::default()
    };
    let mut stdout = Vec::new();

    let err = run_discover_with(args, &ScriptedEngineBuilder, &mut stdout)
        .expect_err("rider position is required");
    assert!(matches!(err, CliError::Discover { .. }), "got {err:?}");
    assert!(stdout.is_empty());
}

#[rstest]
fn invalid_layer_maps_to_configuration_error() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "concurrency_limit": "many" }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "osrm_base_url": "http://from-file:5000",
            "concurrency_limit": 2,
        }),
        None,
    );
    composer.push_environment(json!({
        "input_path": "from-env.json",
        "concurrency_limit": 3,
    }));
    composer.push_cli(json!({
        "concurrency_limit": 4,
    }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.input_path, Utf8PathBuf::from("from-env.json"));
    assert_eq!(config.osrm_base_url, "http://from-file:5000");
    assert_eq!(config.engine.concurrency_limit, 4);
}

#[rstest]
fn layered_rates_and_padding_reach_the_engine() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "input_path": "input.json",
            "base_price": "4.00",
            "region_padding": 1.5,
        }),
        None,
    );
    composer.push_environment(json!({
        "per_meter_rate": "0.002",
        "per_second_rate": "0.02",
    }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    let engine = DefaultDiscoverEngineBuilder
        .build(&config)
        .expect("engine should build");

    assert_eq!(
        engine.pricing(),
        &PricingConfig {
            base_price: Decimal::new(400, 2),
            per_meter_rate: Decimal::new(2, 3),
            per_second_rate: Decimal::new(2, 2),
        }
    );
    assert_eq!(engine.config().region_padding, 1.5);
}
