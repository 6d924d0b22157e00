//! Test helpers for composing discovery inputs and stub engines.

use std::sync::Arc;

use camino::Utf8Path;
use ridescout_core::{Coordinate, DiscoveryInput, DriverRecord};
use ridescout_dispatch::DiscoveryEngine;
use ridescout_dispatch::test_support::{Script, ScriptedRoutingProvider};

use crate::CliError;
use crate::discover::{DiscoverConfig, DiscoverEngineBuilder, SharedProvider};

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write test file");
}

/// Rider at 40.0, -75.0 heading north with two nearby drivers.
pub(super) fn sample_input() -> DiscoveryInput {
    DiscoveryInput {
        rider_position: Some(Coordinate::unchecked(40.0, -75.0)),
        destination: Some(Coordinate::unchecked(40.05, -75.0)),
        drivers: vec![
            DriverRecord::new("slow", Coordinate::unchecked(40.02, -75.0), "Sam"),
            DriverRecord::new("quick", Coordinate::unchecked(40.01, -75.0), "Quinn"),
        ],
        selected_driver_id: None,
    }
}

pub(super) fn write_input(path: &Utf8Path, input: &DiscoveryInput) {
    let payload = serde_json::to_string_pretty(input).expect("serialise input");
    write_utf8(path, payload.as_bytes());
}

/// Engine builder backed by scripted routes instead of OSRM.
pub(super) struct ScriptedEngineBuilder;

impl DiscoverEngineBuilder for ScriptedEngineBuilder {
    fn build(&self, config: &DiscoverConfig) -> Result<DiscoveryEngine<SharedProvider>, CliError> {
        let provider = ScriptedRoutingProvider::new()
            .script(
                Coordinate::unchecked(40.02, -75.0),
                Script::route(420.0, 2_200.0),
            )
            .script(
                Coordinate::unchecked(40.01, -75.0),
                Script::route(180.0, 1_100.0),
            );
        let shared: SharedProvider = Arc::new(provider);
        Ok(DiscoveryEngine::new(
            shared,
            config.engine.clone(),
            config.pricing.clone(),
        )?)
    }
}
