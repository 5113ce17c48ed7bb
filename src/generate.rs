//! Generation pass
//!
//! A pass runs in two phases. Every pod is validated and its compose
//! arguments built first; only when all of them succeed is the firewall rule
//! set aggregated (once, over all pods) and the unit descriptors emitted.
//! Any [`ConfigError`] aborts the whole pass, so callers never see a partial
//! set of units.

use crate::compose::{self, PodArgs};
use crate::config::PodsConfig;
use crate::error::{ConfigError, ConfigWarning};
use crate::firewall::{self, FirewallRuleSet};
use crate::pod::{validate_all, PodRecord, RawPod};
use crate::unit::{self, UnitDescriptor};
use std::collections::BTreeMap;

/// Output of a successful generation pass
#[derive(Debug, Clone)]
pub struct Generation {
    /// Validated pods by name
    pub pods: BTreeMap<String, PodRecord>,
    /// One descriptor per pod, ordered by pod name
    pub units: Vec<UnitDescriptor>,
    /// Allow-lists aggregated across all pods
    pub firewall: FirewallRuleSet,
    pub warnings: Vec<ConfigWarning>,
}

impl Generation {
    /// Descriptor for a pod, by pod name
    pub fn unit(&self, pod: &str) -> Option<&UnitDescriptor> {
        let service_name = self.pods.get(pod)?.service_name();
        self.units.iter().find(|u| u.service_name == service_name)
    }
}

/// Run a generation pass over a loaded configuration
pub fn run(config: &PodsConfig) -> Result<Generation, ConfigError> {
    run_pods(&config.pods, &config.compose_command)
}

/// Run a generation pass over a pod mapping
pub fn run_pods(
    pods: &BTreeMap<String, RawPod>,
    compose_command: &str,
) -> Result<Generation, ConfigError> {
    tracing::info!("Generating units for {} pods", pods.len());

    let records = validate_all(pods)?;
    let args = records
        .values()
        .map(|pod| compose::build(pod).map(|args| (pod, args)))
        .collect::<Result<Vec<(&PodRecord, PodArgs)>, ConfigError>>()?;

    let aggregate = firewall::aggregate(records.values());

    let units = args
        .into_iter()
        .map(|(pod, args)| unit::generate(pod, &args, compose_command))
        .collect();

    Ok(Generation {
        units,
        firewall: aggregate.rules,
        warnings: aggregate.warnings,
        pods: records,
    })
}
