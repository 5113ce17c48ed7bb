//! Compose invocation arguments for a pod

use super::shell;
use crate::error::ConfigError;
use crate::pod::{parse_publish_spec, PodRecord, PortForward};
use serde::Serialize;

/// Namespaces the infra container shares with the pod's containers
pub const SHARED_NAMESPACES: &str = "ipc,net,uts";

const PUBLISH_FLAG: &str = "--publish=";

/// Arguments for one pod's compose invocations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodArgs {
    /// Flags for pod creation, in publish order
    pub pod_flags: Vec<String>,
    /// Flags placed before every compose verb
    pub compose_flags: Vec<String>,
}

impl PodArgs {
    /// Compose command line for a verb, as an argument vector
    pub fn command(&self, compose_command: &str, verb: &[&str]) -> Vec<String> {
        let mut command = Vec::with_capacity(1 + self.compose_flags.len() + verb.len());
        command.push(compose_command.to_string());
        command.extend(self.compose_flags.iter().cloned());
        command.extend(verb.iter().map(|v| v.to_string()));
        command
    }

    /// Forwards recovered from the publish flags
    pub fn published_forwards(&self) -> Vec<PortForward> {
        self.pod_flags
            .iter()
            .filter_map(|flag| flag.strip_prefix(PUBLISH_FLAG))
            .filter_map(parse_publish_spec)
            .collect()
    }
}

/// Build the compose arguments of a validated pod.
///
/// Forward order follows the pod record so command lines are reproducible.
pub fn build(pod: &PodRecord) -> Result<PodArgs, ConfigError> {
    let mut pod_flags = vec![
        "--infra=true".to_string(),
        format!("--share={}", SHARED_NAMESPACES),
        format!("--infra-name={}", pod.infra_name()),
    ];
    if !pod.network.is_empty() {
        pod_flags.push(format!("--network={}", pod.network));
    }
    pod_flags.extend(
        pod.forward_ports
            .iter()
            .map(|forward| format!("{}{}", PUBLISH_FLAG, forward.publish_spec())),
    );

    let pod_args = shell::join(&pod_flags)
        .map_err(|e| ConfigError::invalid(&pod.name, "podArgs", e.to_string()))?;

    let compose_file = pod.compose_file.to_str().ok_or_else(|| {
        ConfigError::invalid(&pod.name, "composeFile", "path is not valid UTF-8")
    })?;

    let compose_flags = vec![
        "--file".to_string(),
        compose_file.to_string(),
        "--in-pod=true".to_string(),
        "--project-name".to_string(),
        pod.name.clone(),
        "--pod-args".to_string(),
        pod_args,
    ];

    tracing::debug!("Pod {} compose flags: {:?}", pod.name, compose_flags);

    Ok(PodArgs {
        pod_flags,
        compose_flags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pod::RawPod;

    fn record(name: &str, raw: RawPod) -> PodRecord {
        PodRecord::from_raw(name, &raw).unwrap()
    }

    #[test]
    fn test_build_minimal() {
        let args = build(&record("syncthing", RawPod::new("/srv/syncthing"))).unwrap();
        assert_eq!(
            args.pod_flags,
            vec![
                "--infra=true",
                "--share=ipc,net,uts",
                "--infra-name=syncthing_infra",
            ]
        );
        assert_eq!(
            &args.compose_flags[..6],
            &[
                "--file",
                "/srv/syncthing/docker-compose.yml",
                "--in-pod=true",
                "--project-name",
                "syncthing",
                "--pod-args",
            ]
        );
        assert_eq!(args.compose_flags.len(), 7);
        assert_eq!(shell::split(&args.compose_flags[6]).unwrap(), args.pod_flags);
    }

    #[test]
    fn test_network_and_publish_flags() {
        let raw = RawPod::new("/srv/web")
            .network("frontend")
            .forward("tcp", 8080, 80)
            .forward("udp", 5353, 53)
            .forward("tcp", 8443, 443);
        let args = build(&record("web", raw)).unwrap();
        assert_eq!(
            &args.pod_flags[3..],
            &[
                "--network=frontend",
                "--publish=8080:80/tcp",
                "--publish=5353:53/udp",
                "--publish=8443:443/tcp",
            ]
        );
    }

    #[test]
    fn test_publish_round_trip() {
        let raw = RawPod::new("/srv/web")
            .forward("TCP", 8080, 80)
            .forward("udp", 5353, 53)
            .forward("sctp", 9000, 9001);
        let pod = record("web", raw);
        let args = build(&pod).unwrap();
        assert_eq!(args.published_forwards(), pod.forward_ports);

        let nested = args.compose_flags.last().unwrap();
        let reparsed: Vec<PortForward> = shell::split(nested)
            .unwrap()
            .iter()
            .filter_map(|flag| flag.strip_prefix(PUBLISH_FLAG))
            .filter_map(parse_publish_spec)
            .collect();
        assert_eq!(reparsed, pod.forward_ports);
    }

    #[test]
    fn test_values_with_spaces_are_quoted() {
        let raw = RawPod::new("/srv/my apps")
            .compose_file("compose file.yml")
            .network("lan bridge");
        let args = build(&record("app", raw)).unwrap();

        assert_eq!(args.compose_flags[1], "/srv/my apps/compose file.yml");
        let nested = shell::split(&args.compose_flags[6]).unwrap();
        assert_eq!(nested, args.pod_flags);
        assert!(nested.contains(&"--network=lan bridge".to_string()));
    }

    #[test]
    fn test_nul_in_network_rejected() {
        let raw = RawPod::new("/srv/app").network("bad\0net");
        let err = build(&record("app", raw)).unwrap_err();
        assert_eq!(err.pod(), "app");
    }

    #[test]
    fn test_command_vectors() {
        let args = build(&record("db", RawPod::new("/srv/db"))).unwrap();
        let up = args.command("podman-compose", &["up", "-d"]);
        assert_eq!(up[0], "podman-compose");
        assert_eq!(&up[1..8], args.compose_flags.as_slice());
        assert_eq!(&up[8..], &["up", "-d"]);
    }
}
