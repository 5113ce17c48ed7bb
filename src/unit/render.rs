//! systemd unit file rendering

use super::descriptor::UnitDescriptor;
use std::fmt;

/// A descriptor formatted as a systemd service unit
pub struct SystemdUnit<'a>(pub &'a UnitDescriptor);

impl fmt::Display for SystemdUnit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.0;

        writeln!(f, "[Unit]")?;
        writeln!(f, "Description={}", escape_specifiers(&unit.description))?;
        if !unit.after.is_empty() {
            writeln!(f, "After={}", unit.after.join(" "))?;
        }
        if !unit.wants.is_empty() {
            writeln!(f, "Wants={}", unit.wants.join(" "))?;
        }

        writeln!(f)?;
        writeln!(f, "[Service]")?;
        writeln!(f, "Type=oneshot")?;
        if unit.remain_after_exit {
            writeln!(f, "RemainAfterExit=yes")?;
        }
        // Taken verbatim up to the end of the line; only specifiers expand.
        writeln!(
            f,
            "WorkingDirectory={}",
            escape_specifiers(&unit.working_directory.to_string_lossy())
        )?;
        writeln!(f, "ExecStartPre={}", exec_line(&unit.pre_start))?;
        writeln!(f, "ExecStart={}", exec_line(&unit.start))?;
        writeln!(f, "ExecStop={}", exec_line(&unit.stop))?;
        writeln!(f, "Restart={}", unit.restart.action)?;
        writeln!(f, "RestartSec={}", unit.restart.delay.as_secs())?;
        writeln!(f, "TimeoutStopSec={}", unit.stop_timeout.as_secs())?;

        if !unit.wanted_by.is_empty() {
            writeln!(f)?;
            writeln!(f, "[Install]")?;
            writeln!(f, "WantedBy={}", unit.wanted_by.join(" "))?;
        }

        Ok(())
    }
}

/// Render a descriptor as a systemd service unit
pub fn render_unit(unit: &UnitDescriptor) -> String {
    SystemdUnit(unit).to_string()
}

/// Render an argument vector as a systemd command line
pub fn exec_line(args: &[String]) -> String {
    args.iter()
        .map(|arg| quote_arg(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain settings expand `%` specifiers but never `$` variables
fn escape_specifiers(value: &str) -> String {
    value.replace('%', "%%")
}

/// Quote one argument using systemd's double-quote rules
fn quote_arg(arg: &str) -> String {
    let is_plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,@+".contains(c));

    if is_plain {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '%' => quoted.push_str("%%"),
            '$' => quoted.push_str("$$"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::build;
    use crate::pod::{PodRecord, RawPod};
    use crate::unit::generate;

    fn render(name: &str, raw: RawPod) -> String {
        let pod = PodRecord::from_raw(name, &raw).unwrap();
        let args = build(&pod).unwrap();
        render_unit(&generate(&pod, &args, "podman-compose"))
    }

    #[test]
    fn test_render_sections() {
        let text = render(
            "syncthing",
            RawPod::new("/srv/syncthing").forward("tcp", 8080, 80),
        );
        assert!(text.starts_with("[Unit]\nDescription=Compose pod syncthing\n"));
        assert!(text.contains("After=network-online.target\n"));
        assert!(text.contains("WorkingDirectory=/srv/syncthing\n"));
        assert!(text.contains("Restart=on-failure\n"));
        assert!(text.contains("RestartSec=30\n"));
        assert!(text.contains("TimeoutStopSec=20\n"));
        assert!(text.contains("[Install]\nWantedBy=multi-user.target\n"));
        let exec_start = text
            .lines()
            .find(|line| line.starts_with("ExecStart="))
            .unwrap();
        assert!(exec_start.starts_with(
            "ExecStart=podman-compose --file /srv/syncthing/docker-compose.yml --in-pod=true \
             --project-name syncthing --pod-args \""
        ));
        assert!(exec_start.contains("--publish=8080:80/tcp"));
        assert!(exec_start.ends_with("\" up -d"));
        assert!(text.contains("ExecStop=podman-compose --file"));
        assert!(text.contains(" down\n"));
        assert!(text.contains(" pull\n"));
    }

    fn setting<'a>(text: &'a str, key: &str) -> &'a str {
        text.lines()
            .find_map(|line| line.strip_prefix(key)?.strip_prefix('='))
            .unwrap()
    }

    #[test]
    fn test_working_directory_with_spaces_unquoted() {
        let text = render("apps", RawPod::new("/srv/my apps"));
        assert_eq!(setting(&text, "WorkingDirectory"), "/srv/my apps");
        // Exec lines still need quoting for the same path.
        assert!(setting(&text, "ExecStart").contains("\"/srv/my apps/docker-compose.yml\""));
    }

    #[test]
    fn test_working_directory_escapes_specifiers_only() {
        let text = render("media", RawPod::new("/srv/100%media/$cache"));
        assert_eq!(
            setting(&text, "WorkingDirectory"),
            "/srv/100%%media/$cache"
        );
    }

    #[test]
    fn test_description_keeps_dollar() {
        let mut unit = {
            let pod = PodRecord::from_raw("db", &RawPod::new("/srv/db")).unwrap();
            let args = build(&pod).unwrap();
            generate(&pod, &args, "podman-compose")
        };
        unit.description = "Costs $5 at 100%".to_string();
        let text = render_unit(&unit);
        assert_eq!(setting(&text, "Description"), "Costs $5 at 100%%");
    }

    #[test]
    fn test_display_matches_render_unit() {
        let pod = PodRecord::from_raw("db", &RawPod::new("/srv/db")).unwrap();
        let args = build(&pod).unwrap();
        let unit = generate(&pod, &args, "podman-compose");
        assert_eq!(SystemdUnit(&unit).to_string(), render_unit(&unit));
    }

    #[test]
    fn test_quote_arg() {
        assert_eq!(quote_arg("plain-arg"), "plain-arg");
        assert_eq!(quote_arg(""), "\"\"");
        assert_eq!(quote_arg("two words"), "\"two words\"");
        assert_eq!(quote_arg("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote_arg("100%"), "\"100%%\"");
        assert_eq!(quote_arg("$HOME"), "\"$$HOME\"");
        assert_eq!(quote_arg("a\\b"), "\"a\\\\b\"");
    }

    #[test]
    fn test_exec_line_keeps_nested_quoting() {
        let args = vec![
            "podman-compose".to_string(),
            "--pod-args".to_string(),
            "--network='lan bridge'".to_string(),
        ];
        assert_eq!(
            exec_line(&args),
            "podman-compose --pod-args \"--network='lan bridge'\""
        );
    }
}
