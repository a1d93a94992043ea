// Host-backed route resolver
//
// Asks the kernel which route it would pick via `ip -json route get`.

use serde::Deserialize;
use std::net::Ipv4Addr;
use std::process::Command;

use super::{RouteOutcome, RouteResolver};
use crate::error::{AppError, AppResult};

/// Resolves routes against the live routing table of this host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    pub fn new() -> Self {
        SystemResolver
    }
}

impl RouteResolver for SystemResolver {
    fn resolve(&self, dest: Ipv4Addr) -> AppResult<RouteOutcome> {
        #[cfg(target_os = "linux")]
        return resolve_linux(dest);

        #[cfg(not(target_os = "linux"))]
        {
            let _ = dest;
            Err(AppError::UnsupportedPlatform)
        }
    }

    fn interface_exists(&self, name: &str) -> bool {
        #[cfg(target_os = "linux")]
        return interface_exists_linux(name);

        #[cfg(not(target_os = "linux"))]
        return Command::new("ifconfig")
            .arg(name)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false);
    }
}

// TODO: bound the lookup with a timeout; `ip route get` can hang when netlink stalls.
#[cfg(target_os = "linux")]
fn resolve_linux(dest: Ipv4Addr) -> AppResult<RouteOutcome> {
    let dest_str = dest.to_string();
    let output = Command::new("ip")
        .args(["-4", "-json", "route", "get", &dest_str])
        .output()
        .map_err(|e| AppError::CommandExecution(format!("ip route get {}: {}", dest, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(classify_failure(&dest_str, stderr.trim()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    tracing::trace!("ip route get {} output: {}", dest, stdout);
    parse_route_get(&stdout)
}

#[cfg(target_os = "linux")]
fn interface_exists_linux(name: &str) -> bool {
    // Anything but a plain name would escape /sys/class/net
    !matches!(name, "" | "." | "..")
        && !name.contains('/')
        && std::path::Path::new("/sys/class/net").join(name).exists()
}

/// Map a failed `ip route get` to a fatal error
fn classify_failure(dest: &str, stderr: &str) -> AppError {
    let lowered = stderr.to_lowercase();
    if lowered.contains("unreachable") || lowered.contains("no route to host") {
        AppError::NoRoute(format!("{} ({})", dest, stderr))
    } else {
        AppError::CommandExecution(format!("ip route get {} failed: {}", dest, stderr))
    }
}

/// One entry of `ip -json route get` output
#[derive(Debug, Deserialize)]
struct RouteGetEntry {
    dev: Option<String>,
    gateway: Option<String>,
    prefsrc: Option<String>,
}

fn parse_route_get(json_str: &str) -> AppResult<RouteOutcome> {
    let entries: Vec<RouteGetEntry> = serde_json::from_str(json_str)?;
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| AppError::RouteOutputParse("empty route list".to_string()))?;

    let interface = entry
        .dev
        .ok_or_else(|| AppError::RouteOutputParse("missing dev".to_string()))?;

    let gateway = entry
        .gateway
        .map(|gw| parse_ipv4(&gw, "gateway"))
        .transpose()?;

    let source = entry
        .prefsrc
        .ok_or_else(|| AppError::RouteOutputParse("missing prefsrc".to_string()))
        .and_then(|src| parse_ipv4(&src, "prefsrc"))?;

    Ok(RouteOutcome {
        interface,
        gateway,
        source,
    })
}

fn parse_ipv4(value: &str, field: &str) -> AppResult<Ipv4Addr> {
    value
        .parse()
        .map_err(|_| AppError::RouteOutputParse(format!("invalid {} {}", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gateway_route() {
        let json = r#"[{"dst":"1.1.1.1","gateway":"192.168.1.1","dev":"wlan0","prefsrc":"192.168.1.23","flags":[],"uid":1000,"cache":[]}]"#;
        let outcome = parse_route_get(json).unwrap();
        assert_eq!(outcome.interface, "wlan0");
        assert_eq!(outcome.gateway, Some(Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(outcome.source, Ipv4Addr::new(192, 168, 1, 23));
    }

    #[test]
    fn test_parse_on_link_route() {
        let json = r#"[{"type":"local","dst":"127.0.0.1","dev":"lo","prefsrc":"127.0.0.1","flags":[],"uid":0,"cache":["local"]}]"#;
        let outcome = parse_route_get(json).unwrap();
        assert_eq!(outcome.interface, "lo");
        assert_eq!(outcome.gateway, None);
        assert_eq!(outcome.source, Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn test_parse_malformed_output() {
        assert!(matches!(parse_route_get("[]"), Err(AppError::RouteOutputParse(_))));
        assert!(matches!(
            parse_route_get(r#"[{"dst":"1.1.1.1","prefsrc":"10.0.0.2"}]"#),
            Err(AppError::RouteOutputParse(_))
        ));
        assert!(matches!(
            parse_route_get(r#"[{"dev":"eth0","gateway":"fe80::1","prefsrc":"10.0.0.2"}]"#),
            Err(AppError::RouteOutputParse(_))
        ));
        assert!(matches!(parse_route_get("not json"), Err(AppError::Serialization(_))));
    }

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure("10.255.0.1", "RTNETLINK answers: Network is unreachable"),
            AppError::NoRoute(_)
        ));
        assert!(matches!(
            classify_failure("10.255.0.1", "RTNETLINK answers: No route to host"),
            AppError::NoRoute(_)
        ));
        assert!(matches!(
            classify_failure("10.255.0.1", "RTNETLINK answers: Operation not permitted"),
            AppError::CommandExecution(_)
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_interface_exists_rejects_paths() {
        assert!(!interface_exists_linux(""));
        assert!(!interface_exists_linux(".."));
        assert!(!interface_exists_linux("../net"));
        assert!(!interface_exists_linux("definitely-not-an-iface0"));
    }
}
