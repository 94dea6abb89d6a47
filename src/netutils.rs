use anyhow::{anyhow, bail, Context, Result};
use std::net::Ipv6Addr;

use crate::probes::mysql::DEFAULT_PORT;

/// Normalize a target into a `host:port` string that `TcpStream::connect` accepts.
///
/// Accepts `host:port`, `[v6]:port`, a bare host or a bare IPv6 address.
/// A missing port defaults to 3306.
pub fn parse_target(spec: &str) -> Result<String> {
    let spec = spec.trim();
    if spec.is_empty() {
        bail!("empty target");
    }

    let (host, port) = if let Some(rest) = spec.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| anyhow!("unterminated '[' in target {:?}", spec))?;
        let port = match tail {
            "" => None,
            t => Some(
                t.strip_prefix(':')
                    .ok_or_else(|| anyhow!("expected ':' after ']' in target {:?}", spec))?,
            ),
        };
        (host, port)
    } else if spec.matches(':').count() > 1 {
        // bare IPv6, no port
        spec.parse::<Ipv6Addr>()
            .with_context(|| format!("invalid IPv6 target {:?}; use [addr]:port", spec))?;
        (spec, None)
    } else {
        match spec.split_once(':') {
            Some((h, p)) => (h, Some(p)),
            None => (spec, None),
        }
    };

    if host.is_empty() {
        bail!("missing host in target {:?}", spec);
    }
    let port = match port {
        Some(p) => parse_port(p).with_context(|| format!("bad port in target {:?}", spec))?,
        None => DEFAULT_PORT,
    };

    if host.contains(':') {
        Ok(format!("[{}]:{}", host, port))
    } else {
        Ok(format!("{}:{}", host, port))
    }
}

fn parse_port(p: &str) -> Result<u16> {
    let port: u16 = p.parse()?;
    if port == 0 {
        bail!("port must be in 1-65535");
    }
    Ok(port)
}
