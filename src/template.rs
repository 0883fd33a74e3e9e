//! Placeholder templates for DNS server configuration files.
//!
//! Placeholders look like `{{ name }}`. `network`, `domain` and `servers`
//! can appear anywhere. A line that mentions `address` or `hostname` is a
//! host line: it is repeated for every (address, host name) pair of every
//! host and dropped when there are none.

use crate::config::{DnsConfig, HostEntry};
use crate::utils::ip_utils::join_addresses;
use crate::zerotier::NetworkId;
use regex::{Captures, Regex};
use std::fs;
use std::net::IpAddr;
use std::path::Path;

const GLOBAL_PLACEHOLDERS: [&str; 3] = ["network", "domain", "servers"];
const HOST_PLACEHOLDERS: [&str; 2] = ["address", "hostname"];

/// Template rendering errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Unknown placeholder `{name}` on line {line}")]
    UnknownPlaceholder { name: String, line: usize },
}

/// Values available to a template
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub network_id: NetworkId,
    pub dns: &'a DnsConfig,
    pub hosts: &'a [HostEntry],
}

#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    placeholder: Regex,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            placeholder: Regex::new(r"\{\{\s*([A-Za-z_]+)\s*\}\}").expect("Invalid placeholder regex"),
        }
    }

    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        fs::read_to_string(path).map(Self::new)
    }

    /// Render the template; every output line ends with a newline
    pub fn render(&self, ctx: &RenderContext<'_>) -> Result<String, TemplateError> {
        let mut output = String::new();

        for (index, line) in self.source.lines().enumerate() {
            let mut host_line = false;
            for caps in self.placeholder.captures_iter(line) {
                let name = &caps[1];
                if HOST_PLACEHOLDERS.contains(&name) {
                    host_line = true;
                } else if !GLOBAL_PLACEHOLDERS.contains(&name) {
                    return Err(TemplateError::UnknownPlaceholder {
                        name: name.to_string(),
                        line: index + 1,
                    });
                }
            }

            if !host_line {
                output.push_str(&self.substitute(line, ctx, None));
                output.push('\n');
                continue;
            }

            for host in ctx.hosts {
                for address in &host.addresses {
                    for hostname in &host.names {
                        output.push_str(&self.substitute(line, ctx, Some((address, hostname))));
                        output.push('\n');
                    }
                }
            }
        }

        Ok(output)
    }

    fn substitute(&self, line: &str, ctx: &RenderContext<'_>, host: Option<(&IpAddr, &str)>) -> String {
        self.placeholder
            .replace_all(line, |caps: &Captures<'_>| match &caps[1] {
                "network" => ctx.network_id.to_string(),
                "domain" => ctx.dns.domain.clone(),
                "servers" => join_addresses(&ctx.dns.servers),
                "address" => host.map(|(address, _)| address.to_string()).unwrap_or_default(),
                "hostname" => host.map(|(_, hostname)| hostname.to_string()).unwrap_or_default(),
                _ => String::new(),
            })
            .into_owned()
    }
}
