//! High-level orchestration: one DNS configuration per controller network.
//!
//! For every network the controller reports, this loads
//! `<config_dir>/<nwid>.json` (networks without one are skipped), renders
//! the template into `<output_dir>/<nwid>/` and pushes the DNS domain and
//! servers back to the controller.

use crate::config_loader;
use crate::controller::{ControllerCommand, ControllerNetwork};
use crate::resolver::NetworkResolver;
use crate::template::{RenderContext, Template};
use crate::zerotier::NetworkId;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::info;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Extension stripped from the template name to get the output name
pub const TEMPLATE_EXTENSION: &str = "tmpl";

/// Paths used by a run
#[derive(Debug, Clone)]
pub struct RunOptions<'a> {
    pub template: &'a Path,
    pub config_dir: &'a Path,
    pub output_dir: &'a Path,
}

/// Which networks were configured and which were skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub configured: Vec<NetworkId>,
    pub skipped: Vec<NetworkId>,
}

/// Output file name: the template's name without a trailing `.tmpl`
pub fn output_file_name(template: &Path) -> Result<OsString> {
    let name = if template.extension().map_or(false, |ext| ext == TEMPLATE_EXTENSION) {
        template.file_stem()
    } else {
        template.file_name()
    };
    name.map(OsString::from)
        .ok_or_else(|| eyre!("Template path '{}' has no file name", template.display()))
}

/// Configure every network known to the controller
pub fn run(options: &RunOptions<'_>, controller: &ControllerCommand) -> Result<RunSummary> {
    let template = Template::from_file(options.template)
        .wrap_err_with(|| format!("Failed to read template '{}'", options.template.display()))?;
    let file_name = output_file_name(options.template)?;

    let networks = controller.networks().wrap_err("Failed to list controller networks")?;
    info!("Controller manages {} network(s)", networks.len());

    let mut summary = RunSummary::default();
    for network in networks {
        let network_id = network.network_id();
        let config_file = config_loader::config_path(options.config_dir, network_id);
        if !config_file.exists() {
            info!("No configuration for network {}, skipping", network_id);
            summary.skipped.push(network_id);
            continue;
        }

        configure_network(&network, &config_file, &template, options.output_dir, &file_name)
            .wrap_err_with(|| format!("Failed to configure network {}", network_id))?;
        summary.configured.push(network_id);
    }

    info!(
        "Configured {} network(s), skipped {}",
        summary.configured.len(),
        summary.skipped.len()
    );
    Ok(summary)
}

/// Render and publish the DNS configuration of a single network
pub fn configure_network(
    network: &ControllerNetwork,
    config_file: &Path,
    template: &Template,
    output_dir: &Path,
    file_name: &OsString,
) -> Result<()> {
    let network_id = network.network_id();
    info!("Configuring network {}", network_id);

    let modes = network.addressing_modes()?;
    info!(
        "Network {} addressing modes: 6plane={}, rfc4193={}",
        network_id, modes.sixplane, modes.rfc4193
    );
    let mut resolver = NetworkResolver::new(network_id, modes, network.clone());

    let config = config_loader::load_network_config(config_file, &mut resolver)?;
    let hosts = config.resolve_hosts(&mut resolver)?;

    let rendered = template.render(&RenderContext {
        network_id,
        dns: &config.dns,
        hosts: &hosts,
    })?;

    let network_dir = output_dir.join(network_id.to_string());
    fs::create_dir_all(output_dir)
        .wrap_err_with(|| format!("Failed to create output directory '{}'", output_dir.display()))?;
    fs::create_dir(&network_dir)
        .wrap_err_with(|| format!("Failed to create '{}'", network_dir.display()))?;

    let output_path = network_dir.join(file_name);
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&output_path)
        .wrap_err_with(|| format!("Failed to create '{}'", output_path.display()))?;
    file.write_all(rendered.as_bytes())?;
    info!("Wrote {:?}", output_path);

    network.set_dns_params(&config.dns.domain, &config.dns.servers)?;
    info!(
        "Published DNS domain {} with {} server address(es) for network {}",
        config.dns.domain,
        config.dns.servers.len(),
        network_id
    );
    Ok(())
}
