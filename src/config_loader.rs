use crate::config::{NetworkConfig, RawNetworkConfig};
use crate::resolver::AddressResolver;
use crate::zerotier::NetworkId;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Location of a network's configuration: `<config_dir>/<nwid>.json`
pub fn config_path(config_dir: &Path, network_id: NetworkId) -> PathBuf {
    config_dir.join(format!("{}.json", network_id))
}

/// Load and parse a network configuration without resolving anything
pub fn load_raw_config(config_path: &Path) -> Result<RawNetworkConfig> {
    info!("Loading network configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open '{}'", config_path.display()))?;
    let raw: RawNetworkConfig = serde_json::from_reader(BufReader::new(file))
        .wrap_err_with(|| format!("Failed to parse '{}'", config_path.display()))?;

    raw.validate()
        .wrap_err_with(|| format!("Invalid configuration in '{}'", config_path.display()))?;
    Ok(raw)
}

/// Load a network configuration and resolve its DNS servers
pub fn load_network_config<R>(config_path: &Path, resolver: &mut R) -> Result<NetworkConfig>
where
    R: AddressResolver,
    R::Error: std::error::Error + Send + Sync + 'static,
{
    let raw = load_raw_config(config_path)?;
    let config = NetworkConfig::from_raw(raw, resolver)
        .wrap_err_with(|| format!("Failed to resolve '{}'", config_path.display()))?;

    info!(
        "Loaded {} host(s) and {} DNS server address(es) for domain {}",
        config.zt_hosts.len(),
        config.dns.servers.len(),
        config.dns.domain
    );
    Ok(config)
}
