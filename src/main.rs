use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use ztdns::controller::ControllerCommand;
use ztdns::orchestrator::{self, RunOptions};

/// Configure a DNS server for ZeroTier networks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the template for the DNS server config
    template: PathBuf,

    /// Directory with a `<nwid>.json` config file per network
    config_dir: PathBuf,

    /// Directory to drop the generated config files
    output_dir: PathBuf,

    /// Command and args used to query and set controller config
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    controller_command: Vec<String>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Template: {:?}", args.template);
    info!("Configuration directory: {:?}", args.config_dir);
    info!("Output directory: {:?}", args.output_dir);

    let (program, controller_args) = args
        .controller_command
        .split_first()
        .ok_or_else(|| eyre!("Controller command cannot be empty"))?;
    let controller = ControllerCommand::new(program.clone(), controller_args.to_vec());

    let options = RunOptions {
        template: &args.template,
        config_dir: &args.config_dir,
        output_dir: &args.output_dir,
    };
    let summary = orchestrator::run(&options, &controller)?;

    info!(
        "DNS configuration completed: {} configured, {} skipped",
        summary.configured.len(),
        summary.skipped.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "ztdns",
            "dnsmasq.conf.tmpl",
            "/etc/ztdns",
            "/run/ztdns",
            "ztctl",
            "--socket",
            "/var/run/zt.sock",
        ])
        .unwrap();

        assert_eq!(args.template, PathBuf::from("dnsmasq.conf.tmpl"));
        assert_eq!(args.controller_command, vec!["ztctl", "--socket", "/var/run/zt.sock"]);
    }

    #[test]
    fn test_controller_command_required() {
        assert!(Args::try_parse_from(["ztdns", "t", "c", "o"]).is_err());
    }
}
