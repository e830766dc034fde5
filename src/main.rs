use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use secrecy::SecretString;

use wifiscan::{
    Engine, EngineConfig, EngineError, Event, RankedNetwork,
    config::{self, ConfigFile},
    error::ConfigError,
    logging::{self, LogConfig},
    store::CredentialStore,
};

/// Scan nearby Wi-Fi networks and connect to one with live progress
#[derive(Parser, Debug)]
#[command(
    name = "wifiscan",
    about = "Scan nearby Wi-Fi networks, ranked by signal strength, and connect with live progress.",
    long_about = None,
    version = env!("CARGO_PKG_VERSION"),
    disable_version_flag = true
)]
struct Args {
    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: (),

    /// Configuration file (must set `timeout`)
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Saved credentials file
    #[arg(long, default_value = config::DEFAULT_STORE_PATH)]
    store: PathBuf,

    /// Network to connect to
    #[arg(long, value_name = "SSID")]
    connect: Option<String>,

    /// Key for --connect; falls back to the saved credential
    #[arg(long, requires = "connect")]
    password: Option<String>,

    /// Exit after the first scan result, or after the connect result with --connect
    #[arg(long)]
    once: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Write the connect timeout (seconds) into the config file and exit
    #[arg(long = "set-timeout", value_name = "SECS")]
    set_timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Some(secs) = args.set_timeout {
        let mut file = match ConfigFile::load(&args.config) {
            Err(ConfigError::NotFound(_)) => ConfigFile::default(),
            other => other?,
        };
        file.set_timeout(secs);
        file.save(&args.config)?;
        println!("timeout set to {secs}s in {}", args.config.display());
        return Ok(());
    }

    let file = ConfigFile::load(&args.config).map_err(EngineError::from)?;
    let level = args
        .log_level
        .clone()
        .or_else(|| file.log_level.clone())
        .unwrap_or_else(|| config::DEFAULT_LOG_LEVEL.to_string());
    logging::init(&LogConfig::with_level(&level));

    let engine_config = EngineConfig::from_file(&file).map_err(EngineError::from)?;
    let mut store = CredentialStore::load(&args.store)?;

    let (mut engine, mut events) = Engine::open_default(engine_config)?;
    engine.start_scanning();

    if let Some(ssid) = &args.connect {
        let credential = args
            .password
            .clone()
            .map(SecretString::from)
            .or_else(|| store.credential(ssid));
        println!("connecting to {ssid}");
        engine.connect(ssid.clone(), credential);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    Event::ScanResult(networks) => {
                        print_networks(&networks);
                        if args.once && args.connect.is_none() {
                            break;
                        }
                    }
                    Event::ConnectProgress { percent } => println!("connecting... {percent}%"),
                    Event::ConnectResult { success, identity, address } => {
                        if success {
                            match address {
                                Some(ip) => println!("connected to {identity}, address {ip}"),
                                None => println!("connected to {identity}, no address assigned yet"),
                            }
                            if let Some(key) = &args.password {
                                store.set_credential(&identity, key);
                                store.save()?;
                            }
                        } else {
                            println!("could not connect to {identity}");
                        }
                        if args.once {
                            break;
                        }
                    }
                }
            }
        }
    }

    engine.shutdown();
    Ok(())
}

fn print_networks(networks: &[RankedNetwork]) {
    println!("{} networks", networks.len());
    for network in networks {
        println!(
            "  {:<32} {:>4} dBm {:>3}% {:<6} {}",
            network.label(),
            network.best_signal_dbm,
            network.quality(),
            format!("{:?}", network.tier()),
            network.representative_bssid
        );
    }
}
