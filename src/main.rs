//! wg-provision main entry point
//!
//! This binary handles CLI parsing and logging setup, then builds the
//! server and client configurations and writes or prints them.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rand::rngs::OsRng;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wg_provision::{
    config::ProvisionSettings, output, wireguard::WireguardConfig, AppConfig, APP_NAME, VERSION,
};

/// WireGuard server and client configuration generator
#[derive(Parser, Debug)]
#[command(name = APP_NAME, version = VERSION, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file path (TOML); built-in defaults are used when omitted
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate configurations and write them to a directory
    Init {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        #[command(flatten)]
        provision: ProvisionArgs,
    },

    /// Generate configurations and print them to stdout
    Show {
        #[command(flatten)]
        provision: ProvisionArgs,
    },

    /// Print the effective settings as TOML
    Settings,

    /// Show version information
    Version,
}

/// Overrides applied on top of the settings file
#[derive(Args, Debug)]
struct ProvisionArgs {
    /// WireGuard subnet in CIDR notation
    #[arg(long)]
    subnet: Option<String>,

    /// Server endpoint written into client configs (host:port)
    #[arg(long)]
    endpoint: Option<String>,

    /// Server UDP listen port
    #[arg(long)]
    listen_port: Option<u16>,

    /// Comma-separated DNS servers for clients
    #[arg(long)]
    dns: Option<String>,

    /// Client MTU (0 to omit)
    #[arg(long)]
    mtu: Option<u16>,

    /// Number of clients to provision
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    clients: u16,
}

impl ProvisionArgs {
    fn apply(&self, settings: &mut ProvisionSettings) {
        if let Some(subnet) = &self.subnet {
            settings.subnet = subnet.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            settings.endpoint = Some(endpoint.clone());
        }
        if let Some(port) = self.listen_port {
            settings.listen_port = Some(port);
        }
        if let Some(dns) = &self.dns {
            settings.dns = dns.clone();
        }
        if let Some(mtu) = self.mtu {
            settings.mtu = mtu;
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Initialize structured logging with tracing, on stderr so stdout stays
/// usable for rendered configs
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Run the CLI command
fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = match &cli.settings {
        Some(path) => ProvisionSettings::from_file(path)?,
        None => ProvisionSettings::default(),
    };

    match cli.command {
        Commands::Init { out, provision } => {
            provision.apply(&mut settings);
            let app = provision_app(&settings, provision.clients)?;
            output::write_all(&out, &settings, &app)?;
            Ok(())
        }
        Commands::Show { provision } => {
            provision.apply(&mut settings);
            let app = provision_app(&settings, provision.clients)?;
            print!("{}", app.server_config_text());
            for client in app.clients() {
                println!();
                print!("{}", client.render());
            }
            Ok(())
        }
        Commands::Settings => {
            settings.validate()?;
            print!("{}", settings.to_toml()?);
            Ok(())
        }
        Commands::Version => {
            println!("{} v{}", APP_NAME, VERSION);
            Ok(())
        }
    }
}

/// Build the server and `clients` client configurations from settings
fn provision_app(settings: &ProvisionSettings, clients: u16) -> anyhow::Result<AppConfig> {
    settings.validate()?;

    let discovered_port = match settings.listen_port {
        Some(port) => port,
        None => output::find_unused_udp_port()?,
    };
    let params = settings.build_params(discovered_port)?;
    info!(
        "Provisioning {} client(s) in {} behind {}",
        clients, params.subnet, params.endpoint
    );

    let mut rng = OsRng;
    let mut app = AppConfig::provision(&params, &mut rng)?;
    for _ in 1..clients {
        app.add_client(&mut rng)?;
    }
    app.verify()?;

    Ok(app)
}
