mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ssb")]
#[command(about = "Stock synthesis dashboard CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// Layered config paths in merge order. Defaults to SSB_CONFIG.
    #[arg(long = "config")]
    config_paths: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the stock synthesis, one row per zone record
    Synthesis {
        #[command(flatten)]
        config: ConfigArgs,

        /// Only rows whose zone matches this label
        #[arg(long)]
        zone: Option<String>,
    },

    /// Delete every consumption record for a product in a zone
    Reset {
        #[command(flatten)]
        config: ConfigArgs,

        #[arg(long)]
        product: String,

        #[arg(long)]
        zone: String,
    },

    /// List zone records with their stock in lots/units
    Zones {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Set a zone's stock to lots * lot size + units
    ZoneAdjust {
        #[command(flatten)]
        config: ConfigArgs,

        /// Zone record id
        #[arg(long)]
        id: String,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        lots: i64,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        units: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = ssb_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Synthesis { config, zone } => {
            let store = commands::open_store(&commands::config_paths(config.config_paths))?;
            commands::synthesis::print_synthesis(store.as_ref(), zone.as_deref()).await?;
        }

        Commands::Reset {
            config,
            product,
            zone,
        } => {
            let store = commands::open_store(&commands::config_paths(config.config_paths))?;
            commands::synthesis::reset(store.as_ref(), &product, &zone).await?;
        }

        Commands::Zones { config } => {
            let store = commands::open_store(&commands::config_paths(config.config_paths))?;
            commands::zones::print_zones(store.as_ref()).await?;
        }

        Commands::ZoneAdjust {
            config,
            id,
            lots,
            units,
        } => {
            let lots = commands::non_negative("lots", lots)?;
            let units = commands::non_negative("units", units)?;
            let store = commands::open_store(&commands::config_paths(config.config_paths))?;
            commands::zones::adjust(store.as_ref(), &id, lots, units).await?;
        }
    }

    Ok(())
}
