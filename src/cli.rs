use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "addon-engine")]
#[command(about = "Addon Engine - install, deploy and supervise containerized addons")]
pub struct Cli {
    /// Path to the addon database
    #[arg(long, default_value = "addons.db")]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the engine: redeploy active addons, then monitor containers until
    /// interrupted
    Run {
        /// Skip redeploying active addons at startup
        #[arg(long)]
        no_resume: bool,
    },
    /// Install an addon from the marketplace
    Install {
        /// Marketplace id of the addon
        marketplace_id: String,

        /// Return as soon as the record is created instead of waiting for
        /// deployment to finish
        #[arg(long)]
        detach: bool,
    },
    /// Redeploy an installed addon
    Deploy {
        /// Addon id
        addon_id: String,
    },
    /// Stop and remove an addon's containers
    Stop {
        /// Addon id
        addon_id: String,

        /// Also remove the addon's images
        #[arg(long)]
        remove_images: bool,
    },
    /// List active addons
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
