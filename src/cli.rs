//! CLI commands for fleetroute.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::state::AppContext;

#[derive(Parser)]
#[command(name = "fleetroute")]
#[command(about = "Vehicle routing service with pluggable matrix providers and VRP engines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Dataset root (overrides DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Parse a benchmark instance and print the canonical form
    Inspect {
        /// Instance file (.vrp, .txt, .xml)
        input: PathBuf,

        /// Also compute the Euclidean matrix
        #[arg(long)]
        with_matrix: bool,
    },

    /// List datasets and their file counts
    Datasets {
        /// Dataset root (overrides DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve { port, data_dir } => {
                let mut settings = Settings::from_env();
                if let Some(dir) = data_dir {
                    settings.data_dir = dir;
                }
                let ctx = AppContext::with_plugins(settings);
                crate::api::serve(ctx, port).await
            }

            Commands::Inspect { input, with_matrix } => {
                let instance = crate::instance::load_instance(&input, with_matrix)
                    .with_context(|| format!("failed to parse {}", input.display()))?;
                println!("{}", serde_json::to_string_pretty(&instance)?);
                Ok(())
            }

            Commands::Datasets { data_dir } => {
                let mut settings = Settings::from_env();
                if let Some(dir) = data_dir {
                    settings.data_dir = dir;
                }
                let ctx = AppContext::new(settings);
                for dataset in ctx.index.list_datasets() {
                    let page = ctx
                        .index
                        .list_files(&dataset.name, &Default::default())
                        .map(|p| p.total)
                        .unwrap_or(0);
                    println!("{}\t{} files\t{}", dataset.name, page, dataset.path);
                }
                Ok(())
            }
        }
    }
}
