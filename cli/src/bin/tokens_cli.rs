use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use cli::{decode_base64_image, load_image_file, write_walkthroughs};
use color_eyre::eyre::Result;
use design_tokens::{ExtractionConfig, Pipeline, TokenBundle};
use image::RgbImage;
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Extract design tokens from a UI screenshot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the token bundle and print it as JSON
    Extract {
        /// Image file to read (base64 or a data URL is read from stdin otherwise)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Use the extended variant (grid gutter, fused depth)
        #[arg(long)]
        extended: bool,
        /// Run extractors one after another instead of concurrently
        #[arg(long)]
        sequential: bool,
        /// Write intermediate images and explanations to this directory
        #[arg(long)]
        walkthrough_dir: Option<PathBuf>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the JSON schema of the output bundle
    Schema {
        /// Print the configuration file schema instead
        #[arg(long)]
        config: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // stdout carries the JSON output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            config,
            extended,
            sequential,
            walkthrough_dir,
            pretty,
        } => {
            let config = match config {
                Some(path) => ExtractionConfig::from_toml_file(path)?,
                None => ExtractionConfig::default(),
            };
            let mut builder = Pipeline::builder().with_config(config);
            if extended {
                builder = builder.extended();
            }
            if sequential {
                builder = builder.sequential();
            }
            let pipeline = builder.build()?;
            info!("{}", pipeline.info());

            let image = read_input(input.as_deref())?;
            let bundle = extract(&pipeline, &image, walkthrough_dir.as_deref()).await?;

            let json = if pretty { bundle.to_json_pretty()? } else { bundle.to_json()? };
            println!("{json}");
        }
        Commands::Schema { config } => {
            let schema = if config {
                serde_json::to_string_pretty(&ExtractionConfig::schema())?
            } else {
                serde_json::to_string_pretty(&TokenBundle::schema())?
            };
            println!("{schema}");
        }
    }

    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<RgbImage> {
    let image = match path {
        Some(path) => {
            info!("Reading image from {:?}", path);
            load_image_file(path)?
        }
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            decode_base64_image(&text)?
        }
    };
    Ok(image)
}

async fn extract(pipeline: &Pipeline, image: &RgbImage, walkthrough_dir: Option<&Path>) -> Result<TokenBundle> {
    let Some(dir) = walkthrough_dir else {
        return Ok(pipeline.extract(image).await?);
    };

    let (bundle, walkthroughs) = pipeline.walkthrough(image)?;
    let written = write_walkthroughs(dir, &walkthroughs)?;
    info!("Wrote {} walkthrough images to {:?}", written.len(), dir);
    Ok(bundle)
}
