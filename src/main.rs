use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use transit_insight::config::Config;
use transit_insight::error::{find_pipeline_error, PipelineError};
use transit_insight::models::TopicSummary;
use transit_insight::output::terminal;
use transit_insight::pipeline::{PipelineRunner, Resources, Stage};
use transit_insight::store::tables::read_json;
use transit_insight::store::{Artifact, DataDir};

/// transit-insight: topic, sentiment and location analytics for public
/// transport posts.
///
/// Reads the scraper's raw_data.csv from the data directory and writes one
/// CSV per pipeline stage next to it.
#[derive(Parser)]
#[command(name = "transit-insight", version, about)]
struct Cli {
    /// Abort on the first malformed raw row instead of skipping it
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean raw_data.csv into cleaned.csv and count mentions
    Clean,

    /// Embed the cleaned corpus
    Embed,

    /// Group documents into topics and show them
    Topics,

    /// Cluster documents with k-means
    Cluster {
        /// Number of clusters (default: TI_CLUSTERS or 6)
        #[arg(long)]
        k: Option<usize>,
    },

    /// Score sentiment and extract locations
    Score {
        /// Documents scored in parallel (default: TI_CONCURRENCY or 8)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Join every table into results.csv
    Merge,

    /// Run the whole pipeline
    Run {
        /// Start from this stage instead of clean
        #[arg(long)]
        from: Option<Stage>,
    },

    /// Print the insight dashboard from results.csv
    Insights,

    /// Normalize a single text and print the result
    Normalize {
        /// Text to normalize
        text: String,
    },

    /// Download the ONNX embedding and sentiment models
    DownloadModel,

    /// Show which artifacts exist and which stage runs next
    Status,

    /// Serve the JSON API
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (default: TI_PORT or 8000)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (default: TI_BIND or 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("transit_insight=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    config.strict |= cli.strict;

    let result = run_command(cli.command, config).await;
    if let Err(e) = &result {
        if let Some(PipelineError::MissingInput { path }) = find_pipeline_error(e) {
            eprintln!(
                "{} {} is missing. Run `transit-insight status` to see which stage comes next.",
                "!".red().bold(),
                path.display()
            );
        }
    }
    result
}

async fn run_command(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Clean => run_stages(&config, &[Stage::Clean]).await,
        Commands::Embed => run_stages(&config, &[Stage::Embed]).await,
        Commands::Topics => {
            run_stages(&config, &[Stage::Topics]).await?;
            show_topics(&config)
        }
        Commands::Cluster { k } => {
            if let Some(k) = k {
                config.clusters = k;
            }
            run_stages(&config, &[Stage::Cluster]).await
        }
        Commands::Score { concurrency } => {
            if let Some(n) = concurrency {
                config.concurrency = n.max(1);
            }
            run_stages(&config, &[Stage::Score]).await
        }
        Commands::Merge => run_stages(&config, &[Stage::Merge]).await,

        Commands::Run { from } => {
            let start = from.unwrap_or(Stage::Clean);
            let stages: Vec<Stage> = Stage::ALL
                .into_iter()
                .skip_while(|s| *s != start)
                .collect();
            run_stages(&config, &stages).await?;
            show_topics(&config)?;
            println!("{}", "Pipeline complete.".bold());
            Ok(())
        }

        Commands::Insights => {
            let data = DataDir::new(&config.data_dir);
            let insights = transit_insight::insights::generate(&data, config.top_keywords)?;
            terminal::display_insights(&insights);
            Ok(())
        }

        Commands::Normalize { text } => {
            let normalizer = transit_insight::text::Normalizer::new(&config.aliases);
            println!("{}", normalizer.normalize(Some(&text)).aliased);
            Ok(())
        }

        Commands::DownloadModel => {
            let model_dir = &config.model_dir;

            println!("Downloading ONNX models...");
            println!("  Destination: {}", model_dir.display());

            transit_insight::download::download_model(model_dir).await?;

            println!("\n{}", "Models downloaded successfully.".bold());
            println!("The next `transit-insight run` will use them instead of the builtin fallbacks.");
            Ok(())
        }

        Commands::Status => transit_insight::status::show(&config),

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }
            let resources = Resources::from_config(&config).await?;
            transit_insight::web::run_server(config, resources).await
        }
    }
}

async fn run_stages(config: &Config, stages: &[Stage]) -> Result<()> {
    let resources = Resources::from_config(config).await?;
    let runner = PipelineRunner::new(config, &resources);

    info!(
        data_dir = %config.data_dir.display(),
        stages = stages.len(),
        "Starting pipeline"
    );
    let reports = runner.run(stages).await?;
    terminal::display_reports(&reports);
    Ok(())
}

fn show_topics(config: &Config) -> Result<()> {
    let data = DataDir::new(&config.data_dir);
    if !data.exists(Artifact::TopicInfo) {
        return Ok(());
    }
    let summaries: Vec<TopicSummary> = read_json(&data.path(Artifact::TopicInfo))?;
    terminal::display_topics(&summaries);
    Ok(())
}
