use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use brochure_core::{
    load_brochure, Config, DirectoryLoader, IngestPipeline, JobRegistry, OpenAiEmbedder,
    OpenAiGenerator, Summarizer,
};

#[derive(Parser, Debug)]
#[command(name = "brochure")]
#[command(about = "Turn uploaded documents into structured brochure content")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest a directory of documents into a new job
    Ingest {
        /// Directory containing PDF/text input files
        input_dir: PathBuf,
        /// Also generate embeddings for the chunks (requires OPENAI_API_KEY)
        #[arg(long)]
        embeddings: bool,
    },
    /// Summarize an ingested job into a structured brochure
    Summarize {
        /// Job identifier from a previous ingest run
        #[arg(long)]
        job_id: String,
    },
    /// Show where a job's brochure lives, ready for a renderer
    Render {
        #[arg(long)]
        job_id: String,
    },
    /// List known jobs, newest first
    Jobs,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("brochure_core=info".parse().expect("valid directive"))
                .add_directive("brochure_cli=info".parse().expect("valid directive")),
        )
        .init();

    // Credentials and overrides may live in a local .env file.
    dotenvy::dotenv().ok();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    if let Err(e) = rt.block_on(run(args)) {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::from_env();

    match args.command {
        Command::Ingest {
            input_dir,
            embeddings,
        } => {
            let mut pipeline = IngestPipeline::new(config.clone(), Arc::new(DirectoryLoader::new()));
            if embeddings {
                let api_key = config.require_api_key()?;
                pipeline = pipeline.with_embedder(Arc::new(OpenAiEmbedder::new(api_key)));
            }

            let receipt = pipeline.ingest(&input_dir, embeddings).await?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        Command::Summarize { job_id } => {
            let api_key = config.require_api_key()?;
            let generator = Arc::new(OpenAiGenerator::new(api_key, &config.model_name));

            let registry = JobRegistry::new(&config.jobs_root);
            let job = registry.locate_job(&job_id)?;

            let summarizer = Summarizer::new(config.clone(), generator);
            let brochure = summarizer.summarize(&job).await?;

            println!("Brochure generated for job {job_id}");
            println!("  Title:      {}", brochure.title);
            println!("  Features:   {}", brochure.key_features.len());
            println!("  Advantages: {}", brochure.competitive_advantages.len());
            println!("  Steps:      {}", brochure.how_it_works.len());
            println!("  Saved to:   {}", job.brochure_path().display());
        }
        Command::Render { job_id } => {
            let registry = JobRegistry::new(&config.jobs_root);
            let job = registry.locate_job(&job_id)?;

            match load_brochure(&job)? {
                Some(brochure) => {
                    println!("Brochure for job {job_id} ({})", brochure.title);
                    println!("  {}", job.brochure_path().display());
                    println!(
                        "No rendering collaborator is bundled; point your renderer at the \
                         brochure file above."
                    );
                }
                None => {
                    anyhow::bail!("job {job_id} has no brochure yet - run `brochure summarize` first")
                }
            }
        }
        Command::Jobs => {
            let registry = JobRegistry::new(&config.jobs_root);
            let ids = registry.list_jobs()?;
            if ids.is_empty() {
                println!("No jobs under {}", config.jobs_root.display());
                return Ok(());
            }
            for id in ids {
                let state = registry.locate_job(&id).and_then(|j| j.state());
                match state {
                    Ok(state) => println!("{id}  [{}]", state.status),
                    Err(_) => println!("{id}  [unknown]"),
                }
            }
        }
    }

    Ok(())
}
