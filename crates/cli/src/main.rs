//! `collage`: review thumbnails and build compilations from a movie library.
//!
//! Results go to stdout (one path per line for `review`, so the output can
//! be piped into an image viewer). Diagnostics go to stderr.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use collage_core::assembly::{Resolution, DEFAULT_RESOLUTION};
use collage_core::ffmpeg::Ffmpeg;
use collage_core::format::{VideoFormat, BASIC_FIELD_OF_VIEW, BASIC_ORIENTATION, BASIC_PERSPECTIVE};
use collage_core::review::MAX_REVIEW_BATCH;
use collage_core::selection::DEFAULT_TARGET_DURATION_SECS;
use collage_core::thumbnail::Rating;
use collage_pipeline::compile::{compile, CompileOptions};
use collage_pipeline::extraction::extract_missing_thumbnails;
use collage_pipeline::registration::{register_all, register_movie};
use collage_pipeline::review::{rate_thumbnail, review_batch};
use collage_pipeline::CollageConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "collage")]
#[command(about = "Curate thumbnails and assemble compilations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the movie in RAW_DIR/<folder>
    Add {
        folder: String,

        #[arg(long, default_value = BASIC_FIELD_OF_VIEW)]
        fov: String,

        #[arg(long, default_value = BASIC_ORIENTATION)]
        orientation: String,

        #[arg(long, default_value = BASIC_PERSPECTIVE)]
        perspective: String,

        /// Movie file inside the folder, when there is more than one
        #[arg(long)]
        file: Option<String>,
    },

    /// Register every movie folder in RAW_DIR, honouring metadata.yaml overrides
    Scan,

    /// Extract thumbnails for movies that have none yet
    Thumbs,

    /// Print the next thumbnails to rate
    Review {
        #[arg(short, long, default_value_t = MAX_REVIEW_BATCH)]
        limit: usize,
    },

    /// Rate a thumbnail
    Rate {
        path: PathBuf,

        /// good or bad
        rating: String,
    },

    /// Select clips and encode a compilation
    Compile {
        #[arg(short, long, default_value = DEFAULT_RESOLUTION)]
        resolution: String,

        /// Target duration in seconds
        #[arg(short, long, default_value_t = DEFAULT_TARGET_DURATION_SECS)]
        duration: f64,

        /// Print the plan without encoding or recording used cuts
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collage=info,collage_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = CollageConfig::from_env()?;

    let pool = collage_db::create_pool(&config.database_url)
        .await
        .with_context(|| format!("opening {}", config.database_url))?;
    collage_db::run_migrations(&pool).await?;
    tracing::info!(
        database = %config.database_url,
        raw_dir = %config.raw_dir.display(),
        "Library opened",
    );

    let media = Ffmpeg;
    let mut rng = rand::rng();

    match cli.command {
        Commands::Add {
            folder,
            fov,
            orientation,
            perspective,
            file,
        } => {
            let format = VideoFormat {
                fov,
                orientation,
                perspective,
            };
            let movie =
                register_movie(&pool, &config, &media, &folder, format, file.as_deref()).await?;
            println!("{}\t{}\t{:.1}s", movie.folder, movie.filename, movie.duration());
        }
        Commands::Scan => {
            for movie in register_all(&pool, &config, &media).await? {
                println!("{}\t{}\t{:.1}s", movie.folder, movie.filename, movie.duration());
            }
        }
        Commands::Thumbs => {
            let summary = extract_missing_thumbnails(&pool, &config, &media).await?;
            println!(
                "extracted {} thumbnails for {} movies",
                summary.thumbnails_written, summary.movies_extracted
            );
        }
        Commands::Review { limit } => {
            let batch = review_batch(&pool, &config, limit, &mut rng).await?;
            for path in batch.thumbnails {
                println!("{}", path.display());
            }
        }
        Commands::Rate { path, rating } => {
            let rating = Rating::parse(&rating)?;
            let thumb = rate_thumbnail(&pool, &config, &path, rating).await?;
            tracing::debug!(
                movie_id = thumb.movie_id,
                filename = %thumb.filename,
                "Rating stored",
            );
        }
        Commands::Compile {
            resolution,
            duration,
            dry_run,
        } => {
            let options = CompileOptions {
                resolution: Resolution::parse(&resolution)?,
                target_duration: duration,
                dry_run,
            };
            let outcome =
                compile(&pool, &config, &media, options, chrono::Utc::now(), &mut rng).await?;

            for clip in &outcome.plan.clips {
                println!(
                    "{:.3}\t{}\t{:.3}\t{:.3}",
                    clip.position, clip.folder, clip.slice.start, clip.slice.end
                );
            }
            match outcome.output {
                Some(path) => {
                    tracing::info!(
                        output = %path.display(),
                        clips = outcome.plan.clips.len(),
                        "Compilation written",
                    );
                    println!("{}", path.display());
                }
                None if outcome.plan.is_empty() => println!("no clips selected"),
                None => println!("dry run: {:.1}s planned", outcome.plan.total_duration),
            }
        }
    }

    Ok(())
}
