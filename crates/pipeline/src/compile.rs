//! Compilation pass: select clips, encode them into one file, then record
//! the footage in the used-cuts ledger.

use std::collections::HashMap;
use std::path::PathBuf;

use collage_core::assembly::{build_filter_graph, compilation_file_name, AssemblyClip, Resolution};
use collage_core::ffmpeg::MediaTools;
use collage_core::selection::{
    collect_candidates, total_duration, ClipSelector, TimeSlice, DEFAULT_BRACKET,
};
use collage_core::types::{DbId, Seconds, Timestamp};
use collage_db::models::used_cut::CreateUsedCut;
use collage_db::repositories::UsedCutRepo;
use collage_db::DbPool;
use rand::Rng;
use serde::Serialize;

use crate::config::CollageConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::library::load_snapshot;

/// Per-run compilation settings.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    pub resolution: Resolution,
    pub target_duration: Seconds,
    /// Plan only: no encoding and no ledger update.
    pub dry_run: bool,
}

/// A clip of the plan, resolved to its source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedClip {
    pub movie_id: DbId,
    pub folder: String,
    pub source: PathBuf,
    pub position: f64,
    pub slice: TimeSlice,
}

/// Clips in assembly order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompilationPlan {
    pub clips: Vec<PlannedClip>,
    pub total_duration: Seconds,
}

impl CompilationPlan {
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// What a compilation run produced.
#[derive(Debug, Clone)]
pub struct CompileOutcome {
    pub plan: CompilationPlan,
    /// The encoded file. `None` for dry runs and empty selections.
    pub output: Option<PathBuf>,
    /// Rows appended to the used-cuts ledger.
    pub ledger_rows: u64,
}

/// Run the clip selector over the current ratings and used cuts.
pub async fn plan_compilation<R: Rng + ?Sized>(
    pool: &DbPool,
    config: &CollageConfig,
    target_duration: Seconds,
    rng: &mut R,
) -> PipelineResult<CompilationPlan> {
    let snapshot = load_snapshot(pool, config).await?;
    let used_cuts = UsedCutRepo::list_grouped(pool).await?;

    let mut ratings = HashMap::new();
    let mut durations = HashMap::new();
    let mut folders = HashMap::new();
    for m in &snapshot.movies {
        ratings.insert(m.movie.id, m.ratings());
        durations.insert(m.movie.id, m.movie.duration());
        folders.insert(m.movie.id, (m.movie.folder.clone(), m.movie.filename.clone()));
    }

    let candidates = collect_candidates(&ratings, DEFAULT_BRACKET);
    let candidate_count = candidates.len();
    let selector = ClipSelector {
        sampling: config.sampling,
        durations: &durations,
        used_cuts: &used_cuts,
        target_duration,
    };
    let selected = selector.plan(candidates, rng);
    let total = total_duration(&selected);

    tracing::info!(
        movies = snapshot.movies.len(),
        skipped = snapshot.skipped,
        candidates = candidate_count,
        clips = selected.len(),
        total_duration = total,
        "Clip selection finished",
    );

    let clips = selected
        .into_iter()
        .filter_map(|clip| {
            let (folder, filename) = folders.get(&clip.movie_id)?;
            Some(PlannedClip {
                movie_id: clip.movie_id,
                folder: folder.clone(),
                source: config.movie_dir(folder).join(filename),
                position: clip.position,
                slice: clip.slice,
            })
        })
        .collect();

    Ok(CompilationPlan {
        clips,
        total_duration: total,
    })
}

/// Plan, encode and record one compilation.
pub async fn compile<M: MediaTools, R: Rng + ?Sized>(
    pool: &DbPool,
    config: &CollageConfig,
    media: &M,
    options: CompileOptions,
    now: Timestamp,
    rng: &mut R,
) -> PipelineResult<CompileOutcome> {
    let plan = plan_compilation(pool, config, options.target_duration, rng).await?;

    if plan.is_empty() {
        tracing::warn!("No clips selected; nothing to encode");
        return Ok(CompileOutcome {
            plan,
            output: None,
            ledger_rows: 0,
        });
    }
    if options.dry_run {
        return Ok(CompileOutcome {
            plan,
            output: None,
            ledger_rows: 0,
        });
    }

    tokio::fs::create_dir_all(&config.collage_dir)
        .await
        .map_err(|e| PipelineError::io(&config.collage_dir, e))?;
    let name = compilation_file_name(now, rng);
    let output = config.collage_dir.join(&name);

    let clips: Vec<AssemblyClip> = plan
        .clips
        .iter()
        .map(|c| AssemblyClip {
            source: c.source.clone(),
            slice: c.slice,
        })
        .collect();
    let graph = build_filter_graph(&clips, options.resolution);

    tracing::info!(
        output = %output.display(),
        clips = clips.len(),
        resolution = %options.resolution,
        "Encoding compilation",
    );
    media.encode(&graph.ffmpeg_args(&output)).await?;

    let cuts: Vec<CreateUsedCut> = plan
        .clips
        .iter()
        .map(|c| CreateUsedCut::new(c.movie_id, c.slice))
        .collect();
    let ledger_rows = UsedCutRepo::append_many(pool, &name, &cuts).await?;
    tracing::info!(compilation = %name, rows = ledger_rows, "Recorded used cuts");

    Ok(CompileOutcome {
        plan,
        output: Some(output),
        ledger_rows,
    })
}
