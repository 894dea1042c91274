use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::{info, warn};

use crate::fetcher::{Choice, CurriculumPage, FetchError, PageFetcher};
use crate::model::{Institution, Program};
use crate::parser;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("landing page unreachable: {0}")]
    Landing(#[source] FetchError),
    #[error("could not list institutions: {0}")]
    InstitutionList(#[source] FetchError),
    #[error("no institution could be collected ({requested} requested)")]
    NothingCollected { requested: usize },
}

/// Counters logged once a run ends.
#[derive(Debug, Default)]
struct CollectStats {
    institutions: usize,
    programs: usize,
    unavailable: usize,
    skipped_institutions: usize,
    skipped_programs: usize,
}

/// Owns the fetcher for one run and releases it on every exit path.
struct Session<F: PageFetcher> {
    fetcher: F,
}

impl<F: PageFetcher> Drop for Session<F> {
    fn drop(&mut self) {
        self.fetcher.release();
    }
}

/// Collect the first `target` institutions in portal order, with all of
/// their programs.
///
/// Only an unreachable landing page, an unreadable institution list, or a
/// run that ends with no institution at all is an error. Anything that goes
/// wrong with a single institution or program is logged and skipped. The
/// fetcher is released exactly once before this returns.
pub async fn collect<F: PageFetcher>(fetcher: F, target: usize) -> Result<Vec<Institution>, CollectError> {
    let mut session = Session { fetcher };
    let outcome = run(&mut session.fetcher, target).await;
    outcome
}

async fn run<F: PageFetcher>(fetcher: &mut F, target: usize) -> Result<Vec<Institution>, CollectError> {
    fetcher.load_landing_page().await.map_err(CollectError::Landing)?;
    if target == 0 {
        return Ok(Vec::new());
    }

    let mut choices = fetcher
        .list_institutions()
        .await
        .map_err(CollectError::InstitutionList)?;
    choices.truncate(target);
    info!("Collecting {} institutions", choices.len());

    let pb = ProgressBar::new(choices.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let mut stats = CollectStats::default();
    let mut institutions = Vec::with_capacity(choices.len());

    for choice in &choices {
        match collect_institution(fetcher, choice, &pb, &mut stats).await {
            Ok(institution) => {
                stats.institutions += 1;
                institutions.push(institution);
            }
            Err(e) => {
                stats.skipped_institutions += 1;
                warn!("Skipping institution {}: {}", choice.name, e);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Collected {} institutions, {} programs ({} without curriculum); skipped {} institutions, {} programs",
        stats.institutions,
        stats.programs,
        stats.unavailable,
        stats.skipped_institutions,
        stats.skipped_programs
    );

    if institutions.is_empty() {
        return Err(CollectError::NothingCollected { requested: target });
    }
    Ok(institutions)
}

async fn collect_institution<F: PageFetcher>(
    fetcher: &mut F,
    choice: &Choice,
    pb: &ProgressBar,
    stats: &mut CollectStats,
) -> Result<Institution, FetchError> {
    fetcher.select_institution(&choice.code).await?;
    let programs = fetcher.list_programs().await?;
    let mut institution = Institution::new(&choice.name);

    for (i, program) in programs.iter().enumerate() {
        // Each search leaves the session on a curriculum page.
        if i > 0 {
            if let Err(e) = return_to_institution(fetcher, &choice.code).await {
                stats.skipped_programs += 1;
                warn!("Skipping program {}: reset to {} failed: {}", program.name, choice.name, e);
                continue;
            }
        }

        pb.set_message(program.name.clone());
        match collect_program(fetcher, &institution.name, program).await {
            Ok((collected, published)) => {
                stats.programs += 1;
                if !published {
                    stats.unavailable += 1;
                }
                institution.programs.push(collected);
            }
            Err(e) => {
                stats.skipped_programs += 1;
                warn!("Skipping program {}: {}", program.name, e);
            }
        }
    }

    Ok(institution)
}

async fn return_to_institution<F: PageFetcher>(fetcher: &mut F, code: &str) -> Result<(), FetchError> {
    fetcher.load_landing_page().await?;
    fetcher.select_institution(code).await
}

/// The flag is false when the portal had no curriculum for the program.
async fn collect_program<F: PageFetcher>(
    fetcher: &mut F,
    institution: &str,
    choice: &Choice,
) -> Result<(Program, bool), FetchError> {
    match fetcher.open_curriculum(&choice.code).await? {
        CurriculumPage::Ready(markup) => {
            let curriculum = parser::parse_curriculum(&markup);
            if curriculum.disciplines.is_empty() {
                warn!("Curriculum page for {} lists no disciplines", choice.name);
            }
            let d = curriculum.disciplines;
            Ok((
                Program {
                    name: choice.name.clone(),
                    institution: institution.to_string(),
                    duration: curriculum.duration,
                    mandatory: d.mandatory,
                    free_elective: d.free_elective,
                    restricted_elective: d.restricted_elective,
                },
                true,
            ))
        }
        CurriculumPage::Unavailable => {
            info!("No curriculum published for {}", choice.name);
            Ok((Program::without_curriculum(&choice.name, institution), false))
        }
    }
}

// ── Tests ──
