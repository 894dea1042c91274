use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{decode_choices, wait_for, Choice, CurriculumPage, FetchError, PageFetcher, Waits};

/// Replays a portal session saved to a directory:
///
/// ```text
/// institutions.json            [{"code": "86", "name": "..."}]
/// programs/<institution>.json  [{"code": "86010", "name": "..."}]
/// curriculum/<program>.html    rendered curriculum tab
/// curriculum/<program>.err     error box shown instead of the tab
/// ```
///
/// A page counts as ready once its file exists, so a directory that is
/// still being written behaves like a slow portal.
pub struct ReplayFetcher {
    root: PathBuf,
    waits: Waits,
    institutions: Option<Vec<Choice>>,
    programs: Option<Vec<Choice>>,
    released: bool,
}

impl ReplayFetcher {
    pub fn new(root: impl Into<PathBuf>, waits: Waits) -> Self {
        ReplayFetcher {
            root: root.into(),
            waits,
            institutions: None,
            programs: None,
            released: false,
        }
    }

    fn ensure_open(&self) -> Result<(), FetchError> {
        if self.released {
            Err(FetchError::Released)
        } else {
            Ok(())
        }
    }
}

impl PageFetcher for ReplayFetcher {
    async fn load_landing_page(&mut self) -> Result<(), FetchError> {
        self.ensure_open()?;
        let path = self.root.join("institutions.json");
        let body = wait_for("institution selector", self.waits.ready, self.waits.poll, || {
            read_if_present(path.clone())
        })
        .await?;
        let institutions = decode_choices("institutions", &body)?;
        info!("Landing page: {} institutions in {}", institutions.len(), self.root.display());
        self.institutions = Some(institutions);
        self.programs = None;
        Ok(())
    }

    async fn list_institutions(&mut self) -> Result<Vec<Choice>, FetchError> {
        self.ensure_open()?;
        self.institutions.clone().ok_or_else(|| FetchError::NotReady {
            what: "landing page".to_string(),
            waited: Default::default(),
        })
    }

    async fn select_institution(&mut self, code: &str) -> Result<(), FetchError> {
        self.ensure_open()?;
        let known = self
            .institutions
            .as_ref()
            .is_some_and(|list| list.iter().any(|c| c.code == code));
        if !known {
            return Err(FetchError::UnknownInstitution(code.to_string()));
        }

        self.programs = None;
        let path = self.root.join("programs").join(format!("{}.json", code));
        let body = wait_for("program selector", self.waits.ready, self.waits.poll, || {
            read_if_present(path.clone())
        })
        .await?;
        self.programs = Some(decode_choices("programs", &body)?);
        Ok(())
    }

    async fn list_programs(&mut self) -> Result<Vec<Choice>, FetchError> {
        self.ensure_open()?;
        self.programs.clone().ok_or(FetchError::NoInstitution)
    }

    async fn open_curriculum(&mut self, program_code: &str) -> Result<CurriculumPage, FetchError> {
        self.ensure_open()?;
        if self.programs.is_none() {
            return Err(FetchError::NoInstitution);
        }

        let dir = self.root.join("curriculum");
        let page = dir.join(format!("{}.html", program_code));
        let error_box = dir.join(format!("{}.err", program_code));
        let outcome = wait_for("curriculum tab", self.waits.curriculum, self.waits.poll, || {
            probe_curriculum(page.clone(), error_box.clone())
        })
        .await;

        match outcome {
            Ok(page) => Ok(page),
            Err(FetchError::NotReady { .. }) => {
                debug!("No curriculum tab for program {}", program_code);
                Ok(CurriculumPage::Unavailable)
            }
            Err(e) => Err(e),
        }
    }

    fn release(&mut self) {
        if !self.released {
            debug!("Releasing replay session {}", self.root.display());
            self.released = true;
            self.institutions = None;
            self.programs = None;
        }
    }
}

async fn read_if_present(path: PathBuf) -> Result<Option<String>, FetchError> {
    match tokio::fs::read_to_string(&path).await {
        Ok(body) => Ok(Some(body)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn probe_curriculum(page: PathBuf, error_box: PathBuf) -> Result<Option<CurriculumPage>, FetchError> {
    if let Some(body) = read_if_present(page).await? {
        return Ok(Some(CurriculumPage::Ready(body)));
    }
    if exists(&error_box).await? {
        return Ok(Some(CurriculumPage::Unavailable));
    }
    Ok(None)
}

async fn exists(path: &Path) -> Result<bool, FetchError> {
    Ok(tokio::fs::try_exists(path).await?)
}
