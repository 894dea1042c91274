use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use super::{decode_choices, wait_for, Choice, CurriculumPage, FetchError, PageFetcher, Waits};

/// Same layout as [`super::ReplayFetcher`], served over HTTP from a mirror.
/// `404` means the page is not there yet.
pub struct HttpFetcher {
    client: Client,
    base: String,
    waits: Waits,
    institutions: Option<Vec<Choice>>,
    programs: Option<Vec<Choice>>,
    released: bool,
}

impl HttpFetcher {
    pub fn new(base: &str, waits: Waits, request_timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(HttpFetcher {
            client,
            base: base.trim_end_matches('/').to_string(),
            waits,
            institutions: None,
            programs: None,
            released: false,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    fn ensure_open(&self) -> Result<(), FetchError> {
        if self.released {
            Err(FetchError::Released)
        } else {
            Ok(())
        }
    }

    async fn wait_for_page(&self, what: &str, path: &str, limit: Duration) -> Result<String, FetchError> {
        let client = self.client.clone();
        let url = self.url(path);
        wait_for(what, limit, self.waits.poll, move || get_optional(client.clone(), url.clone())).await
    }
}

impl PageFetcher for HttpFetcher {
    async fn load_landing_page(&mut self) -> Result<(), FetchError> {
        self.ensure_open()?;
        let body = self
            .wait_for_page("institution selector", "institutions.json", self.waits.ready)
            .await?;
        let institutions = decode_choices("institutions", &body)?;
        info!("Landing page: {} institutions at {}", institutions.len(), self.base);
        self.institutions = Some(institutions);
        self.programs = None;
        Ok(())
    }

    async fn list_institutions(&mut self) -> Result<Vec<Choice>, FetchError> {
        self.ensure_open()?;
        self.institutions.clone().ok_or_else(|| FetchError::NotReady {
            what: "landing page".to_string(),
            waited: Duration::ZERO,
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
        let body = self
            .wait_for_page("program selector", &format!("programs/{}.json", code), self.waits.ready)
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

        let client = self.client.clone();
        let page = self.url(&format!("curriculum/{}.html", program_code));
        let error_box = self.url(&format!("curriculum/{}.err", program_code));
        let outcome = wait_for("curriculum tab", self.waits.curriculum, self.waits.poll, move || {
            probe_curriculum(client.clone(), page.clone(), error_box.clone())
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
            debug!("Releasing HTTP session {}", self.base);
            self.released = true;
            self.institutions = None;
            self.programs = None;
        }
    }
}

async fn get_optional(client: Client, url: String) -> Result<Option<String>, FetchError> {
    let response = client.get(&url).send().await?;
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(FetchError::Status { url, status });
    }
    Ok(Some(response.text().await?))
}

async fn probe_curriculum(
    client: Client,
    page: String,
    error_box: String,
) -> Result<Option<CurriculumPage>, FetchError> {
    if let Some(body) = get_optional(client.clone(), page).await? {
        return Ok(Some(CurriculumPage::Ready(body)));
    }
    if get_optional(client, error_box).await?.is_some() {
        return Ok(Some(CurriculumPage::Unavailable));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Minimal HTTP/1.1 responder over fixed routes.
    async fn serve(routes: Vec<(&'static str, u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                let (status, body) = routes
                    .iter()
                    .find(|(p, _, _)| *p == path)
                    .map(|(_, s, b)| (*s, *b))
                    .unwrap_or((404, ""));
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(reply.as_bytes()).await;
            }
        });
        format!("http://{}/", addr)
    }

    fn quick() -> Waits {
        Waits {
            ready: Duration::from_millis(50),
            curriculum: Duration::from_millis(50),
            poll: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn walks_a_mirrored_session() {
        let base = serve(vec![
            ("/institutions.json", 200, r#"[{"code": "86", "name": "EACH (EACH)"}]"#),
            ("/programs/86.json", 200, r#"[{"code": "86010", "name": "Lic."}, {"code": "", "name": "-"}]"#),
            ("/curriculum/86010.html", 200, "<html>grade</html>"),
            ("/curriculum/86020.err", 200, "Curso sem grade"),
            ("/curriculum/86030.html", 500, "boom"),
        ])
        .await;

        let mut f = HttpFetcher::new(&base, quick(), Duration::from_secs(5)).unwrap();
        f.load_landing_page().await.unwrap();
        assert_eq!(f.list_institutions().await.unwrap().len(), 1);
        f.select_institution("86").await.unwrap();
        assert_eq!(f.list_programs().await.unwrap().len(), 1);

        assert_eq!(
            f.open_curriculum("86010").await.unwrap(),
            CurriculumPage::Ready("<html>grade</html>".to_string())
        );
        assert_eq!(f.open_curriculum("86020").await.unwrap(), CurriculumPage::Unavailable);
        assert!(matches!(
            f.open_curriculum("86030").await,
            Err(FetchError::Status { .. })
        ));

        f.release();
        f.release();
        assert!(matches!(f.list_programs().await, Err(FetchError::Released)));
    }

    #[tokio::test]
    async fn landing_page_times_out() {
        let base = serve(Vec::new()).await;
        let mut f = HttpFetcher::new(&base, quick(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            f.load_landing_page().await,
            Err(FetchError::NotReady { .. })
        ));
    }
}
