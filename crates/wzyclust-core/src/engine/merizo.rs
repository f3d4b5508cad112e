//! Client for the PSIPRED Merizo-search submission API.

use super::config::MerizoConfig;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const MERIZO_JOB: &str = "merizosearch";
const FILE_FIELD: &str = "input_data";
const FILE_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum MerizoError {
    #[error("File not found at {}", path.display())]
    FileNotFound { path: PathBuf },
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

/// Text fields of a Merizo-search submission. The structure itself travels as
/// the `input_data` file part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MerizoJob {
    pub job: String,
    pub submission_name: String,
    pub email: String,
    pub merizosearch_db: String,
    pub merizosearch_chain: String,
}

impl MerizoJob {
    pub fn new(path: &Path, email: &str, chain_id: &str, database: &str) -> Self {
        Self {
            job: MERIZO_JOB.to_string(),
            submission_name: format!("search_{}_{}", path.display(), chain_id),
            email: email.to_string(),
            merizosearch_db: database.to_string(),
            merizosearch_chain: chain_id.to_string(),
        }
    }

    fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("job", &self.job),
            ("submission_name", &self.submission_name),
            ("email", &self.email),
            ("merizosearch_db", &self.merizosearch_db),
            ("merizosearch_chain", &self.merizosearch_chain),
        ]
    }

    fn into_form(self, path: &Path, file_data: Vec<u8>) -> Result<Form, MerizoError> {
        let part = Part::bytes(file_data)
            .file_name(path.display().to_string())
            .mime_str(FILE_CONTENT_TYPE)?;
        let form = self
            .fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| {
                form.text(name, value.to_string())
            });
        Ok(form.part(FILE_FIELD, part))
    }
}

#[derive(Debug, Clone)]
pub struct MerizoClient {
    http: reqwest::Client,
    api_url: String,
}

impl MerizoClient {
    pub fn new(config: &MerizoConfig) -> Result<Self, MerizoError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Uploads one structure file and returns the server's JSON reply.
    pub async fn submit(
        &self,
        path: &Path,
        email: &str,
        chain_id: &str,
        database: &str,
    ) -> Result<serde_json::Value, MerizoError> {
        let file_data = tokio::fs::read(path).await.map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                MerizoError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                MerizoError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let job = MerizoJob::new(path, email, chain_id, database);
        info!("Submitting job: {}", job.submission_name);
        debug!(
            "Uploading {} bytes from {} to {}",
            file_data.len(),
            path.display(),
            self.api_url
        );
        let form = job.into_form(path, file_data)?;

        let response = self.http.post(&self.api_url).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(MerizoError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| MerizoError::InvalidResponse(e.to_string()))
    }

    /// Submits with the email, chain and database of `config`.
    pub async fn submit_with(
        &self,
        path: &Path,
        config: &MerizoConfig,
    ) -> Result<serde_json::Value, MerizoError> {
        self.submit(path, &config.email, &config.chain_id, &config.database)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::MerizoConfigBuilder;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SUBMIT_PATH: &str = "/psipred/api/submission.json";

    fn pdb_file() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".pdb").tempfile().unwrap();
        writeln!(
            file,
            "ATOM      1  N   MET A   1      11.104   6.134  -6.504  1.00  0.00           N"
        )
        .unwrap();
        file
    }

    fn client_for(server: &MockServer) -> MerizoClient {
        let config = MerizoConfigBuilder::new()
            .api_url(format!("{}{}", server.uri(), SUBMIT_PATH))
            .build()
            .unwrap();
        MerizoClient::new(&config).unwrap()
    }

    #[test]
    fn job_fields_follow_submission_naming() {
        let job = MerizoJob::new(Path::new("models/wzy1.pdb"), "me@lab.org", "B", "cath");
        assert_eq!(job.job, "merizosearch");
        assert_eq!(job.submission_name, "search_models/wzy1.pdb_B");
        assert_eq!(job.merizosearch_db, "cath");
        assert_eq!(job.merizosearch_chain, "B");
        let names: Vec<&str> = job.fields().iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "job",
                "submission_name",
                "email",
                "merizosearch_db",
                "merizosearch_chain"
            ]
        );
    }

    #[tokio::test]
    async fn submit_posts_multipart_form_and_parses_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SUBMIT_PATH))
            .and(body_string_contains("name=\"job\""))
            .and(body_string_contains("merizosearch"))
            .and(body_string_contains("name=\"input_data\""))
            .and(body_string_contains("application/octet-stream"))
            .and(body_string_contains("ATOM      1  N   MET"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"UUID": "abc-123", "state": "Submitted"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let file = pdb_file();
        let reply = client_for(&server)
            .submit(file.path(), "me@lab.org", "A", "ted")
            .await
            .unwrap();
        assert_eq!(reply["UUID"], "abc-123");
    }

    #[tokio::test]
    async fn submission_name_and_email_are_sent() {
        let server = MockServer::start().await;
        let file = pdb_file();
        let expected_name = format!("search_{}_A", file.path().display());
        Mock::given(method("POST"))
            .and(body_string_contains(expected_name.as_str()))
            .and(body_string_contains("me@lab.org"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let config = MerizoConfigBuilder::new()
            .api_url(format!("{}{}", server.uri(), SUBMIT_PATH))
            .email("me@lab.org")
            .build()
            .unwrap();
        let client = MerizoClient::new(&config).unwrap();
        client.submit_with(file.path(), &config).await.unwrap();
    }

    #[tokio::test]
    async fn http_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad chain"))
            .mount(&server)
            .await;

        let file = pdb_file();
        let err = client_for(&server)
            .submit(file.path(), "me@lab.org", "A", "ted")
            .await
            .unwrap_err();
        match err {
            MerizoError::Http { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad chain");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_reply_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let file = pdb_file();
        let err = client_for(&server)
            .submit(file.path(), "me@lab.org", "A", "ted")
            .await
            .unwrap_err();
        assert!(matches!(err, MerizoError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn missing_file_is_reported_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .submit(Path::new("/no/such/model.pdb"), "me@lab.org", "A", "ted")
            .await
            .unwrap_err();
        assert!(matches!(err, MerizoError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn unreadable_path_is_an_io_error_naming_the_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();

        let err = client_for(&server)
            .submit(dir.path(), "me@lab.org", "A", "ted")
            .await
            .unwrap_err();
        assert!(matches!(err, MerizoError::Io { ref path, .. } if path == dir.path()));
    }
}
