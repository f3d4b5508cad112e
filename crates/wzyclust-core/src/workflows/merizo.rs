use crate::engine::config::MerizoConfig;
use crate::engine::error::EngineError;
use crate::engine::merizo::{MerizoClient, MerizoError};
use crate::engine::progress::{Progress, ProgressReporter};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

const STRUCTURE_EXTENSION: &str = "pdb";

/// Result of one attempted submission.
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub path: PathBuf,
    pub result: Result<serde_json::Value, MerizoError>,
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Whether `path` names a PDB structure (`.pdb`, case-sensitive).
pub fn is_structure_file(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(STRUCTURE_EXTENSION))
}

/// Submits every `.pdb` path to Merizo-search, one at a time.
///
/// Paths with any other extension are skipped. A failed submission is logged and
/// reported, and the remaining paths are still submitted.
#[instrument(skip_all, name = "merizo_workflow")]
pub async fn run(
    pdbs: &[PathBuf],
    config: &MerizoConfig,
    reporter: &ProgressReporter<'_>,
) -> Result<Vec<SubmissionOutcome>, EngineError> {
    let client = MerizoClient::new(config)?;

    let (structures, others): (Vec<&PathBuf>, Vec<&PathBuf>) =
        pdbs.iter().partition(|p| is_structure_file(p));
    for path in others {
        info!("Skipping {}: not a .pdb file.", path.display());
        reporter.skipped(path.display(), "not a .pdb file");
    }

    reporter.report(Progress::PhaseStart {
        name: "Submitting structures",
    });
    reporter.report(Progress::TaskStart {
        total_steps: structures.len() as u64,
    });

    let mut outcomes = Vec::with_capacity(structures.len());
    for path in structures {
        let result = client.submit_with(path, config).await;
        match &result {
            Ok(reply) => info!("Successfully submitted {}. Response: {}", path.display(), reply),
            Err(e) => {
                warn!("Error submitting job for {}: {}", path.display(), e);
                reporter.failed(path.display(), e);
            }
        }
        outcomes.push(SubmissionOutcome {
            path: path.clone(),
            result,
        });
        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    info!(
        "Submitted {} of {} structure(s) to {}.",
        succeeded,
        outcomes.len(),
        client.api_url()
    );
    reporter.report(Progress::Message(format!(
        "Submitted {} of {} structure(s)",
        succeeded,
        outcomes.len()
    )));
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::MerizoConfigBuilder;
    use serde_json::json;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn only_lowercase_pdb_extension_is_a_structure() {
        assert!(is_structure_file(Path::new("models/wzy.pdb")));
        assert!(!is_structure_file(Path::new("models/wzy.cif")));
        assert!(!is_structure_file(Path::new("models/wzy.PDB")));
        assert!(!is_structure_file(Path::new("pdb")));
    }

    #[tokio::test]
    async fn skips_non_pdb_and_continues_after_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"UUID": "u1"})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.pdb");
        let present = dir.path().join("wzy.pdb");
        fs::write(&present, "END\n").unwrap();
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, "not a structure").unwrap();

        let config = MerizoConfigBuilder::new()
            .api_url(format!("{}/submission.json", server.uri()))
            .build()
            .unwrap();
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|p| {
            events.lock().unwrap().push(p);
        }));

        let outcomes = run(
            &[missing.clone(), notes.clone(), present.clone()],
            &config,
            &reporter,
        )
        .await
        .unwrap();
        drop(reporter);

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].path, missing);
        assert!(matches!(
            outcomes[0].result,
            Err(MerizoError::FileNotFound { .. })
        ));
        assert_eq!(outcomes[1].path, present);
        assert_eq!(outcomes[1].result.as_ref().unwrap()["UUID"], "u1");

        let events = events.into_inner().unwrap();
        assert!(events.iter().any(
            |e| matches!(e, Progress::Skipped { item, .. } if item == &notes.display().to_string())
        ));
        assert!(events.iter().any(|e| matches!(e, Progress::Failed { .. })));
        assert_eq!(
            events.last(),
            Some(&Progress::Message("Submitted 1 of 2 structure(s)".to_string()))
        );
    }

    #[tokio::test]
    async fn server_errors_do_not_abort_the_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(2)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let paths: Vec<PathBuf> = ["a.pdb", "b.pdb"]
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                fs::write(&path, "END\n").unwrap();
                path
            })
            .collect();
        let config = MerizoConfigBuilder::new()
            .api_url(server.uri())
            .build()
            .unwrap();

        let outcomes = run(&paths, &config, &ProgressReporter::new())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| matches!(
            o.result,
            Err(MerizoError::Http { status: 503, .. })
        )));
    }
}
