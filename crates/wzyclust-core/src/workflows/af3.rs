use crate::core::io::af3::Af3Writer;
use crate::core::io::fasta::FastaFile;
use crate::core::io::traits::SequenceFile;
use crate::core::models::af3::Af3Job;
use crate::core::models::sequence::SequenceRecord;
use crate::engine::config::Af3Config;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Converts every record of every FASTA file into an AlphaFold3 job under `outdir`.
///
/// The output directory is created if needed. Records sharing a name overwrite the
/// earlier document; each written path is returned once, in first-write order.
#[instrument(skip_all, name = "af3_workflow")]
pub fn run(
    fastas: &[PathBuf],
    outdir: &Path,
    config: &Af3Config,
    reporter: &ProgressReporter,
) -> Result<Vec<PathBuf>, EngineError> {
    let records = reporter.phase("Reading FASTA", || read_records(fastas))?;
    info!(
        "Read {} sequence records from {} FASTA file(s).",
        records.len(),
        fastas.len()
    );

    std::fs::create_dir_all(outdir).map_err(|source| EngineError::OutputDirectory {
        path: outdir.to_path_buf(),
        source,
    })?;

    let writer = Af3Writer::new(config.pretty);
    let written = reporter.phase("Writing AlphaFold3 jobs", || {
        reporter.report(Progress::TaskStart {
            total_steps: records.len() as u64,
        });
        let mut seen = HashSet::new();
        let mut written = Vec::with_capacity(records.len());
        for record in &records {
            let job = Af3Job::from_record(record, config);
            let path = writer.write(&job, outdir)?;
            if seen.insert(path.clone()) {
                written.push(path);
            } else {
                warn!(
                    "Duplicate sequence name '{}'; {} was overwritten.",
                    record.name,
                    path.display()
                );
            }
            reporter.report(Progress::TaskIncrement);
        }
        reporter.report(Progress::TaskFinish);
        Ok::<_, EngineError>(written)
    })?;

    if written.is_empty() {
        warn!("No sequence records found; nothing was written.");
    } else {
        info!(
            "Wrote {} AlphaFold3 job(s) to {}.",
            written.len(),
            outdir.display()
        );
    }
    reporter.report(Progress::Message(format!(
        "Wrote {} AlphaFold3 job(s) to {}",
        written.len(),
        outdir.display()
    )));
    Ok(written)
}

fn read_records(fastas: &[PathBuf]) -> Result<Vec<SequenceRecord>, EngineError> {
    let mut records = Vec::new();
    for path in fastas {
        let mut batch = FastaFile::read_from_path(path).map_err(|source| EngineError::Fasta {
            path: path.clone(),
            source,
        })?;
        if batch.is_empty() {
            warn!("No records found in {}.", path.display());
        }
        records.append(&mut batch);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::af3::SequenceEntry;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn read_job(path: &Path) -> Af3Job {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn writes_one_job_per_record_into_nested_outdir() {
        let dir = tempdir().unwrap();
        let a = write(
            dir.path(),
            "a.fasta",
            ">WzyA_1 putative polymerase\nMKT\nLLV\n\n>WzyA_2\nMSS\n",
        );
        let b = write(dir.path(), "b.fa", ">WzyB_1\nMQQ\n");
        let outdir = dir.path().join("jobs/af3");

        let written = run(
            &[a, b],
            &outdir,
            &Af3Config::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["WzyA_1.json", "WzyA_2.json", "WzyB_1.json"]);

        let job = read_job(&outdir.join("WzyA_1.json"));
        assert_eq!(job.name, "WzyA_1");
        assert_eq!(job.model_seeds, vec![1]);
        let SequenceEntry::Protein(chain) = &job.sequences[0];
        assert_eq!(chain.sequence, "MKTLLV");
    }

    #[test]
    fn duplicate_names_overwrite_and_are_listed_once() {
        let dir = tempdir().unwrap();
        let fasta = write(dir.path(), "dup.fasta", ">X\nAAA\n>X\nCCC\n");
        let outdir = dir.path().join("out");

        let written = run(
            &[fasta],
            &outdir,
            &Af3Config::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(written.len(), 1);
        let SequenceEntry::Protein(chain) = &read_job(&written[0]).sequences[0];
        assert_eq!(chain.sequence, "CCC");
    }

    #[test]
    fn missing_fasta_is_an_error_naming_the_file() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.fasta");

        let err = run(
            &[missing.clone()],
            dir.path(),
            &Af3Config::default(),
            &ProgressReporter::new(),
        )
        .unwrap_err();

        match err {
            EngineError::Fasta { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reports_phases_and_one_increment_per_record() {
        let dir = tempdir().unwrap();
        let fasta = write(dir.path(), "s.fasta", ">a\nM\n>b\nK\n");
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|p| {
            events.lock().unwrap().push(p);
        }));

        run(&[fasta], dir.path(), &Af3Config::default(), &reporter).unwrap();
        drop(reporter);

        let events = events.into_inner().unwrap();
        assert_eq!(events[0], Progress::PhaseStart { name: "Reading FASTA" });
        assert!(events.contains(&Progress::TaskStart { total_steps: 2 }));
        let increments = events
            .iter()
            .filter(|e| **e == Progress::TaskIncrement)
            .count();
        assert_eq!(increments, 2);
        assert_eq!(
            events.last(),
            Some(&Progress::Message(format!(
                "Wrote 2 AlphaFold3 job(s) to {}",
                dir.path().display()
            )))
        );
    }
}
