use crate::core::models::af3::Af3Job;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Af3Error {
    #[error("I/O error for '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid job name '{0}': it must be a plain file name")]
    InvalidJobName(String),
}

/// Writes AlphaFold3 job documents as `<outdir>/<name>.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Af3Writer {
    pretty: bool,
}

impl Af3Writer {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Target path of `job` inside `outdir`.
    pub fn output_path(job: &Af3Job, outdir: &Path) -> Result<PathBuf, Af3Error> {
        validate_job_name(&job.name)?;
        Ok(outdir.join(format!("{}.json", job.name)))
    }

    pub fn write_to(&self, job: &Af3Job, writer: &mut impl Write) -> Result<(), Af3Error> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, job)?;
        } else {
            serde_json::to_writer(&mut *writer, job)?;
        }
        Ok(())
    }

    /// Serialises `job` into `outdir`, replacing an existing file of the same name.
    pub fn write(&self, job: &Af3Job, outdir: &Path) -> Result<PathBuf, Af3Error> {
        let path = Self::output_path(job, outdir)?;
        let io_err = |source| Af3Error::Io {
            path: path.clone(),
            source,
        };

        let file = File::create(&path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        self.write_to(job, &mut writer)?;
        writer.flush().map_err(io_err)?;
        Ok(path)
    }
}

fn validate_job_name(name: &str) -> Result<(), Af3Error> {
    let is_plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0');
    if is_plain {
        Ok(())
    } else {
        Err(Af3Error::InvalidJobName(name.to_string()))
    }
}
