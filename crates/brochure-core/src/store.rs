//! Chunk store: line-delimited JSON records per job.
//!
//! One record per line, `{"text": ..., "metadata": {...}}`, written
//! in input order. Line order carries semantic meaning (sequential
//! reading order of the source), so both writer and reader preserve
//! it. The format stays streaming-appendable: records are serialized
//! one at a time through a buffered writer, and read back lazily.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::PathBuf;

use crate::chunking::Chunk;
use crate::error::{PipelineError, Result};
use crate::jobs::Job;

/// Write `chunks` to the job's chunk file in input order, replacing
/// any prior contents. Returns the chunk file path.
pub fn write_chunks(job: &Job, chunks: &[Chunk]) -> Result<PathBuf> {
    let path = job.chunks_path();
    let mut writer = BufWriter::new(File::create(&path)?);

    for chunk in chunks {
        let line = serde_json::to_string(chunk)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    tracing::info!(job_id = %job.id(), count = chunks.len(), path = %path.display(), "Saved chunks");
    Ok(path)
}

/// Lazy reader over a job's chunk file.
///
/// Lines that fail to parse are skipped with a warning and counted in
/// [`ChunkReader::skipped`]; the remaining chunks still come through.
#[derive(Debug)]
pub struct ChunkReader {
    lines: Lines<BufReader<File>>,
    path: PathBuf,
    line_no: usize,
    skipped: usize,
}

impl ChunkReader {
    /// Number of malformed lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for ChunkReader {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Chunk>(&line) {
                Ok(chunk) => return Some(Ok(chunk)),
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!(
                        path = %self.path.display(),
                        line = self.line_no,
                        error = %e,
                        "Skipping malformed chunk line"
                    );
                }
            }
        }
    }
}

/// Open the job's chunk file for streaming reads. Fails with
/// `NotFound` when the file is absent (ingestion has not run).
pub fn read_chunks(job: &Job) -> Result<ChunkReader> {
    let path = job.chunks_path();
    let file = File::open(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PipelineError::NotFound(format!("chunk file for job {}", job.id()))
        } else {
            e.into()
        }
    })?;

    Ok(ChunkReader {
        lines: BufReader::new(file).lines(),
        path,
        line_no: 0,
        skipped: 0,
    })
}

/// Read all chunks for a job, returning them in write order together
/// with the number of malformed lines skipped.
pub fn read_all(job: &Job) -> Result<(Vec<Chunk>, usize)> {
    let mut reader = read_chunks(job)?;
    let mut chunks = Vec::new();
    for chunk in reader.by_ref() {
        chunks.push(chunk?);
    }
    Ok((chunks, reader.skipped()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobRegistry;
    use crate::loader::RawDocument;

    fn chunk(text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            metadata: RawDocument::new("", "test.txt").metadata,
        }
    }

    #[test]
    fn read_back_preserves_write_order() {
        let dir = tempfile::tempdir().unwrap();
        let job = JobRegistry::new(dir.path()).create_job().unwrap();

        let written: Vec<Chunk> = (0..10).map(|i| chunk(&format!("chunk {i}"))).collect();
        write_chunks(&job, &written).unwrap();

        let (read, skipped) = read_all(&job).unwrap();
        assert_eq!(read, written);
        assert_eq!(skipped, 0);
    }

    #[test]
    fn missing_chunk_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let job = JobRegistry::new(dir.path()).create_job().unwrap();
        let err = read_chunks(&job).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[test]
    fn malformed_lines_are_skipped_and_counted() {
        let dir = tempfile::tempdir().unwrap();
        let job = JobRegistry::new(dir.path()).create_job().unwrap();

        let good = serde_json::to_string(&chunk("valid one")).unwrap();
        let good2 = serde_json::to_string(&chunk("valid two")).unwrap();
        std::fs::write(
            job.chunks_path(),
            format!("{good}\n{{\"text\": truncated\n{good2}\n"),
        )
        .unwrap();

        let (chunks, skipped) = read_all(&job).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(skipped, 1);
        assert_eq!(chunks[0].text, "valid one");
        assert_eq!(chunks[1].text, "valid two");
    }

    #[test]
    fn rewrite_replaces_prior_contents() {
        let dir = tempfile::tempdir().unwrap();
        let job = JobRegistry::new(dir.path()).create_job().unwrap();

        write_chunks(&job, &[chunk("old a"), chunk("old b")]).unwrap();
        write_chunks(&job, &[chunk("new")]).unwrap();

        let (chunks, _) = read_all(&job).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "new");
    }
}
