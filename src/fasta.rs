//! Access to an indexed reference genome
//!
//! Wraps [`bio::io::fasta::IndexedReader`]. The Fasta file must be indexed
//! (`samtools faidx`), the index is expected next to it as `<fasta>.fai`.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use bio::io::fasta::{Index, IndexedReader};
use log::info;

use crate::utils::errors::{Error, Result};

/// Reads genomic sequences from an indexed Fasta file
pub struct FastaReader {
    inner: IndexedReader<File>,
    lengths: HashMap<String, u64>,
    buffer: Vec<u8>,
}

impl FastaReader {
    /// Opens the Fasta file and its `.fai` index
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut fai = path.as_os_str().to_owned();
        fai.push(".fai");
        let fai = PathBuf::from(fai);

        if !fai.exists() {
            return Err(Error::Fasta(format!(
                "Fasta index not found: {}. Please create it using: samtools faidx {}",
                fai.display(),
                path.display()
            )));
        }

        let index = Index::from_file(&fai)
            .map_err(|e| Error::Fasta(format!("Failed to load Fasta index: {}", e)))?;
        let lengths: HashMap<String, u64> = index
            .sequences()
            .into_iter()
            .map(|seq| (seq.name, seq.len))
            .collect();
        info!(
            "Loaded reference genome {} with {} sequences",
            path.display(),
            lengths.len()
        );

        Ok(FastaReader {
            inner: IndexedReader::with_index(File::open(path)?, index),
            lengths,
            buffer: Vec::new(),
        })
    }

    /// Resolves `chrom` to the name used in the Fasta file, allowing
    /// for a missing or additional `chr` prefix
    pub fn resolve_chrom(&self, chrom: &str) -> Option<String> {
        if self.lengths.contains_key(chrom) {
            return Some(chrom.to_string());
        }
        let alternative = match chrom.strip_prefix("chr") {
            Some(stripped) => stripped.to_string(),
            None => format!("chr{}", chrom),
        };
        self.lengths.contains_key(&alternative).then_some(alternative)
    }

    /// Length of the chromosome
    pub fn chrom_len(&self, chrom: &str) -> Option<u64> {
        self.resolve_chrom(chrom)
            .and_then(|name| self.lengths.get(&name).copied())
    }

    /// Returns the uppercase sequence of `chrom` from `start` to `end`
    /// (1-based, inclusive)
    ///
    /// Positions outside of the chromosome are filled with `N`, so the
    /// returned sequence always has a length of `end - start + 1`.
    pub fn fetch_padded(&mut self, chrom: &str, start: i64, end: i64) -> Result<Vec<u8>> {
        if end < start {
            return Ok(Vec::new());
        }
        let name = self
            .resolve_chrom(chrom)
            .ok_or_else(|| Error::Fasta(format!("Unknown sequence {}", chrom)))?;
        let chrom_len = self.lengths[&name] as i64;

        let fetch_start = start.max(1);
        let fetch_end = end.min(chrom_len);

        let mut seq = Vec::with_capacity((end - start + 1) as usize);
        seq.resize((fetch_start - start).clamp(0, end - start + 1) as usize, b'N');

        if fetch_start <= fetch_end {
            self.inner
                .fetch(&name, (fetch_start - 1) as u64, fetch_end as u64)
                .map_err(|e| Error::Fasta(format!("{}:{}-{}: {}", name, start, end, e)))?;
            self.buffer.clear();
            self.inner
                .read(&mut self.buffer)
                .map_err(|e| Error::Fasta(format!("{}:{}-{}: {}", name, start, end, e)))?;
            seq.extend(self.buffer.iter().map(|b| b.to_ascii_uppercase()));
        }

        seq.resize((end - start + 1) as usize, b'N');
        Ok(seq)
    }
}
