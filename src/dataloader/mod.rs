//! Variant/junction pairs with their reference and mutated sequences
//!
//! The [`SpliceOutlierDataloader`] iterates over every junction of the
//! reference tables and yields one [`Row`] for every variant in the
//! sequence window of the junction's splice site. The 5' splice-site
//! events (`ref_table5`) are yielded first, followed by the 3' splice-site
//! events (`ref_table3`).
//!
//! ```rust,no_run
//! use splicing_outlier::dataloader::{DataloaderOptions, SpliceOutlierDataloader};
//!
//! let mut dl = SpliceOutlierDataloader::new(
//!     "genome.fa",
//!     "variants.vcf.gz",
//!     Some("ref_table5.csv".into()),
//!     None,
//!     DataloaderOptions::default(),
//! )
//! .unwrap();
//!
//! for batch in dl.batch_iter(32) {
//!     let batch = batch.unwrap();
//!     println!("{} rows", batch.len());
//! }
//! ```

mod batch;
mod splitter;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::fasta::FastaReader;
use crate::models::EventType;
use crate::ref_table::{RefJunction, SplicingRefTable};
use crate::utils::errors::{Error, Result};
use crate::vcf::VariantIndex;

pub use crate::dataloader::batch::{Batch, EncodedRegions, Inputs};
pub use crate::dataloader::splitter::{DataloaderOptions, Region, SiteWindow, SplitSeq};

/// A reference table, given either as file or as already loaded table
#[derive(Clone, Debug)]
pub enum RefTableInput {
    Path(PathBuf),
    Table(SplicingRefTable),
}

impl RefTableInput {
    fn load(self) -> Result<SplicingRefTable> {
        match self {
            RefTableInput::Path(path) => SplicingRefTable::read_csv(path),
            RefTableInput::Table(table) => Ok(table),
        }
    }
}

impl From<&str> for RefTableInput {
    fn from(path: &str) -> Self {
        RefTableInput::Path(PathBuf::from(path))
    }
}

impl From<PathBuf> for RefTableInput {
    fn from(path: PathBuf) -> Self {
        RefTableInput::Path(path)
    }
}

impl From<SplicingRefTable> for RefTableInput {
    fn from(table: SplicingRefTable) -> Self {
        RefTableInput::Table(table)
    }
}

/// Variant information attached to a row
#[derive(Clone, Debug, PartialEq)]
pub struct VariantMeta {
    /// `chrom:pos:ref>alt`
    pub id: String,
    /// Semicolon separated carriers, `None` if the VCF has no samples
    pub samples: Option<String>,
    pub maf: f64,
}

/// Junction information attached to a row, joined from the reference table
#[derive(Clone, Debug, PartialEq)]
pub struct JunctionMeta {
    pub junction: String,
    pub event_type: EventType,
    pub splice_site: String,
    pub ref_row: RefJunction,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Metadata {
    pub variant: VariantMeta,
    pub junction: JunctionMeta,
}

/// A single variant/junction pair
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub seq: SplitSeq,
    pub mut_seq: SplitSeq,
    pub metadata: Metadata,
}

/// Iterates over all variant/junction pairs of the reference tables
pub struct SpliceOutlierDataloader {
    fasta: FastaReader,
    variants: VariantIndex,
    ref_table5: Option<SplicingRefTable>,
    ref_table3: Option<SplicingRefTable>,
    options: DataloaderOptions,
    // event types still to iterate, with the next junction index
    streams: VecDeque<(EventType, usize)>,
    pending: VecDeque<Row>,
}

impl SpliceOutlierDataloader {
    /// Creates a dataloader from a Fasta and a VCF file
    ///
    /// At least one of `ref_table5` and `ref_table3` must be given.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        fasta_file: P,
        vcf_file: Q,
        ref_table5: Option<RefTableInput>,
        ref_table3: Option<RefTableInput>,
        options: DataloaderOptions,
    ) -> Result<Self> {
        if ref_table5.is_none() && ref_table3.is_none() {
            return Err(Error::MissingRefTable);
        }
        let fasta = FastaReader::from_file(fasta_file)?;
        let variants = VariantIndex::from_vcf(vcf_file)?;
        Self::from_parts(
            fasta,
            variants,
            ref_table5.map(RefTableInput::load).transpose()?,
            ref_table3.map(RefTableInput::load).transpose()?,
            options,
        )
    }

    /// Creates a dataloader from an opened genome and loaded variants
    pub fn from_parts(
        fasta: FastaReader,
        variants: VariantIndex,
        ref_table5: Option<SplicingRefTable>,
        ref_table3: Option<SplicingRefTable>,
        options: DataloaderOptions,
    ) -> Result<Self> {
        let mut streams = VecDeque::with_capacity(2);
        if let Some(table) = &ref_table5 {
            info!("Reference table 5' splice sites: {} junctions", table.len());
            streams.push_back((EventType::Psi5, 0));
        }
        if let Some(table) = &ref_table3 {
            info!("Reference table 3' splice sites: {} junctions", table.len());
            streams.push_back((EventType::Psi3, 0));
        }
        if streams.is_empty() {
            return Err(Error::MissingRefTable);
        }

        Ok(SpliceOutlierDataloader {
            fasta,
            variants,
            ref_table5,
            ref_table3,
            options,
            streams,
            pending: VecDeque::new(),
        })
    }

    pub fn ref_table5(&self) -> Option<&SplicingRefTable> {
        self.ref_table5.as_ref()
    }

    pub fn ref_table3(&self) -> Option<&SplicingRefTable> {
        self.ref_table3.as_ref()
    }

    /// True if the variants carry sample information
    pub fn has_samples(&self) -> bool {
        self.variants.has_samples()
    }

    /// Returns an iterator over encoded batches of `batch_size` rows
    pub fn batch_iter(&mut self, batch_size: usize) -> Batches<'_> {
        Batches {
            dataloader: self,
            batch_size: batch_size.max(1),
        }
    }

    /// Collects all rows of the next junction of the current event stream
    ///
    /// Returns `Ok(false)` once all streams are exhausted.
    fn fill_pending(&mut self) -> Result<bool> {
        let Self {
            fasta,
            variants,
            ref_table5,
            ref_table3,
            options,
            streams,
            pending,
        } = self;

        let (event_type, cursor) = match streams.front_mut() {
            Some(stream) => stream,
            None => return Ok(false),
        };
        let table = match event_type {
            EventType::Psi5 => ref_table5.as_ref(),
            EventType::Psi3 => ref_table3.as_ref(),
        }
        .ok_or(Error::MissingRefTable)?;

        let Some(junction_row) = table.row(*cursor) else {
            debug!("Finished {} events", event_type);
            streams.pop_front();
            return Ok(true);
        };
        *cursor += 1;
        let event_type = *event_type;

        let junction_id = junction_row.id();
        let ref_row = table.get(&junction_id)?;
        let window = SiteWindow::new(&ref_row.junction(), event_type, options);
        let start = window.start().max(1) as u64;
        let end = window.end().max(1) as u64;

        for variant in variants.query(&window.chrom, start, end) {
            let (seq, mut_seq) = match window.sequences(fasta, variant)? {
                Some(seqs) => seqs,
                None => {
                    warn!(
                        "Reference allele of {} does not match the genome. Skipping",
                        variant
                    );
                    continue;
                }
            };
            pending.push_back(Row {
                seq: SplitSeq::split(&seq, event_type, options),
                mut_seq: SplitSeq::split(&mut_seq, event_type, options),
                metadata: Metadata {
                    variant: VariantMeta {
                        id: variant.id(),
                        samples: variant.samples_field(),
                        maf: variant.maf,
                    },
                    junction: JunctionMeta {
                        junction: junction_id.clone(),
                        event_type,
                        splice_site: ref_row.splice_site(event_type),
                        ref_row: ref_row.clone(),
                    },
                },
            });
        }
        Ok(true)
    }
}

impl Iterator for SpliceOutlierDataloader {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            match self.fill_pending() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Encoded batches of a [`SpliceOutlierDataloader`]
pub struct Batches<'a> {
    dataloader: &'a mut SpliceOutlierDataloader,
    batch_size: usize,
}

impl Iterator for Batches<'_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut rows = Vec::with_capacity(self.batch_size);
        while rows.len() < self.batch_size {
            match self.dataloader.next() {
                Some(Ok(row)) => rows.push(row),
                Some(Err(err)) => return Some(Err(err)),
                None => break,
            }
        }
        if rows.is_empty() {
            None
        } else {
            Some(Ok(Batch::from_rows(rows)))
        }
    }
}
