//! Delta PSI predictions for variant/junction pairs
//!
//! [`SpliceOutlier`] runs a [`SpliceModel`] on the batches of a
//! [`SpliceOutlierDataloader`] and converts the predicted delta logit PSI
//! into delta PSI, based on the reference PSI of the junction.

mod writer;

use std::path::Path;

use log::{debug, info};
use serde::Deserialize;

use crate::dataloader::{Batch, Region, SpliceOutlierDataloader};
use crate::model::SpliceModel;
use crate::models::{EventType, Strand};
use crate::result::SplicingOutlierResult;
use crate::utils::errors::{Error, Result};
use crate::utils::{delta_logit_psi_to_delta_psi, get_progress_bar, CLIP_THRESHOLD};

pub use crate::predict::writer::Writer;

/// Default number of variant/junction pairs per batch
pub const BATCH_SIZE: usize = 512;

const SAMPLES_COLUMN: usize = 10;

/// Prediction for a single variant/junction pair
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PredictionRow {
    pub variant: String,
    pub junction: String,
    pub event_type: EventType,
    #[serde(rename = "Chromosome")]
    pub chrom: String,
    #[serde(rename = "Start")]
    pub start: u64,
    #[serde(rename = "End")]
    pub end: u64,
    #[serde(rename = "Strand")]
    pub strand: Strand,
    #[serde(default)]
    pub splice_site: Option<String>,
    #[serde(default)]
    pub gene_id: Option<String>,
    #[serde(default)]
    pub gene_name: Option<String>,
    #[serde(default)]
    pub samples: Option<String>,
    #[serde(default)]
    pub maf: f64,
    pub ref_psi: f64,
    #[serde(default)]
    pub k: Option<u64>,
    #[serde(default)]
    pub n: Option<u64>,
    #[serde(default)]
    pub median_n: Option<f64>,
    pub delta_logit_psi: f64,
    pub delta_psi: f64,
    #[serde(rename = "ref_acceptorIntron", default)]
    pub ref_acceptor_intron: f64,
    #[serde(rename = "ref_acceptor", default)]
    pub ref_acceptor: f64,
    #[serde(rename = "ref_exon", default)]
    pub ref_exon: f64,
    #[serde(rename = "ref_donor", default)]
    pub ref_donor: f64,
    #[serde(rename = "ref_donorIntron", default)]
    pub ref_donor_intron: f64,
    #[serde(rename = "alt_acceptorIntron", default)]
    pub alt_acceptor_intron: f64,
    #[serde(rename = "alt_acceptor", default)]
    pub alt_acceptor: f64,
    #[serde(rename = "alt_exon", default)]
    pub alt_exon: f64,
    #[serde(rename = "alt_donor", default)]
    pub alt_donor: f64,
    #[serde(rename = "alt_donorIntron", default)]
    pub alt_donor_intron: f64,
}

impl PredictionRow {
    /// Output columns, in the order of [`PredictionRow::fields`]
    pub const COLUMNS: [&'static str; 28] = [
        "variant",
        "junction",
        "event_type",
        "Chromosome",
        "Start",
        "End",
        "Strand",
        "splice_site",
        "gene_id",
        "gene_name",
        "samples",
        "maf",
        "ref_psi",
        "k",
        "n",
        "median_n",
        "delta_logit_psi",
        "delta_psi",
        "ref_acceptorIntron",
        "ref_acceptor",
        "ref_exon",
        "ref_donor",
        "ref_donorIntron",
        "alt_acceptorIntron",
        "alt_acceptor",
        "alt_exon",
        "alt_donor",
        "alt_donorIntron",
    ];

    /// Output columns, without `samples` if the variants have no carriers
    pub fn columns(with_samples: bool) -> Vec<&'static str> {
        Self::COLUMNS
            .iter()
            .filter(|column| with_samples || **column != "samples")
            .copied()
            .collect()
    }

    /// Returns the row as CSV fields, matching [`PredictionRow::columns`]
    pub fn record(&self, with_samples: bool) -> Vec<String> {
        let mut fields = self.fields();
        if !with_samples {
            fields.remove(SAMPLES_COLUMN);
        }
        fields
    }

    /// Returns the row as CSV fields, matching [`PredictionRow::COLUMNS`]
    pub fn fields(&self) -> Vec<String> {
        fn opt<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map(|v| v.to_string()).unwrap_or_default()
        }
        vec![
            self.variant.clone(),
            self.junction.clone(),
            self.event_type.to_string(),
            self.chrom.clone(),
            self.start.to_string(),
            self.end.to_string(),
            self.strand.to_string(),
            opt(&self.splice_site),
            opt(&self.gene_id),
            opt(&self.gene_name),
            opt(&self.samples),
            self.maf.to_string(),
            self.ref_psi.to_string(),
            opt(&self.k),
            opt(&self.n),
            opt(&self.median_n),
            self.delta_logit_psi.to_string(),
            self.delta_psi.to_string(),
            self.ref_acceptor_intron.to_string(),
            self.ref_acceptor.to_string(),
            self.ref_exon.to_string(),
            self.ref_donor.to_string(),
            self.ref_donor_intron.to_string(),
            self.alt_acceptor_intron.to_string(),
            self.alt_acceptor.to_string(),
            self.alt_exon.to_string(),
            self.alt_donor.to_string(),
            self.alt_donor_intron.to_string(),
        ]
    }

    /// Individual carriers of the variant
    pub fn sample_list(&self) -> Vec<String> {
        self.samples
            .as_deref()
            .map(|samples| {
                samples
                    .split(';')
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn set_scores(&mut self, region: Region, ref_score: f64, alt_score: f64) {
        let (r, a) = match region {
            Region::AcceptorIntron => (&mut self.ref_acceptor_intron, &mut self.alt_acceptor_intron),
            Region::Acceptor => (&mut self.ref_acceptor, &mut self.alt_acceptor),
            Region::Exon => (&mut self.ref_exon, &mut self.alt_exon),
            Region::Donor => (&mut self.ref_donor, &mut self.alt_donor),
            Region::DonorIntron => (&mut self.ref_donor_intron, &mut self.alt_donor_intron),
        };
        *r = ref_score;
        *a = alt_score;
    }
}

/// Predicts splicing outliers with a [`SpliceModel`]
pub struct SpliceOutlier<M: SpliceModel> {
    model: M,
    clip_threshold: Option<f64>,
}

impl<M: SpliceModel> SpliceOutlier<M> {
    /// `clip_threshold` bounds the reference PSI away from 0 and 1
    /// (default [`CLIP_THRESHOLD`])
    pub fn new(model: M, clip_threshold: Option<f64>) -> Self {
        SpliceOutlier {
            model,
            clip_threshold,
        }
    }

    pub fn clip_threshold(&self) -> f64 {
        self.clip_threshold.unwrap_or(CLIP_THRESHOLD)
    }

    /// Predicts all variant/junction pairs of a batch
    pub fn predict_on_batch(&self, batch: &Batch) -> Result<Vec<PredictionRow>> {
        let outputs = self.model.predict_batch(batch)?;
        if outputs.len() != batch.len() {
            return Err(Error::parse(format!(
                "Model returned {} predictions for a batch of {}",
                outputs.len(),
                batch.len()
            )));
        }

        let clip_threshold = self.clip_threshold();
        Ok(batch
            .metadata
            .iter()
            .zip(outputs)
            .map(|(meta, output)| {
                let ref_row = &meta.junction.ref_row;
                let mut row = PredictionRow {
                    variant: meta.variant.id.clone(),
                    junction: meta.junction.junction.clone(),
                    event_type: meta.junction.event_type,
                    chrom: ref_row.chrom.clone(),
                    start: ref_row.start,
                    end: ref_row.end,
                    strand: ref_row.strand,
                    splice_site: Some(meta.junction.splice_site.clone()),
                    gene_id: ref_row.gene_id.clone(),
                    gene_name: ref_row.gene_name.clone(),
                    samples: meta.variant.samples.clone(),
                    maf: meta.variant.maf,
                    ref_psi: ref_row.psi,
                    k: ref_row.k,
                    n: ref_row.n,
                    median_n: ref_row.median_n,
                    delta_logit_psi: output.delta_logit_psi,
                    delta_psi: delta_logit_psi_to_delta_psi(
                        output.delta_logit_psi,
                        ref_row.psi,
                        clip_threshold,
                        None,
                    ),
                    ref_acceptor_intron: 0.0,
                    ref_acceptor: 0.0,
                    ref_exon: 0.0,
                    ref_donor: 0.0,
                    ref_donor_intron: 0.0,
                    alt_acceptor_intron: 0.0,
                    alt_acceptor: 0.0,
                    alt_exon: 0.0,
                    alt_donor: 0.0,
                    alt_donor_intron: 0.0,
                };
                for region in Region::ALL {
                    row.set_scores(region, output.ref_score(region), output.alt_score(region));
                }
                row
            })
            .collect())
    }

    /// Calls `f` with the predictions of every batch of the dataloader
    fn for_each_batch<F>(
        &self,
        dataloader: &mut SpliceOutlierDataloader,
        batch_size: usize,
        progress: bool,
        mut f: F,
    ) -> Result<usize>
    where
        F: FnMut(Vec<PredictionRow>) -> Result<()>,
    {
        let pb = get_progress_bar(progress, "Predicting...");
        let mut n_rows = 0;
        for batch in dataloader.batch_iter(batch_size) {
            let rows = self.predict_on_batch(&batch?)?;
            debug!("Predicted batch of {} rows", rows.len());
            n_rows += rows.len();
            f(rows)?;
            pb.inc(1);
        }
        pb.finish_and_clear();
        info!("Predicted {} variant/junction pairs", n_rows);
        Ok(n_rows)
    }

    /// Predicts all pairs of the dataloader and keeps them in memory
    pub fn predict_on_dataloader(
        &self,
        dataloader: &mut SpliceOutlierDataloader,
        batch_size: usize,
        progress: bool,
    ) -> Result<SplicingOutlierResult> {
        let mut rows = Vec::new();
        self.for_each_batch(dataloader, batch_size, progress, |batch| {
            rows.extend(batch);
            Ok(())
        })?;
        Ok(SplicingOutlierResult::new(rows, dataloader.has_samples()))
    }

    /// Predicts all pairs of the dataloader and writes them batch by batch
    /// to `output_csv`. Returns the number of written rows.
    pub fn predict_save<P: AsRef<Path>>(
        &self,
        dataloader: &mut SpliceOutlierDataloader,
        output_csv: P,
        batch_size: usize,
        progress: bool,
    ) -> Result<usize> {
        info!("Writing predictions to {}", output_csv.as_ref().display());
        let with_samples = dataloader.has_samples();
        let mut writer = Writer::from_file(output_csv)?;
        writer.write_header(&PredictionRow::columns(with_samples))?;
        let n_rows = self.for_each_batch(dataloader, batch_size, progress, |rows| {
            writer.write_rows(&rows, with_samples)
        })?;
        writer.flush()?;
        Ok(n_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataloader::{JunctionMeta, Metadata, Row, SplitSeq, VariantMeta};
    use crate::model::ModelOutput;
    use crate::models::Junction;
    use crate::ref_table::RefJunction;
    use crate::utils::{expit, logit};

    struct ConstantModel(f64);

    impl SpliceModel for ConstantModel {
        fn predict_batch(&self, batch: &Batch) -> Result<Vec<ModelOutput>> {
            Ok((0..batch.len())
                .map(|_| {
                    let mut output = ModelOutput {
                        delta_logit_psi: self.0,
                        ..Default::default()
                    };
                    output.ref_scores.insert(Region::Donor, 1.5);
                    output.alt_scores.insert(Region::Donor, 0.5);
                    output
                })
                .collect())
        }
    }

    struct BrokenModel;

    impl SpliceModel for BrokenModel {
        fn predict_batch(&self, _batch: &Batch) -> Result<Vec<ModelOutput>> {
            Ok(Vec::new())
        }
    }

    fn row(variant: &str, psi: f64, samples: Option<&str>) -> Row {
        let junction = Junction::new("1", 101, 200, Strand::Plus);
        Row {
            seq: SplitSeq::default(),
            mut_seq: SplitSeq::default(),
            metadata: Metadata {
                variant: VariantMeta {
                    id: variant.to_string(),
                    samples: samples.map(|s| s.to_string()),
                    maf: 0.05,
                },
                junction: JunctionMeta {
                    junction: junction.to_string(),
                    event_type: EventType::Psi5,
                    splice_site: junction.splice_site(EventType::Psi5),
                    ref_row: RefJunction::new(&junction, psi).with_gene_id("G1"),
                },
            },
        }
    }

    #[test]
    fn test_predict_on_batch() {
        let batch = Batch::from_rows(vec![
            row("1:105:A>T", 0.5, Some("S1;S2")),
            row("1:106:C>A", 0.0, None),
        ]);
        let model = SpliceOutlier::new(ConstantModel(-2.0), None);
        let rows = model.predict_on_batch(&batch).unwrap();
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(first.variant, "1:105:A>T");
        assert_eq!(first.junction, "1:101-200:+");
        assert_eq!(first.splice_site.as_deref(), Some("1:101:+"));
        assert_eq!(first.gene_id.as_deref(), Some("G1"));
        assert_eq!(first.ref_psi, 0.5);
        assert_eq!(first.maf, 0.05);
        assert_eq!(first.sample_list(), vec!["S1", "S2"]);
        assert_eq!(first.ref_donor, 1.5);
        assert_eq!(first.alt_donor, 0.5);
        assert_eq!(first.ref_exon, 0.0);
        assert!((first.delta_psi - (expit(-2.0) - 0.5)).abs() < 1e-12);

        // ref_psi is clipped before the conversion
        let second = &rows[1];
        assert_eq!(second.ref_psi, 0.0);
        let expected = expit(-2.0 + logit(0.01)) - 0.01;
        assert!((second.delta_psi - expected).abs() < 1e-12);
    }

    #[test]
    fn test_clip_threshold() {
        let batch = Batch::from_rows(vec![row("1:105:A>T", 1.0, None)]);
        let model = SpliceOutlier::new(ConstantModel(0.0), Some(0.1));
        assert_eq!(model.clip_threshold(), 0.1);
        let rows = model.predict_on_batch(&batch).unwrap();
        assert!(rows[0].delta_psi.abs() < 1e-12);
    }

    #[test]
    fn test_model_output_mismatch() {
        let batch = Batch::from_rows(vec![row("1:105:A>T", 0.5, None)]);
        let model = SpliceOutlier::new(BrokenModel, None);
        assert!(model.predict_on_batch(&batch).is_err());
    }

    #[test]
    fn test_fields_match_columns() {
        let batch = Batch::from_rows(vec![row("1:105:A>T", 0.5, None)]);
        let model = SpliceOutlier::new(ConstantModel(1.0), None);
        let rows = model.predict_on_batch(&batch).unwrap();
        let fields = rows[0].fields();
        assert_eq!(fields.len(), PredictionRow::COLUMNS.len());
        assert_eq!(fields[0], "1:105:A>T");
        assert_eq!(fields[10], "");
        assert_eq!(fields[12], "0.5");

        let record = rows[0].record(false);
        assert_eq!(record.len(), PredictionRow::columns(false).len());
        assert_eq!(record[10], "0.05");
        assert_eq!(record[11], "0.5");
        assert_eq!(PredictionRow::columns(false)[10], "maf");
        assert_eq!(rows[0].record(true), fields);
    }
}
