use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;

use crate::dataloader::{Batch, Region};
use crate::model::{ModelOutput, SpliceModel};
use crate::models::{EventType, OneHot};
use crate::utils::errors::{Error, Result};

/// Position weight matrix and linear coefficient of one region
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RegionWeights {
    pub coef: f64,
    /// One row per position, columns in `A C G T` order
    pub pwm: Vec<[f64; 4]>,
}

impl RegionWeights {
    /// Scores a one-hot encoded sequence
    ///
    /// Sequence and matrix are aligned at the start, or at the end if
    /// `anchor_right` is set. Positions without counterpart are ignored.
    pub fn score(&self, seq: &[OneHot], anchor_right: bool) -> f64 {
        let n = seq.len().min(self.pwm.len());
        let (seq, pwm) = if anchor_right {
            (&seq[seq.len() - n..], &self.pwm[self.pwm.len() - n..])
        } else {
            (&seq[..n], &self.pwm[..n])
        };
        seq.iter()
            .zip(pwm)
            .map(|(base, weights)| {
                base.iter()
                    .zip(weights)
                    .map(|(b, w)| *b as f64 * w)
                    .sum::<f64>()
            })
            .sum()
    }
}

#[derive(Deserialize)]
struct WeightsFile {
    regions: BTreeMap<String, RegionWeights>,
}

/// Linear combination of per-region position weight matrices
///
/// Every region of reference and mutated sequence is scored with its
/// weight matrix. The delta logit PSI is the coefficient-weighted sum of
/// the score differences:
///
/// `delta_logit_psi = sum(coef_r * (alt_r - ref_r))`
///
/// The weights are stored as JSON:
///
/// ```json
/// {"regions": {"donor": {"coef": 1.2, "pwm": [[0.1, 0.2, 0.3, 0.4], ...]}, ...}}
/// ```
///
/// Region names are `acceptor_intron`, `acceptor`, `exon`, `donor`
/// and `donor_intron`. Regions without weights do not contribute.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinearSpliceModel {
    regions: BTreeMap<Region, RegionWeights>,
}

impl LinearSpliceModel {
    pub fn new(regions: BTreeMap<Region, RegionWeights>) -> Self {
        LinearSpliceModel { regions }
    }

    /// Loads the model weights from a JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Loading model weights from {}", path.as_ref().display());
        Self::from_reader(BufReader::new(File::open(path.as_ref())?))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let weights: WeightsFile = serde_json::from_reader(reader)?;
        let mut regions = BTreeMap::new();
        for (name, region_weights) in weights.regions {
            let region: Region = name.parse()?;
            debug!(
                "Region {} with {} positions",
                region,
                region_weights.pwm.len()
            );
            regions.insert(region, region_weights);
        }
        if regions.is_empty() {
            return Err(Error::parse("Model weights do not define any region"));
        }
        Ok(Self::new(regions))
    }

    fn anchor_right(region: Region, event_type: EventType) -> bool {
        match region {
            Region::AcceptorIntron => true,
            Region::Exon => event_type == EventType::Psi5,
            _ => false,
        }
    }
}

impl SpliceModel for LinearSpliceModel {
    fn predict_batch(&self, batch: &Batch) -> Result<Vec<ModelOutput>> {
        let mut outputs = Vec::with_capacity(batch.len());
        for (idx, metadata) in batch.metadata.iter().enumerate() {
            let event_type = metadata.junction.event_type;
            let mut output = ModelOutput::default();

            for (region, weights) in &self.regions {
                let anchor_right = Self::anchor_right(*region, event_type);
                let ref_score = batch
                    .inputs
                    .seq
                    .get(region)
                    .and_then(|seqs| seqs.get(idx))
                    .map_or(0.0, |seq| weights.score(seq, anchor_right));
                let alt_score = batch
                    .inputs
                    .mut_seq
                    .get(region)
                    .and_then(|seqs| seqs.get(idx))
                    .map_or(0.0, |seq| weights.score(seq, anchor_right));

                output.delta_logit_psi += weights.coef * (alt_score - ref_score);
                output.ref_scores.insert(*region, ref_score);
                output.alt_scores.insert(*region, alt_score);
            }
            outputs.push(output);
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::encode_dna;

    const WEIGHTS: &str = r#"{
        "regions": {
            "donor": {"coef": 2.0, "pwm": [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]]},
            "exon": {"coef": 0.5, "pwm": [[0.0, 0.0, 1.0, 0.0]]}
        }
    }"#;

    #[test]
    fn test_load_weights() {
        let model = LinearSpliceModel::from_reader(WEIGHTS.as_bytes()).unwrap();
        assert_eq!(model.regions.len(), 2);
        assert_eq!(model.regions[&Region::Donor].coef, 2.0);
    }

    #[test]
    fn test_invalid_region() {
        let weights = r#"{"regions": {"branchpoint": {"coef": 1.0, "pwm": []}}}"#;
        assert!(LinearSpliceModel::from_reader(weights.as_bytes()).is_err());
        assert!(LinearSpliceModel::from_reader(r#"{"regions": {}}"#.as_bytes()).is_err());
    }

    #[test]
    fn test_score_alignment() {
        let weights = RegionWeights {
            coef: 1.0,
            pwm: vec![[1.0, 0.0, 0.0, 0.0], [0.0, 2.0, 0.0, 0.0]],
        };
        let seq = encode_dna("ACA");
        // left: A C -> 1 + 2
        assert_eq!(weights.score(&seq, false), 3.0);
        // right: C A -> 0 + 0
        assert_eq!(weights.score(&seq, true), 0.0);
        assert_eq!(weights.score(&[], true), 0.0);
    }
}
