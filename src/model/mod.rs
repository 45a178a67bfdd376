//! Splicing models predicting the effect of a variant on splice-site usage
//!
//! A model scores every [`Region`] of the reference and the mutated
//! sequence and combines the score differences into a delta logit PSI.

mod linear;

use std::collections::BTreeMap;

use crate::dataloader::{Batch, Region};
use crate::utils::errors::Result;

pub use crate::model::linear::{LinearSpliceModel, RegionWeights};

/// Prediction of a model for a single row of a batch
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelOutput {
    pub delta_logit_psi: f64,
    pub ref_scores: BTreeMap<Region, f64>,
    pub alt_scores: BTreeMap<Region, f64>,
}

impl ModelOutput {
    pub fn ref_score(&self, region: Region) -> f64 {
        self.ref_scores.get(&region).copied().unwrap_or(0.0)
    }

    pub fn alt_score(&self, region: Region) -> f64 {
        self.alt_scores.get(&region).copied().unwrap_or(0.0)
    }
}

/// A model that predicts delta logit PSI for a batch of encoded sequences
pub trait SpliceModel {
    /// Returns one [`ModelOutput`] per row of the batch, in batch order
    fn predict_batch(&self, batch: &Batch) -> Result<Vec<ModelOutput>>;
}

impl<M: SpliceModel + ?Sized> SpliceModel for Box<M> {
    fn predict_batch(&self, batch: &Batch) -> Result<Vec<ModelOutput>> {
        (**self).predict_batch(batch)
    }
}
