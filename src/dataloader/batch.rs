use std::collections::BTreeMap;

use crate::dataloader::splitter::{Region, SplitSeq};
use crate::dataloader::{Metadata, Row};
use crate::models::{encode_dna, OneHot};

/// One-hot encoded sequences of a batch, per model region
///
/// `regions[region][i]` is the encoded sequence of the i-th row of the batch.
pub type EncodedRegions = BTreeMap<Region, Vec<Vec<OneHot>>>;

/// Reference and mutated sequences of a batch
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inputs {
    pub seq: EncodedRegions,
    pub mut_seq: EncodedRegions,
}

/// A chunk of variant/junction pairs, encoded for the splicing model
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Batch {
    pub inputs: Inputs,
    pub metadata: Vec<Metadata>,
}

impl Batch {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let seq = encode_batch_seq(rows.iter().map(|row| &row.seq));
        let mut_seq = encode_batch_seq(rows.iter().map(|row| &row.mut_seq));
        Batch {
            inputs: Inputs { seq, mut_seq },
            metadata: rows.into_iter().map(|row| row.metadata).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }
}

fn encode_batch_seq<'a, I>(seqs: I) -> EncodedRegions
where
    I: Iterator<Item = &'a SplitSeq> + Clone,
{
    Region::ALL
        .iter()
        .map(|region| {
            (
                *region,
                seqs.clone().map(|seq| encode_dna(seq.get(*region))).collect(),
            )
        })
        .collect()
}
