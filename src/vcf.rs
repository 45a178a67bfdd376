//! Variant calls loaded from VCF/BCF into an interval index
//!
//! Multi-allelic records are split into one [`Variant`] per alternative
//! allele. Symbolic alleles are skipped. If the VCF contains samples, only
//! variants carried by at least one sample are kept.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use rust_htslib::bcf::{self, Read};
use rust_lapper::{Interval, Lapper};

use crate::models::Variant;
use crate::utils::errors::{Error, Result};

type VariantInterval = Interval<u64, usize>;

/// All variants of a VCF file, queryable by genomic interval
pub struct VariantIndex {
    variants: Vec<Variant>,
    intervals: HashMap<String, Lapper<u64, usize>>,
    has_samples: bool,
}

impl VariantIndex {
    /// Reads all variants of a (bgzipped) VCF or BCF file
    pub fn from_vcf<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = bcf::Reader::from_path(path.as_ref())?;
        let samples: Vec<String> = reader
            .header()
            .samples()
            .iter()
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .collect();

        let mut variants = Vec::new();
        for record in reader.records() {
            let record = record?;
            variants.extend(split_record(&record, &samples)?);
        }
        info!(
            "Loaded {} variants from {}",
            variants.len(),
            path.as_ref().display()
        );
        Ok(Self::new(variants, !samples.is_empty()))
    }

    /// Builds the index from already parsed variants
    pub fn new(variants: Vec<Variant>, has_samples: bool) -> Self {
        let mut per_chrom: HashMap<String, Vec<VariantInterval>> = HashMap::new();
        for (idx, variant) in variants.iter().enumerate() {
            per_chrom
                .entry(variant.chrom.clone())
                .or_default()
                .push(Interval {
                    start: variant.pos,
                    stop: variant.end() + 1,
                    val: idx,
                });
        }
        VariantIndex {
            variants,
            intervals: per_chrom
                .into_iter()
                .map(|(chrom, intervals)| (chrom, Lapper::new(intervals)))
                .collect(),
            has_samples,
        }
    }

    /// Returns all variants overlapping `start..=end` (1-based) in file order
    pub fn query(&self, chrom: &str, start: u64, end: u64) -> Vec<&Variant> {
        let lapper = match self.intervals.get(chrom) {
            Some(lapper) => lapper,
            None => {
                let alternative = match chrom.strip_prefix("chr") {
                    Some(stripped) => stripped.to_string(),
                    None => format!("chr{}", chrom),
                };
                match self.intervals.get(&alternative) {
                    Some(lapper) => lapper,
                    None => return Vec::new(),
                }
            }
        };
        let mut hits: Vec<usize> = lapper.find(start, end + 1).map(|iv| iv.val).collect();
        hits.sort_unstable();
        hits.into_iter().map(|idx| &self.variants[idx]).collect()
    }

    /// True if the VCF contains sample columns
    pub fn has_samples(&self) -> bool {
        self.has_samples
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

fn split_record(record: &bcf::Record, samples: &[String]) -> Result<Vec<Variant>> {
    let rid = record
        .rid()
        .ok_or_else(|| Error::parse("VCF record without chromosome"))?;
    let chrom = String::from_utf8_lossy(record.header().rid2name(rid)?).into_owned();
    let pos = record.pos() as u64 + 1;
    let alleles: Vec<String> = record
        .alleles()
        .iter()
        .map(|a| String::from_utf8_lossy(a).into_owned())
        .collect();

    // undefined or missing INFO/AF counts as 0
    let allele_freqs: Vec<f32> = match record.info(b"AF").float() {
        Ok(Some(values)) => values.to_vec(),
        _ => Vec::new(),
    };

    let carriers = if samples.is_empty() {
        None
    } else {
        Some(alt_carriers(record, samples, alleles.len()))
    };

    let mut variants = Vec::with_capacity(alleles.len().saturating_sub(1));
    for (alt_idx, alt) in alleles.iter().enumerate().skip(1) {
        let mut variant = Variant::new(&chrom, pos, &alleles[0], alt);
        if !variant.is_sequence_variant() {
            debug!("Skipping non-sequence variant {}", variant);
            continue;
        }
        if let Some(carriers) = &carriers {
            if carriers[alt_idx].is_empty() {
                continue;
            }
            variant.samples = Some(carriers[alt_idx].clone());
        }
        variant.maf = allele_freqs
            .get(alt_idx - 1)
            .filter(|af| !af.is_nan())
            .map(|af| {
                let af = *af as f64;
                af.min(1.0 - af)
            })
            .unwrap_or(0.0);
        variants.push(variant);
    }
    Ok(variants)
}

/// Returns for every allele index the samples that carry it
fn alt_carriers(record: &bcf::Record, samples: &[String], n_alleles: usize) -> Vec<Vec<String>> {
    let mut carriers = vec![Vec::new(); n_alleles];
    let genotypes = match record.genotypes() {
        Ok(genotypes) => genotypes,
        Err(_) => return carriers,
    };
    for (sample_idx, sample) in samples.iter().enumerate() {
        let genotype = genotypes.get(sample_idx);
        let mut seen = vec![false; n_alleles];
        for allele in genotype.iter() {
            if let Some(idx) = allele.index() {
                let idx = idx as usize;
                if idx > 0 && idx < n_alleles && !seen[idx] {
                    seen[idx] = true;
                    carriers[idx].push(sample.clone());
                }
            }
        }
    }
    carriers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants() -> VariantIndex {
        let mut a = Variant::new("chr1", 10, "A", "G");
        a.samples = Some(vec!["S1".to_string()]);
        let b = Variant::new("chr1", 8, "ACGT", "A");
        let c = Variant::new("chr2", 10, "A", "T");
        VariantIndex::new(vec![a, b, c], true)
    }

    #[test]
    fn test_query() {
        let index = variants();
        let hits: Vec<String> = index.query("chr1", 9, 12).iter().map(|v| v.id()).collect();
        assert_eq!(hits, vec!["chr1:10:A>G", "chr1:8:ACGT>A"]);

        assert_eq!(index.query("chr1", 12, 20).len(), 0);
        assert_eq!(index.query("chr1", 11, 11).len(), 1);
        assert_eq!(index.query("chr3", 1, 100).len(), 0);
    }

    #[test]
    fn test_query_chr_prefix() {
        let index = variants();
        assert_eq!(index.query("2", 1, 100).len(), 1);
    }

    #[test]
    fn test_read_vcf() {
        let index = VariantIndex::from_vcf("tests/data/variants.vcf").unwrap();
        assert!(index.has_samples());

        // multi-allelic record is split, the allele carried by nobody is dropped
        let hits = index.query("chr1", 151, 151);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "chr1:151:G>T");
        assert_eq!(
            hits[0].samples.as_deref(),
            Some(&["S1".to_string(), "S2".to_string()][..])
        );
        assert!((hits[0].maf - 0.25).abs() < 1e-6);

        // symbolic alleles are skipped
        assert_eq!(index.query("chr2", 300, 300).len(), 0);
    }
}
