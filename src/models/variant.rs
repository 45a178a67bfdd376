use std::fmt;

/// A single bi-allelic variant, as split from a VCF record
#[derive(Clone, Debug, PartialEq)]
pub struct Variant {
    pub chrom: String,
    /// 1-based position of the first reference base
    pub pos: u64,
    pub ref_allele: String,
    pub alt_allele: String,
    /// Samples carrying the alternative allele, `None` if the VCF has no samples
    pub samples: Option<Vec<String>>,
    pub maf: f64,
}

impl Variant {
    pub fn new(chrom: &str, pos: u64, ref_allele: &str, alt_allele: &str) -> Self {
        Variant {
            chrom: chrom.to_string(),
            pos,
            ref_allele: ref_allele.to_ascii_uppercase(),
            alt_allele: alt_allele.to_ascii_uppercase(),
            samples: None,
            maf: 0.0,
        }
    }

    /// Returns the variant id, `chrom:pos:ref>alt`
    pub fn id(&self) -> String {
        self.to_string()
    }

    /// Last reference base covered by the variant (1-based, inclusive)
    pub fn end(&self) -> u64 {
        self.pos + self.ref_allele.len() as u64 - 1
    }

    /// Semicolon separated list of carriers
    pub fn samples_field(&self) -> Option<String> {
        self.samples.as_ref().map(|s| s.join(";"))
    }

    /// Returns false for symbolic, breakend or spanning-deletion alleles
    pub fn is_sequence_variant(&self) -> bool {
        !self.ref_allele.is_empty()
            && !self.alt_allele.is_empty()
            && self.ref_allele.bytes().all(|b| b"ACGTN".contains(&b))
            && self.alt_allele.bytes().all(|b| b"ACGTN".contains(&b))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}>{}",
            self.chrom, self.pos, self.ref_allele, self.alt_allele
        )
    }
}
