//! Sequence windows around splice sites
//!
//! For every junction and event type, a window of intronic and exonic
//! sequence next to the splice site is extracted from the reference genome.
//! In transcript orientation the window looks like this:
//!
//! ```text
//! psi5 (donor)      EEEEEEEEEEEEEEEEEEEE|iiiiiiiiiiiiiiiiiiii
//!                   <- exon_overhang -> | <- intron_overhang ->
//!                              donor: [-5, +13)
//!                                       donor intron: [+6, ..)
//!
//! psi3 (acceptor)   iiiiiiiiiiiiiiiiiiii|EEEEEEEEEEEEEEEEEEEE
//!                   <- intron_overhang ->| <- exon_overhang ->
//!                   acceptor intron: [.., -6)
//!                            acceptor: [-50, +3)
//! ```
//!
//! The mutated window is created by applying the variant to the genomic
//! sequence. Indels upstream of the splice site shift the window, so that
//! reference and mutated windows are both anchored at the splice site.

use core::str::FromStr;
use std::fmt;

use crate::fasta::FastaReader;
use crate::models::{EventType, Junction, Sequence, Strand, Variant};
use crate::utils::errors::{Error, Result};

const ACCEPTOR_INTRON_CUT: usize = 6;
const DONOR_INTRON_CUT: usize = 6;
const ACCEPTOR_INTRON_LEN: usize = 50;
const ACCEPTOR_EXON_LEN: usize = 3;
const DONOR_EXON_LEN: usize = 5;
const DONOR_INTRON_LEN: usize = 13;

/// Sequence regions scored by the splicing model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    AcceptorIntron,
    Acceptor,
    Exon,
    Donor,
    DonorIntron,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::AcceptorIntron,
        Region::Acceptor,
        Region::Exon,
        Region::Donor,
        Region::DonorIntron,
    ];

    /// Name of the region in output columns
    pub fn column_name(&self) -> &'static str {
        match self {
            Region::AcceptorIntron => "acceptorIntron",
            Region::Acceptor => "acceptor",
            Region::Exon => "exon",
            Region::Donor => "donor",
            Region::DonorIntron => "donorIntron",
        }
    }
}

impl FromStr for Region {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "acceptor_intron" | "acceptorIntron" => Ok(Region::AcceptorIntron),
            "acceptor" => Ok(Region::Acceptor),
            "exon" => Ok(Region::Exon),
            "donor" => Ok(Region::Donor),
            "donor_intron" | "donorIntron" => Ok(Region::DonorIntron),
            _ => Err(Error::parse(format!("Invalid region {}", s))),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

/// Window sizes around the splice site
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataloaderOptions {
    pub intron_overhang: usize,
    pub exon_overhang: usize,
}

impl Default for DataloaderOptions {
    fn default() -> Self {
        DataloaderOptions {
            intron_overhang: 100,
            exon_overhang: 100,
        }
    }
}

/// A window split into the regions of the splicing model
///
/// Regions that do not apply to the event type are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitSeq {
    pub acceptor_intron: String,
    pub acceptor: String,
    pub exon: String,
    pub donor: String,
    pub donor_intron: String,
}

impl SplitSeq {
    /// Splits a window in transcript orientation
    pub fn split(window: &str, event_type: EventType, options: &DataloaderOptions) -> Self {
        let len = window.len();
        match event_type {
            EventType::Psi5 => {
                let site = options.exon_overhang.min(len);
                SplitSeq {
                    exon: window[..site].to_string(),
                    donor: window
                        [site.saturating_sub(DONOR_EXON_LEN)..(site + DONOR_INTRON_LEN).min(len)]
                        .to_string(),
                    donor_intron: window[(site + DONOR_INTRON_CUT).min(len)..].to_string(),
                    ..Default::default()
                }
            }
            EventType::Psi3 => {
                let site = options.intron_overhang.min(len);
                SplitSeq {
                    acceptor_intron: window[..site.saturating_sub(ACCEPTOR_INTRON_CUT)]
                        .to_string(),
                    acceptor: window[site.saturating_sub(ACCEPTOR_INTRON_LEN)
                        ..(site + ACCEPTOR_EXON_LEN).min(len)]
                        .to_string(),
                    exon: window[site..].to_string(),
                    ..Default::default()
                }
            }
        }
    }

    pub fn get(&self, region: Region) -> &str {
        match region {
            Region::AcceptorIntron => &self.acceptor_intron,
            Region::Acceptor => &self.acceptor,
            Region::Exon => &self.exon,
            Region::Donor => &self.donor,
            Region::DonorIntron => &self.donor_intron,
        }
    }
}

/// Genomic window next to the splice site of a junction
///
/// `boundary` is the 1-based position of the first base right of the
/// splice site in genomic orientation, `left` and `right` the number of
/// bases on either side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteWindow {
    pub chrom: String,
    pub boundary: i64,
    pub left: usize,
    pub right: usize,
    pub strand: Strand,
    pub event_type: EventType,
}

impl SiteWindow {
    pub fn new(junction: &Junction, event_type: EventType, options: &DataloaderOptions) -> Self {
        let intron = options.intron_overhang;
        let exon = options.exon_overhang;
        let start = junction.start as i64;
        let end = junction.end as i64;

        let (boundary, left, right) = match (event_type, junction.strand) {
            (EventType::Psi5, Strand::Plus) => (start, exon, intron),
            (EventType::Psi5, Strand::Minus) => (end + 1, intron, exon),
            (EventType::Psi3, Strand::Plus) => (end + 1, intron, exon),
            (EventType::Psi3, Strand::Minus) => (start, exon, intron),
        };

        SiteWindow {
            chrom: junction.chrom.clone(),
            boundary,
            left,
            right,
            strand: junction.strand,
            event_type,
        }
    }

    /// First base of the window (1-based, may be < 1 close to the chromosome start)
    pub fn start(&self) -> i64 {
        self.boundary - self.left as i64
    }

    /// Last base of the window (1-based, inclusive)
    pub fn end(&self) -> i64 {
        self.boundary + self.right as i64 - 1
    }

    /// True if any base of the variant lies in the window
    pub fn overlaps(&self, variant: &Variant) -> bool {
        (variant.pos as i64) <= self.end() && (variant.end() as i64) >= self.start()
    }

    /// Returns reference and mutated windows in transcript orientation
    ///
    /// Returns `None` if the reference allele of the variant does not
    /// match the reference genome.
    pub fn sequences(
        &self,
        fasta: &mut FastaReader,
        variant: &Variant,
    ) -> Result<Option<(String, String)>> {
        let ref_len = variant.ref_allele.len();
        let alt_len = variant.alt_allele.len();
        let pad = ref_len.max(alt_len) as i64;

        let fetch_start = self.start() - pad;
        let region = fasta.fetch_padded(&self.chrom, fetch_start, self.end() + pad)?;

        if !self.overlaps(variant) {
            return Ok(None);
        }
        let var_offset = (variant.pos as i64 - fetch_start) as usize;
        if var_offset + ref_len > region.len()
            || &region[var_offset..var_offset + ref_len] != variant.ref_allele.as_bytes()
        {
            return Ok(None);
        }

        let boundary = (self.boundary - fetch_start) as usize;
        let ref_window = &region[boundary - self.left..boundary + self.right];

        let mut mutated = Vec::with_capacity(region.len() + alt_len);
        mutated.extend_from_slice(&region[..var_offset]);
        mutated.extend_from_slice(variant.alt_allele.as_bytes());
        mutated.extend_from_slice(&region[var_offset + ref_len..]);

        // variants completely upstream of the boundary move the splice site
        let mut_boundary = if (variant.end() as i64) < self.boundary {
            boundary + alt_len - ref_len
        } else {
            boundary
        };
        let mut_window = &mutated[mut_boundary - self.left..mut_boundary + self.right];

        Ok(Some((self.orient(ref_window)?, self.orient(mut_window)?)))
    }

    fn orient(&self, window: &[u8]) -> Result<String> {
        let mut seq = Sequence::from_raw_bytes(window)?;
        if self.strand == Strand::Minus {
            seq.reverse_complement();
        }
        Ok(seq.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // chr1 is ACGT repeats: base p is "ACGT"[(p - 1) % 4]
    const GENOME: &str = "tests/data/genome.fa";

    fn options() -> DataloaderOptions {
        DataloaderOptions {
            intron_overhang: 60,
            exon_overhang: 10,
        }
    }

    fn sequences(junction: &Junction, event_type: EventType, variant: &Variant) -> (String, String) {
        let mut fasta = FastaReader::from_file(GENOME).unwrap();
        SiteWindow::new(junction, event_type, &options())
            .sequences(&mut fasta, variant)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_split_psi5() {
        let opts = options();
        let window = format!("{}{}", "E".repeat(10), "I".repeat(60));
        let split = SplitSeq::split(&window, EventType::Psi5, &opts);
        assert_eq!(split.exon, "E".repeat(10));
        assert_eq!(split.donor, format!("{}{}", "E".repeat(5), "I".repeat(13)));
        assert_eq!(split.donor_intron, "I".repeat(54));
        assert!(split.acceptor.is_empty());
        assert!(split.acceptor_intron.is_empty());
    }

    #[test]
    fn test_split_psi3() {
        let opts = options();
        let window = format!("{}{}", "I".repeat(60), "E".repeat(10));
        let split = SplitSeq::split(&window, EventType::Psi3, &opts);
        assert_eq!(split.acceptor_intron, "I".repeat(54));
        assert_eq!(split.acceptor, format!("{}{}", "I".repeat(50), "E".repeat(3)));
        assert_eq!(split.exon, "E".repeat(10));
        assert!(split.donor.is_empty());
        assert_eq!(split.get(Region::DonorIntron), "");
    }

    #[test]
    fn test_split_short_window() {
        let opts = options();
        let split = SplitSeq::split("ACG", EventType::Psi3, &opts);
        assert_eq!(split.acceptor, "ACG");
        assert_eq!(split.exon, "");
    }

    #[test]
    fn test_windows() {
        let opts = options();
        let plus = Junction::new("1", 100, 200, Strand::Plus);
        let w = SiteWindow::new(&plus, EventType::Psi5, &opts);
        assert_eq!((w.start(), w.end()), (90, 159));
        let w = SiteWindow::new(&plus, EventType::Psi3, &opts);
        assert_eq!((w.start(), w.end()), (141, 210));

        let minus = Junction::new("1", 100, 200, Strand::Minus);
        let w = SiteWindow::new(&minus, EventType::Psi5, &opts);
        assert_eq!((w.start(), w.end()), (141, 210));
        let w = SiteWindow::new(&minus, EventType::Psi3, &opts);
        assert_eq!((w.start(), w.end()), (90, 159));
    }

    #[test]
    fn test_overlaps() {
        let opts = options();
        let plus = Junction::new("1", 100, 200, Strand::Plus);
        let w = SiteWindow::new(&plus, EventType::Psi5, &opts);
        assert!(w.overlaps(&Variant::new("1", 90, "A", "G")));
        assert!(w.overlaps(&Variant::new("1", 88, "AAA", "A")));
        assert!(!w.overlaps(&Variant::new("1", 87, "AAA", "A")));
        assert!(!w.overlaps(&Variant::new("1", 160, "A", "G")));
    }

    #[test]
    fn test_minus_strand_donor() {
        let junction = Junction::new("chr1", 101, 200, Strand::Minus);
        let variant = Variant::new("chr1", 205, "A", "C");
        let (seq, mut_seq) = sequences(&junction, EventType::Psi5, &variant);
        assert_eq!(seq.len(), 70);
        assert_eq!(mut_seq.len(), 70);

        // exon is the reverse complement of 201-210
        let split = SplitSeq::split(&seq, EventType::Psi5, &options());
        let mut_split = SplitSeq::split(&mut_seq, EventType::Psi5, &options());
        assert_eq!(split.exon, "GTACGTACGT");
        assert_eq!(mut_split.exon, "GTACGGACGT");
        assert_eq!(split.donor_intron, mut_split.donor_intron);
        assert_eq!(&seq[10..], "ACGT".repeat(15));
    }

    #[test]
    fn test_minus_strand_acceptor() {
        let junction = Junction::new("chr1", 101, 200, Strand::Minus);
        let variant = Variant::new("chr1", 95, "G", "A");
        let (seq, mut_seq) = sequences(&junction, EventType::Psi3, &variant);

        let split = SplitSeq::split(&seq, EventType::Psi3, &options());
        let mut_split = SplitSeq::split(&mut_seq, EventType::Psi3, &options());
        // exon is the reverse complement of 91-100, 95 is its 6th base
        assert_eq!(split.exon, "ACGTACGTAC");
        assert_eq!(mut_split.exon, "ACGTATGTAC");
        assert_eq!(split.acceptor_intron, mut_split.acceptor_intron);
        assert_eq!(
            split.acceptor,
            "GTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACG"
        );
    }

    #[test]
    fn test_insertion_upstream_of_donor() {
        let junction = Junction::new("chr1", 101, 200, Strand::Plus);
        let variant = Variant::new("chr1", 95, "G", "GTT");
        let (seq, mut_seq) = sequences(&junction, EventType::Psi5, &variant);
        assert_eq!(seq.len(), 70);
        assert_eq!(mut_seq.len(), 70);
        // window stays anchored at the donor, the exon end takes the insertion
        assert_eq!(&seq[..10], "GTACGTACGT");
        assert_eq!(&mut_seq[..10], "ACGTTTACGT");
        assert_eq!(&seq[10..], &mut_seq[10..]);
    }

    #[test]
    fn test_deletion_across_donor() {
        let junction = Junction::new("chr1", 101, 200, Strand::Plus);
        let variant = Variant::new("chr1", 99, "GTAC", "G");
        let (seq, mut_seq) = sequences(&junction, EventType::Psi5, &variant);
        assert_eq!(mut_seq.len(), 70);
        // deleted 100-102, the intron starts at 104
        assert_eq!(&seq[..10], "GTACGTACGT");
        assert_eq!(&mut_seq[..10], "GTACGTACGG");
        assert_eq!(&seq[10..20], "ACGTACGTAC");
        assert_eq!(&mut_seq[10..20], "TACGTACGTA");
    }

    #[test]
    fn test_sequences_ref_mismatch() {
        let junction = Junction::new("chr1", 101, 200, Strand::Plus);
        let mut fasta = FastaReader::from_file(GENOME).unwrap();
        let window = SiteWindow::new(&junction, EventType::Psi5, &options());
        let res = window.sequences(&mut fasta, &Variant::new("chr1", 105, "C", "T"));
        assert_eq!(res.unwrap(), None);
    }
}
