use crate::count_table::CountTable;
use crate::models::EventType;
use crate::utils::{clip, logit, CLIP_THRESHOLD};

/// Observed splicing of a junction in a clinically accessible tissue
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatAnnotation {
    pub tissue_cat: String,
    /// Split reads of the junction in the sample
    pub count_cat: Option<u64>,
    /// Split reads of the whole event in the sample
    pub n_cat: Option<u64>,
    pub psi_cat: Option<f64>,
    /// PSI pooled over all samples of the count table
    pub ref_psi_cat: Option<f64>,
    pub delta_logit_psi_cat: Option<f64>,
    pub delta_psi_cat: Option<f64>,
}

impl CatAnnotation {
    pub const COLUMNS: [&'static str; 7] = [
        "tissue_cat",
        "count_cat",
        "n_cat",
        "psi_cat",
        "ref_psi_cat",
        "delta_logit_psi_cat",
        "delta_psi_cat",
    ];

    pub fn fields(&self) -> Vec<String> {
        fn opt<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map(|v| v.to_string()).unwrap_or_default()
        }
        vec![
            self.tissue_cat.clone(),
            opt(&self.count_cat),
            opt(&self.n_cat),
            opt(&self.psi_cat),
            opt(&self.ref_psi_cat),
            opt(&self.delta_logit_psi_cat),
            opt(&self.delta_psi_cat),
        ]
    }
}

/// Compares the splicing of a sample in a clinically accessible tissue
/// to the pooled splicing of all samples of that tissue
///
/// # Examples
///
/// ```rust
/// use splicing_outlier::count_table::{CatInference, CountTable};
/// use splicing_outlier::models::EventType;
///
/// let counts = "Chromosome,Start,End,Strand,S1,S2
/// 1,100,200,+,9,1
/// 1,100,300,+,1,9
/// ";
/// let ct = CountTable::from_reader(counts.as_bytes()).unwrap();
/// let cat = CatInference::new(ct, "blood");
///
/// let annotation = cat.infer("1:100-200:+", "S1", EventType::Psi5);
/// assert_eq!(annotation.count_cat, Some(9));
/// assert_eq!(annotation.psi_cat, Some(0.9));
/// assert_eq!(annotation.ref_psi_cat, Some(0.5));
/// ```
#[derive(Clone, Debug)]
pub struct CatInference {
    count_table: CountTable,
    tissue: String,
    clip_threshold: f64,
}

impl CatInference {
    pub fn new(count_table: CountTable, tissue: &str) -> Self {
        CatInference {
            count_table,
            tissue: tissue.to_string(),
            clip_threshold: CLIP_THRESHOLD,
        }
    }

    pub fn with_clip_threshold(mut self, clip_threshold: f64) -> Self {
        self.clip_threshold = clip_threshold;
        self
    }

    pub fn tissue(&self) -> &str {
        &self.tissue
    }

    pub fn count_table(&self) -> &CountTable {
        &self.count_table
    }

    /// Annotates a junction of a sample
    ///
    /// Values are `None` if junction or sample are not part of the count
    /// table, or if the event has no split reads.
    pub fn infer(&self, junction_id: &str, sample: &str, event_type: EventType) -> CatAnnotation {
        let ct = &self.count_table;
        let psi = ct.psi(junction_id, sample, event_type);
        let ref_psi = ct.ref_psi(junction_id, event_type);

        let (delta_logit_psi, delta_psi) = match (psi, ref_psi) {
            (Some(psi), Some(ref_psi)) => (
                Some(
                    logit(clip(psi, self.clip_threshold))
                        - logit(clip(ref_psi, self.clip_threshold)),
                ),
                Some(psi - ref_psi),
            ),
            _ => (None, None),
        };

        CatAnnotation {
            tissue_cat: self.tissue.clone(),
            count_cat: ct.count(junction_id, sample),
            n_cat: ct.event_count(junction_id, sample, event_type),
            psi_cat: psi,
            ref_psi_cat: ref_psi,
            delta_logit_psi_cat: delta_logit_psi,
            delta_psi_cat: delta_psi,
        }
    }
}
