//! Aggregation of predictions to junction, splice-site and gene level
//!
//! [`SplicingOutlierResult`] holds one [`PredictionRow`] per
//! variant/junction pair. If the variants come with carriers, the
//! junction view has one row per carrier. The splice-site and gene views
//! keep, for every splice site (or gene) and sample, the junction row with
//! the largest absolute delta PSI.

use std::cell::OnceCell;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use log::{debug, info};

use crate::count_table::{CatAnnotation, CatInference};
use crate::population::Population;
use crate::predict::{PredictionRow, Writer};
use crate::utils::errors::{Error, Result};
use crate::utils::get_abs_max_rows;

/// Default upper bound of the population MAF in [`SplicingOutlierResult::filter_maf`]
pub const MAF_CUTOFF: f64 = 0.001;

/// Default number of carriers in [`SplicingOutlierResult::filter_maf`]
pub const MAX_NUM_SAMPLE: usize = 2;

/// A prediction of the junction view, optionally for a single carrier
#[derive(Clone, Debug, PartialEq)]
pub struct JunctionRow {
    pub prediction: PredictionRow,
    pub sample: Option<String>,
    pub cat: Option<CatAnnotation>,
}

impl JunctionRow {
    fn fields(&self, with_sample: bool, with_cat: bool) -> Vec<String> {
        let mut fields = self.prediction.record(with_sample);
        if with_sample {
            fields.push(self.sample.clone().unwrap_or_default());
        }
        if with_cat {
            match &self.cat {
                Some(cat) => fields.extend(cat.fields()),
                None => fields.extend(CatAnnotation::COLUMNS.iter().map(|_| String::new())),
            }
        }
        fields
    }
}

/// Predictions of all variant/junction pairs with lazily built views
#[derive(Debug, Default)]
pub struct SplicingOutlierResult {
    rows: Vec<PredictionRow>,
    has_samples: bool,
    junction: OnceCell<Vec<JunctionRow>>,
    splice_site: OnceCell<Vec<JunctionRow>>,
    gene: OnceCell<Vec<JunctionRow>>,
}

impl SplicingOutlierResult {
    /// `has_samples` tells whether the predictions carry a `samples`
    /// column, even if no variant has carriers
    pub fn new(rows: Vec<PredictionRow>, has_samples: bool) -> Self {
        SplicingOutlierResult {
            rows,
            has_samples,
            ..Default::default()
        }
    }

    /// Reads predictions written by [`SplicingOutlierResult::write_csv`]
    /// or [`crate::predict::SpliceOutlier::predict_save`]
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Reading predictions from {}", path.as_ref().display());
        Self::from_reader(File::open(path.as_ref())?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);
        let has_samples = reader.headers()?.iter().any(|column| column == "samples");
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(Self::new(rows, has_samples))
    }

    pub fn rows(&self) -> &[PredictionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True if the predictions list carriers of the variants
    pub fn has_samples(&self) -> bool {
        self.has_samples
    }

    fn reset_views(&mut self) {
        self.junction = OnceCell::new();
        self.splice_site = OnceCell::new();
        self.gene = OnceCell::new();
    }

    /// Predictions by junction, one row per carrier if samples are known
    pub fn junction(&self) -> &[JunctionRow] {
        self.junction.get_or_init(|| {
            let mut rows = Vec::with_capacity(self.rows.len());
            for prediction in &self.rows {
                let samples = prediction.sample_list();
                if !self.has_samples || samples.is_empty() {
                    rows.push(JunctionRow {
                        prediction: prediction.clone(),
                        sample: None,
                        cat: None,
                    });
                    continue;
                }
                rows.extend(samples.into_iter().map(|sample| JunctionRow {
                    prediction: prediction.clone(),
                    sample: Some(sample),
                    cat: None,
                }));
            }
            debug!("Junction view with {} rows", rows.len());
            rows
        })
    }

    fn abs_max_by<F>(&self, group: F) -> Vec<JunctionRow>
    where
        F: Fn(&PredictionRow) -> Option<&String>,
    {
        let has_samples = self.has_samples;
        get_abs_max_rows(
            self.junction(),
            |row| {
                let key = group(&row.prediction)?.clone();
                match (has_samples, &row.sample) {
                    (true, None) => None,
                    (_, sample) => Some((key, sample.clone())),
                }
            },
            |row| row.prediction.delta_psi,
        )
    }

    /// Junction row with the largest absolute delta PSI per splice site
    /// (and sample)
    pub fn splice_site(&self) -> &[JunctionRow] {
        self.splice_site
            .get_or_init(|| self.abs_max_by(|row| row.splice_site.as_ref()))
    }

    /// Junction row with the largest absolute delta PSI per gene (and sample)
    pub fn gene(&self) -> &[JunctionRow] {
        self.gene
            .get_or_init(|| self.abs_max_by(|row| row.gene_id.as_ref()))
    }

    /// Replaces the MAF of every variant by its population frequency
    ///
    /// Variants missing from the population get a MAF of `0`. An annotated
    /// junction view keeps its CAT annotations.
    pub fn add_maf(&mut self, population: &Population) {
        let maf = |variant: &str| population.get(variant).copied().unwrap_or(0.0);
        for row in self.rows.iter_mut() {
            row.maf = maf(&row.variant);
        }
        if let Some(rows) = self.junction.get_mut() {
            for row in rows.iter_mut() {
                row.prediction.maf = maf(&row.prediction.variant);
            }
        }
        self.splice_site = OnceCell::new();
        self.gene = OnceCell::new();
    }

    /// Keeps rare variants
    ///
    /// Keeps rows whose variant is carried by at most `max_num_sample`
    /// samples and, if a population is given, whose population MAF is at
    /// most `maf_cutoff`.
    ///
    /// ```rust
    /// use splicing_outlier::result::SplicingOutlierResult;
    /// use splicing_outlier::population::Population;
    ///
    /// let data = "variant,junction,event_type,Chromosome,Start,End,Strand,samples,ref_psi,delta_logit_psi,delta_psi
    /// 1:150:G>T,1:101-200:+,psi5,1,101,200,+,S1;S2;S3,0.5,1.0,0.2
    /// 1:160:A>C,1:101-200:+,psi5,1,101,200,+,S1,0.5,1.0,0.2
    /// 1:170:A>C,1:101-200:+,psi5,1,101,200,+,S2,0.5,1.0,0.2
    /// ";
    /// let result = SplicingOutlierResult::from_reader(data.as_bytes()).unwrap();
    ///
    /// let mut population = Population::new();
    /// population.insert("1:170:A>C".to_string(), 0.1);
    ///
    /// let rare = result.filter_maf(2, Some(&population), 0.001);
    /// assert_eq!(rare.len(), 1);
    /// assert_eq!(rare.rows()[0].variant, "1:160:A>C");
    /// ```
    pub fn filter_maf(
        &self,
        max_num_sample: usize,
        population: Option<&Population>,
        maf_cutoff: f64,
    ) -> Self {
        let rows: Vec<PredictionRow> = self
            .rows
            .iter()
            .filter(|row| row.sample_list().len() <= max_num_sample)
            .filter(|row| match population {
                Some(population) => {
                    population.get(&row.variant).copied().unwrap_or(0.0) <= maf_cutoff
                }
                None => true,
            })
            .cloned()
            .collect();
        debug!("{} of {} rows pass the MAF filter", rows.len(), self.len());
        SplicingOutlierResult {
            rows,
            has_samples: self.has_samples,
            ..Default::default()
        }
    }

    /// Annotates the junction view with the splicing observed in a
    /// clinically accessible tissue of the carriers
    ///
    /// Fails with [`Error::MissingSamples`] if the predictions have no
    /// carriers.
    pub fn infer_cat(&mut self, cat_inference: &CatInference) -> Result<()> {
        if !self.has_samples {
            return Err(Error::MissingSamples);
        }
        info!("Inferring splicing in {}", cat_inference.tissue());
        let mut rows = self.junction().to_vec();
        for row in rows.iter_mut() {
            if let Some(sample) = &row.sample {
                row.cat = Some(cat_inference.infer(
                    &row.prediction.junction,
                    sample,
                    row.prediction.event_type,
                ));
            }
        }
        self.reset_views();
        self.junction = OnceCell::from(rows);
        Ok(())
    }

    /// Writes all predictions as CSV
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        info!("Writing predictions to {}", path.as_ref().display());
        let mut writer = Writer::from_file(path)?;
        writer.write_rows(&self.rows, self.has_samples)?;
        writer.flush()
    }

    pub fn write_junction_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_view(self.junction(), Writer::from_file(path)?)
    }

    pub fn write_splice_site_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_view(self.splice_site(), Writer::from_file(path)?)
    }

    pub fn write_gene_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_view(self.gene(), Writer::from_file(path)?)
    }

    /// Writes rows of a view, with `sample` and CAT columns if present
    pub fn write_view<W: Write>(&self, rows: &[JunctionRow], mut writer: Writer<W>) -> Result<()> {
        let with_sample = self.has_samples;
        let with_cat = rows.iter().any(|row| row.cat.is_some());

        let mut columns = PredictionRow::columns(with_sample);
        if with_sample {
            columns.push("sample");
        }
        if with_cat {
            columns.extend(CatAnnotation::COLUMNS);
        }
        writer.write_header(&columns)?;
        for row in rows {
            writer.write_record(row.fields(with_sample, with_cat))?;
        }
        writer.flush()
    }
}
