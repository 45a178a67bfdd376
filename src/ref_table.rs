//! Reference table of splice junctions
//!
//! The reference table lists every junction that is tested for aberrant
//! splicing, together with its gene and the PSI observed in the reference
//! cohort. It is a comma separated file with a header row:
//!
//! | column | required | content |
//! | --- | --- | --- |
//! | `junctions` | no | junction id `chrom:start-end:strand`, derived if missing |
//! | `Chromosome`, `Start`, `End`, `Strand` | yes | intron coordinates (1-based, inclusive) |
//! | `splice_site` | no | splice-site id, derived per event type if missing |
//! | `gene_id`, `gene_name` | no | gene annotation |
//! | `psi` (or `ref_psi`) | yes | reference PSI |
//! | `k`, `n`, `median_n` | no | split-read counts of the reference cohort |
//!
//! Any other column (e.g. `transcript_id`, `gene_type`) is kept as text in
//! [`RefJunction::extra`]. Predictions only report the columns above.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, warn};
use serde::Deserialize;

use crate::models::{EventType, Junction, Strand};
use crate::utils::errors::{Error, Result};

const COLUMNS: [&str; 13] = [
    "junctions",
    "Chromosome",
    "Start",
    "End",
    "Strand",
    "splice_site",
    "gene_id",
    "gene_name",
    "psi",
    "ref_psi",
    "k",
    "n",
    "median_n",
];

/// A single row of the [`SplicingRefTable`]
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RefJunction {
    #[serde(rename = "junctions", default)]
    junction_id: Option<String>,
    #[serde(rename = "Chromosome")]
    pub chrom: String,
    #[serde(rename = "Start")]
    pub start: u64,
    #[serde(rename = "End")]
    pub end: u64,
    #[serde(rename = "Strand")]
    pub strand: Strand,
    #[serde(default)]
    splice_site: Option<String>,
    #[serde(default)]
    pub gene_id: Option<String>,
    #[serde(default)]
    pub gene_name: Option<String>,
    #[serde(alias = "ref_psi")]
    pub psi: f64,
    #[serde(default)]
    pub k: Option<u64>,
    #[serde(default)]
    pub n: Option<u64>,
    #[serde(default)]
    pub median_n: Option<f64>,
    #[serde(skip)]
    extra: BTreeMap<String, String>,
}

impl RefJunction {
    pub fn new(junction: &Junction, psi: f64) -> Self {
        RefJunction {
            junction_id: Some(junction.to_string()),
            chrom: junction.chrom.clone(),
            start: junction.start,
            end: junction.end,
            strand: junction.strand,
            splice_site: None,
            gene_id: None,
            gene_name: None,
            psi,
            k: None,
            n: None,
            median_n: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_gene_id(mut self, gene_id: &str) -> Self {
        self.gene_id = Some(gene_id.to_string());
        self
    }

    pub fn with_splice_site(mut self, splice_site: &str) -> Self {
        self.splice_site = Some(splice_site.to_string());
        self
    }

    /// Returns the junction id, `chrom:start-end:strand`
    pub fn id(&self) -> String {
        match &self.junction_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => self.junction().to_string(),
        }
    }

    /// Columns of the reference table without a dedicated field
    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    pub fn junction(&self) -> Junction {
        Junction::new(&self.chrom, self.start, self.end, self.strand)
    }

    /// Returns the splice site id of the junction for the given event type
    pub fn splice_site(&self, event_type: EventType) -> String {
        match &self.splice_site {
            Some(site) if !site.is_empty() => site.clone(),
            _ => self.junction().splice_site(event_type),
        }
    }
}

/// Reference table of junctions, indexed by junction id
///
/// # Examples
///
/// ```rust
/// use splicing_outlier::ref_table::SplicingRefTable;
///
/// let data = "junctions,Chromosome,Start,End,Strand,gene_id,psi
/// 1:100-200:+,1,100,200,+,ENSG1,0.8
/// ";
/// let table = SplicingRefTable::from_reader(data.as_bytes()).unwrap();
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.get("1:100-200:+").unwrap().psi, 0.8);
/// assert!(table.get("1:100-300:+").is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct SplicingRefTable {
    rows: Vec<RefJunction>,
    index: HashMap<String, usize>,
}

impl SplicingRefTable {
    /// Reads the reference table from a CSV file
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        debug!("Reading reference table {}", path.as_ref().display());
        Self::from_reader(File::open(path.as_ref())?)
    }

    /// Reads the reference table from any CSV source
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let extra_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(_, column)| !COLUMNS.contains(column))
            .map(|(i, column)| (i, column.to_string()))
            .collect();
        if !extra_columns.is_empty() {
            debug!("{} extra columns in reference table", extra_columns.len());
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: RefJunction = record.deserialize(Some(&headers))?;
            row.extra = extra_columns
                .iter()
                .map(|(i, column)| (column.clone(), record[*i].to_string()))
                .collect();
            rows.push(row);
        }
        Ok(Self::from_rows(rows))
    }

    /// Builds the table from junction rows. Later duplicates are dropped.
    pub fn from_rows(rows: Vec<RefJunction>) -> Self {
        let mut table = SplicingRefTable {
            rows: Vec::with_capacity(rows.len()),
            index: HashMap::with_capacity(rows.len()),
        };
        for row in rows {
            let id = row.id();
            if table.index.contains_key(&id) {
                warn!("Duplicate junction {} in reference table", id);
                continue;
            }
            table.index.insert(id, table.rows.len());
            table.rows.push(row);
        }
        table
    }

    /// Returns the row of the junction
    pub fn get(&self, junction_id: &str) -> Result<&RefJunction> {
        self.index
            .get(junction_id)
            .map(|idx| &self.rows[*idx])
            .ok_or_else(|| Error::JunctionNotFound(junction_id.to_string()))
    }

    /// Returns the row at position `idx` in table order
    pub fn row(&self, idx: usize) -> Option<&RefJunction> {
        self.rows.get(idx)
    }

    pub fn contains(&self, junction_id: &str) -> bool {
        self.index.contains_key(junction_id)
    }

    /// Returns the junction ids in table order
    pub fn junctions(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.id()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RefJunction> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
