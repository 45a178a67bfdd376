//! Split-read counts of junctions in a clinically accessible tissue
//!
//! The count table is a CSV file with one row per junction and one column
//! per sample:
//!
//! ```text
//! Chromosome,Start,End,Strand,S1,S2,S3
//! 1,100,200,+,10,0,4
//! 1,100,300,+,2,8,4
//! ```
//!
//! Junctions sharing a donor form a psi5 event, junctions sharing an
//! acceptor a psi3 event. The PSI of a junction in a sample is its split
//! read count divided by the total count of its event in that sample.

mod cat;

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info};

use crate::models::{EventType, Junction, Strand};
use crate::utils::errors::{Error, Result};

pub use crate::count_table::cat::{CatAnnotation, CatInference};

const COORD_COLUMNS: [&str; 4] = ["Chromosome", "Start", "End", "Strand"];

/// Split-read counts per junction and sample
#[derive(Clone, Debug, Default)]
pub struct CountTable {
    junctions: Vec<Junction>,
    ids: Vec<String>,
    index: HashMap<String, usize>,
    samples: Vec<String>,
    sample_index: HashMap<String, usize>,
    // one row of sample counts per junction
    counts: Vec<Vec<u64>>,
    event5: HashMap<String, Vec<usize>>,
    event3: HashMap<String, Vec<usize>>,
}

impl CountTable {
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Reading count table {}", path.as_ref().display());
        Self::from_reader(File::open(path.as_ref())?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let header = reader.headers()?.clone();
        let mut coord_idx = [0usize; 4];
        for (i, name) in COORD_COLUMNS.iter().enumerate() {
            coord_idx[i] = header
                .iter()
                .position(|column| column == *name)
                .ok_or_else(|| Error::parse(format!("Count table lacks column {}", name)))?;
        }
        let sample_columns: Vec<usize> = (0..header.len())
            .filter(|i| !coord_idx.contains(i) && &header[*i] != "junctions")
            .collect();
        let samples = sample_columns
            .iter()
            .map(|i| header[*i].to_string())
            .collect();

        let mut junctions = Vec::new();
        let mut counts = Vec::new();
        for record in reader.records() {
            let record = record?;
            let junction = Junction::new(
                &record[coord_idx[0]],
                parse_field(&record[coord_idx[1]])?,
                parse_field(&record[coord_idx[2]])?,
                record[coord_idx[3]].parse::<Strand>()?,
            );
            let row = sample_columns
                .iter()
                .map(|i| match &record[*i] {
                    "" => Ok(0),
                    value => parse_field(value),
                })
                .collect::<Result<Vec<u64>>>()?;
            junctions.push(junction);
            counts.push(row);
        }
        Ok(Self::new(junctions, samples, counts))
    }

    /// Builds the table from junctions, sample names and per junction counts
    pub fn new(junctions: Vec<Junction>, samples: Vec<String>, counts: Vec<Vec<u64>>) -> Self {
        let mut table = CountTable {
            sample_index: samples
                .iter()
                .enumerate()
                .map(|(i, s)| (s.clone(), i))
                .collect(),
            samples,
            ..Default::default()
        };
        for (junction, row) in junctions.into_iter().zip(counts) {
            let id = junction.to_string();
            if table.index.contains_key(&id) {
                continue;
            }
            let idx = table.junctions.len();
            table
                .event5
                .entry(junction.splice_site(EventType::Psi5))
                .or_default()
                .push(idx);
            table
                .event3
                .entry(junction.splice_site(EventType::Psi3))
                .or_default()
                .push(idx);
            table.index.insert(id.clone(), idx);
            table.ids.push(id);
            table.junctions.push(junction);
            table.counts.push(row);
        }
        debug!(
            "Count table with {} junctions and {} samples",
            table.len(),
            table.samples.len()
        );
        table
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn junctions(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, junction_id: &str) -> bool {
        self.index.contains_key(junction_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Split-read count of a junction in a sample
    pub fn count(&self, junction_id: &str, sample: &str) -> Option<u64> {
        let row = self.index.get(junction_id)?;
        let col = self.sample_index.get(sample)?;
        Some(self.counts[*row][*col])
    }

    fn event_members(&self, junction_id: &str, event_type: EventType) -> Option<&[usize]> {
        let junction = &self.junctions[*self.index.get(junction_id)?];
        let events = match event_type {
            EventType::Psi5 => &self.event5,
            EventType::Psi3 => &self.event3,
        };
        events
            .get(&junction.splice_site(event_type))
            .map(|members| members.as_slice())
    }

    /// Junctions of the event of `junction_id`, including itself
    pub fn event(&self, junction_id: &str, event_type: EventType) -> Vec<&str> {
        self.event_members(junction_id, event_type)
            .map(|members| members.iter().map(|i| self.ids[*i].as_str()).collect())
            .unwrap_or_default()
    }

    /// Junctions sharing the donor of `junction_id`
    pub fn event5(&self, junction_id: &str) -> Vec<&str> {
        self.event(junction_id, EventType::Psi5)
    }

    /// Junctions sharing the acceptor of `junction_id`
    pub fn event3(&self, junction_id: &str) -> Vec<&str> {
        self.event(junction_id, EventType::Psi3)
    }

    /// Total split-read count of the event of `junction_id` in a sample
    pub fn event_count(&self, junction_id: &str, sample: &str, event_type: EventType) -> Option<u64> {
        let col = *self.sample_index.get(sample)?;
        let members = self.event_members(junction_id, event_type)?;
        Some(members.iter().map(|i| self.counts[*i][col]).sum())
    }

    /// PSI of a junction in a sample, `None` if the event has no reads
    pub fn psi(&self, junction_id: &str, sample: &str, event_type: EventType) -> Option<f64> {
        let k = self.count(junction_id, sample)?;
        let n = self.event_count(junction_id, sample, event_type)?;
        if n == 0 {
            return None;
        }
        Some(k as f64 / n as f64)
    }

    pub fn psi5(&self, junction_id: &str, sample: &str) -> Option<f64> {
        self.psi(junction_id, sample, EventType::Psi5)
    }

    pub fn psi3(&self, junction_id: &str, sample: &str) -> Option<f64> {
        self.psi(junction_id, sample, EventType::Psi3)
    }

    /// PSI of a junction with the counts of all samples pooled
    pub fn ref_psi(&self, junction_id: &str, event_type: EventType) -> Option<f64> {
        let row = *self.index.get(junction_id)?;
        let members = self.event_members(junction_id, event_type)?;
        let k: u64 = self.counts[row].iter().sum();
        let n: u64 = members
            .iter()
            .map(|i| self.counts[*i].iter().sum::<u64>())
            .sum();
        if n == 0 {
            return None;
        }
        Some(k as f64 / n as f64)
    }

    pub fn ref_psi5(&self, junction_id: &str) -> Option<f64> {
        self.ref_psi(junction_id, EventType::Psi5)
    }

    pub fn ref_psi3(&self, junction_id: &str) -> Option<f64> {
        self.ref_psi(junction_id, EventType::Psi3)
    }

    /// Restricts the table to the events of the given junctions
    ///
    /// Keeps every junction that shares a splice site of `event_type` with
    /// one of `junction_ids`. Unknown junctions are ignored.
    pub fn filter_event<S: AsRef<str>>(&self, junction_ids: &[S], event_type: EventType) -> Self {
        let keep: BTreeSet<usize> = junction_ids
            .iter()
            .filter_map(|id| self.event_members(id.as_ref(), event_type))
            .flatten()
            .copied()
            .collect();
        Self::new(
            keep.iter().map(|i| self.junctions[*i].clone()).collect(),
            self.samples.clone(),
            keep.iter().map(|i| self.counts[*i].clone()).collect(),
        )
    }

    pub fn filter_event5<S: AsRef<str>>(&self, junction_ids: &[S]) -> Self {
        self.filter_event(junction_ids, EventType::Psi5)
    }

    pub fn filter_event3<S: AsRef<str>>(&self, junction_ids: &[S]) -> Self {
        self.filter_event(junction_ids, EventType::Psi3)
    }
}

fn parse_field(value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::parse(format!("Invalid count {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTS: &str = "Chromosome,Start,End,Strand,S1,S2,S3
1,100,200,+,10,0,4
1,100,300,+,2,8,4
1,150,300,+,0,2,
2,50,80,-,5,5,5
";

    fn table() -> CountTable {
        CountTable::from_reader(COUNTS.as_bytes()).unwrap()
    }

    #[test]
    fn test_read_counts() {
        let ct = table();
        assert_eq!(ct.len(), 4);
        assert_eq!(ct.samples(), &["S1", "S2", "S3"]);
        assert_eq!(ct.count("1:100-300:+", "S2"), Some(8));
        assert_eq!(ct.count("1:150-300:+", "S3"), Some(0));
        assert_eq!(ct.count("1:150-300:+", "S4"), None);
        assert_eq!(ct.count("3:1-2:+", "S1"), None);
    }

    #[test]
    fn test_events() {
        let ct = table();
        assert_eq!(ct.event5("1:100-200:+"), vec!["1:100-200:+", "1:100-300:+"]);
        assert_eq!(ct.event3("1:100-300:+"), vec!["1:100-300:+", "1:150-300:+"]);
        assert_eq!(ct.event5("2:50-80:-"), vec!["2:50-80:-"]);
        assert!(ct.event5("3:1-2:+").is_empty());
    }

    #[test]
    fn test_psi() {
        let ct = table();
        assert_eq!(ct.psi5("1:100-200:+", "S1"), Some(10.0 / 12.0));
        assert_eq!(ct.psi5("1:100-200:+", "S2"), Some(0.0));
        assert_eq!(ct.psi3("1:100-300:+", "S2"), Some(0.8));
        assert_eq!(ct.ref_psi5("1:100-200:+"), Some(14.0 / 28.0));
        assert_eq!(ct.ref_psi3("1:150-300:+"), Some(2.0 / 16.0));
    }

    #[test]
    fn test_psi_without_reads() {
        let ct = CountTable::new(
            vec![Junction::new("1", 1, 10, Strand::Plus)],
            vec!["S1".to_string()],
            vec![vec![0]],
        );
        assert_eq!(ct.psi5("1:1-10:+", "S1"), None);
        assert_eq!(ct.ref_psi3("1:1-10:+"), None);
    }

    #[test]
    fn test_filter_event() {
        let ct = table();
        let filtered = ct.filter_event5(&["1:100-300:+"]);
        assert_eq!(filtered.junctions(), &["1:100-200:+", "1:100-300:+"]);

        let filtered = ct.filter_event3(&["1:100-300:+", "3:1-2:+"]);
        assert_eq!(filtered.junctions(), &["1:100-300:+", "1:150-300:+"]);
        assert_eq!(filtered.count("1:150-300:+", "S2"), Some(2));
    }

    #[test]
    fn test_missing_column() {
        let data = "Chromosome,Start,Strand,S1\n1,100,+,1\n";
        assert!(CountTable::from_reader(data.as_bytes()).is_err());
    }
}
