//! Minor allele frequencies of a population cohort
//!
//! A CSV file with a `variant` (`chrom:pos:ref>alt`) and a `maf` column.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::utils::errors::Result;

/// Minor allele frequency by variant id
pub type Population = HashMap<String, f64>;

#[derive(Deserialize)]
struct PopulationRow {
    variant: String,
    maf: f64,
}

/// Reads a population MAF table
pub fn read_population<P: AsRef<Path>>(path: P) -> Result<Population> {
    let population = population_from_reader(File::open(path.as_ref())?)?;
    info!(
        "Loaded {} population frequencies from {}",
        population.len(),
        path.as_ref().display()
    );
    Ok(population)
}

/// Reads a population MAF table from any CSV source
///
/// ```rust
/// use splicing_outlier::population::population_from_reader;
///
/// let data = "variant,maf\n1:150:G>T,0.2\n";
/// let population = population_from_reader(data.as_bytes()).unwrap();
/// assert_eq!(population["1:150:G>T"], 0.2);
/// ```
pub fn population_from_reader<R: Read>(reader: R) -> Result<Population> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    let mut population = Population::new();
    for row in reader.deserialize() {
        let row: PopulationRow = row?;
        population.insert(row.variant, row.maf);
    }
    Ok(population)
}
