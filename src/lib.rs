#![doc = include_str!("../README.md")]

pub mod count_table;
pub mod dataloader;
pub mod fasta;
pub mod model;
pub mod models;
pub mod population;
pub mod predict;
pub mod ref_table;
pub mod result;
pub mod utils;
pub mod vcf;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
