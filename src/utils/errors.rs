use thiserror::Error;

/// Errors raised while loading inputs, predicting or aggregating
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTSlib error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fasta error: {0}")]
    Fasta(String),

    #[error("`ref_table5` and `ref_table3` cannot be both None")]
    MissingRefTable,

    #[error("\"samples\" column is missing.")]
    MissingSamples,

    #[error("Junction {0} is not part of the reference table")]
    JunctionNotFound(String),

    #[error("Invalid junction id {0}. Expected `chrom:start-end:strand`")]
    InvalidJunction(String),

    #[error("Invalid nucleotide {0}")]
    InvalidNucleotide(char),

    #[error("Invalid value: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Error::Parse(msg.into())
    }
}
