//! Domain types: junctions, variants and nucleotide sequences

mod junction;
mod sequence;
mod variant;

pub use crate::models::junction::{EventType, Junction, Strand};
pub use crate::models::sequence::{encode_dna, Nucleotide, OneHot, Sequence};
pub use crate::models::variant::Variant;
