use core::str::FromStr;
use std::fmt;

use crate::utils::errors::Error;

// UTF-8 encoding of all nucleotides
const UPPERCASE_A: u8 = 0x41;
const UPPERCASE_C: u8 = 0x43;
const UPPERCASE_G: u8 = 0x47;
const UPPERCASE_T: u8 = 0x54;
const UPPERCASE_N: u8 = 0x4e;
const LOWERCASE_A: u8 = 0x61;
const LOWERCASE_C: u8 = 0x63;
const LOWERCASE_G: u8 = 0x67;
const LOWERCASE_T: u8 = 0x74;
const LOWERCASE_N: u8 = 0x6e;

const LF: u8 = 0xa;
const CR: u8 = 0xd;

/// One-hot encoding of a single nucleotide in `A C G T` order
pub type OneHot = [f32; 4];

/// Nucleotide is a single DNA nucleotide (A C G T N)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nucleotide {
    A,
    C,
    G,
    T,
    N,
}

impl Nucleotide {
    /// Crates a `Nucleotide` from a character
    pub fn new(c: &char) -> Result<Self, Error> {
        match c {
            'a' | 'A' => Ok(Self::A),
            'c' | 'C' => Ok(Self::C),
            'g' | 'G' => Ok(Self::G),
            't' | 'T' => Ok(Self::T),
            'n' | 'N' => Ok(Self::N),
            _ => Err(Error::InvalidNucleotide(*c)),
        }
    }

    /// Returns the complementary nucleotide
    pub fn complement(&self) -> Self {
        match self {
            Self::A => Self::T,
            Self::C => Self::G,
            Self::G => Self::C,
            Self::T => Self::A,
            Self::N => Self::N,
        }
    }

    /// Returns the one-hot encoding of the nucleotide. `N` is all zeros.
    pub fn one_hot(self) -> OneHot {
        match self {
            Self::A => [1.0, 0.0, 0.0, 0.0],
            Self::C => [0.0, 1.0, 0.0, 0.0],
            Self::G => [0.0, 0.0, 1.0, 0.0],
            Self::T => [0.0, 0.0, 0.0, 1.0],
            Self::N => [0.0, 0.0, 0.0, 0.0],
        }
    }
}

impl FromStr for Nucleotide {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::new(&c),
            _ => Err(Error::parse(format!("Invalid nucleotide {}", s))),
        }
    }
}

impl fmt::Display for Nucleotide {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", char::from(self))
    }
}

impl TryFrom<&u8> for Nucleotide {
    type Error = Error;
    /// Converts a raw byte into a `Nucleotide`
    ///
    /// Newlines are rejected, so that they can be skipped when reading
    /// raw Fasta bytes. IUPAC ambiguity codes are read as `N`.
    fn try_from(b: &u8) -> Result<Nucleotide, Error> {
        match b {
            &LOWERCASE_A | &UPPERCASE_A => Ok(Self::A),
            &LOWERCASE_C | &UPPERCASE_C => Ok(Self::C),
            &LOWERCASE_G | &UPPERCASE_G => Ok(Self::G),
            &LOWERCASE_T | &UPPERCASE_T => Ok(Self::T),
            &LOWERCASE_N | &UPPERCASE_N => Ok(Self::N),
            &LF | &CR => Err(Error::parse("newline")),
            b if b.is_ascii_alphabetic() => Ok(Self::N),
            _ => Err(Error::InvalidNucleotide(*b as char)),
        }
    }
}

impl From<&Nucleotide> for char {
    fn from(n: &Nucleotide) -> Self {
        match n {
            Nucleotide::A => 'A',
            Nucleotide::C => 'C',
            Nucleotide::G => 'G',
            Nucleotide::T => 'T',
            Nucleotide::N => 'N',
        }
    }
}

/// A DNA sequence consisting of Nucleotides.
///
/// It provides the utility methods needed to bring genomic windows into
/// transcript orientation ([`reverse_complement`](`Sequence::reverse_complement`)).
/// Windows are encoded for the splicing model with [`encode_dna`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sequence {
    sequence: Vec<Nucleotide>,
}

impl FromStr for Sequence {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut sequence: Vec<Nucleotide> = Vec::with_capacity(s.len());
        for c in s.chars() {
            sequence.push(Nucleotide::new(&c)?)
        }
        Ok(Self { sequence })
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = String::with_capacity(self.len());
        for n in &self.sequence {
            s.push(n.into())
        }
        write!(f, "{}", s)
    }
}

impl Sequence {
    /// Creates a new sequence
    ///
    /// # Examples
    ///
    /// ```rust
    /// use splicing_outlier::models::Sequence;
    ///
    /// let seq = Sequence::new();
    /// assert_eq!(seq.len(), 0)
    /// ```
    pub fn new() -> Self {
        Sequence {
            sequence: Vec::new(),
        }
    }

    /// Creates a new sequence with the specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Sequence {
            sequence: Vec::with_capacity(capacity),
        }
    }

    /// Creates a new `Sequence` from a raw bytes nucleotide sequence, ignoring newlines
    ///
    /// # Examples
    ///
    /// ```rust
    /// use splicing_outlier::models::Sequence;
    ///
    /// let seq = Sequence::from_raw_bytes("AC".as_bytes()).unwrap();
    /// assert_eq!(seq.len(), 2);
    /// let seq = Sequence::from_raw_bytes("A\nC\r\nGT".as_bytes()).unwrap();
    /// assert_eq!(seq.len(), 4);
    /// ```
    pub fn from_raw_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut seq = Self::with_capacity(bytes.len());
        for b in bytes {
            match Nucleotide::try_from(b) {
                Ok(n) => seq.push(n),
                Err(Error::Parse(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(seq)
    }

    /// Returns the length of the Sequence
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Returns true if the Sequence contains no Nucleotides.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Appends a Nucleotide to the back of a collection.
    pub fn push(&mut self, n: Nucleotide) {
        self.sequence.push(n);
    }

    /// Changes `Self` to the complementary sequence
    pub fn complement(&mut self) {
        for n in &mut self.sequence {
            *n = n.complement();
        }
    }

    /// Reverses the `Sequence`, in place
    pub fn reverse(&mut self) {
        self.sequence.reverse()
    }

    /// Changes `Self` into the reverse complement sequence
    ///
    /// # Examples
    /// ```rust
    /// use splicing_outlier::models::Sequence;
    ///
    /// let mut seq = Sequence::from_raw_bytes("AC".as_bytes()).unwrap();
    /// assert_eq!(seq.to_string(), "AC".to_string());
    ///
    /// seq.reverse_complement();
    /// assert_eq!(seq.to_string(), "GT".to_string());
    /// ```
    pub fn reverse_complement(&mut self) {
        self.reverse();
        self.complement();
    }
}

/// One-hot encodes a DNA string in `A C G T` order
///
/// Letters other than `ACGT` (in any case) are encoded as all zeros.
///
/// # Examples
///
/// ```rust
/// use splicing_outlier::models::encode_dna;
///
/// let encoded = encode_dna("AtN");
/// assert_eq!(encoded, vec![[1.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0], [0.0; 4]]);
/// ```
pub fn encode_dna(seq: &str) -> Vec<OneHot> {
    seq.bytes()
        .map(|b| {
            Nucleotide::try_from(&b)
                .map(|n| n.one_hot())
                .unwrap_or([0.0; 4])
        })
        .collect()
}
