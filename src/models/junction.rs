use core::str::FromStr;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::errors::Error;

/// Strand of a junction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl FromStr for Strand {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Self::Plus),
            "-" => Ok(Self::Minus),
            _ => Err(Error::parse(format!("Invalid strand {}", s))),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Strand::Plus => "+",
                Strand::Minus => "-",
            }
        )
    }
}

/// The splice site of a junction that an event refers to
///
/// `psi5` events describe the usage of the 5' (donor) splice site,
/// `psi3` events the usage of the 3' (acceptor) splice site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "psi5")]
    Psi5,
    #[serde(rename = "psi3")]
    Psi3,
}

impl FromStr for EventType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "psi5" => Ok(Self::Psi5),
            "psi3" => Ok(Self::Psi3),
            _ => Err(Error::parse(format!("Invalid event type {}", s))),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                EventType::Psi5 => "psi5",
                EventType::Psi3 => "psi3",
            }
        )
    }
}

/// An intron defined by its first and last base (1-based, inclusive)
///
/// # Examples
///
/// ```rust
/// use splicing_outlier::models::{EventType, Junction, Strand};
///
/// let junction: Junction = "17:41215968-41234420:-".parse().unwrap();
/// assert_eq!(junction.start, 41215968);
/// assert_eq!(junction.strand, Strand::Minus);
/// assert_eq!(junction.splice_site_position(EventType::Psi5), 41234420);
/// assert_eq!(junction.to_string(), "17:41215968-41234420:-");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Junction {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
}

impl Junction {
    pub fn new(chrom: &str, start: u64, end: u64, strand: Strand) -> Self {
        Junction {
            chrom: chrom.to_string(),
            start,
            end,
            strand,
        }
    }

    /// Returns the intronic base adjacent to the splice site of the event
    pub fn splice_site_position(&self, event_type: EventType) -> u64 {
        match (event_type, self.strand) {
            (EventType::Psi5, Strand::Plus) | (EventType::Psi3, Strand::Minus) => self.start,
            (EventType::Psi5, Strand::Minus) | (EventType::Psi3, Strand::Plus) => self.end,
        }
    }

    /// Returns the id of the splice site, `chrom:position:strand`
    pub fn splice_site(&self, event_type: EventType) -> String {
        format!(
            "{}:{}:{}",
            self.chrom,
            self.splice_site_position(event_type),
            self.strand
        )
    }
}

impl FromStr for Junction {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidJunction(s.to_string());

        // chromosome names may contain ':' (e.g. HLA contigs), so split from the right
        let mut parts = s.rsplitn(3, ':');
        let strand = parts.next().ok_or_else(invalid)?;
        let interval = parts.next().ok_or_else(invalid)?;
        let chrom = parts.next().ok_or_else(invalid)?;

        let (start, end) = interval.split_once('-').ok_or_else(invalid)?;
        let start: u64 = start.parse().map_err(|_| invalid())?;
        let end: u64 = end.parse().map_err(|_| invalid())?;
        if start > end || chrom.is_empty() {
            return Err(invalid());
        }

        Ok(Junction {
            chrom: chrom.to_string(),
            start,
            end,
            strand: strand.parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for Junction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}-{}:{}", self.chrom, self.start, self.end, self.strand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_junction() {
        let junction = Junction::from_str("chr1:100-200:+").unwrap();
        assert_eq!(junction, Junction::new("chr1", 100, 200, Strand::Plus));
    }

    #[test]
    fn test_parse_invalid_junction() {
        assert!(Junction::from_str("chr1:100-200").is_err());
        assert!(Junction::from_str("chr1:200-100:+").is_err());
        assert!(Junction::from_str("chr1:100_200:+").is_err());
        assert!(Junction::from_str("chr1:100-200:*").is_err());
    }

    #[test]
    fn test_splice_sites() {
        let plus = Junction::new("1", 100, 200, Strand::Plus);
        assert_eq!(plus.splice_site(EventType::Psi5), "1:100:+");
        assert_eq!(plus.splice_site(EventType::Psi3), "1:200:+");

        let minus = Junction::new("1", 100, 200, Strand::Minus);
        assert_eq!(minus.splice_site(EventType::Psi5), "1:200:-");
        assert_eq!(minus.splice_site(EventType::Psi3), "1:100:-");
    }
}
