use std::cmp::Ordering;
use std::fmt;

use anyhow::{anyhow, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Evr {
    pub epoch: u64,
    pub version: String,
    pub release: Option<String>,
}

impl Evr {
    pub fn new(epoch: u64, version: impl Into<String>, release: Option<String>) -> Self {
        Self {
            epoch,
            version: version.into(),
            release,
        }
    }

    // Format: [epoch:]version[-release]
    pub fn parse(input: &str) -> Result<Self> {
        let (epoch_str, rest) = match input.split_once(':') {
            Some((epoch, rest)) => (epoch, rest),
            None => ("0", input),
        };

        let epoch = if epoch_str.is_empty() {
            0
        } else {
            epoch_str
                .parse::<u64>()
                .map_err(|err| anyhow!("invalid epoch in version '{input}': {err}"))?
        };

        let (version, release) = match rest.split_once('-') {
            Some((version, release)) => (version.to_string(), Some(release.to_string())),
            None => (rest.to_string(), None),
        };

        if version.is_empty() {
            return Err(anyhow!("empty version component in '{input}'"));
        }

        Ok(Self {
            epoch,
            version,
            release,
        })
    }
}

impl fmt::Display for Evr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.version)?;
        if let Some(release) = &self.release {
            write!(f, "-{release}")?;
        }
        Ok(())
    }
}

impl Ord for Evr {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.epoch.cmp(&other.epoch) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match compare_segments(&self.version, &other.version) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match (&self.release, &other.release) {
            (Some(left), Some(right)) => compare_segments(left, right),
            (left, right) => left.cmp(right),
        }
    }
}

impl PartialOrd for Evr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Segment-wise version ordering: alternating digit and letter runs compare
// numerically and lexicographically respectively; a numeric segment outranks
// an alphabetic one; separators only delimit segments.
fn compare_segments(left: &str, right: &str) -> Ordering {
    let left_segments = split_segments(left);
    let right_segments = split_segments(right);

    for pair in left_segments.iter().zip(right_segments.iter()) {
        let ord = match pair {
            (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(b),
            (Segment::Alpha(a), Segment::Alpha(b)) => a.cmp(b),
            (Segment::Numeric(_), Segment::Alpha(_)) => Ordering::Greater,
            (Segment::Alpha(_), Segment::Numeric(_)) => Ordering::Less,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    left_segments.len().cmp(&right_segments.len())
}

#[derive(Debug, PartialEq, Eq)]
enum Segment {
    Numeric(u64),
    Alpha(String),
}

fn split_segments(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_ascii_digit() {
            let mut run = String::new();
            while let Some(&digit) = chars.peek() {
                if !digit.is_ascii_digit() {
                    break;
                }
                run.push(digit);
                chars.next();
            }
            // Leading zeros would overflow u64 only past 20 digits; saturate.
            segments.push(Segment::Numeric(run.parse::<u64>().unwrap_or(u64::MAX)));
        } else if ch.is_ascii_alphabetic() {
            let mut run = String::new();
            while let Some(&letter) = chars.peek() {
                if !letter.is_ascii_alphabetic() {
                    break;
                }
                run.push(letter);
                chars.next();
            }
            segments.push(Segment::Alpha(run));
        } else {
            chars.next();
        }
    }

    segments
}
