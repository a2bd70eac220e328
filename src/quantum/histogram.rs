//! Measurement histograms.

/// Occurrence counts of measured bitstrings.
///
/// Entries keep insertion order, which is the order bits are later
/// flattened in. There are at most 2^5 distinct outcomes for the
/// circuits used here, so lookup is a linear scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    entries: Vec<(String, u64)>,
}

impl Histogram {
    /// Creates an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a histogram from `(bitstring, count)` pairs, merging repeats.
    pub fn from_counts<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut histogram = Self::new();
        for (outcome, count) in counts {
            histogram.add(outcome.into(), count);
        }
        histogram
    }

    /// Records one shot.
    pub fn record(&mut self, outcome: &str) {
        match self.entries.iter_mut().find(|(o, _)| o == outcome) {
            Some((_, count)) => *count = count.saturating_add(1),
            None => self.entries.push((outcome.to_string(), 1)),
        }
    }

    fn add(&mut self, outcome: String, count: u64) {
        match self.entries.iter_mut().find(|(o, _)| *o == outcome) {
            Some((_, c)) => *c = c.saturating_add(count),
            None => self.entries.push((outcome, count)),
        }
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.entries.iter().map(|(o, c)| (o.as_str(), *c))
    }

    /// Total number of shots recorded.
    pub fn total_shots(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |total, (_, c)| total.saturating_add(*c))
    }

    /// Total bits carried by all shots.
    pub fn total_bits(&self) -> u64 {
        self.entries.iter().fold(0u64, |total, (o, c)| {
            total.saturating_add((o.len() as u64).saturating_mul(*c))
        })
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no shots were recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
