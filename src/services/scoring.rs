use std::collections::BTreeMap;

/// Points by word length. Lengths past the longest entry plateau at that
/// entry's value; lengths below the shortest score nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreTable {
    points: BTreeMap<usize, u32>,
}

impl ScoreTable {
    pub fn new(points: BTreeMap<usize, u32>) -> Self {
        Self { points }
    }

    pub fn score(&self, length: usize) -> u32 {
        if let Some(&points) = self.points.get(&length) {
            return points;
        }
        match self.points.last_key_value() {
            Some((&max_len, &points)) if length > max_len => points,
            _ => 0,
        }
    }

    pub fn max_points(&self) -> u32 {
        self.points.values().copied().max().unwrap_or(0)
    }
}
