//! Sparse term-weight vectors keyed by vocabulary column.

use crate::TermId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entries sorted by column, one entry per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(TermId, f32)>,
}

impl SparseVector {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, f32)> + '_ {
        self.entries.iter().copied()
    }

    /// Weight at `column`, zero when absent.
    pub fn get(&self, column: TermId) -> f32 {
        self.entries
            .binary_search_by_key(&column, |(c, _)| *c)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    pub fn scaled(&self, factor: f32) -> SparseVector {
        SparseVector { entries: self.entries.iter().map(|(c, w)| (*c, w * factor)).collect() }
    }
}

/// Duplicate columns are summed.
impl FromIterator<(TermId, f32)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (TermId, f32)>>(iter: I) -> Self {
        let mut acc: BTreeMap<TermId, f32> = BTreeMap::new();
        for (c, w) in iter {
            *acc.entry(c).or_insert(0.0) += w;
        }
        SparseVector { entries: acc.into_iter().collect() }
    }
}

/// Merge-join dot product over the shared columns.
pub fn dot(a: &SparseVector, b: &SparseVector) -> f32 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0f32;
    while i < a.entries.len() && j < b.entries.len() {
        let (ca, wa) = a.entries[i];
        let (cb, wb) = b.entries[j];
        if ca == cb {
            sum += wa * wb;
            i += 1;
            j += 1;
        } else if ca < cb {
            i += 1;
        } else {
            j += 1;
        }
    }
    sum
}

pub fn l2_norm(v: &SparseVector) -> f32 {
    v.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
}

/// Unit-length copy of `v`; a zero vector stays zero.
pub fn l2_normalize(v: &SparseVector) -> SparseVector {
    let norm = l2_norm(v);
    if norm == 0.0 { return v.clone(); }
    v.scaled(1.0 / norm)
}
