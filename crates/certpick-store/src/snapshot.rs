use std::cmp::Ordering;

use time::OffsetDateTime;

use crate::entry::CertificateEntry;

/// Every entry retrieved by one repository query, in enumeration order.
///
/// The snapshot is the only owner of the handles it holds. A [`MatchSet`]
/// refers to entries by index, so no handle is ever owned twice.
#[derive(Debug)]
pub struct Snapshot<E> {
    entries: Vec<E>,
}

impl<E> Snapshot<E> {
    pub fn new(entries: Vec<E>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&E> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entries.iter()
    }

    /// Moves one entry out and drops the snapshot, releasing every other
    /// handle it held.
    pub fn take(mut self, index: usize) -> Option<E> {
        if index < self.entries.len() {
            Some(self.entries.swap_remove(index))
        } else {
            None
        }
    }
}

impl<E: CertificateEntry> Snapshot<E> {
    pub fn filter(&self, subject: &str, valid_only: bool, at: OffsetDateTime) -> MatchSet {
        let indices = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.subject() == subject)
            .filter(|(_, entry)| !valid_only || entry.is_valid_at(at))
            .map(|(index, _)| index)
            .collect();

        MatchSet { indices }
    }
}

impl<E> FromIterator<E> for Snapshot<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Indices of the snapshot entries that passed the subject/validity filter,
/// ascending and without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    indices: Vec<usize>,
}

impl MatchSet {
    pub fn from_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Index of the entry with the latest not-after.
    ///
    /// Ties go to the smallest thumbprint, then to the earliest index.
    /// Indices outside the snapshot are ignored.
    pub fn best<E: CertificateEntry>(&self, snapshot: &Snapshot<E>) -> Option<usize> {
        let mut best: Option<(usize, &E)> = None;

        for &index in &self.indices {
            let Some(candidate) = snapshot.get(index) else {
                continue;
            };

            best = match best {
                Some((_, current)) if !outranks(candidate, current) => best,
                _ => Some((index, candidate)),
            };
        }

        best.map(|(index, _)| index)
    }
}

fn outranks<E: CertificateEntry>(candidate: &E, current: &E) -> bool {
    match candidate.not_after().cmp(&current.not_after()) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => candidate.thumbprint() < current.thumbprint(),
    }
}
