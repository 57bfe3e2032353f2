//! Append-only interning of sample ids.
//!
//! Buckets store 4-byte [`SampleKey`]s instead of owned strings. A key is the
//! position of the id in the arena, so it is stable for the arena's lifetime
//! and can index side tables such as stored signatures.

use hashbrown::HashMap;

use crate::IndexError;

/// Stable handle for an interned sample id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleKey(u32);

impl SampleKey {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default, Clone)]
pub struct SampleArena {
    ids: Vec<String>,
    lookup: HashMap<String, SampleKey>,
}

impl SampleArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `sample_id`, returning its key and whether it was new.
    pub fn intern(&mut self, sample_id: &str) -> Result<(SampleKey, bool), IndexError> {
        if let Some(&key) = self.lookup.get(sample_id) {
            return Ok((key, false));
        }
        let next = u32::try_from(self.ids.len()).map_err(|_| IndexError::ArenaFull(self.ids.len()))?;
        let key = SampleKey(next);
        self.ids.push(sample_id.to_owned());
        self.lookup.insert(sample_id.to_owned(), key);
        Ok((key, true))
    }

    pub fn key_of(&self, sample_id: &str) -> Option<SampleKey> {
        self.lookup.get(sample_id).copied()
    }

    /// Resolve a key produced by this arena. Foreign keys resolve to `None`.
    pub fn get(&self, key: SampleKey) -> Option<&str> {
        self.ids.get(key.index()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
