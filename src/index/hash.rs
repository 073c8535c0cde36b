//! Extendible hash table used by the partitioned hash join.
//!
//! A directory of `2^global_depth` slots maps the low bits of a key's hash
//! to a bucket; buckets hold up to one page of entries and split on demand.
//! Directory slots that agree in their low `local_depth` bits always point
//! to the same bucket, so doubling the directory is a pointer copy and a
//! split only rewrites the slots of the bucket being divided. Duplicate
//! keys are kept and returned in insertion order.

use crate::error::{BasaltError, BasaltResult};
use crate::PAGE_SIZE;

/// Entries per bucket: one page of `(i32 key, usize value)` pairs.
pub const BUCKET_CAPACITY: usize = PAGE_SIZE / 12;

/// A put that cannot place its key after this many splits means the hash
/// function has degenerated; treat it as a broken invariant, not a loop.
const SPLIT_RETRY_LIMIT: usize = 10;

#[derive(Debug, Clone)]
struct Bucket {
    local_depth: u32,
    keys: Vec<i32>,
    values: Vec<usize>,
}

impl Bucket {
    fn new(local_depth: u32) -> Self {
        Self {
            local_depth,
            keys: Vec::new(),
            values: Vec::new(),
        }
    }
}

/// Extendible hash table from `i32` keys to `usize` values.
#[derive(Debug, Clone)]
pub struct ExtendibleHashTable {
    directory: Vec<usize>,
    buckets: Vec<Bucket>,
    global_depth: u32,
    bucket_capacity: usize,
}

impl Default for ExtendibleHashTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtendibleHashTable {
    pub fn new() -> Self {
        Self::with_bucket_capacity(BUCKET_CAPACITY)
    }

    /// Custom bucket capacity; tests use tiny buckets to force splits.
    pub fn with_bucket_capacity(bucket_capacity: usize) -> Self {
        assert!(bucket_capacity >= 1);
        Self {
            directory: vec![0],
            buckets: vec![Bucket::new(0)],
            global_depth: 0,
            bucket_capacity,
        }
    }

    pub fn global_depth(&self) -> u32 {
        self.global_depth
    }

    pub fn directory_len(&self) -> usize {
        self.directory.len()
    }

    fn slot_of(&self, key: i32) -> usize {
        (mix(key as u32) as usize) & ((1usize << self.global_depth) - 1)
    }

    /// Appends `(key, value)`; key duplicates are kept.
    ///
    /// ## Output
    /// - `Ok(())`: Entry stored (possibly after directory/bucket growth)
    /// - `Err(InvariantViolation)`: A colliding key cluster would not
    ///   settle within the retry limit
    pub fn put(&mut self, key: i32, value: usize) -> BasaltResult<()> {
        for _ in 0..SPLIT_RETRY_LIMIT {
            let slot = self.slot_of(key);
            let bucket_id = self.directory[slot];

            let bucket = &mut self.buckets[bucket_id];
            if bucket.keys.len() < self.bucket_capacity
                || bucket.keys.iter().all(|&k| k == key)
            {
                // a full bucket of this exact key can never be divided by
                // further hash bits; duplicates overflow in place
                bucket.keys.push(key);
                bucket.values.push(value);
                return Ok(());
            }

            if self.buckets[bucket_id].local_depth == self.global_depth {
                // double the directory; the new upper half mirrors the old
                // slots so every bucket keeps all of its references
                self.directory.extend_from_within(..);
                self.global_depth += 1;
            }

            self.split_bucket(bucket_id);
        }
        Err(BasaltError::InvariantViolation {
            reason: format!(
                "hash bucket for key {} would not settle after {} splits",
                key, SPLIT_RETRY_LIMIT
            ),
        })
    }

    /// Divides a full bucket by the next hash bit and rebinds the directory
    /// slots that now disagree with it.
    fn split_bucket(&mut self, bucket_id: usize) {
        let old_depth = self.buckets[bucket_id].local_depth;
        let new_id = self.buckets.len();

        let keys = std::mem::take(&mut self.buckets[bucket_id].keys);
        let values = std::mem::take(&mut self.buckets[bucket_id].values);
        self.buckets[bucket_id].local_depth = old_depth + 1;
        self.buckets.push(Bucket::new(old_depth + 1));

        for (k, v) in keys.into_iter().zip(values) {
            let goes_high = (mix(k as u32) >> old_depth) & 1 == 1;
            let target = if goes_high { new_id } else { bucket_id };
            self.buckets[target].keys.push(k);
            self.buckets[target].values.push(v);
        }

        for (slot, target) in self.directory.iter_mut().enumerate() {
            if *target == bucket_id && (slot >> old_depth) & 1 == 1 {
                *target = new_id;
            }
        }
    }

    /// Every stored value whose key equals `key`, in insertion order.
    pub fn get(&self, key: i32) -> Vec<usize> {
        let bucket = &self.buckets[self.directory[self.slot_of(key)]];
        bucket
            .keys
            .iter()
            .zip(bucket.values.iter())
            .filter(|&(&k, _)| k == key)
            .map(|(_, &v)| v)
            .collect()
    }

    /// Directory/bucket consistency check used by tests.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.directory.len() != 1usize << self.global_depth {
            return Err("directory size is not 2^global_depth".to_string());
        }
        for (slot, &bucket_id) in self.directory.iter().enumerate() {
            let bucket = &self.buckets[bucket_id];
            if bucket.local_depth > self.global_depth {
                return Err(format!("bucket {} deeper than directory", bucket_id));
            }
            // all slots agreeing in the low local_depth bits share the bucket
            let mask = (1usize << bucket.local_depth) - 1;
            for (other, &other_id) in self.directory.iter().enumerate() {
                if other & mask == slot & mask && other_id != bucket_id {
                    return Err(format!(
                        "slots {} and {} agree in {} bits but differ",
                        slot, other, bucket.local_depth
                    ));
                }
            }
        }
        Ok(())
    }
}

/// The integer-mixing hash; deterministic within a process.
pub fn mix(mut x: u32) -> u32 {
    x = (x ^ (x >> 16)).wrapping_mul(0x45d9f3b);
    x = (x ^ (x >> 16)).wrapping_mul(0x45d9f3b);
    x ^ (x >> 16)
}
