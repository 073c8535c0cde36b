//! Index substrate: the structures selection and joins consult.
//!
//! - **sorted**: page-blocked sorted index (clustered or unclustered)
//! - **btree**: arena-backed B+-tree with a leaf sibling chain
//! - **hash**: extendible hash table used by the partitioned hash join

pub mod btree;
pub mod hash;
pub mod sorted;


pub use btree::{BPlusTree, TreeDump, MAX_DEGREE, MAX_KEYS};
pub use hash::ExtendibleHashTable;
pub use sorted::{SortedIndex, SORTED_PAGE_KEYS};
