//! The PATRICIA trie (component D) and its binary PATTY persistence.

pub mod node;
pub mod patty;

pub use node::{Edge, LookupBytes, Node, NodeId, Trie};

use std::io;
use std::path::Path;
use std::sync::Arc;

/// Component I: seeds a lookup-linked trie from a CSV file, treating every
/// field of every record as a key to insert. This is a thin adapter over
/// the `csv` crate — the line-batching itself is the named external
/// collaborator, not something this crate re-implements.
pub fn from_csv(path: impl AsRef<Path>) -> io::Result<Trie> {
    let raw = std::fs::read(path.as_ref())?;
    let lookup_bytes: Arc<[u8]> = Arc::from(raw.as_slice());
    let mut trie = Trie::with_lookup_region(Arc::clone(&lookup_bytes));

    let mut reader = csv::ReaderBuilder::new().has_headers(false).from_reader(raw.as_slice());
    for result in reader.records() {
        let record = result.map_err(io::Error::other)?;
        for field in record.iter() {
            if !field.is_empty() {
                trie.insert(field);
            }
        }
    }
    Ok(trie)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn random_ascii_fill_is_findable_and_prefix_findable(
            words in proptest::collection::vec("[a-z]{1,12}", 1..200)
        ) {
            let mut trie = Trie::new();
            for w in &words {
                trie.insert(w);
            }
            for w in &words {
                let (n, node) = trie.search_ext(w);
                prop_assert_eq!(n, w.len());
                prop_assert!(trie.is_terminal(node));
                for i in 1..w.len() {
                    let prefix = &w[..i];
                    prop_assert_eq!(trie.search(prefix), prefix.len());
                }
            }
        }
    }
}
