//! A pluggable, concurrent text-mining engine: dispatch named miners over a
//! shared UTF-8 stream and collect labelled occurrences.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod automaton;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod miner;
pub mod miners;
pub mod pair;
pub mod patricia;
pub mod predicates;
pub mod regex;
pub mod stream;

pub use error::{NextractError, Result};
pub use extractor::{Extractor, ExtractorFlags};
pub use loader::{LoadedMiner, MinerLoader};
pub use miner::{Dir, Matcher, MatcherFn, Miner, Occurrence};
pub use pair::Pair;
pub use patricia::{Trie, from_csv};
pub use regex::{RegexArtifact, RegexBuildConfig};
pub use stream::{Cursor, Mark, StreamFlags};
