//! Component H: dynamic miner loading via shared libraries.
//!
//! Mirrors `extractor_c_add_miner_from_so`'s bookkeeping: libraries are
//! opened at most once per path, miner factories are resolved by symbol
//! name, and each loaded factory's `meta` pair list is copied out before
//! the miner itself is instantiated.

use std::collections::HashMap;
use std::sync::Arc;

use libloading::{Library, Symbol};

use crate::error::{NextractError, Result};
use crate::miner::Miner;

/// A loaded miner factory: the raw constructor symbol plus the `meta`
/// label pairs it exported, kept alive for as long as any miner built
/// from it is in use.
pub struct LoadedMiner {
    pub so_path: String,
    pub symbol: String,
    pub meta: Vec<(String, String)>,
    library: Arc<Library>,
}

impl LoadedMiner {
    /// Instantiates a fresh [`Miner`] by calling the factory again with
    /// `params`. The constructor symbol's signature is
    /// `extern "C" fn(*const u8) -> *mut Miner`; `params` is passed as an
    /// opaque pointer, matching the original `miner_new(const void*)` contract.
    pub fn instantiate(&self, params: *const u8) -> Result<Miner> {
        type MinerNew = unsafe extern "C" fn(*const u8) -> *mut Miner;
        unsafe {
            let ctor: Symbol<MinerNew> = self
                .library
                .get(self.symbol.as_bytes())
                .map_err(|_| NextractError::PluginSymbolMissing(self.symbol.clone()))?;
            let raw = ctor(params);
            if raw.is_null() {
                return Err(NextractError::MinerFactoryFailed(self.symbol.clone()));
            }
            Ok(*Box::from_raw(raw))
        }
    }
}

/// Tracks every `.so`/`.dylib` opened so a second `load` of the same path
/// reuses the handle instead of re-opening it, matching the original's
/// linear scan over `dlsymbols` by path before falling back to `dlopen`.
#[derive(Default)]
pub struct MinerLoader {
    libraries: HashMap<String, Arc<Library>>,
    loaded: Vec<LoadedMiner>,
}

impl MinerLoader {
    pub fn new() -> MinerLoader {
        MinerLoader::default()
    }

    /// Loads `symbol` from the shared library at `so_path`, reusing an
    /// already-open library handle for the same path. Reads the library's
    /// exported `meta` symbol: a NUL-terminated array of C strings,
    /// interpreted pairwise as (key, value) label metadata.
    #[tracing::instrument(skip(self))]
    pub fn load(&mut self, so_path: &str, symbol: &str) -> Result<&LoadedMiner> {
        if !self.libraries.contains_key(so_path) {
            let lib = unsafe { Library::new(so_path) }
                .map_err(|e| NextractError::PluginLoadFailed(format!("{so_path}: {e}")))?;
            tracing::debug!(so_path, "opened new plugin library");
            self.libraries.insert(so_path.to_string(), Arc::new(lib));
        }
        let library = Arc::clone(self.libraries.get(so_path).expect("just inserted"));

        // Presence check only; the constructor symbol is re-resolved per
        // instantiation since `libloading::Symbol` borrows the library.
        unsafe {
            let _ctor: Symbol<unsafe extern "C" fn(*const u8) -> *mut Miner> =
                library.get(symbol.as_bytes()).map_err(|_| NextractError::PluginSymbolMissing(symbol.to_string()))?;
        }

        let meta = unsafe { read_meta(&library)? };
        tracing::debug!(so_path, symbol, meta_pairs = meta.len(), "loaded miner factory");

        self.loaded.push(LoadedMiner { so_path: so_path.to_string(), symbol: symbol.to_string(), meta, library });
        Ok(self.loaded.last().expect("just pushed"))
    }

    pub fn loaded(&self) -> &[LoadedMiner] {
        &self.loaded
    }
}

/// Reads the library's `meta` symbol: a NULL-terminated `*const *const u8`
/// array of NUL-terminated byte strings, grouped pairwise into (key, value).
/// An odd-length array drops its trailing unpaired entry, matching the
/// original's tolerance for a library that only exports a bare label. A
/// missing `meta` symbol itself is not tolerated: lazy symbol resolution
/// means `load` is where that contract is checked.
unsafe fn read_meta(library: &Library) -> Result<Vec<(String, String)>> {
    type MetaArray = *const *const std::os::raw::c_char;
    let meta: Symbol<MetaArray> =
        library.get(b"meta").map_err(|_| NextractError::PluginSymbolMissing("meta".to_string()))?;
    let mut strings = Vec::new();
    let mut cursor = *meta;
    while !cursor.is_null() {
        let entry = std::ffi::CStr::from_ptr(*cursor);
        strings.push(entry.to_string_lossy().into_owned());
        cursor = cursor.add(1);
    }
    Ok(strings.chunks_exact(2).map(|pair| (pair[0].clone(), pair[1].clone())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_reports_plugin_load_failed() {
        let mut loader = MinerLoader::new();
        let err = loader.load("/nonexistent/path/to/miner.so", "miner_new").unwrap_err();
        assert!(matches!(err, NextractError::PluginLoadFailed { .. }));
    }
}
