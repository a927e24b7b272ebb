//! Component K: example miners built directly on the miner framework,
//! doubling as the loader's own shared-library fixtures.

pub mod email;
pub mod glob;

pub use email::EmailMiner;
pub use glob::GlobMiner;

use crate::miner::{Matcher, Miner};
use crate::stream::Cursor;

// One `(factory symbol, label)` pair per constructor this cdylib exports,
// NUL-terminated, matching `naive_email_miner.c`'s and `glob_entities.c`'s
// own `meta` arrays.
static META_ENTRIES: [*const std::os::raw::c_char; 5] = [
    c"match_email_naive".as_ptr(),
    c"Email".as_ptr(),
    c"match_glob".as_ptr(),
    c"Glob".as_ptr(),
    std::ptr::null(),
];

#[unsafe(no_mangle)]
#[allow(non_upper_case_globals)]
pub static meta: *const *const std::os::raw::c_char = META_ENTRIES.as_ptr();

/// Factory symbol for the naive email miner. `_params` is unused; emails
/// have no configurable parameters.
///
/// # Safety
/// Matches the loader's `extern "C" fn(*const u8) -> *mut Miner` contract.
/// The returned pointer is owned by the caller, which reconstitutes it via
/// `Box::from_raw`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn match_email_naive(_params: *const u8) -> *mut Miner {
    let cursor = Cursor::open_buffer(b"");
    let miner = Miner::new("Email", cursor, EmailMiner.matcher_fn(), false);
    Box::into_raw(Box::new(miner))
}

/// Factory symbol for the glob miner. `params` is a NUL-terminated C string
/// holding the glob pattern; an invalid glob yields a null pointer, which
/// the loader surfaces as `MinerFactoryFailed`.
///
/// # Safety
/// `params` must point to a valid NUL-terminated UTF-8 C string for the
/// duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn match_glob(params: *const u8) -> *mut Miner {
    if params.is_null() {
        return std::ptr::null_mut();
    }
    let glob = unsafe { std::ffi::CStr::from_ptr(params.cast()) };
    let Ok(glob) = glob.to_str() else {
        return std::ptr::null_mut();
    };
    let Ok(compiled) = GlobMiner::compile(glob) else {
        return std::ptr::null_mut();
    };
    let cursor = Cursor::open_buffer(b"");
    let miner = Miner::new("Glob", cursor, compiled.matcher_fn(), false);
    Box::into_raw(Box::new(miner))
}
