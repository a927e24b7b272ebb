//! Typed error surface for the engine's internal `?`-propagating paths.
//!
//! The public, caller-facing API keeps the original bool-return plus
//! `last_error()` accessor contract (see [`crate::extractor::Extractor`]);
//! this enum backs that string and is also used directly by the regex
//! compiler's `errors` list and the PATRICIA loader.

use thiserror::Error;

/// Every failure mode named by the error-handling design.
///
/// `InvariantViolation` is deliberately not produced by any fallible path in
/// this crate: invariant breaches (e.g. `pos > end`) are programmer errors
/// and panic instead, per the recovery policy.
#[derive(Debug, Error)]
pub enum NextractError {
    #[error("failed to open stream: {0}")]
    StreamOpenFailed(String),

    #[error("stream is in a failed state")]
    StreamFailedState,

    #[error("failed to load plugin artifact: {0}")]
    PluginLoadFailed(String),

    #[error("plugin artifact is missing required symbol: {0}")]
    PluginSymbolMissing(String),

    #[error("miner factory call failed: {0}")]
    MinerFactoryFailed(String),

    #[error("regex syntax error: unbalanced parentheses")]
    RegexSyntaxParens,

    #[error("regex syntax error: invalid range")]
    RegexSyntaxRange,

    #[error("regex syntax error: invalid quantifier")]
    RegexSyntaxQuantifier,

    #[error("regex syntax error: invalid character set")]
    RegexSyntaxCharset,

    #[error("automaton construction failed: {0}")]
    AutomatonConstructionFailed(String),

    #[error("corrupt PATTY file: {0}")]
    PattyCorrupt(String),

    #[error("unknown flag bits: {0:#x}")]
    UnknownFlag(u32),
}

pub type Result<T> = std::result::Result<T, NextractError>;
