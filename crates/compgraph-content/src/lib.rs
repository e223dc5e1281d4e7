//! Content analysis of component definitions: reference normalization,
//! reference extraction, and API/config hashing.
//!
//! Everything here is a pure function over `serde_json::Value`; graph
//! builders call into this crate for every record they insert.
//!
//! # Modules
//!
//! - [`normalize`]: RawRef shapes and ComponentRef normalization
//! - [`extract`]: recursive reference discovery with type inference
//! - [`hash`]: API-signature and config digests (blake3)

pub mod extract;
pub mod hash;
pub mod normalize;

pub use extract::{definition_body, extract_references, ExtractedRef, Extraction};
pub use hash::{
    api_signature, canonical_json, config_signature, hash_api_signature, hash_component,
    hash_config, stable_hash, ContentHashes,
};
pub use normalize::{
    looks_like_ref, normalize, resolve, sniff, NormalizedRef, RawRef, RefDefaults, DEFAULT_DOMAIN,
    DEFAULT_VERSION,
};
