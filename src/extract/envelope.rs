//! Descriptor envelope unwrapping
//!
//! The descriptor endpoint returns JSON wrapped in a jsonp callback:
//! a fixed call prefix, the payload, then `);`. Unwrapping is deliberately
//! rigid: strip the known prefix, drop the final two characters, parse the
//! remainder. Any drift in the wrapper format must fail loudly here instead of
//! producing a half-parsed descriptor.

use crate::error::{ExtractError, Result};
use crate::types::RawDescriptor;

/// The callback prefix the descriptor endpoint wraps its payload in
const ENVELOPE_PREFIX: &str = "$mediaObject.jsonpHelper.storeAndPlay(";

/// Strip the callback envelope and parse the descriptor payload
pub fn unwrap_descriptor(body: &str) -> Result<RawDescriptor> {
    let rest = body
        .trim()
        .strip_prefix(ENVELOPE_PREFIX)
        .ok_or(ExtractError::EnvelopePrefix)?;
    let json = rest
        .len()
        .checked_sub(2)
        .and_then(|end| rest.get(..end))
        .ok_or(ExtractError::EnvelopeTruncated)?;
    let value = serde_json::from_str(json)?;
    Ok(RawDescriptor::new(value))
}
