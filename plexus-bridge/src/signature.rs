//! HMAC-SHA256 envelope signing: `HMAC-SHA256(shared_secret, caller ‖
//! module ‖ command ‖ canonical_json(args) ‖ nonce ‖ timestamp)`, verified
//! with the same `subtle` constant-time comparator `plexus-core`'s CSRF
//! check uses.

use hmac::{Hmac, Mac};
use rand::RngCore;
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// `serde_json::Value`'s default `Map` is a `BTreeMap` (the `preserve_order`
/// feature is off), so plain `to_string` already yields a deterministic,
/// key-sorted rendering — this *is* `canonical_json`.
fn canonical_json(args: &[Value]) -> String {
    serde_json::to_string(args).unwrap_or_else(|_| "[]".to_string())
}

fn signing_base(caller: &str, module: &str, command: &str, args: &[Value], nonce: &str, timestamp: i64) -> String {
    format!(
        "{caller}\u{1f}{module}\u{1f}{command}\u{1f}{}\u{1f}{nonce}\u{1f}{timestamp}",
        canonical_json(args)
    )
}

/// Sign a bridge call with the target distributor's shared secret.
pub fn sign(
    secret: &str,
    caller: &str,
    module: &str,
    command: &str,
    args: &[Value],
    nonce: &str,
    timestamp: i64,
) -> String {
    let base = signing_base(caller, module, command, args, nonce, timestamp);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(base.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a signature against the same shared secret, in constant time.
pub fn verify(
    secret: &str,
    caller: &str,
    module: &str,
    command: &str,
    args: &[Value],
    nonce: &str,
    timestamp: i64,
    signature: &str,
) -> bool {
    let expected = sign(secret, caller, module, command, args, nonce, timestamp);
    bool::from(expected.as_bytes().ct_eq(signature.as_bytes()))
}

/// A random 16-byte hex nonce for one bridge call.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

// `hex` isn't a separate workspace dependency; encode/decode inline since
// the alphabet is fixed and the need is this narrow.
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}
