//! Receiving end of the bridge: verify the caller's signature and
//! allowlist membership, then dispatch into the target `Distributor`'s
//! command table. Exposed as a plain function rather than a framework
//! route handler — the embedding application wires this to whichever HTTP
//! server or subprocess entry point it uses.

use chrono::Utc;
use plexus_core::{AppError, Distributor, DistributorId};

use crate::envelope::{BridgeEnvelope, BridgeRequest, ACCESS_DENIED, COMMAND_NOT_FOUND, INTERNAL_ERROR, MODULE_NOT_FOUND};
use crate::signature::verify;

/// Verify `request`'s signature against `secret`, check the caller against
/// `distributor`'s bridge allowlist, and execute the bridge command,
/// producing a [`BridgeEnvelope`] for every outcome — this function never
/// panics and never needs the caller to handle an `Err` separately, mirroring
/// "Bridge `ACCESS_DENIED`... A observes that as a structured error, not a
/// panic."
pub fn handle_bridge_request(distributor: &Distributor, secret: &str, request: &BridgeRequest) -> BridgeEnvelope {
    let source = distributor.id.as_wire();
    let now = Utc::now().timestamp();

    let signature_ok = verify(
        secret,
        &request.caller,
        &request.module,
        &request.command,
        &request.args,
        &request.nonce,
        request.timestamp,
        &request.signature,
    );
    if !signature_ok {
        return BridgeEnvelope::error(source, ACCESS_DENIED, "signature verification failed", now);
    }

    let caller = DistributorId::parse(&request.caller);
    if let Err(err) = distributor.check_bridge_caller(&caller) {
        return BridgeEnvelope::error(source, ACCESS_DENIED, err.to_string(), now);
    }

    if distributor.module_info(&request.module).is_none() {
        return BridgeEnvelope::error(source, MODULE_NOT_FOUND, format!("module '{}' not loaded", request.module), now);
    }

    match distributor.execute_bridge_command(&request.module, &request.caller, &request.command, &request.args) {
        Ok(result) => BridgeEnvelope::ok(source, result, now),
        Err(AppError::CommandNotFound(msg)) => BridgeEnvelope::error(source, COMMAND_NOT_FOUND, msg, now),
        Err(AppError::AccessDenied(msg)) => BridgeEnvelope::error(source, ACCESS_DENIED, msg, now),
        Err(other) => BridgeEnvelope::error(source, INTERNAL_ERROR, other.to_string(), now),
    }
}
