//! Layered gateway signature computation and verification.
//!
//! The payment gateway authenticates both directions of the protocol with a
//! chained MD5 construction: the merchant secret is hashed once and
//! uppercased, then appended to the concatenated request fields and hashed
//! again. MD5 and uppercase hex are requirements of the gateway wire
//! protocol, not a design choice of this crate.
//!
//! Field order inside the concatenation is fixed by the protocol; any
//! reordering produces a signature the gateway will reject.

use crate::config::GatewayConfig;
use crate::error::Result;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Status code the gateway sends for a completed payment.
pub const SUCCESS_STATUS_CODE: &str = "2";

/// Outbound payment-initiation response, returned to the client that is
/// about to redirect to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiationResponse {
    /// Initiation hash the gateway expects alongside the order fields.
    pub hash: String,
    /// Merchant identifier, echoed so the client need not know it.
    pub merchant_id: String,
}

/// Computes and verifies the gateway's layered hash signature.
///
/// Constructed from a validated [`GatewayConfig`]; an empty merchant secret
/// is rejected at construction time so verification can never silently run
/// against an empty secret (fail closed).
#[derive(Debug, Clone)]
pub struct SignatureEngine {
    merchant_id: String,
    /// Uppercased MD5 of the merchant secret, precomputed once.
    hashed_secret: String,
}

impl SignatureEngine {
    /// Create a signature engine from gateway credentials.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the merchant id or secret is empty.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            merchant_id: config.merchant_id.clone(),
            hashed_secret: md5_upper(config.merchant_secret.as_bytes()),
        })
    }

    /// Merchant identifier this engine signs for.
    #[must_use]
    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    /// Compute the outbound initiation signature for an order.
    ///
    /// `amount` must be the exact string that will be sent to the gateway
    /// (e.g. `"1000.00"`); the signature is computed over the gateway's own
    /// formatting, not a numeric value.
    #[must_use]
    pub fn initiation_signature(&self, order_id: &str, amount: &str, currency: &str) -> String {
        let payload = format!(
            "{}{}{}{}{}",
            self.merchant_id, order_id, amount, currency, self.hashed_secret
        );
        md5_upper(payload.as_bytes())
    }

    /// Build the full initiation response for an order.
    #[must_use]
    pub fn initiation(&self, order_id: &str, amount: &str, currency: &str) -> InitiationResponse {
        InitiationResponse {
            hash: self.initiation_signature(order_id, amount, currency),
            merchant_id: self.merchant_id.clone(),
        }
    }

    /// Verify an inbound notification signature.
    ///
    /// Returns `true` only when the locally recomputed signature matches
    /// `provided_signature` exactly (both uppercase hex) AND `status_code`
    /// reports a completed payment. Never errors; any mismatch is `false`.
    #[must_use]
    pub fn verify_notification(
        &self,
        order_id: &str,
        amount: &str,
        currency: &str,
        status_code: &str,
        provided_signature: &str,
    ) -> bool {
        let payload = format!(
            "{}{}{}{}{}{}",
            self.merchant_id, order_id, amount, currency, status_code, self.hashed_secret
        );
        let local = md5_upper(payload.as_bytes());

        if local != provided_signature {
            warn!("Signature mismatch for order {order_id}");
            return false;
        }
        if status_code != SUCCESS_STATUS_CODE {
            debug!("Valid signature but non-success status {status_code} for order {order_id}");
            return false;
        }
        true
    }
}

/// Uppercase hex MD5 digest.
fn md5_upper(data: &[u8]) -> String {
    let digest = Md5::digest(data);
    hex::encode_upper(digest)
}
