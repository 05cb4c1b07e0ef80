//! HMAC-SHA256 request signing for signed REST endpoints.

use bot_core::ExchangeError;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

/// Signs query strings with the account's API secret.
pub struct Signer {
    api_secret: SecretString,
}

impl Signer {
    pub fn new(api_secret: SecretString) -> Self {
        Self { api_secret }
    }

    /// Hex-encoded HMAC-SHA256 of `payload`.
    pub fn sign(&self, payload: &str) -> Result<String, ExchangeError> {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.expose_secret().as_bytes())
            .map_err(|e| ExchangeError::Configuration(format!("hmac init: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").field("api_secret", &"[REDACTED]").finish()
    }
}

/// Join parameters as `k=v&...` in key order, URL-encoding values.
pub fn encode_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference vector from the exchange's API documentation.
    #[test]
    fn test_sign_matches_reference_vector() {
        let signer = Signer::new(SecretString::new(
            "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j".to_string(),
        ));
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            signer.sign(query).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_encode_query_is_sorted() {
        let mut params = BTreeMap::new();
        params.insert("symbol".to_string(), "BTCUSDT".to_string());
        params.insert("side".to_string(), "BUY".to_string());
        params.insert("newClientOrderId".to_string(), "twap:1".to_string());
        assert_eq!(
            encode_query(&params),
            "newClientOrderId=twap%3A1&side=BUY&symbol=BTCUSDT"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let signer = Signer::new(SecretString::new("top-secret".to_string()));
        assert!(!format!("{:?}", signer).contains("top-secret"));
    }
}
