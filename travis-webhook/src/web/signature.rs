//! Travis CI webhook signature verification.
//!
//! Travis signs the raw `payload` string with its private key (RSA, SHA-1)
//! and sends the base64 signature in the `Signature` header. The matching
//! public key is published at the API's `/config` endpoint.
//! Reference: https://docs.travis-ci.com/user/notifications/#verifying-webhook-requests

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Public};
use openssl::rsa::Rsa;
use openssl::sign::Verifier;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::VerifyError;

/// Outcome of checking one request's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid,
    Invalid(VerifyError),
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid)
    }
}

impl From<Result<(), VerifyError>> for Verification {
    fn from(result: Result<(), VerifyError>) -> Self {
        match result {
            Ok(()) => Verification::Valid,
            Err(e) => Verification::Invalid(e),
        }
    }
}

// `{"config":{"notifications":{"webhook":{"public_key":"..."}}}}`
#[derive(Debug, Default, Deserialize)]
struct KeyResponse {
    #[serde(default)]
    config: Option<KeyConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct KeyConfig {
    #[serde(default)]
    notifications: Option<KeyNotifications>,
}

#[derive(Debug, Default, Deserialize)]
struct KeyNotifications {
    #[serde(default)]
    webhook: Option<KeyWebhook>,
}

#[derive(Debug, Default, Deserialize)]
struct KeyWebhook {
    #[serde(default)]
    public_key: Option<String>,
}

impl KeyResponse {
    fn into_public_key(self) -> Option<String> {
        self.config?.notifications?.webhook?.public_key
    }
}

/// Extract the PEM public key from a key-service response body.
///
/// A `null` body or any missing level yields [`VerifyError::MissingKey`].
pub fn parse_key_response(body: &str) -> Result<String, VerifyError> {
    let response: Option<KeyResponse> = serde_json::from_str(body)
        .map_err(|e| VerifyError::MalformedKeyResponse(e.to_string()))?;

    response
        .and_then(KeyResponse::into_public_key)
        .filter(|k| !k.trim().is_empty())
        .ok_or(VerifyError::MissingKey)
}

/// Fetch the current Travis public key.
pub async fn fetch_public_key(
    client: &Client,
    config_url: &Url,
    timeout: Duration,
) -> Result<String, VerifyError> {
    let response = client
        .get(config_url.clone())
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| VerifyError::KeyFetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(VerifyError::KeyFetch(format!("HTTP {}", status.as_u16())));
    }

    let body = response
        .text()
        .await
        .map_err(|e| VerifyError::KeyFetch(e.to_string()))?;

    parse_key_response(&body)
}

/// Verify a base64 RSA/SHA-1 signature over the exact payload bytes.
///
/// Accepts both SubjectPublicKeyInfo (`BEGIN PUBLIC KEY`) and PKCS#1
/// (`BEGIN RSA PUBLIC KEY`) PEM encodings.
pub fn verify_signature(
    public_key_pem: &str,
    payload: &str,
    signature: &str,
) -> Result<(), VerifyError> {
    let signature = STANDARD
        .decode(signature.trim())
        .map_err(|_| VerifyError::MalformedSignature)?;

    let key = load_public_key(public_key_pem)?;

    let mut verifier = Verifier::new(MessageDigest::sha1(), &key)
        .map_err(|e| VerifyError::MalformedKey(e.to_string()))?;
    verifier
        .update(payload.as_bytes())
        .map_err(|e| VerifyError::MalformedKey(e.to_string()))?;

    match verifier.verify(&signature) {
        Ok(true) => Ok(()),
        Ok(false) => Err(VerifyError::Mismatch),
        Err(e) => {
            debug!(error = %e, "signature_verify_error");
            Err(VerifyError::Mismatch)
        }
    }
}

fn load_public_key(pem: &str) -> Result<PKey<Public>, VerifyError> {
    let pem = pem.trim().as_bytes();
    PKey::public_key_from_pem(pem)
        .or_else(|_| Rsa::public_key_from_pem_pkcs1(pem).and_then(PKey::from_rsa))
        .map_err(|e| VerifyError::MalformedKey(e.to_string()))
}

/// Verifies request signatures against a freshly fetched key.
///
/// The key is fetched on every call and never cached.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    client: Client,
    config_url: Url,
    timeout: Duration,
}

impl SignatureVerifier {
    pub fn new(client: Client, config_url: Url, timeout: Duration) -> Self {
        Self {
            client,
            config_url,
            timeout,
        }
    }

    /// Check `signature` over `payload`. Every failure is an `Invalid`.
    pub async fn verify(&self, payload: &str, signature: Option<&str>) -> Verification {
        let Some(signature) = signature.filter(|s| !s.trim().is_empty()) else {
            warn!("signature_missing");
            return Verification::Invalid(VerifyError::MissingSignature);
        };

        let fetched = fetch_public_key(&self.client, &self.config_url, self.timeout).await;
        let public_key = match fetched {
            Ok(key) => key,
            Err(e) => {
                warn!(config_url = %self.config_url, error = %e, "public_key_fetch_failed");
                return Verification::Invalid(e);
            }
        };

        debug!(
            public_key_length = public_key.len(),
            signature_length = signature.len(),
            "public_key_fetched"
        );

        let result = verify_signature(&public_key, payload, signature);
        if let Err(e) = &result {
            warn!(
                error = %e,
                payload_length = payload.len(),
                "signature_invalid"
            );
        }

        result.into()
    }
}


#[cfg(test)]
mod tests {
    use super::test_keys::TestKey;
    use super::*;
    use base64::Engine as _;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAYLOAD: &str = r#"{"number":"42","state":"passed"}"#;

    fn flip_base64_byte(signature: &str) -> String {
        let mut raw = STANDARD.decode(signature).unwrap();
        raw[10] ^= 0x01;
        STANDARD.encode(raw)
    }

    fn key_body(pem: &str) -> serde_json::Value {
        json!({"config": {"notifications": {"webhook": {"public_key": pem}}}})
    }

    fn ok_key_response(key: &TestKey) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(key_body(&key.public_pem()))
    }

    async fn key_server(response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config"))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    fn verifier_for(server: &MockServer) -> SignatureVerifier {
        let url = Url::parse(&format!("{}/config", server.uri())).unwrap();
        SignatureVerifier::new(Client::new(), url, Duration::from_secs(5))
    }

    #[test]
    fn test_verify_signature_valid() {
        let key = TestKey::generate();
        let signature = key.sign(PAYLOAD);
        assert_eq!(verify_signature(&key.public_pem(), PAYLOAD, &signature), Ok(()));
    }

    #[test]
    fn test_verify_signature_pkcs1_key() {
        let key = TestKey::generate();
        let signature = key.sign(PAYLOAD);
        assert_eq!(verify_signature(&key.public_pem_pkcs1(), PAYLOAD, &signature), Ok(()));
    }

    #[test]
    fn test_verify_signature_flipped_signature_byte() {
        let key = TestKey::generate();
        let signature = flip_base64_byte(&key.sign(PAYLOAD));
        assert_eq!(
            verify_signature(&key.public_pem(), PAYLOAD, &signature),
            Err(VerifyError::Mismatch)
        );
    }

    #[test]
    fn test_verify_signature_modified_payload() {
        let key = TestKey::generate();
        let signature = key.sign(PAYLOAD);
        let tampered = PAYLOAD.replace("passed", "failed");
        assert_eq!(
            verify_signature(&key.public_pem(), &tampered, &signature),
            Err(VerifyError::Mismatch)
        );
    }

    #[test]
    fn test_verify_signature_no_normalization() {
        let key = TestKey::generate();
        let signature = key.sign(PAYLOAD);
        let spaced = format!("{} ", PAYLOAD);
        assert_eq!(
            verify_signature(&key.public_pem(), &spaced, &signature),
            Err(VerifyError::Mismatch)
        );
    }

    #[test]
    fn test_verify_signature_wrong_key() {
        let signer = TestKey::generate();
        let other = TestKey::generate();
        let signature = signer.sign(PAYLOAD);
        assert_eq!(
            verify_signature(&other.public_pem(), PAYLOAD, &signature),
            Err(VerifyError::Mismatch)
        );
    }

    #[test]
    fn test_verify_signature_malformed_inputs() {
        let key = TestKey::generate();
        assert_eq!(
            verify_signature(&key.public_pem(), PAYLOAD, "not base64!!"),
            Err(VerifyError::MalformedSignature)
        );
        assert!(matches!(
            verify_signature("-----BEGIN PUBLIC KEY-----\ngarbage\n", PAYLOAD, &key.sign(PAYLOAD)),
            Err(VerifyError::MalformedKey(_))
        ));
    }

    #[test]
    fn test_parse_key_response() {
        let body = key_body("PEM").to_string();
        assert_eq!(parse_key_response(&body), Ok("PEM".to_string()));

        assert_eq!(parse_key_response("null"), Err(VerifyError::MissingKey));
        assert_eq!(parse_key_response("{}"), Err(VerifyError::MissingKey));
        assert_eq!(
            parse_key_response(r#"{"config":{"notifications":{}}}"#),
            Err(VerifyError::MissingKey)
        );
        assert!(matches!(
            parse_key_response("<html>"),
            Err(VerifyError::MalformedKeyResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_verifier_accepts_valid_signature() {
        let key = TestKey::generate();
        let server = key_server(ok_key_response(&key)).await;

        let verification = verifier_for(&server).verify(PAYLOAD, Some(&key.sign(PAYLOAD))).await;
        assert_eq!(verification, Verification::Valid);
    }

    #[tokio::test]
    async fn test_verifier_rejects_flipped_signature() {
        let key = TestKey::generate();
        let server = key_server(ok_key_response(&key)).await;

        let signature = flip_base64_byte(&key.sign(PAYLOAD));
        let verification = verifier_for(&server).verify(PAYLOAD, Some(&signature)).await;
        assert_eq!(verification, Verification::Invalid(VerifyError::Mismatch));
    }

    #[tokio::test]
    async fn test_verifier_missing_signature_skips_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let verifier = verifier_for(&server);
        assert_eq!(
            verifier.verify(PAYLOAD, None).await,
            Verification::Invalid(VerifyError::MissingSignature)
        );
        assert_eq!(
            verifier.verify(PAYLOAD, Some("  ")).await,
            Verification::Invalid(VerifyError::MissingSignature)
        );
    }

    #[tokio::test]
    async fn test_verifier_fails_closed_on_malformed_json() {
        let key = TestKey::generate();
        let server = key_server(ResponseTemplate::new(200).set_body_string("{not json")).await;

        let verification = verifier_for(&server).verify(PAYLOAD, Some(&key.sign(PAYLOAD))).await;
        assert!(matches!(
            verification,
            Verification::Invalid(VerifyError::MalformedKeyResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_verifier_fails_closed_on_error_status() {
        let key = TestKey::generate();
        let server = key_server(ResponseTemplate::new(503)).await;

        let verification = verifier_for(&server).verify(PAYLOAD, Some(&key.sign(PAYLOAD))).await;
        assert_eq!(
            verification,
            Verification::Invalid(VerifyError::KeyFetch("HTTP 503".to_string()))
        );
    }

    #[tokio::test]
    async fn test_verifier_fails_closed_on_network_error() {
        let key = TestKey::generate();
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/config", server.uri())).unwrap();
        drop(server);

        let verifier = SignatureVerifier::new(Client::new(), url, Duration::from_secs(2));
        let verification = verifier.verify(PAYLOAD, Some(&key.sign(PAYLOAD))).await;
        assert!(matches!(verification, Verification::Invalid(VerifyError::KeyFetch(_))));
    }
}
