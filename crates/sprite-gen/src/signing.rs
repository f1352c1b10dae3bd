//! Signed request builder
//!
//! Turns `(endpoint path, body, credentials)` into a request descriptor the
//! HTTP layer can send verbatim. The image service authenticates every call
//! with an HMAC-SHA1 signature carried in the query string; the model service
//! only needs a bearer header.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sprite_core::{Result, SpriteError};
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

/// Service credentials
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Access key + secret used to sign each request
    KeyPair {
        access_key: String,
        secret_key: String,
    },
    /// Static bearer token
    Bearer { token: String },
}

impl Credentials {
    /// Build key-pair credentials, rejecting missing or blank values
    pub fn key_pair(access_key: Option<&str>, secret_key: Option<&str>) -> Result<Self> {
        let access_key = non_blank(access_key).ok_or_else(|| {
            SpriteError::ConfigurationError(
                "Missing LiblibAI access key. Set LIBLIB_ACCESS_KEY or add [liblib] access_key to .sprite/config.toml".to_string(),
            )
        })?;
        let secret_key = non_blank(secret_key).ok_or_else(|| {
            SpriteError::ConfigurationError(
                "Missing LiblibAI secret key. Set LIBLIB_SECRET_KEY or add [liblib] secret_key to .sprite/config.toml".to_string(),
            )
        })?;
        Ok(Credentials::KeyPair {
            access_key,
            secret_key,
        })
    }

    /// Build bearer credentials, rejecting a missing or blank token
    pub fn bearer(token: Option<&str>) -> Result<Self> {
        let token = non_blank(token).ok_or_else(|| {
            SpriteError::ConfigurationError(
                "Missing Tripo3D API key. Set TRIPO_API_KEY, pass --tripo-key, or add [tripo] api_key to .sprite/config.toml".to_string(),
            )
        })?;
        Ok(Credentials::Bearer { token })
    }

    fn validate(&self) -> Result<()> {
        let ok = match self {
            Credentials::KeyPair {
                access_key,
                secret_key,
            } => !access_key.trim().is_empty() && !secret_key.trim().is_empty(),
            Credentials::Bearer { token } => !token.trim().is_empty(),
        };
        if ok {
            Ok(())
        } else {
            Err(SpriteError::ConfigurationError(
                "Credentials are blank".to_string(),
            ))
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::KeyPair { access_key, .. } => f
                .debug_struct("KeyPair")
                .field("access_key", access_key)
                .field("secret_key", &"<redacted>")
                .finish(),
            Credentials::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A ready-to-send request
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub method: Method,
    /// Base URL joined with the endpoint path, without a query string
    pub url: String,
    /// Query parameters, unencoded; the HTTP layer encodes them
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl SignedRequest {
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Compute the request signature:
/// `urlsafe_base64(HMAC_SHA1(secret, path + "&" + timestamp + "&" + nonce))`
/// with the trailing `=` padding stripped.
pub fn signature(
    secret_key: &str,
    endpoint_path: &str,
    timestamp_ms: u64,
    nonce: &str,
) -> Result<String> {
    let content = format!("{}&{}&{}", endpoint_path, timestamp_ms, nonce);
    let mut mac = HmacSha1::new_from_slice(secret_key.as_bytes())
        .map_err(|e| SpriteError::ConfigurationError(format!("Invalid secret key: {}", e)))?;
    mac.update(content.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// Milliseconds since the Unix epoch
pub fn timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// A random alphanumeric nonce (32 lowercase hex characters)
pub fn new_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Builds authenticated requests against one service base URL
#[derive(Debug, Clone)]
pub struct RequestSigner {
    base_url: String,
    credentials: Credentials,
}

impl RequestSigner {
    pub fn new(base_url: &str, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Signed POST with a JSON body, using the current time and a fresh nonce
    pub fn post(&self, path: &str, body: serde_json::Value) -> Result<SignedRequest> {
        self.build(Method::Post, path, Some(body), timestamp_millis(), &new_nonce())
    }

    /// Signed GET, using the current time and a fresh nonce
    pub fn get(&self, path: &str) -> Result<SignedRequest> {
        self.build(Method::Get, path, None, timestamp_millis(), &new_nonce())
    }

    /// Build a request with an explicit timestamp and nonce
    pub fn build(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        timestamp_ms: u64,
        nonce: &str,
    ) -> Result<SignedRequest> {
        self.credentials.validate()?;

        let mut request = SignedRequest {
            method,
            url: format!("{}{}", self.base_url, path),
            query: Vec::new(),
            headers: Vec::new(),
            body,
        };

        if request.body.is_some() {
            request
                .headers
                .push(("Content-Type".to_string(), "application/json".to_string()));
        }

        match &self.credentials {
            Credentials::KeyPair {
                access_key,
                secret_key,
            } => {
                // The signature covers the path only, never the base URL or query
                let sig = signature(secret_key, path, timestamp_ms, nonce)?;
                request.query = vec![
                    ("AccessKey".to_string(), access_key.clone()),
                    ("Signature".to_string(), sig),
                    ("Timestamp".to_string(), timestamp_ms.to_string()),
                    ("SignatureNonce".to_string(), nonce.to_string()),
                ];
            }
            Credentials::Bearer { token } => {
                request
                    .headers
                    .push(("Authorization".to_string(), format!("Bearer {}", token)));
            }
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_known_vectors() {
        assert_eq!(
            signature(
                "secret-key",
                "/api/generate/webui/text2img",
                1_700_000_000_000,
                "abc123XYZ"
            )
            .unwrap(),
            "XLP-rjMbEsc2F6ac5Kgv84s1gJ8"
        );
        assert_eq!(
            signature(
                "4lH_K_Ya66",
                "/api/generate/webui/status",
                1_712_345_678_901,
                "n0nce"
            )
            .unwrap(),
            "6hghhEgV_pqF8rsPHy3LDLwKOts"
        );
    }

    #[test]
    fn test_signature_is_deterministic_and_unpadded() {
        let a = signature("k", "/p", 42, "n").unwrap();
        let b = signature("k", "/p", 42, "n").unwrap();
        assert_eq!(a, b);
        assert!(!a.ends_with('='));
        assert!(!a.contains('+') && !a.contains('/'));
        // SHA-1 digest is 20 bytes -> 27 unpadded base64 characters
        assert_eq!(a.len(), 27);
        assert_ne!(a, signature("k", "/p", 43, "n").unwrap());
    }

    #[test]
    fn test_key_pair_request_carries_signature_params() {
        let creds = Credentials::key_pair(Some("ak"), Some("secret-key")).unwrap();
        let signer = RequestSigner::new("https://openapi.liblibai.cloud/", creds);
        let req = signer
            .build(
                Method::Post,
                "/api/generate/webui/text2img",
                Some(serde_json::json!({"templateUuid": "t"})),
                1_700_000_000_000,
                "abc123XYZ",
            )
            .unwrap();

        assert_eq!(
            req.url,
            "https://openapi.liblibai.cloud/api/generate/webui/text2img"
        );
        assert_eq!(req.query_param("AccessKey"), Some("ak"));
        assert_eq!(req.query_param("Signature"), Some("XLP-rjMbEsc2F6ac5Kgv84s1gJ8"));
        assert_eq!(req.query_param("Timestamp"), Some("1700000000000"));
        assert_eq!(req.query_param("SignatureNonce"), Some("abc123XYZ"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert!(req.header("Authorization").is_none());
    }

    #[test]
    fn test_bearer_request_has_no_signature() {
        let creds = Credentials::bearer(Some("tsk_abc")).unwrap();
        let signer = RequestSigner::new("https://api.tripo3d.ai/v2/openapi", creds);
        let req = signer.get("/task/123").unwrap();

        assert_eq!(req.method, Method::Get);
        assert_eq!(req.url, "https://api.tripo3d.ai/v2/openapi/task/123");
        assert!(req.query.is_empty());
        assert!(req.body.is_none());
        assert_eq!(req.header("Authorization"), Some("Bearer tsk_abc"));
    }

    #[test]
    fn test_blank_credentials_rejected_before_signing() {
        assert!(matches!(
            Credentials::key_pair(Some("ak"), Some("  ")),
            Err(SpriteError::ConfigurationError(_))
        ));
        assert!(matches!(
            Credentials::key_pair(None, Some("sk")),
            Err(SpriteError::ConfigurationError(_))
        ));
        assert!(matches!(
            Credentials::bearer(Some("")),
            Err(SpriteError::ConfigurationError(_))
        ));

        let signer = RequestSigner::new(
            "http://localhost",
            Credentials::Bearer {
                token: String::new(),
            },
        );
        assert!(matches!(
            signer.get("/task/1"),
            Err(SpriteError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_nonce_is_alphanumeric_and_fresh() {
        let a = new_nonce();
        let b = new_nonce();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::key_pair(Some("ak"), Some("very-secret")).unwrap();
        let dbg = format!("{:?}", creds);
        assert!(dbg.contains("ak"));
        assert!(!dbg.contains("very-secret"));
    }
}
