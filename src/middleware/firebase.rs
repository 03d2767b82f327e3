//! Firebase ID token verification.
//!
//! Tokens are RS256 JWTs signed by Google's `securetoken` service account.
//! Signing keys come from Google's JWKS endpoint and are cached for the
//! `max-age` the endpoint advertises. Refreshes are serialized, and a token
//! naming an unknown key id refetches at most once per `MIN_REFETCH_INTERVAL`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use log::{debug, warn};
use reqwest::header::{CACHE_CONTROL, HeaderMap};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use crate::middleware::auth::IdentityVerifier;
use crate::user::model::VerifiedIdentity;
use crate::utils::error::CustomError;
use crate::utils::helpers::email_local_part;

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);
const CLOCK_SKEW_SECS: u64 = 60;

fn invalid_token() -> CustomError {
    CustomError::InvalidTokenError("Invalid or expired token".to_string())
}

struct KeyCache {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    fetched_at: Instant,
    expires_at: Instant,
}

impl KeyCache {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at > now
    }

    /// Whether a refetch is allowed. A stale or missing cache always is;
    /// a fresh one only when asked to and the last fetch is old enough.
    fn needs_fetch(cache: Option<&KeyCache>, force: bool, now: Instant) -> bool {
        match cache {
            None => true,
            Some(entry) if !entry.is_fresh(now) => true,
            Some(entry) => force && now.duration_since(entry.fetched_at) >= MIN_REFETCH_INTERVAL,
        }
    }
}

enum KeySource {
    Google,
    /// A single fixed key, for tests and offline deployments.
    Static {
        kid: String,
        key: Arc<DecodingKey>,
    },
}

pub struct FirebaseVerifier {
    http_client: reqwest::Client,
    project_id: String,
    source: KeySource,
    keys: RwLock<Option<KeyCache>>,
    refresh_lock: Mutex<()>,
}

impl FirebaseVerifier {
    pub fn new(project_id: &str) -> Result<Self, CustomError> {
        Self::with_source(project_id, KeySource::Google)
    }

    /// Verifies against one known key instead of Google's JWKS.
    pub fn with_static_key(
        project_id: &str,
        kid: &str,
        key: DecodingKey,
    ) -> Result<Self, CustomError> {
        if kid.trim().is_empty() {
            return Err(CustomError::InternalServerError(
                "Static signing key id must not be empty".to_string(),
            ));
        }
        Self::with_source(
            project_id,
            KeySource::Static {
                kid: kid.to_string(),
                key: Arc::new(key),
            },
        )
    }

    fn with_source(project_id: &str, source: KeySource) -> Result<Self, CustomError> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| CustomError::InternalServerError(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            http_client,
            project_id: project_id.to_string(),
            source,
            keys: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", self.project_id)]);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;
        validation
    }

    async fn cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.keys.read().await;
        cache
            .as_ref()
            .filter(|entry| entry.is_fresh(Instant::now()))
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn decoding_key(&self, kid: &str) -> Result<Arc<DecodingKey>, CustomError> {
        if let KeySource::Static { kid: known, key } = &self.source {
            return if kid == known {
                Ok(key.clone())
            } else {
                Err(invalid_token())
            };
        }

        if let Some(key) = self.cached_key(kid).await {
            return Ok(key);
        }

        for force in [false, true] {
            self.refresh_keys(force).await?;
            if let Some(key) = self.cached_key(kid).await {
                return Ok(key);
            }
        }

        warn!("Token signed with unknown key id {}", kid);
        Err(invalid_token())
    }

    async fn refresh_keys(&self, force: bool) -> Result<(), CustomError> {
        let _guard = self.refresh_lock.lock().await;

        let have_fresh_keys = {
            let cache = self.keys.read().await;
            if !KeyCache::needs_fetch(cache.as_ref(), force, Instant::now()) {
                return Ok(());
            }
            cache.as_ref().is_some_and(|entry| entry.is_fresh(Instant::now()))
        };

        match self.fetch_keys().await {
            Ok(fresh) => {
                *self.keys.write().await = Some(fresh);
                Ok(())
            }
            // The cached keys still answer for every known kid.
            Err(e) if have_fresh_keys => {
                warn!("Keeping cached Firebase signing keys: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_keys(&self) -> Result<KeyCache, CustomError> {
        let unavailable = |e: String| {
            CustomError::InternalServerError(format!("Identity provider unavailable: {}", e))
        };

        let response = self
            .http_client
            .get(JWKS_URL)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("JWKS returned {}", response.status())));
        }

        let ttl = cache_ttl(response.headers());
        let jwks: Jwks = response.json().await.map_err(|e| unavailable(e.to_string()))?;

        let mut keys_by_kid = HashMap::new();
        for jwk in jwks.keys {
            if jwk.kty != "RSA" || jwk.kid.trim().is_empty() {
                continue;
            }
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys_by_kid.insert(jwk.kid, Arc::new(key));
                }
                Err(e) => warn!("Skipping unusable signing key {}: {}", jwk.kid, e),
            }
        }

        if keys_by_kid.is_empty() {
            return Err(unavailable("no usable signing keys".to_string()));
        }

        debug!("Refreshed {} Firebase signing keys for {:?}", keys_by_kid.len(), ttl);
        let fetched_at = Instant::now();
        Ok(KeyCache {
            keys_by_kid,
            fetched_at,
            expires_at: fetched_at + ttl,
        })
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, CustomError> {
        let header = decode_header(token).map_err(|_| invalid_token())?;
        if header.alg != Algorithm::RS256 {
            return Err(invalid_token());
        }
        let kid = header.kid.ok_or_else(invalid_token)?;

        let key = self.decoding_key(&kid).await?;
        let claims = decode::<FirebaseClaims>(token, &key, &self.validation())
            .map_err(|e| {
                debug!("Firebase token rejected: {}", e);
                invalid_token()
            })?
            .claims;

        claims.into_identity(unix_now())
    }
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: String,
    e: String,
}

#[derive(Debug, Default, Deserialize)]
struct FirebaseInfo {
    sign_in_provider: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    iat: Option<u64>,
    auth_time: Option<u64>,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
    #[serde(default)]
    firebase: FirebaseInfo,
}

impl FirebaseClaims {
    fn into_identity(self, now: u64) -> Result<VerifiedIdentity, CustomError> {
        if self.sub.trim().is_empty() {
            return Err(invalid_token());
        }

        let latest = now + CLOCK_SKEW_SECS;
        match self.iat {
            Some(iat) if iat <= latest => {}
            _ => return Err(invalid_token()),
        }
        if self.auth_time.is_some_and(|auth_time| auth_time > latest) {
            return Err(invalid_token());
        }

        let email = self
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| CustomError::InvalidTokenError("Token has no email claim".to_string()))?;

        let display_name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email_local_part(&email).to_string());

        Ok(VerifiedIdentity {
            external_id: self.sub,
            email,
            display_name,
            avatar_url: self.picture.filter(|p| !p.is_empty()),
            provider: self.firebase.sign_in_provider,
        })
    }
}

fn cache_ttl(headers: &HeaderMap) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_max_age)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_CACHE_TTL)
}

fn parse_max_age(value: &str) -> Option<u64> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|raw| raw.trim_matches('"').parse().ok())
}
