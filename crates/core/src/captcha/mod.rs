//! Single-use CAPTCHA challenges.
//!
//! Challenges live in a sharded concurrent map. [`CaptchaStore::check`]
//! removes the entry before comparing, so a key can pass at most once even
//! when several submissions race on it, and a failed attempt burns the key
//! as well.

mod render;

use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::Rng;

pub use render::{render_png, GLYPH_ALPHABET};

/// Default number of characters in a challenge response.
pub const DEFAULT_CHALLENGE_LENGTH: usize = 6;

/// Upper bound on the challenge length (the submitted token is at most 6 chars).
pub const MAX_CHALLENGE_LENGTH: usize = 6;

/// Default lifetime of an issued challenge (5 minutes).
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(300);

/// Default URL prefix for rendered challenge images.
pub const DEFAULT_IMAGE_PREFIX: &str = "/api/v1/captcha/image";

/// How challenges are generated and compared.
#[derive(Debug, Clone)]
pub struct CaptchaPolicy {
    pub length: usize,
    pub ttl: Duration,
    pub case_sensitive: bool,
    /// Prefix joined with the key to form the image reference.
    pub image_prefix: String,
}

impl Default for CaptchaPolicy {
    fn default() -> Self {
        Self {
            length: DEFAULT_CHALLENGE_LENGTH,
            ttl: DEFAULT_CHALLENGE_TTL,
            case_sensitive: true,
            image_prefix: DEFAULT_IMAGE_PREFIX.to_string(),
        }
    }
}

/// The public half of a freshly issued challenge.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IssuedChallenge {
    pub key: String,
    pub image_url: String,
}

#[derive(Debug)]
struct Challenge {
    response: String,
    expires_at: Instant,
}

impl Challenge {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Concurrent store of outstanding challenges keyed by opaque key.
#[derive(Debug)]
pub struct CaptchaStore {
    challenges: DashMap<String, Challenge>,
    policy: CaptchaPolicy,
}

impl CaptchaStore {
    pub fn new(policy: CaptchaPolicy) -> Self {
        let length = policy.length.clamp(1, MAX_CHALLENGE_LENGTH);
        Self {
            challenges: DashMap::new(),
            policy: CaptchaPolicy { length, ..policy },
        }
    }

    pub fn policy(&self) -> &CaptchaPolicy {
        &self.policy
    }

    /// Generate a new random challenge and remember its expected response.
    pub fn issue(&self) -> IssuedChallenge {
        let key = uuid::Uuid::new_v4().simple().to_string();
        let response = random_response(self.policy.length);

        self.challenges.insert(
            key.clone(),
            Challenge {
                response,
                expires_at: Instant::now() + self.policy.ttl,
            },
        );

        IssuedChallenge {
            image_url: format!("{}/{key}", self.policy.image_prefix.trim_end_matches('/')),
            key,
        }
    }

    /// Consume the challenge for `key` and compare `submitted` against it.
    ///
    /// Unknown, already-consumed and expired keys all return `false`.
    pub fn check(&self, key: &str, submitted: &str) -> bool {
        let Some((_, challenge)) = self.challenges.remove(key) else {
            return false;
        };

        if challenge.is_expired(Instant::now()) {
            return false;
        }

        if self.policy.case_sensitive {
            challenge.response == submitted
        } else {
            challenge.response.eq_ignore_ascii_case(submitted)
        }
    }

    /// Expected response for a live challenge, without consuming it.
    ///
    /// Used to render the challenge image.
    pub fn peek_response(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.challenges
            .get(key)
            .filter(|c| !c.is_expired(now))
            .map(|c| c.response.clone())
    }

    /// Drop every expired challenge, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.challenges.len();
        self.challenges.retain(|_, c| !c.is_expired(now));
        before.saturating_sub(self.challenges.len())
    }

    /// Number of outstanding (possibly expired) challenges.
    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}

impl Default for CaptchaStore {
    fn default() -> Self {
        Self::new(CaptchaPolicy::default())
    }
}

fn random_response(length: usize) -> String {
    let alphabet = GLYPH_ALPHABET.as_bytes();
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn issued_challenge_passes_once() {
        let store = CaptchaStore::default();
        let issued = store.issue();
        let answer = store.peek_response(&issued.key).unwrap();

        assert!(store.check(&issued.key, &answer));
        assert!(!store.check(&issued.key, &answer));
    }

    #[test]
    fn failed_attempt_consumes_the_key() {
        let store = CaptchaStore::default();
        let issued = store.issue();
        let answer = store.peek_response(&issued.key).unwrap();

        assert!(!store.check(&issued.key, "wrong"));
        assert!(!store.check(&issued.key, &answer));
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_key_fails_without_panicking() {
        let store = CaptchaStore::default();
        assert!(!store.check("does-not-exist", "ABC123"));
    }

    #[test]
    fn comparison_is_case_sensitive_by_default() {
        let store = CaptchaStore::default();
        let issued = store.issue();
        let answer = store.peek_response(&issued.key).unwrap();
        assert!(!store.check(&issued.key, &answer.to_ascii_lowercase()));
    }

    #[test]
    fn case_insensitive_policy() {
        let store = CaptchaStore::new(CaptchaPolicy {
            case_sensitive: false,
            ..CaptchaPolicy::default()
        });
        let issued = store.issue();
        let answer = store.peek_response(&issued.key).unwrap();
        assert!(store.check(&issued.key, &answer.to_ascii_lowercase()));
    }

    #[test]
    fn expired_challenge_fails_and_is_purged() {
        let store = CaptchaStore::new(CaptchaPolicy {
            ttl: Duration::ZERO,
            ..CaptchaPolicy::default()
        });
        let a = store.issue();
        let _b = store.issue();

        assert!(store.peek_response(&a.key).is_none());
        assert!(!store.check(&a.key, "anything"));
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn response_shape_follows_policy() {
        let store = CaptchaStore::new(CaptchaPolicy {
            length: 4,
            ..CaptchaPolicy::default()
        });
        let issued = store.issue();
        let answer = store.peek_response(&issued.key).unwrap();
        assert_eq!(answer.len(), 4);
        assert!(answer.chars().all(|c| GLYPH_ALPHABET.contains(c)));
        assert!(issued.image_url.ends_with(&issued.key));
        assert!(issued.image_url.starts_with(DEFAULT_IMAGE_PREFIX));
    }

    #[test]
    fn length_is_clamped() {
        let store = CaptchaStore::new(CaptchaPolicy {
            length: 40,
            ..CaptchaPolicy::default()
        });
        assert_eq!(store.policy().length, MAX_CHALLENGE_LENGTH);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_checks_pass_at_most_once() {
        let store = Arc::new(CaptchaStore::default());

        for _ in 0..50 {
            let issued = store.issue();
            let answer = store.peek_response(&issued.key).unwrap();

            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let store = Arc::clone(&store);
                    let key = issued.key.clone();
                    let answer = answer.clone();
                    tokio::spawn(async move { store.check(&key, &answer) })
                })
                .collect();

            let mut passes = 0;
            for handle in handles {
                if handle.await.unwrap() {
                    passes += 1;
                }
            }
            assert_eq!(passes, 1);
        }
    }
}
