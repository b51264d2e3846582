//! Collision-free name generation
//!
//! Names are `<token>.<sanitized-name>` for uploads and
//! `<token>.<short-token>.<ext>` for generated images. A candidate is only
//! accepted once the [`NameClaimer`] has claimed it, so two concurrent callers
//! can never be handed the same name.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use imgvault_core::{ImageFormat, StoreError, StoreResult};
use rand::Rng;

/// Length of the leading random token (~82 bits over `[0-9a-z]`)
pub const TOKEN_LEN: usize = 16;
/// Length of the second token in generated names
pub const SUFFIX_LEN: usize = 5;

const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Source of random tokens
pub trait TokenSource: Send + Sync {
    fn token(&self, len: usize) -> String;
}

/// Tokens drawn from the thread-local CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenSource;

impl TokenSource for RandomTokenSource {
    fn token(&self, len: usize) -> String {
        let mut rng = rand::rng();
        (0..len)
            .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect()
    }
}

/// Yields a fixed list of tokens in order, cycling when exhausted.
/// The requested length is ignored.
///
/// # Panics
///
/// `new` panics if `tokens` is empty.
#[derive(Debug)]
pub struct SequenceTokenSource {
    tokens: Vec<String>,
    next: AtomicUsize,
}

impl SequenceTokenSource {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        assert!(!tokens.is_empty(), "SequenceTokenSource needs at least one token");
        SequenceTokenSource {
            tokens,
            next: AtomicUsize::new(0),
        }
    }
}

impl TokenSource for SequenceTokenSource {
    fn token(&self, _len: usize) -> String {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.tokens.len();
        self.tokens[index].clone()
    }
}

/// Claims candidate names.
#[async_trait]
pub trait NameClaimer: Send + Sync {
    /// `Ok(true)` if `name` was free and is now reserved for the caller.
    async fn claim(&self, name: &str) -> StoreResult<bool>;
}

/// Lower-case the extension of an already sanitized name.
fn normalize_upload_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{}.{}", stem, ext.to_lowercase())
        }
        _ => name.to_string(),
    }
}

/// Generates names that a [`NameClaimer`] has claimed.
#[derive(Clone)]
pub struct NameGenerator {
    tokens: Arc<dyn TokenSource>,
    max_attempts: u32,
}

impl NameGenerator {
    pub fn new(tokens: Arc<dyn TokenSource>, max_attempts: u32) -> Self {
        NameGenerator {
            tokens,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Name for an uploaded file: `<token>.<stem>.<ext>`.
    pub async fn generate_unique_name(
        &self,
        claimer: &dyn NameClaimer,
        sanitized_name: &str,
    ) -> StoreResult<String> {
        let suffix = normalize_upload_name(sanitized_name);
        self.claim_first_free(claimer, || {
            format!("{}.{}", self.tokens.token(TOKEN_LEN), suffix)
        })
        .await
    }

    /// Name for a generated image: `<token>.<short-token>.<ext>`.
    pub async fn generate_unique_generated_name(
        &self,
        claimer: &dyn NameClaimer,
        format: ImageFormat,
    ) -> StoreResult<String> {
        self.claim_first_free(claimer, || {
            format!(
                "{}.{}.{}",
                self.tokens.token(TOKEN_LEN),
                self.tokens.token(SUFFIX_LEN),
                format.extension()
            )
        })
        .await
    }

    async fn claim_first_free<F>(&self, claimer: &dyn NameClaimer, mut candidate: F) -> StoreResult<String>
    where
        F: FnMut() -> String,
    {
        for attempt in 1..=self.max_attempts {
            let name = candidate();
            if claimer.claim(&name).await? {
                return Ok(name);
            }
            tracing::warn!(name = %name, attempt, "Generated name already taken, retrying");
        }

        Err(StoreError::NameGenerationExhausted {
            attempts: self.max_attempts,
        })
    }
}
