//! Argon2id secret codec
//!
//! Secrets are hashed into a self-describing string:
//!
//! ```text
//! $argon2id$v=19$m=65536,t=4,p=1$<salt>$<hash>
//! ```
//!
//! Salt and hash are standard base64 without padding. Verification recovers
//! every parameter from the string itself, so the codec's own parameters only
//! affect newly encoded secrets.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD as B64;
use rand::RngCore;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::core::CodecError;

/// Algorithm identifier embedded in every encoding
pub const ALGORITHM: &str = "argon2id";

/// Argon2 version embedded in every encoding (0x13)
pub const VERSION: u32 = 0x13;

const SEPARATOR: char = '$';
const FIELD_COUNT: usize = 6;
const MIN_SALT_LENGTH: usize = 8;

/// Decoded costs may exceed the larger of the configured and default costs
/// by at most this factor
const COST_HEADROOM: u32 = 8;

/// Argon2id cost parameters
///
/// Defaults are tuned for a single core with limited memory; raise
/// `parallelism` on multi-core hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashParams {
    /// Random salt length in bytes
    pub salt_length: usize,
    /// Number of passes over memory
    pub iterations: u32,
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
    /// Derived key length in bytes
    pub key_length: usize,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            salt_length: 32,
            iterations: 4,
            memory_kib: 64 * 1024,
            parallelism: 1,
            key_length: 32,
        }
    }
}

impl HashParams {
    /// Very low cost parameters for tests
    #[cfg(any(test, feature = "test-util"))]
    pub fn insecure_fast() -> Self {
        Self {
            salt_length: 16,
            iterations: 1,
            memory_kib: 256,
            parallelism: 1,
            key_length: 32,
        }
    }

    /// Check the parameters against argon2's limits
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.salt_length < MIN_SALT_LENGTH {
            return Err(CodecError::InvalidParams {
                reason: format!(
                    "salt_length must be at least {} bytes, got {}",
                    MIN_SALT_LENGTH,
                    self.salt_length
                ),
            });
        }
        self.to_argon2()
            .map(drop)
            .map_err(|e| CodecError::InvalidParams {
                reason: e.to_string(),
            })
    }

    fn to_argon2(self) -> Result<Params, argon2::Error> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(self.key_length),
        )
    }
}

/// Hashes and verifies passkey secrets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecretCodec {
    params: HashParams,
}

impl SecretCodec {
    /// Create a codec, rejecting parameters argon2 would refuse
    pub fn new(params: HashParams) -> Result<Self, CodecError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Parameters used for new encodings
    pub fn params(&self) -> &HashParams {
        &self.params
    }

    /// Highest costs [`verify`](Self::verify) will run
    ///
    /// Each is [`COST_HEADROOM`] times the larger of the configured and the
    /// default cost, so older encodings stay verifiable after a downgrade
    /// while a corrupted row cannot request an unbounded allocation.
    pub fn cost_ceiling(&self) -> HashParams {
        let defaults = HashParams::default();
        let cap = |configured: u32, default: u32| configured.max(default).saturating_mul(COST_HEADROOM);
        HashParams {
            memory_kib: cap(self.params.memory_kib, defaults.memory_kib),
            iterations: cap(self.params.iterations, defaults.iterations),
            parallelism: cap(self.params.parallelism, defaults.parallelism),
            ..self.params
        }
    }

    /// Hash `secret` with a fresh OS-random salt
    ///
    /// # Errors
    ///
    /// - [`CodecError::EntropyUnavailable`] if the OS generator fails
    /// - [`CodecError::Hashing`] if key derivation fails
    pub fn encode(&self, secret: &SecretString) -> Result<String, CodecError> {
        let mut salt = vec![0u8; self.params.salt_length];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| CodecError::EntropyUnavailable {
                reason: e.to_string(),
            })?;

        let params = self.params.to_argon2().map_err(|e| CodecError::Hashing {
            reason: e.to_string(),
        })?;
        let hash = derive(secret, &salt, params, self.params.key_length)?;

        Ok(format!(
            "{SEPARATOR}{ALGORITHM}{SEPARATOR}v={VERSION}{SEPARATOR}m={},t={},p={}{SEPARATOR}{}{SEPARATOR}{}",
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            B64.encode(&salt),
            B64.encode(hash.as_slice()),
        ))
    }

    /// Check `secret` against an encoding produced by [`encode`](Self::encode)
    ///
    /// A mismatch is `Ok(false)`; only an unparseable encoding is an error.
    ///
    /// # Errors
    ///
    /// - [`CodecError::MalformedEncoding`] on a wrong field count, an unreadable
    ///   version or parameter string, invalid base64, or costs beyond
    ///   [`cost_ceiling`](Self::cost_ceiling)
    /// - [`CodecError::IncompatibleVersion`] if the embedded version differs
    ///   from [`VERSION`]
    pub fn verify(&self, secret: &SecretString, encoded: &str) -> Result<bool, CodecError> {
        let decoded = DecodedSecret::parse(encoded)?;

        let ceiling = self.cost_ceiling();
        for (name, found, max) in [
            ("m", decoded.memory_kib, ceiling.memory_kib),
            ("t", decoded.iterations, ceiling.iterations),
            ("p", decoded.parallelism, ceiling.parallelism),
        ] {
            if found > max {
                return Err(CodecError::malformed(format!(
                    "{name}={found} exceeds the accepted maximum of {max}"
                )));
            }
        }

        let params = HashParams {
            salt_length: decoded.salt.len(),
            iterations: decoded.iterations,
            memory_kib: decoded.memory_kib,
            parallelism: decoded.parallelism,
            key_length: decoded.hash.len(),
        }
        .to_argon2()
        .map_err(|e| CodecError::malformed(format!("unusable parameters: {e}")))?;

        if decoded.salt.len() < MIN_SALT_LENGTH {
            return Err(CodecError::malformed(format!(
                "salt is {} bytes, need at least {}",
                decoded.salt.len(),
                MIN_SALT_LENGTH
            )));
        }

        let candidate = derive(secret, &decoded.salt, params, decoded.hash.len())?;
        Ok(candidate.as_slice().ct_eq(&decoded.hash).into())
    }
}

fn derive(
    secret: &SecretString,
    salt: &[u8],
    params: Params,
    key_length: usize,
) -> Result<Zeroizing<Vec<u8>>, CodecError> {
    let mut out = Zeroizing::new(vec![0u8; key_length]);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(secret.expose_secret().as_bytes(), salt, &mut out)
        .map_err(|e| CodecError::Hashing {
            reason: e.to_string(),
        })?;
    Ok(out)
}

/// Fields recovered from an encoded secret
struct DecodedSecret {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl DecodedSecret {
    fn parse(encoded: &str) -> Result<Self, CodecError> {
        let fields: Vec<&str> = encoded.split(SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return Err(CodecError::malformed(format!(
                "expected {FIELD_COUNT} fields, found {}",
                fields.len()
            )));
        }
        if !fields[0].is_empty() || fields[1] != ALGORITHM {
            return Err(CodecError::malformed(format!(
                "unsupported algorithm '{}'",
                fields[1]
            )));
        }

        let version = fields[2]
            .strip_prefix("v=")
            .and_then(|v| v.parse::<u32>().ok())
            .ok_or_else(|| CodecError::malformed(format!("unreadable version '{}'", fields[2])))?;
        if version != VERSION {
            return Err(CodecError::IncompatibleVersion {
                found: version,
                expected: VERSION,
            });
        }

        let (memory_kib, iterations, parallelism) = parse_costs(fields[3])
            .ok_or_else(|| CodecError::malformed(format!("unreadable parameters '{}'", fields[3])))?;

        let salt = B64
            .decode(fields[4])
            .map_err(|e| CodecError::malformed(format!("salt: {e}")))?;
        let hash = B64
            .decode(fields[5])
            .map_err(|e| CodecError::malformed(format!("hash: {e}")))?;

        Ok(Self {
            memory_kib,
            iterations,
            parallelism,
            salt,
            hash,
        })
    }
}

/// `m=<u32>,t=<u32>,p=<u32>`, in that order
fn parse_costs(field: &str) -> Option<(u32, u32, u32)> {
    let mut parts = field.split(',');
    let m = parts.next()?.strip_prefix("m=")?.parse().ok()?;
    let t = parts.next()?.strip_prefix("t=")?.parse().ok()?;
    let p = parts.next()?.strip_prefix("p=")?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((m, t, p))
}
