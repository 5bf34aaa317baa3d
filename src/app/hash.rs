//! MD5 digest value type used for download verification
//!
//! Digests are stored as their raw 16 bytes and compared bytewise, so a
//! published checksum in upper or lower case matches the computed one.

use std::fmt;

use crate::errors::{DownloadError, DownloadResult};

/// MD5 digest stored as a 16-byte array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Md5Hash([u8; 16]);

impl Md5Hash {
    /// Create an MD5 hash from a hex string
    ///
    /// # Arguments
    ///
    /// * `hex` - 32-character hexadecimal string (case insensitive)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use datadir_mgr::app::Md5Hash;
    ///
    /// let hash = Md5Hash::from_hex("50c9d1c465f3cbff652be1509c2e2a4e")?;
    /// let hash_upper = Md5Hash::from_hex("50C9D1C465F3CBFF652BE1509C2E2A4E")?;
    /// assert_eq!(hash, hash_upper);
    /// # Ok::<(), datadir_mgr::errors::DownloadError>(())
    /// ```
    pub fn from_hex(hex: &str) -> DownloadResult<Self> {
        if hex.len() != 32 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DownloadError::InvalidHash {
                hash: hex.to_string(),
            });
        }

        let mut bytes = [0u8; 16];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).map_err(|_| DownloadError::InvalidHash {
                hash: hex.to_string(),
            })?;
            bytes[i] = u8::from_str_radix(pair, 16).map_err(|_| DownloadError::InvalidHash {
                hash: hex.to_string(),
            })?;
        }

        Ok(Md5Hash(bytes))
    }

    /// Whether `expected` is the hex form of this digest
    ///
    /// Text that is not a valid MD5 hex string never matches.
    pub fn matches_hex(&self, expected: &str) -> bool {
        Self::from_hex(expected).map_or(false, |hash| hash == *self)
    }

    /// Digest of an in-memory buffer
    pub fn compute(data: impl AsRef<[u8]>) -> Self {
        Md5Hash(md5::compute(data).0)
    }

    /// Convert the hash to a lowercase 32-character hex string
    pub fn to_hex(&self) -> String {
        use std::fmt::Write;
        self.0.iter().fold(String::with_capacity(32), |mut acc, b| {
            let _ = write!(&mut acc, "{:02x}", b);
            acc
        })
    }
}

impl From<md5::Digest> for Md5Hash {
    fn from(digest: md5::Digest) -> Self {
        Md5Hash(digest.0)
    }
}

impl fmt::Display for Md5Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Expected digest text of a checksum file
///
/// The digest is the first whitespace-delimited token, as written by
/// `md5sum` (`"<hex>  <filename>\n"`). An empty file yields `""`.
pub fn checksum_token(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

/// Incremental MD5 over a byte stream
///
/// Fed chunk by chunk while a download is written to disk, so the digest
/// is available as soon as the transfer completes.
pub struct HashTracker {
    context: md5::Context,
}

impl HashTracker {
    /// Start an empty digest
    pub fn new() -> Self {
        Self {
            context: md5::Context::new(),
        }
    }

    /// Feed the next chunk of data
    pub fn update(&mut self, chunk: &[u8]) {
        self.context.consume(chunk);
    }

    /// Finish and return the digest
    pub fn finish(self) -> Md5Hash {
        self.context.compute().into()
    }
}

impl Default for HashTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HashTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTracker").finish_non_exhaustive()
    }
}
