//! Core types for OTP generation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest accepted code length.
pub const MIN_DIGITS: u8 = 6;
/// Largest accepted code length. The truncated value is below 2^31, so codes
/// up to 10 digits stay exact.
pub const MAX_DIGITS: u8 = 10;
/// RFC 6238 default code length.
pub const DEFAULT_DIGITS: u8 = 6;
/// RFC 6238 default time-step, in seconds.
pub const DEFAULT_PERIOD: u32 = 30;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Hash algorithm used for HMAC-based OTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri_name())
    }
}

impl Algorithm {
    /// Parse from a case-insensitive string.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SHA1" | "SHA-1" | "HMACSHA1" | "HMAC-SHA1" => Some(Self::Sha1),
            "SHA256" | "SHA-256" | "HMACSHA256" | "HMAC-SHA256" => Some(Self::Sha256),
            "SHA512" | "SHA-512" | "HMACSHA512" | "HMAC-SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// URI-safe name for `otpauth://` parameters.
    pub fn uri_name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }

    /// HMAC digest length in bytes. Always at least 20, which keeps the
    /// dynamic-truncation window (offset at most 15, plus 4 bytes) in range.
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OTP type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Whether a key is time-based or counter-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpType {
    Totp,
    Hotp,
}

impl Default for OtpType {
    fn default() -> Self {
        Self::Totp
    }
}

impl fmt::Display for OtpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Totp => write!(f, "totp"),
            Self::Hotp => write!(f, "hotp"),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OTP key
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A key and its generation parameters, as carried by an `otpauth://` URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpKey {
    /// TOTP or HOTP.
    pub otp_type: OtpType,
    /// Issuer (e.g. "GitHub", "Google").
    pub issuer: Option<String>,
    /// Account label (e.g. "user@example.com").
    pub account: String,
    /// Base-32 encoded secret key.
    pub secret: String,
    /// Hash algorithm.
    pub algorithm: Algorithm,
    /// Number of digits in the generated code.
    pub digits: u8,
    /// Time period in seconds (TOTP only).
    pub period: u32,
    /// Counter value (HOTP only).
    pub counter: u64,
}

impl OtpKey {
    /// Create a TOTP key with RFC defaults.
    pub fn new(account: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            otp_type: OtpType::Totp,
            issuer: None,
            account: account.into(),
            secret: secret.into(),
            algorithm: Algorithm::default(),
            digits: DEFAULT_DIGITS,
            period: DEFAULT_PERIOD,
            counter: 0,
        }
    }

    /// Builder: set issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Builder: set algorithm.
    pub fn with_algorithm(mut self, algo: Algorithm) -> Self {
        self.algorithm = algo;
        self
    }

    /// Builder: set digit count.
    pub fn with_digits(mut self, digits: u8) -> Self {
        self.digits = digits;
        self
    }

    /// Builder: set time period.
    pub fn with_period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    /// Builder: mark as HOTP.
    pub fn as_hotp(mut self, counter: u64) -> Self {
        self.otp_type = OtpType::Hotp;
        self.counter = counter;
        self
    }

    /// Normalise the secret (uppercase, no spaces/dashes).
    pub fn normalised_secret(&self) -> String {
        self.secret
            .replace(' ', "")
            .replace('-', "")
            .to_uppercase()
    }

    /// Check if the secret is valid base-32.
    pub fn is_secret_valid(&self) -> bool {
        base32::decode(
            base32::Alphabet::Rfc4648 { padding: false },
            &self.normalised_secret(),
        )
        .is_some()
    }

    /// Validate the key's parameters against this crate's bounds.
    pub fn validate(&self) -> Result<(), OtpError> {
        if self.account.is_empty() {
            return Err(OtpError::new(
                OtpErrorKind::InvalidParameter,
                "account label must not be empty",
            ));
        }
        if !(MIN_DIGITS..=MAX_DIGITS).contains(&self.digits) {
            return Err(OtpError::new(
                OtpErrorKind::InvalidParameter,
                format!(
                    "digits must be between {} and {}, got {}",
                    MIN_DIGITS, MAX_DIGITS, self.digits
                ),
            ));
        }
        if self.period == 0 {
            return Err(OtpError::new(
                OtpErrorKind::InvalidParameter,
                "period must be a positive number of seconds",
            ));
        }
        if self.normalised_secret().is_empty() {
            return Err(OtpError::new(
                OtpErrorKind::EncodingFailure,
                "secret must not be empty",
            ));
        }
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generated code result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A generated OTP code with associated timing info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// The OTP code string (e.g. "123456").
    pub code: String,
    /// Seconds remaining until the code expires (TOTP only).
    pub remaining_seconds: u32,
    /// Total period in seconds.
    pub period: u32,
    /// Progress as fraction 0.0–1.0 (1.0 = expired).
    pub progress: f64,
    /// The time step (TOTP) or counter (HOTP) used.
    pub counter: u64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OtpErrorKind {
    /// Bad digits, zero period, unsupported algorithm, empty issuer/account.
    InvalidParameter,
    /// Secret missing or not encodable/decodable as base-32.
    EncodingFailure,
    /// An `otpauth://` URI could not be parsed.
    InvalidUri,
}

/// Crate-level error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpError {
    pub kind: OtpErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl fmt::Display for OtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for OtpError {}

impl OtpError {
    pub fn new(kind: OtpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl From<OtpError> for String {
    fn from(e: OtpError) -> String {
        e.to_string()
    }
}
