//! Core OTP generation per RFC 4226 (HOTP) and RFC 6238 (TOTP).
//!
//! HMAC-based One-Time Password with SHA-1, SHA-256 and SHA-512, time-step
//! derivation, and secret-handling helpers. Everything here is a pure
//! function of its arguments; the wall-clock wrappers read the clock once
//! and delegate to the `_at` variants.

use crate::totp::types::*;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Raw HMAC-OTP (RFC 4226 §5.3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute an HOTP code for the given raw key bytes and counter.
pub fn hotp_raw(key: &[u8], counter: u64, digits: u8, algo: Algorithm) -> Result<String, OtpError> {
    validate_digits(digits)?;
    if key.is_empty() {
        return Err(OtpError::new(
            OtpErrorKind::EncodingFailure,
            "secret must not be empty",
        ));
    }
    let digest = compute_hmac(key, &counter.to_be_bytes(), algo);
    Ok(truncate(&digest, digits))
}

/// Compute HMAC(key, message) using the specified algorithm.
fn compute_hmac(key: &[u8], data: &[u8], algo: Algorithm) -> Vec<u8> {
    match algo {
        Algorithm::Sha1 => {
            let mut mac =
                Hmac::<Sha1>::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha256 => {
            let mut mac =
                Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha512 => {
            let mut mac =
                Hmac::<Sha512>::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Dynamic truncation per RFC 4226 §5.3.
fn truncate(digest: &[u8], digits: u8) -> String {
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    // Every supported digest is at least 20 bytes, so the 4-byte window at
    // offset (at most 15) always fits.
    assert!(
        offset + 4 <= digest.len(),
        "truncation window exceeds digest length"
    );
    let binary = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);
    // 64-bit modulus keeps 9- and 10-digit codes exact.
    let modulus = 10u64.pow(digits as u32);
    let code = binary as u64 % modulus;
    format!("{:0>width$}", code, width = digits as usize)
}

fn validate_digits(digits: u8) -> Result<(), OtpError> {
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
        return Err(OtpError::new(
            OtpErrorKind::InvalidParameter,
            format!(
                "digits must be between {} and {}, got {}",
                MIN_DIGITS, MAX_DIGITS, digits
            ),
        ));
    }
    Ok(())
}

fn validate_period(period: u32) -> Result<(), OtpError> {
    if period == 0 {
        return Err(OtpError::new(
            OtpErrorKind::InvalidParameter,
            "period must be a positive number of seconds",
        ));
    }
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Time-step derivation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute the current TOTP time-step counter.
pub fn time_step(period: u32) -> Result<u64, OtpError> {
    time_step_at(current_unix_time(), period)
}

/// Compute the time-step counter for a given unix timestamp.
///
/// Unsigned integer division floors, which is the required counter
/// semantics for any non-negative timestamp.
pub fn time_step_at(unix_seconds: u64, period: u32) -> Result<u64, OtpError> {
    validate_period(period)?;
    Ok(unix_seconds / period as u64)
}

/// Seconds remaining until the current time-step expires.
pub fn seconds_remaining(period: u32) -> Result<u32, OtpError> {
    seconds_remaining_at(current_unix_time(), period)
}

/// Seconds remaining for a specific timestamp.
pub fn seconds_remaining_at(unix_seconds: u64, period: u32) -> Result<u32, OtpError> {
    validate_period(period)?;
    let p = period as u64;
    Ok((p - (unix_seconds % p)) as u32)
}

/// Progress fraction (0.0 = fresh code, 1.0 = about to expire).
pub fn progress_fraction(period: u32) -> Result<f64, OtpError> {
    progress_fraction_at(current_unix_time(), period)
}

/// Progress fraction for a specific timestamp.
pub fn progress_fraction_at(unix_seconds: u64, period: u32) -> Result<f64, OtpError> {
    validate_period(period)?;
    let elapsed = (unix_seconds % period as u64) as f64;
    Ok(elapsed / period as f64)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TOTP over raw key bytes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generate a TOTP code from raw secret bytes at the current time.
pub fn generate(
    secret: &[u8],
    digits: u8,
    period: u32,
    algo: Algorithm,
) -> Result<String, OtpError> {
    generate_at(secret, digits, period, algo, current_unix_time())
}

/// Generate a TOTP code from raw secret bytes at an explicit unix timestamp.
pub fn generate_at(
    secret: &[u8],
    digits: u8,
    period: u32,
    algo: Algorithm,
    unix_seconds: u64,
) -> Result<String, OtpError> {
    let step = time_step_at(unix_seconds, period)?;
    hotp_raw(secret, step, digits, algo)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  HOTP / TOTP over a base-32 secret
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generate an HOTP code from a base-32 encoded secret.
pub fn generate_hotp(
    secret_b32: &str,
    counter: u64,
    digits: u8,
    algo: Algorithm,
) -> Result<String, OtpError> {
    let key = decode_secret(secret_b32)?;
    hotp_raw(&key, counter, digits, algo)
}

/// Generate a TOTP code from a base-32 secret, at the current time.
pub fn generate_totp(
    secret_b32: &str,
    digits: u8,
    period: u32,
    algo: Algorithm,
) -> Result<String, OtpError> {
    generate_totp_at(secret_b32, digits, period, algo, current_unix_time())
}

/// Generate a TOTP code at an explicit unix timestamp.
pub fn generate_totp_at(
    secret_b32: &str,
    digits: u8,
    period: u32,
    algo: Algorithm,
    unix_seconds: u64,
) -> Result<String, OtpError> {
    let step = time_step_at(unix_seconds, period)?;
    generate_hotp(secret_b32, step, digits, algo)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  High-level: generate from a key
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generate a `GeneratedCode` for an `OtpKey`.
pub fn generate_code(key: &OtpKey) -> Result<GeneratedCode, OtpError> {
    generate_code_at(key, current_unix_time())
}

/// Generate a `GeneratedCode` at a specific unix timestamp.
pub fn generate_code_at(key: &OtpKey, unix_seconds: u64) -> Result<GeneratedCode, OtpError> {
    key.validate()?;
    let secret = key.normalised_secret();
    match key.otp_type {
        OtpType::Totp => {
            let step = time_step_at(unix_seconds, key.period)?;
            let code = generate_hotp(&secret, step, key.digits, key.algorithm)?;
            Ok(GeneratedCode {
                code,
                remaining_seconds: seconds_remaining_at(unix_seconds, key.period)?,
                period: key.period,
                progress: progress_fraction_at(unix_seconds, key.period)?,
                counter: step,
            })
        }
        OtpType::Hotp => {
            let code = generate_hotp(&secret, key.counter, key.digits, key.algorithm)?;
            Ok(GeneratedCode {
                code,
                remaining_seconds: 0,
                period: 0,
                progress: 0.0,
                counter: key.counter,
            })
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Secret helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Decode a base-32 secret (with or without spaces/dashes, case-insensitive).
pub fn decode_secret(b32: &str) -> Result<Vec<u8>, OtpError> {
    let cleaned = b32.replace(' ', "").replace('-', "").to_uppercase();
    if cleaned.is_empty() {
        return Err(OtpError::new(
            OtpErrorKind::EncodingFailure,
            "secret must not be empty",
        ));
    }
    // Pad to multiple of 8 if needed
    let padded = pad_base32(&cleaned);
    base32::decode(base32::Alphabet::Rfc4648 { padding: true }, &padded)
        .or_else(|| base32::decode(base32::Alphabet::Rfc4648 { padding: false }, &cleaned))
        .ok_or_else(|| OtpError::new(OtpErrorKind::EncodingFailure, "invalid base-32 secret"))
}

/// Encode raw bytes to base-32 (no padding, uppercase).
pub fn encode_secret(bytes: &[u8]) -> String {
    base32::encode(base32::Alphabet::Rfc4648 { padding: false }, bytes)
}

/// Generate a cryptographically-random base-32 secret.
pub fn generate_secret(byte_length: usize) -> String {
    let mut buf = vec![0u8; byte_length];
    use rand::RngCore;
    rand::thread_rng().fill_bytes(&mut buf);
    encode_secret(&buf)
}

/// Pad a base-32 string to a multiple of 8 with '='.
fn pad_base32(s: &str) -> String {
    let remainder = s.len() % 8;
    if remainder == 0 {
        s.to_string()
    } else {
        let pad_count = 8 - remainder;
        format!("{}{}", s, "=".repeat(pad_count))
    }
}

/// Check if a string looks like a valid base-32 secret.
pub fn is_valid_base32(s: &str) -> bool {
    let cleaned = s.replace(' ', "").replace('-', "").to_uppercase();
    if cleaned.is_empty() {
        return false;
    }
    cleaned.chars().all(|c| matches!(c, 'A'..='Z' | '2'..='7' | '='))
        && decode_secret(&cleaned).is_ok()
}

/// Format an OTP code with a space in the middle (e.g. "123 456").
pub fn format_code_display(code: &str) -> String {
    if code.len() <= 4 {
        return code.to_string();
    }
    let mid = code.len() / 2;
    format!("{} {}", &code[..mid], &code[mid..])
}

/// Current unix timestamp in seconds.
fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── RFC 4226 test vectors (Appendix D) ───────────────────────
    // Secret: "12345678901234567890" (ASCII) → base32: GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ

    const RFC_SECRET_ASCII: &[u8] = b"12345678901234567890";
    const RFC_SECRET_B32: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn rfc4226_hotp_vectors() {
        let expected = [
            "755224", "287082", "359152", "969429", "338314",
            "254676", "287922", "162583", "399871", "520489",
        ];
        for (counter, exp) in expected.iter().enumerate() {
            let code = generate_hotp(RFC_SECRET_B32, counter as u64, 6, Algorithm::Sha1).unwrap();
            assert_eq!(&code, exp, "HOTP mismatch at counter {}", counter);
        }
    }

    #[test]
    fn hotp_raw_matches_base32_wrapper() {
        let raw = hotp_raw(RFC_SECRET_ASCII, 1, 6, Algorithm::Sha1).unwrap();
        let wrapped = generate_hotp(RFC_SECRET_B32, 1, 6, Algorithm::Sha1).unwrap();
        assert_eq!(raw, wrapped);
    }

    // ── RFC 6238 test vectors ────────────────────────────────────

    #[test]
    fn rfc6238_totp_sha1() {
        // At T=59s → step 1
        let code = generate_at(RFC_SECRET_ASCII, 8, 30, Algorithm::Sha1, 59).unwrap();
        assert_eq!(code, "94287082");
    }

    #[test]
    fn rfc6238_totp_sha256() {
        let code = generate_at(
            b"12345678901234567890123456789012",
            8,
            30,
            Algorithm::Sha256,
            59,
        )
        .unwrap();
        assert_eq!(code, "46119246");
    }

    #[test]
    fn rfc6238_totp_sha512() {
        let code = generate_at(
            b"1234567890123456789012345678901234567890123456789012345678901234",
            8,
            30,
            Algorithm::Sha512,
            59,
        )
        .unwrap();
        assert_eq!(code, "90693936");
    }

    #[test]
    fn rfc6238_totp_leading_zero_preserved() {
        // T = 1111111109 → "07081804"; the zero-pad must survive.
        let code = generate_at(RFC_SECRET_ASCII, 8, 30, Algorithm::Sha1, 1111111109).unwrap();
        assert_eq!(code, "07081804");
    }

    #[test]
    fn rfc6238_totp_far_future() {
        let code = generate_at(RFC_SECRET_ASCII, 8, 30, Algorithm::Sha1, 20000000000).unwrap();
        assert_eq!(code, "65353130");
    }

    #[test]
    fn base32_wrapper_matches_rfc6238() {
        let code = generate_totp_at(RFC_SECRET_B32, 8, 30, Algorithm::Sha1, 59).unwrap();
        assert_eq!(code, "94287082");
    }

    // ── Time-step helpers ────────────────────────────────────────

    #[test]
    fn time_step_calculation() {
        assert_eq!(time_step_at(0, 30).unwrap(), 0);
        assert_eq!(time_step_at(29, 30).unwrap(), 0);
        assert_eq!(time_step_at(30, 30).unwrap(), 1);
        assert_eq!(time_step_at(59, 30).unwrap(), 1);
        assert_eq!(time_step_at(60, 30).unwrap(), 2);
    }

    #[test]
    fn time_step_zero_period_rejected() {
        let err = time_step_at(59, 0).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidParameter);
    }

    #[test]
    fn seconds_remaining_calculation() {
        assert_eq!(seconds_remaining_at(0, 30).unwrap(), 30);
        assert_eq!(seconds_remaining_at(1, 30).unwrap(), 29);
        assert_eq!(seconds_remaining_at(29, 30).unwrap(), 1);
        assert_eq!(seconds_remaining_at(30, 30).unwrap(), 30);
    }

    #[test]
    fn progress_fraction_calculation() {
        let p = progress_fraction_at(0, 30).unwrap();
        assert!((p - 0.0).abs() < 0.01);
        let p = progress_fraction_at(15, 30).unwrap();
        assert!((p - 0.5).abs() < 0.01);
    }

    // ── Determinism and window properties ────────────────────────

    #[test]
    fn same_window_same_code() {
        let a = generate_at(RFC_SECRET_ASCII, 6, 30, Algorithm::Sha1, 31).unwrap();
        let b = generate_at(RFC_SECRET_ASCII, 6, 30, Algorithm::Sha1, 59).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn adjacent_windows_differ() {
        // Steps 1 and 2 of the RFC vectors are known distinct.
        let a = generate_at(RFC_SECRET_ASCII, 6, 30, Algorithm::Sha1, 59).unwrap();
        let b = generate_at(RFC_SECRET_ASCII, 6, 30, Algorithm::Sha1, 60).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn repeated_calls_deterministic() {
        for _ in 0..3 {
            let code = generate_at(RFC_SECRET_ASCII, 6, 30, Algorithm::Sha1, 1234567890).unwrap();
            assert_eq!(
                code,
                generate_at(RFC_SECRET_ASCII, 6, 30, Algorithm::Sha1, 1234567890).unwrap()
            );
        }
    }

    #[test]
    fn codes_mostly_distinct_across_periods() {
        let mut codes = std::collections::HashSet::new();
        for step in 0..100u64 {
            let code =
                generate_at(RFC_SECRET_ASCII, 6, 30, Algorithm::Sha1, step * 30).unwrap();
            codes.insert(code);
        }
        // Collisions among 100 draws from 10^6 values are rare; a handful is
        // tolerated, wholesale repetition is not.
        assert!(codes.len() >= 95, "only {} distinct codes", codes.len());
    }

    #[test]
    fn output_length_matches_digits() {
        for digits in MIN_DIGITS..=MAX_DIGITS {
            let code = generate_at(RFC_SECRET_ASCII, digits, 30, Algorithm::Sha1, 59).unwrap();
            assert_eq!(code.len(), digits as usize);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    // ── Parameter validation ─────────────────────────────────────

    #[test]
    fn digits_out_of_range_rejected() {
        for digits in [0u8, 5, 11] {
            let err = generate_at(RFC_SECRET_ASCII, digits, 30, Algorithm::Sha1, 59).unwrap_err();
            assert_eq!(err.kind, OtpErrorKind::InvalidParameter);
        }
    }

    #[test]
    fn zero_period_rejected() {
        let err = generate_at(RFC_SECRET_ASCII, 6, 0, Algorithm::Sha1, 59).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidParameter);
    }

    #[test]
    fn empty_secret_rejected() {
        let err = generate_at(b"", 6, 30, Algorithm::Sha1, 59).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::EncodingFailure);
    }

    // ── generate_code for a key ──────────────────────────────────

    #[test]
    fn generate_code_totp_key() {
        let key = OtpKey::new("user", RFC_SECRET_B32);
        let result = generate_code_at(&key, 59).unwrap();
        assert_eq!(result.code, "287082"); // 6-digit at step 1
        assert_eq!(result.remaining_seconds, 1);
        assert_eq!(result.counter, 1);
    }

    #[test]
    fn generate_code_hotp_key() {
        let key = OtpKey::new("user", RFC_SECRET_B32).as_hotp(0);
        let result = generate_code_at(&key, 59).unwrap();
        assert_eq!(result.code, "755224"); // counter=0
        assert_eq!(result.counter, 0);
    }

    #[test]
    fn generate_code_invalid_secret() {
        let key = OtpKey::new("u", "!!!INVALID!!!");
        let result = generate_code_at(&key, 59);
        assert!(result.is_err());
    }

    // ── Secret helpers ───────────────────────────────────────────

    #[test]
    fn decode_encode_roundtrip() {
        let original = b"hello world secret";
        let b32 = encode_secret(original);
        let decoded = decode_secret(&b32).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn decode_with_spaces_dashes() {
        let clean = "JBSWY3DPEHPK3PXP";
        let spaced = "JBSW Y3DP EHPK 3PXP";
        let dashed = "JBSW-Y3DP-EHPK-3PXP";
        let d1 = decode_secret(clean).unwrap();
        let d2 = decode_secret(spaced).unwrap();
        let d3 = decode_secret(dashed).unwrap();
        assert_eq!(d1, d2);
        assert_eq!(d2, d3);
    }

    #[test]
    fn decode_case_insensitive() {
        let upper = decode_secret("JBSWY3DPEHPK3PXP").unwrap();
        let lower = decode_secret("jbswy3dpehpk3pxp").unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn decode_invalid() {
        let err = decode_secret("!!!").unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::EncodingFailure);
    }

    #[test]
    fn decode_empty() {
        let err = decode_secret("").unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::EncodingFailure);
    }

    #[test]
    fn generate_secret_length() {
        let s = generate_secret(20);
        assert!(!s.is_empty());
        let bytes = decode_secret(&s).unwrap();
        assert_eq!(bytes.len(), 20);
    }

    #[test]
    fn is_valid_base32_check() {
        assert!(is_valid_base32("JBSWY3DPEHPK3PXP"));
        assert!(is_valid_base32("jbsw y3dp ehpk 3pxp"));
        assert!(!is_valid_base32(""));
        assert!(!is_valid_base32("!!!"));
    }

    // ── Display formatting ───────────────────────────────────────

    #[test]
    fn format_code_split() {
        assert_eq!(format_code_display("123456"), "123 456");
        assert_eq!(format_code_display("12345678"), "1234 5678");
        assert_eq!(format_code_display("1234"), "1234");
        assert_eq!(format_code_display("123"), "123");
    }
}
