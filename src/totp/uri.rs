//! `otpauth://` URI generation and parsing per the Google Authenticator
//! key-URI format:
//! <https://github.com/google/google-authenticator/wiki/Key-Uri-Format>
//!
//! Format: `otpauth://totp/ISSUER:LABEL?secret=BASE32&issuer=ISSUER&algorithm=SHA1&digits=6&period=30`

use crate::totp::core::encode_secret;
use crate::totp::types::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build a provisioning URI for a raw secret.
///
/// The secret is base-32 encoded (unpadded) and issuer/user are treated as
/// opaque strings: both are percent-encoded before embedding.
pub fn generate_uri(
    secret: &[u8],
    issuer: &str,
    user: &str,
    algorithm: Algorithm,
    digits: u8,
    period: u32,
) -> Result<String, OtpError> {
    if issuer.is_empty() {
        return Err(OtpError::new(
            OtpErrorKind::InvalidParameter,
            "issuer must not be empty",
        ));
    }
    if user.is_empty() {
        return Err(OtpError::new(
            OtpErrorKind::InvalidParameter,
            "user must not be empty",
        ));
    }
    if secret.is_empty() {
        return Err(OtpError::new(
            OtpErrorKind::EncodingFailure,
            "secret must not be empty",
        ));
    }
    let key = OtpKey::new(user, encode_secret(secret))
        .with_issuer(issuer)
        .with_algorithm(algorithm)
        .with_digits(digits)
        .with_period(period);
    build_otpauth_uri(&key)
}

/// Build an `otpauth://` URI from an `OtpKey`.
///
/// All generation parameters are emitted explicitly, so the URI round-trips
/// through any parser without relying on its defaults.
pub fn build_otpauth_uri(key: &OtpKey) -> Result<String, OtpError> {
    key.validate()?;

    let label = url_encode(&key.account);
    let path = match &key.issuer {
        Some(iss) if !iss.is_empty() => format!("{}:{}", url_encode(iss), label),
        _ => label,
    };

    let mut params = vec![format!("secret={}", key.normalised_secret())];
    if let Some(ref iss) = key.issuer {
        params.push(format!("issuer={}", url_encode(iss)));
    }
    params.push(format!("algorithm={}", key.algorithm.uri_name()));
    params.push(format!("digits={}", key.digits));
    match key.otp_type {
        OtpType::Totp => params.push(format!("period={}", key.period)),
        OtpType::Hotp => params.push(format!("counter={}", key.counter)),
    }

    Ok(format!(
        "otpauth://{}/{}?{}",
        key.otp_type,
        path,
        params.join("&")
    ))
}

/// Generate URIs for multiple keys (one per line).
pub fn build_otpauth_uris(keys: &[OtpKey]) -> Result<String, OtpError> {
    let lines = keys
        .iter()
        .map(build_otpauth_uri)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parse
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse an `otpauth://` URI into an `OtpKey`.
///
/// Unknown query parameters are skipped; out-of-range or unparsable values
/// for the known parameters are rejected rather than silently replaced.
pub fn parse_otpauth_uri(uri: &str) -> Result<OtpKey, OtpError> {
    let url = url::Url::parse(uri)
        .map_err(|e| OtpError::new(OtpErrorKind::InvalidUri, format!("invalid URI: {}", e)))?;

    if url.scheme() != "otpauth" {
        return Err(OtpError::new(
            OtpErrorKind::InvalidUri,
            format!("expected scheme 'otpauth', got '{}'", url.scheme()),
        ));
    }

    let otp_type = match url.host_str() {
        Some("totp") => OtpType::Totp,
        Some("hotp") => OtpType::Hotp,
        other => {
            return Err(OtpError::new(
                OtpErrorKind::InvalidUri,
                format!("unknown OTP type: {:?}", other),
            ))
        }
    };

    // Path is "/LABEL" or "/ISSUER:LABEL"
    let path = url.path();
    let path = path.strip_prefix('/').unwrap_or(path);
    let path_decoded = url_decode(path);

    let (path_issuer, account) = if let Some(colon_pos) = path_decoded.find(':') {
        let issuer = path_decoded[..colon_pos].trim().to_string();
        let account = path_decoded[colon_pos + 1..].trim().to_string();
        (Some(issuer), account)
    } else {
        (None, path_decoded)
    };

    let mut secret = None;
    let mut param_issuer = None;
    let mut algorithm = Algorithm::default();
    let mut digits = DEFAULT_DIGITS;
    let mut period = DEFAULT_PERIOD;
    let mut counter = 0u64;

    for (name, value) in url.query_pairs() {
        match name.as_ref() {
            "secret" => secret = Some(value.to_string()),
            "issuer" => param_issuer = Some(value.to_string()),
            "algorithm" => {
                algorithm = Algorithm::from_str_loose(&value).ok_or_else(|| {
                    OtpError::new(
                        OtpErrorKind::InvalidParameter,
                        format!("unsupported algorithm '{}'", value),
                    )
                })?;
            }
            "digits" => {
                digits = value
                    .parse::<u8>()
                    .ok()
                    .filter(|d| (MIN_DIGITS..=MAX_DIGITS).contains(d))
                    .ok_or_else(|| {
                        OtpError::new(
                            OtpErrorKind::InvalidParameter,
                            format!("digits out of range: '{}'", value),
                        )
                    })?;
            }
            "period" => {
                period = value.parse::<u32>().ok().filter(|p| *p > 0).ok_or_else(|| {
                    OtpError::new(
                        OtpErrorKind::InvalidParameter,
                        format!("period must be a positive number of seconds, got '{}'", value),
                    )
                })?;
            }
            "counter" => {
                counter = value.parse::<u64>().map_err(|_| {
                    OtpError::new(
                        OtpErrorKind::InvalidParameter,
                        format!("counter is not a number: '{}'", value),
                    )
                })?;
            }
            other => log::debug!("ignoring unknown otpauth parameter '{}'", other),
        }
    }

    let secret = secret.ok_or_else(|| {
        OtpError::new(OtpErrorKind::InvalidUri, "missing 'secret' parameter")
    })?;

    // Prefer issuer from query param, then from path prefix
    let issuer = param_issuer.or(path_issuer);

    let mut key = OtpKey::new(account, secret)
        .with_algorithm(algorithm)
        .with_digits(digits)
        .with_period(period);
    key.otp_type = otp_type;
    if otp_type == OtpType::Hotp {
        key.counter = counter;
    }
    if let Some(iss) = issuer {
        key = key.with_issuer(iss);
    }

    key.validate()?;
    Ok(key)
}

/// Parse multiple URIs (one per line), skipping blanks and comments.
pub fn parse_otpauth_uris(text: &str) -> Vec<Result<OtpKey, OtpError>> {
    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(parse_otpauth_uri)
        .collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  URL encoding helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn url_encode(s: &str) -> String {
    let mut output = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                output.push(byte as char);
            }
            b' ' => output.push_str("%20"),
            b'@' => output.push_str("%40"),
            _ => output.push_str(&format!("%{:02X}", byte)),
        }
    }
    output
}

fn url_decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => {
                let hex: String = chars.by_ref().take(2).collect();
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    bytes.push(byte);
                } else {
                    bytes.push(b'%');
                    bytes.extend_from_slice(hex.as_bytes());
                }
            }
            '+' => bytes.push(b' '),
            _ => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
