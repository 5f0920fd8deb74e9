//! # totpauth – TOTP / HOTP one-time passwords
//!
//! Time-based and counter-based one-time password crate:
//!
//! - **RFC 4226 / 6238** – HOTP & TOTP generation with SHA-1, SHA-256, SHA-512
//! - **otpauth:// URIs** – Generation & parsing per the Google Authenticator
//!   key-URI format, with percent-encoded labels
//! - **Secret helpers** – Base-32 encode/decode, validity checks,
//!   cryptographically-random secret generation
//!
//! All code generation is a pure function of its inputs; every clock-reading
//! convenience has an `_at(unix_seconds)` twin that takes the timestamp
//! explicitly, so callers (and tests) control time.

pub mod totp;
