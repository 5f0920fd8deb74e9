//! OTP crate: sub-modules.

pub mod core;
pub mod types;
pub mod uri;

// Re-export top-level items for convenience.
pub use self::core::{
    decode_secret, encode_secret, format_code_display, generate, generate_at, generate_code,
    generate_code_at, generate_hotp, generate_secret, generate_totp, generate_totp_at, hotp_raw,
    is_valid_base32, progress_fraction, progress_fraction_at, seconds_remaining,
    seconds_remaining_at, time_step, time_step_at,
};
pub use types::*;
pub use uri::{
    build_otpauth_uri, build_otpauth_uris, generate_uri, parse_otpauth_uri, parse_otpauth_uris,
};
