//! Raw HTML sanitization.
//!
//! The parser hands every raw HTML block to a [`Sanitizer`] when
//! [`Settings::xss_protect_raw_html`](crate::Settings) is on. The default
//! implementation delegates to `ammonia`, which balances tags and strips
//! scripts, event handlers and dangerous URL schemes.

/// Turns an untrusted HTML fragment into one that is safe to embed.
pub trait Sanitizer {
    fn sanitize(&self, fragment: &str) -> String;
}

/// Whitelist-based cleaning with `ammonia`'s default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmmoniaSanitizer;

impl Sanitizer for AmmoniaSanitizer {
    fn sanitize(&self, fragment: &str) -> String {
        ammonia::clean(fragment)
    }
}

/// Returns the fragment unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Sanitizer for PassThrough {
    fn sanitize(&self, fragment: &str) -> String {
        fragment.to_string()
    }
}

impl<F> Sanitizer for F
where
    F: Fn(&str) -> String,
{
    fn sanitize(&self, fragment: &str) -> String {
        self(fragment)
    }
}
