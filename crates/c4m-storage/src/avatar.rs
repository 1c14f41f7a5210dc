//! Avatar object keys.

use uuid::Uuid;

pub const AVATAR_PREFIX: &str = "avatars/";

/// Fresh key for an uploaded avatar.
pub fn avatar_key() -> String {
    format!("{}{}", AVATAR_PREFIX, Uuid::new_v4())
}

/// Recover the object key from a public avatar URL served under `base_url`.
///
/// Returns `None` for URLs that point elsewhere, so foreign avatars are
/// never deleted.
pub fn key_from_public_url(base_url: &str, url: &str) -> Option<String> {
    let base = base_url.trim_end_matches('/');
    let rest = url.strip_prefix(base)?.strip_prefix('/')?;
    let key = rest.split(['?', '#']).next().unwrap_or_default();
    if key.starts_with(AVATAR_PREFIX) && key.len() > AVATAR_PREFIX.len() {
        Some(key.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_key_is_unique() {
        let a = avatar_key();
        assert!(a.starts_with(AVATAR_PREFIX));
        assert_ne!(a, avatar_key());
    }

    #[test]
    fn test_key_from_public_url() {
        let base = "https://cdn.career4me.test/";
        assert_eq!(
            key_from_public_url(base, "https://cdn.career4me.test/avatars/abc?v=2").as_deref(),
            Some("avatars/abc")
        );
        assert_eq!(key_from_public_url(base, "https://other.test/avatars/abc"), None);
        assert_eq!(key_from_public_url(base, "https://cdn.career4me.test/logos/abc"), None);
        assert_eq!(key_from_public_url(base, "https://cdn.career4me.test/avatars/"), None);
    }
}
