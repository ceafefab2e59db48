use url::Url;

/// Canonicalizes an href into a lowercase, `/`-terminated path.
///
/// `value` is resolved against `base` (the page origin) with the same WHATWG
/// rules the browser applies to `new URL(value, origin)`, keeping only the
/// path. Input that fails to parse is treated as a raw path instead. Missing or
/// empty input yields an empty string, which never equals a rule path.
pub fn normalize_path(value: Option<&str>, base: &Url) -> String {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return String::new();
    };

    match base.join(value) {
        Ok(url) => {
            let path = url.path();
            // Opaque URLs (`javascript:`, `mailto:`) have no leading slash.
            let mut normalized = if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            };
            if !normalized.ends_with('/') {
                normalized.push('/');
            }
            normalized.to_lowercase()
        }
        Err(_) => raw_path(value),
    }
}

fn raw_path(value: &str) -> String {
    let wrapped = match (value.starts_with('/'), value.ends_with('/')) {
        (true, true) => value.to_string(),
        (true, false) => format!("{value}/"),
        (false, _) => format!("/{value}/"),
    };
    wrapped.to_lowercase()
}

/// Base URL carrying only the scheme, host and port of `page`.
pub fn origin_base(page: &Url) -> Url {
    let origin = page.origin().ascii_serialization();
    Url::parse(&origin).unwrap_or_else(|_| page.clone())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn base() -> Url {
        Url::parse("https://www.instagram.com").expect("static url")
    }

    fn normalize(value: &str) -> String {
        normalize_path(Some(value), &base())
    }

    #[test]
    fn documented_cases() {
        assert_eq!(normalize("/reels"), "/reels/");
        assert_eq!(normalize("https://site/reels/"), "/reels/");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize_path(None, &base()), "");
    }

    #[test]
    fn strips_query_fragment_and_case() {
        assert_eq!(normalize("/Reels/?utm=1#top"), "/reels/");
        assert_eq!(normalize("https://www.instagram.com/EXPLORE"), "/explore/");
        assert_eq!(normalize("reels"), "/reels/");
        assert_eq!(normalize("//cdn.example.com/shop"), "/shop/");
    }

    #[test]
    fn relative_paths_resolve_against_origin() {
        let page = Url::parse("https://www.instagram.com/someone/tagged/").expect("static url");
        let base = origin_base(&page);
        assert_eq!(base.as_str(), "https://www.instagram.com/");
        assert_eq!(normalize_path(Some("reels"), &base), "/reels/");
        assert_eq!(normalize_path(Some("../shop"), &base), "/shop/");
    }

    #[test]
    fn opaque_urls_get_a_leading_slash() {
        assert_eq!(normalize("javascript:void(0)"), "/void(0)/");
        assert_eq!(normalize("mailto:hi@example.com"), "/hi@example.com/");
    }

    #[test]
    fn malformed_urls_fall_back_to_raw_path() {
        assert_eq!(normalize("http://[::1"), "/http://[::1/");
        assert_eq!(raw_path("/Threads_App"), "/threads_app/");
        assert_eq!(raw_path("/threads_app/"), "/threads_app/");
        assert_eq!(raw_path("Reels"), "/reels/");
    }

    #[test]
    fn idempotent() {
        for input in [
            "/reels",
            "/reels/",
            "https://site/reels/",
            "REELS",
            "/explore/?x=1",
            "https://www.instagram.com/threads_app/",
            "javascript:void(0)",
            "/a/b/../c",
            "",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input {input:?}");
        }
    }
}
