use url::Url;

pub const HOME_URL: &str = "https://www.instagram.com/";

/// Hosts that stay inside the shell. Subdomains of these are first-party too.
pub const FIRST_PARTY_HOSTS: [&str; 6] = [
    "instagram.com",
    "www.instagram.com",
    "m.instagram.com",
    "l.instagram.com",
    "cdninstagram.com",
    "static.cdninstagram.com",
];

/// Schemes always handed to the operating system.
const EXTERNAL_SCHEMES: [&str; 3] = ["intent", "mailto", "tel"];

pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 14; NoReel Build/UPB5.230623.003; wv) AppleWebKit/537.36 (KHTML, like Gecko) Version/4.0 Chrome/124.0.0.0 Mobile Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Let the web view load it.
    Stay,
    OpenExternal(Url),
}

pub fn is_first_party(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    FIRST_PARTY_HOSTS.iter().any(|allowed| {
        host == *allowed
            || host
                .strip_suffix(allowed)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Decides where a main-frame navigation goes.
pub fn classify_navigation(target: &str) -> Navigation {
    let Ok(url) = Url::parse(target) else {
        return Navigation::Stay;
    };
    if EXTERNAL_SCHEMES.contains(&url.scheme()) {
        return Navigation::OpenExternal(url);
    }
    match url.host_str() {
        None => Navigation::Stay,
        Some(host) if is_first_party(host) => Navigation::Stay,
        Some(_) => Navigation::OpenExternal(url),
    }
}
