use crate::domain::GroupReference;
use url::Url;

/// Domain of the group hosting platform
pub const PLATFORM_DOMAIN: &str = "meetup.com";

/// Checks whether a URL points at the hosting platform (the domain itself or any subdomain)
pub fn is_platform_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return false;
    };
    parsed
        .host_str()
        .map(|host| host.to_ascii_lowercase())
        .is_some_and(|host| host == PLATFORM_DOMAIN || host.ends_with(&format!(".{PLATFORM_DOMAIN}")))
}

/// Prefixes `https://` to a URL written without a scheme, e.g. "www.meetup.com/phpug"
pub fn with_default_scheme(url: &str) -> String {
    let url = url.trim();
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Extracts the group's url name, the first path segment of a group URL
/// e.g. "https://www.meetup.com/Berlin-PHP-Usergroup/" -> "Berlin-PHP-Usergroup"
pub fn group_urlname(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed
        .path_segments()?
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Reads direct group references from text with one URL per line
/// Blank lines are ignored and surrounding whitespace is trimmed
pub fn parse_reference_lines(content: &str) -> Vec<GroupReference> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| GroupReference::Url(line.to_string()))
        .collect()
}
