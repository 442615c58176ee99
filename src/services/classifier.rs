use crate::models::DeviceType;

const MOBILE_MAX_WIDTH: u32 = 768;
const TABLET_MAX_WIDTH: u32 = 1024;

const UNKNOWN: &str = "Unknown";
const DIRECT: &str = "direct";

const KNOWN_SOURCES: &[(&str, &str)] = &[
    ("google", "google"),
    ("bing", "bing"),
    ("yahoo", "yahoo"),
    ("facebook", "facebook"),
    ("linkedin", "linkedin"),
    ("github", "github"),
    ("reddit", "reddit"),
];

// Matched by host rather than substring: "x.com" is a substring of plenty of
// unrelated hosts.
const TWITTER_HOSTS: &[&str] = &["twitter.com", "x.com", "t.co"];

pub fn classify_device(viewport_width: u32) -> DeviceType {
    if viewport_width < MOBILE_MAX_WIDTH {
        DeviceType::Mobile
    } else if viewport_width < TABLET_MAX_WIDTH {
        DeviceType::Tablet
    } else {
        DeviceType::Desktop
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub country: String,
    pub region: String,
}

impl Location {
    fn unknown() -> Self {
        Self {
            country: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
        }
    }
}

/// Coarse location guessed from an IANA timezone such as `America/New_York`:
/// the first segment is the region, the last one the country label. This is
/// a heuristic, not geolocation.
pub fn classify_location(timezone: &str) -> Location {
    let segments: Vec<&str> = timezone
        .trim()
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    match (segments.first(), segments.last()) {
        (Some(region), Some(country)) if segments.len() >= 2 => Location {
            country: country.replace('_', " "),
            region: region.replace('_', " "),
        },
        _ => Location::unknown(),
    }
}

pub fn classify_source(referrer: &str) -> String {
    let referrer = referrer.trim();
    if referrer.is_empty() {
        return DIRECT.to_string();
    }

    let host = match url::Url::parse(referrer)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    {
        Some(h) => h,
        None => return DIRECT.to_string(),
    };

    if TWITTER_HOSTS
        .iter()
        .any(|t| host == *t || host.ends_with(&format!(".{}", t)))
    {
        return "twitter".to_string();
    }

    KNOWN_SOURCES
        .iter()
        .find(|(needle, _)| host.contains(needle))
        .map(|(_, source)| source.to_string())
        .unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_thresholds() {
        assert_eq!(classify_device(0), DeviceType::Mobile);
        assert_eq!(classify_device(767), DeviceType::Mobile);
        assert_eq!(classify_device(768), DeviceType::Tablet);
        assert_eq!(classify_device(1023), DeviceType::Tablet);
        assert_eq!(classify_device(1024), DeviceType::Desktop);
        assert_eq!(classify_device(2560), DeviceType::Desktop);
    }

    #[test]
    fn test_location_from_timezone() {
        assert_eq!(
            classify_location("America/New_York"),
            Location {
                country: "New York".to_string(),
                region: "America".to_string(),
            }
        );
        assert_eq!(
            classify_location("America/Argentina/Buenos_Aires"),
            Location {
                country: "Buenos Aires".to_string(),
                region: "America".to_string(),
            }
        );
    }

    #[test]
    fn test_location_unparseable() {
        assert_eq!(classify_location(""), Location::unknown());
        assert_eq!(classify_location("UTC"), Location::unknown());
        assert_eq!(classify_location("Europe/"), Location::unknown());
    }

    #[test]
    fn test_source_examples() {
        assert_eq!(classify_source("https://www.google.com/search?q=x"), "google");
        assert_eq!(classify_source(""), "direct");
        assert_eq!(classify_source("https://example.org"), "example.org");
    }

    #[test]
    fn test_source_social_hosts() {
        assert_eq!(classify_source("https://t.co/abc"), "twitter");
        assert_eq!(classify_source("https://x.com/someone"), "twitter");
        assert_eq!(classify_source("https://mobile.twitter.com/"), "twitter");
        assert_eq!(classify_source("https://www.linkedin.com/feed/"), "linkedin");
        assert_eq!(classify_source("https://old.reddit.com/r/rust"), "reddit");
        assert_eq!(classify_source("https://dropbox.com/s/file"), "dropbox.com");
    }

    #[test]
    fn test_source_garbage_counts_as_direct() {
        assert_eq!(classify_source("not a url"), "direct");
        assert_eq!(classify_source("   "), "direct");
    }
}
