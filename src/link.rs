//! Validation and classification of user-entered Spotify links.
//!
//! A Spotify link has the shape `open.spotify.com/<type>/<id>`, where
//! `<type>` is one of track/album/playlist and `<id>` may carry a trailing
//! `?si=...` share code.

use {
    crate::error::Error,
    regex::Regex,
    std::{fmt, str::FromStr},
};

/// One accepted pattern per downloadable resource type.
const SPOTIFY_LINK_PATTERNS: [&str; 3] = [
    r"^(?:https?://)?open\.spotify\.com/track/[A-Za-z0-9]+",
    r"^(?:https?://)?open\.spotify\.com/album/[A-Za-z0-9]+",
    r"^(?:https?://)?open\.spotify\.com/playlist/[A-Za-z0-9]+",
];

/// The kind of resource a Spotify link refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    Track,
    Album,
    Playlist,
}

impl FromStr for LinkType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "track" => Ok(LinkType::Track),
            "album" => Ok(LinkType::Album),
            "playlist" => Ok(LinkType::Playlist),
            other => Err(Error::Link(format!(
                "Invalid Spotify link type entered: '{other}'"
            ))),
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::Track => write!(f, "track"),
            LinkType::Album => write!(f, "album"),
            LinkType::Playlist => write!(f, "playlist"),
        }
    }
}

/// A validated link, broken into its resource type and id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyLink {
    pub kind: LinkType,
    pub id: String,
}

/// Handles all checks needed to vet user-entered Spotify links.
///
/// Match-any semantics: every pattern is evaluated and a single flag records
/// whether anything matched. An empty link never matches and is rejected
/// before any pattern runs.
pub fn check_spotify_link(link: &str) -> bool {
    let mut is_match = false;

    if link.is_empty() {
        return is_match;
    }

    for pattern in SPOTIFY_LINK_PATTERNS.iter() {
        let re = Regex::new(pattern).unwrap();
        if re.is_match(link.trim()) {
            is_match = true;
        }
    }

    is_match
}

/// Returns the resource type of a link: the path segment immediately before
/// the trailing id segment.
pub fn link_type(link: &str) -> &str {
    let parts: Vec<&str> = link.trim().trim_end_matches('/').split('/').collect();
    if parts.len() < 2 {
        return "";
    }

    parts[parts.len() - 2]
}

/// Returns the resource id of a link: the final path segment with any
/// `?si=...` share code stripped.
///
/// The tool this replaces kept only the *last character* of the segment when
/// no query string was present, which discards the id entirely. The full
/// segment is the intended value and is what gets returned here.
pub fn resource_id(link: &str) -> &str {
    let segment = link
        .trim()
        .trim_end_matches('/')
        .split('/')
        .next_back()
        .unwrap_or_default();

    match segment.split_once('?') {
        Some((id, _)) => id,
        None => segment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_spotify_urls() {
        assert!(!check_spotify_link("https://example.com/track/abc123"));
        assert!(!check_spotify_link("https://www.youtube.com/watch?v=x"));
        assert!(!check_spotify_link("not a link at all"));
    }

    #[test]
    fn rejects_empty_link() {
        assert!(!check_spotify_link(""));
    }

    #[test]
    fn rejects_unsupported_resource_types() {
        assert!(!check_spotify_link(
            "https://open.spotify.com/artist/4NHQUGzhtTLFvgF5SZesLK"
        ));
        assert!(!check_spotify_link("https://open.spotify.com/show/abc123"));
    }

    #[test]
    fn accepts_track_album_and_playlist_links() {
        assert!(check_spotify_link(
            "https://open.spotify.com/track/0Ey8buiWgtBQjb7ypaACKN"
        ));
        assert!(check_spotify_link(
            "https://open.spotify.com/album/0bWYlK9rRmIB68icHx9PNR?si=0PRvNMbB"
        ));
        assert!(check_spotify_link(
            "https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M"
        ));
    }

    #[test]
    fn accepts_links_with_surrounding_whitespace() {
        assert!(check_spotify_link(
            "  https://open.spotify.com/track/0Ey8buiWgtBQjb7ypaACKN "
        ));
    }

    #[test]
    fn extracts_type_from_segment_before_id() {
        assert_eq!(
            link_type("https://open.spotify.com/track/0Ey8buiWgtBQjb7ypaACKN"),
            "track"
        );
        assert_eq!(
            link_type("https://open.spotify.com/album/0bWYlK9rRmIB68icHx9PNR?si=x"),
            "album"
        );
        assert_eq!(
            link_type("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M"),
            "playlist"
        );
    }

    #[test]
    fn extracts_id_with_share_code_stripped() {
        assert_eq!(
            resource_id("https://open.spotify.com/track/0Ey8buiWgtBQjb7ypaACKN?si=22882b3a"),
            "0Ey8buiWgtBQjb7ypaACKN"
        );
    }

    // Pins the full-segment behavior: the predecessor tool returned only the
    // last character of the id when no query string was present.
    #[test]
    fn extracts_full_id_without_query_string() {
        assert_eq!(
            resource_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M"),
            "37i9dQZF1DXcBWIGoYBM5M"
        );
    }

    #[test]
    fn link_type_parses_only_the_allow_list() {
        assert_eq!("track".parse::<LinkType>().unwrap(), LinkType::Track);
        assert_eq!("album".parse::<LinkType>().unwrap(), LinkType::Album);
        assert_eq!("playlist".parse::<LinkType>().unwrap(), LinkType::Playlist);
        assert!(matches!(
            "artist".parse::<LinkType>(),
            Err(Error::Link(_))
        ));
    }
}
