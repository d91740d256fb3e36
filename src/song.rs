//! The canonical song representation and the raw-record normalizer.

use crate::AudioCodec;
use crate::error::{Error, Result};

/// Characters that cannot appear in a file or folder name.
const ILLEGAL_NAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replaces every illegal file-name character in `query` with `#`.
pub fn correct_name(query: &str) -> String {
    query
        .chars()
        .map(|c| if ILLEGAL_NAME_CHARS.contains(&c) { '#' } else { c })
        .collect()
}

/// Joins artist names with `delim` and appends the song name.
pub fn make_song_title(artists: &[String], name: &str, delim: &str) -> String {
    format!("{} - {}", artists.join(delim), name)
}

/// One artist entry of a raw track record.
#[derive(Debug, Clone)]
pub struct RawArtist {
    pub name: String,
}

/// The album sub-object embedded in a full track record.
#[derive(Debug, Clone)]
pub struct RawAlbumRef {
    pub name: String,
    /// Cover image URLs, largest first, as the API returns them.
    pub images: Vec<String>,
}

/// A track record as received from the metadata provider, before
/// normalization. Album listings return trimmed-down records without the
/// embedded album sub-object, hence the `Option`.
#[derive(Debug, Clone)]
pub struct RawTrack {
    pub name: String,
    pub artists: Vec<RawArtist>,
    pub disc_number: u32,
    pub track_number: u32,
    pub album: Option<RawAlbumRef>,
}

/// Where a raw record came from, which decides where its album metadata is
/// read from. Closed set: a record that fits neither case cannot be built.
#[derive(Debug, Clone)]
pub enum TrackContext {
    /// A full track record; album name and cover art come from the record's
    /// own embedded album sub-object.
    SingleTrack,
    /// A record from an album listing, which lacks album metadata of its
    /// own; the enclosing album supplies it.
    AlbumContext {
        album_name: String,
        cover_art_url: String,
    },
}

/// Canonical representation of one track to download. Built once per track
/// encountered, consumed by the download stage, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub title: String,
    pub artists: Vec<String>,
    pub album_name: String,
    pub disc_number: u32,
    pub track_number: u32,
    pub cover_art_url: String,
}

impl Song {
    /// Normalizes a raw track record into a `Song`.
    ///
    /// A record with no artists, or a `SingleTrack` record lacking its album
    /// sub-object or cover images, is rejected rather than producing a
    /// partially-populated song.
    pub fn from_raw(raw: &RawTrack, context: &TrackContext) -> Result<Song> {
        if raw.artists.is_empty() {
            return Err(Error::IncompleteRecord(format!(
                "track '{}' has no artists",
                raw.name
            )));
        }

        let artists: Vec<String> = raw.artists.iter().map(|artist| artist.name.clone()).collect();
        let title = correct_name(&raw.name);

        let (album_name, cover_art_url) = match context {
            TrackContext::SingleTrack => {
                let album = raw.album.as_ref().ok_or_else(|| {
                    Error::IncompleteRecord(format!("track '{}' carries no album data", raw.name))
                })?;
                // The first image is the largest one (640x640).
                let cover = album.images.first().ok_or_else(|| {
                    Error::IncompleteRecord(format!("track '{}' has no cover art", raw.name))
                })?;
                (album.name.clone(), cover.clone())
            }
            TrackContext::AlbumContext {
                album_name,
                cover_art_url,
            } => (album_name.clone(), cover_art_url.clone()),
        };

        Ok(Song {
            title,
            artists,
            album_name,
            disc_number: raw.disc_number,
            track_number: raw.track_number,
            cover_art_url,
        })
    }

    /// `"<artists joined by ', '> - <title>"`, used for file names and
    /// YouTube search queries.
    pub fn display_title(&self) -> String {
        make_song_title(&self.artists, &self.title, ", ")
    }

    /// The output file name for this song in the given codec.
    pub fn file_name(&self, codec: AudioCodec) -> String {
        format!("{}.{}", self.display_title(), codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_track(name: &str, artists: &[&str]) -> RawTrack {
        RawTrack {
            name: name.to_string(),
            artists: artists
                .iter()
                .map(|a| RawArtist {
                    name: a.to_string(),
                })
                .collect(),
            disc_number: 1,
            track_number: 3,
            album: Some(RawAlbumRef {
                name: "Some Album".to_string(),
                images: vec![
                    "https://i.scdn.co/image/large".to_string(),
                    "https://i.scdn.co/image/small".to_string(),
                ],
            }),
        }
    }

    #[test]
    fn corrects_illegal_characters() {
        assert_eq!(correct_name("Song?"), "Song#");
        assert_eq!(correct_name("a/b\\c:d*e"), "a#b#c#d#e");
        assert_eq!(correct_name("untouched name"), "untouched name");
    }

    #[test]
    fn makes_display_title_from_artists_and_name() {
        let song = Song::from_raw(
            &raw_track("Song", &["A", "B"]),
            &TrackContext::SingleTrack,
        )
        .unwrap();
        assert_eq!(song.display_title(), "A, B - Song");
    }

    #[test]
    fn sanitizes_title_during_normalization() {
        let song = Song::from_raw(
            &raw_track("Song?", &["A"]),
            &TrackContext::SingleTrack,
        )
        .unwrap();
        assert_eq!(song.title, "Song#");
    }

    #[test]
    fn single_track_reads_album_from_the_record() {
        let song = Song::from_raw(
            &raw_track("Song", &["A"]),
            &TrackContext::SingleTrack,
        )
        .unwrap();
        assert_eq!(song.album_name, "Some Album");
        assert_eq!(song.cover_art_url, "https://i.scdn.co/image/large");
        assert_eq!(song.disc_number, 1);
        assert_eq!(song.track_number, 3);
    }

    #[test]
    fn album_context_uses_caller_supplied_album_metadata() {
        let mut raw = raw_track("Song", &["A"]);
        raw.album = None;
        let song = Song::from_raw(
            &raw,
            &TrackContext::AlbumContext {
                album_name: "Enclosing Album".to_string(),
                cover_art_url: "https://i.scdn.co/image/album".to_string(),
            },
        )
        .unwrap();
        assert_eq!(song.album_name, "Enclosing Album");
        assert_eq!(song.cover_art_url, "https://i.scdn.co/image/album");
        assert_eq!(song.track_number, 3);
    }

    #[test]
    fn album_context_overrides_embedded_album_fields() {
        // Even when the record carries its own album data, the enclosing
        // album wins in album context.
        let song = Song::from_raw(
            &raw_track("Song", &["A"]),
            &TrackContext::AlbumContext {
                album_name: "Enclosing Album".to_string(),
                cover_art_url: "https://i.scdn.co/image/album".to_string(),
            },
        )
        .unwrap();
        assert_eq!(song.album_name, "Enclosing Album");
        assert_eq!(song.cover_art_url, "https://i.scdn.co/image/album");
    }

    #[test]
    fn rejects_record_without_artists() {
        let raw = raw_track("Song", &[]);
        assert!(matches!(
            Song::from_raw(&raw, &TrackContext::SingleTrack),
            Err(Error::IncompleteRecord(_))
        ));
    }

    #[test]
    fn rejects_single_track_without_album_data() {
        let mut raw = raw_track("Song", &["A"]);
        raw.album = None;
        assert!(matches!(
            Song::from_raw(&raw, &TrackContext::SingleTrack),
            Err(Error::IncompleteRecord(_))
        ));
    }
}
