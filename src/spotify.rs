//! Fetching track metadata from the Spotify Web API.
//!
//! The [`SongSource`] trait is the seam between the fetch orchestration and
//! the actual API client, so tests can substitute an in-memory source.

use {
    crate::Credentials,
    crate::error::{Error, Result},
    crate::link::{LinkType, SpotifyLink},
    crate::song::{RawAlbumRef, RawArtist, RawTrack, Song, TrackContext, correct_name},
    log::info,
    spotify_rs::{ClientCredsClient, model::PlayableItem},
};

/// How many items each album/playlist page requests.
const PAGE_LIMIT: u32 = 50;

/// One page of a paginated listing. `next` is an opaque continuation token;
/// `None` means the listing is exhausted.
#[derive(Debug, Clone)]
pub struct RawPage<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

/// The header of an album: the fields its tracks lack on their own.
#[derive(Debug, Clone)]
pub struct RawAlbum {
    pub name: String,
    /// Cover image URLs, largest first.
    pub images: Vec<String>,
}

/// A provider of raw track metadata.
pub trait SongSource {
    async fn track(&self, id: &str) -> Result<RawTrack>;
    async fn album(&self, id: &str) -> Result<RawAlbum>;
    async fn album_tracks(&self, id: &str, next: Option<&str>) -> Result<RawPage<RawTrack>>;
    async fn playlist_name(&self, id: &str) -> Result<String>;
    async fn playlist_tracks(&self, id: &str, next: Option<&str>) -> Result<RawPage<RawTrack>>;
}

/// The songs a link resolved to, plus the collection name when the link was
/// an album (used for the per-album save folder).
#[derive(Debug, Clone)]
pub struct FetchedSongs {
    pub collection_name: Option<String>,
    pub songs: Vec<Song>,
}

/// Resolves a classified link into normalized songs, transparently following
/// pagination and preserving source order.
pub async fn fetch_songs<S: SongSource>(source: &S, link: &SpotifyLink) -> Result<FetchedSongs> {
    match link.kind {
        LinkType::Track => {
            let raw = source.track(&link.id).await?;
            let song = Song::from_raw(&raw, &TrackContext::SingleTrack)?;
            Ok(FetchedSongs {
                collection_name: None,
                songs: vec![song],
            })
        }
        LinkType::Album => {
            let album = source.album(&link.id).await?;
            let cover_art_url = album.images.first().cloned().ok_or_else(|| {
                Error::IncompleteRecord(format!("album '{}' has no cover art", album.name))
            })?;
            let album_name = correct_name(&album.name);
            let context = TrackContext::AlbumContext {
                album_name: album_name.clone(),
                cover_art_url,
            };

            let mut raws = Vec::new();
            let mut next: Option<String> = None;
            loop {
                let page = source.album_tracks(&link.id, next.as_deref()).await?;
                let received = page.items.len();
                raws.extend(page.items);
                // An empty page with a continuation token would never
                // advance; stop rather than loop on it.
                match page.next {
                    Some(token) if received > 0 => next = Some(token),
                    _ => break,
                }
            }

            let songs = raws
                .iter()
                .map(|raw| Song::from_raw(raw, &context))
                .collect::<Result<Vec<_>>>()?;
            info!("Found {} tracks in {}!", songs.len(), album.name);
            Ok(FetchedSongs {
                collection_name: Some(album_name),
                songs,
            })
        }
        LinkType::Playlist => {
            let name = source.playlist_name(&link.id).await?;

            let mut raws = Vec::new();
            let mut next: Option<String> = None;
            loop {
                let page = source.playlist_tracks(&link.id, next.as_deref()).await?;
                let received = page.items.len();
                raws.extend(page.items);
                match page.next {
                    Some(token) if received > 0 => next = Some(token),
                    _ => break,
                }
            }

            // Playlist items are full track records, album data included.
            let songs = raws
                .iter()
                .map(|raw| Song::from_raw(raw, &TrackContext::SingleTrack))
                .collect::<Result<Vec<_>>>()?;
            info!("Found {} tracks in {}!", songs.len(), name);
            Ok(FetchedSongs {
                collection_name: None,
                songs,
            })
        }
    }
}

/// The real `SongSource`, backed by the Spotify Web API through the
/// client-credentials flow. Constructed once per run and passed into the
/// orchestration explicitly.
pub struct SpotifyFetcher {
    credentials: Credentials,
}

impl SpotifyFetcher {
    pub fn new(credentials: Credentials) -> SpotifyFetcher {
        SpotifyFetcher { credentials }
    }
}

fn no_data<E>(cause: E) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    Error::NoDataReceived(Box::new(cause))
}

fn raw_from_track(track: spotify_rs::model::track::Track) -> RawTrack {
    RawTrack {
        name: track.name,
        artists: track
            .artists
            .into_iter()
            .map(|artist| RawArtist { name: artist.name })
            .collect(),
        disc_number: track.disc_number,
        track_number: track.track_number,
        album: Some(RawAlbumRef {
            name: track.album.name,
            images: track.album.images.into_iter().map(|image| image.url).collect(),
        }),
    }
}

fn raw_from_simplified(track: spotify_rs::model::track::SimplifiedTrack) -> RawTrack {
    RawTrack {
        name: track.name,
        artists: track
            .artists
            .into_iter()
            .map(|artist| RawArtist { name: artist.name })
            .collect(),
        disc_number: track.disc_number,
        track_number: track.track_number,
        // Album listings return trimmed records without album data.
        album: None,
    }
}

fn parse_offset(next: Option<&str>) -> u32 {
    next.and_then(|token| token.parse().ok()).unwrap_or(0)
}

/// Continuation token for the page after this one. The offset advances by
/// the raw entry count, null entries included; filtering happens after, so
/// the next request never overlaps this page.
fn page_advance<T>(offset: u32, raw_items: &[Option<T>], has_next: bool) -> Option<String> {
    has_next.then(|| (offset + raw_items.len() as u32).to_string())
}

impl SongSource for SpotifyFetcher {
    async fn track(&self, id: &str) -> Result<RawTrack> {
        let spotify = ClientCredsClient::authenticate(
            &self.credentials.client_id,
            &self.credentials.client_secret,
        )
        .await
        .map_err(no_data)?;
        let track = spotify_rs::track(id).get(&spotify).await.map_err(no_data)?;
        Ok(raw_from_track(track))
    }

    async fn album(&self, id: &str) -> Result<RawAlbum> {
        let spotify = ClientCredsClient::authenticate(
            &self.credentials.client_id,
            &self.credentials.client_secret,
        )
        .await
        .map_err(no_data)?;
        let album = spotify_rs::album(id).get(&spotify).await.map_err(no_data)?;
        Ok(RawAlbum {
            name: album.name,
            images: album.images.into_iter().map(|image| image.url).collect(),
        })
    }

    async fn album_tracks(&self, id: &str, next: Option<&str>) -> Result<RawPage<RawTrack>> {
        let spotify = ClientCredsClient::authenticate(
            &self.credentials.client_id,
            &self.credentials.client_secret,
        )
        .await
        .map_err(no_data)?;
        let offset = parse_offset(next);
        let page = spotify_rs::album_tracks(id)
            .limit(PAGE_LIMIT)
            .offset(offset)
            .get(&spotify)
            .await
            .map_err(no_data)?;

        let next = page_advance(offset, &page.items, page.next.is_some());
        let items: Vec<RawTrack> = page
            .items
            .into_iter()
            .flatten()
            .map(raw_from_simplified)
            .collect();
        Ok(RawPage { items, next })
    }

    async fn playlist_name(&self, id: &str) -> Result<String> {
        let spotify = ClientCredsClient::authenticate(
            &self.credentials.client_id,
            &self.credentials.client_secret,
        )
        .await
        .map_err(no_data)?;
        let playlist = spotify_rs::playlist(id).get(&spotify).await.map_err(no_data)?;
        Ok(playlist.name)
    }

    async fn playlist_tracks(&self, id: &str, next: Option<&str>) -> Result<RawPage<RawTrack>> {
        let spotify = ClientCredsClient::authenticate(
            &self.credentials.client_id,
            &self.credentials.client_secret,
        )
        .await
        .map_err(no_data)?;
        let offset = parse_offset(next);
        let page = spotify_rs::playlist_items(id)
            .limit(PAGE_LIMIT)
            .offset(offset)
            .get(&spotify)
            .await
            .map_err(no_data)?;

        let next = page_advance(offset, &page.items, page.next.is_some());
        let mut items = Vec::new();
        for item in page.items.into_iter().flatten() {
            match item.track {
                PlayableItem::Track(track) => items.push(raw_from_track(track)),
                PlayableItem::Episode(episode) => {
                    info!("Skipping episode '{}', not a song.", episode.name);
                }
            }
        }
        Ok(RawPage { items, next })
    }
}
