//! Cross-provider relations normalization.
//!
//! Each provider reports airing status, upcoming episodes, and related
//! titles in its own vocabulary and payload shape. [`normalize`] is the
//! single place where those raw detail payloads become one canonical
//! [`RelationsEnvelope`]; nothing else in the crate hand-builds one.
//!
//! The mapping is a pure, provider-keyed dispatch: no network, no state,
//! no mutation of the raw payload. Per-provider quirks handled here:
//!
//! - AniList tags relation edges with an enumerated `relationType` and
//!   reports the next episode as an epoch-seconds timestamp
//! - Kitsu nests relations as JSON:API `included` resources keyed by a
//!   `role` attribute
//! - Jikan groups relations by a `relation` name with nested `entry` arrays
//!   and exposes no upcoming-episode number at all
//! - TMDB has no prequel/sequel concept; its recommendations, similar
//!   titles, and collection membership land under `related`/`collection`,
//!   never in the prequel/sequel lists

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::net::json::{extract_array, extract_i64, extract_path, extract_str};
use crate::types::MediaStatus;

/// A reference to a related title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationRef {
    pub id: String,
    pub title: String,
    pub media_type: Option<String>,
    pub poster: Option<String>,
}

/// The next episode scheduled to air.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextEpisode {
    pub episode_number: u32,
    pub air_date: Option<String>,
}

/// The next season scheduled to air.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextSeason {
    pub season_number: u32,
    pub air_date: Option<String>,
}

/// Collection/franchise membership, for providers that expose one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRef {
    pub id: String,
    pub name: String,
}

/// Normalized airing/sequel/prequel metadata for one title.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationsEnvelope {
    pub status: MediaStatus,
    pub next_episode: Option<NextEpisode>,
    pub next_season: Option<NextSeason>,
    pub prequel: Vec<RelationRef>,
    pub sequel: Vec<RelationRef>,
    /// Recommendation-style links (similar/recommended titles). Kept
    /// separate from prequel/sequel on purpose.
    pub related: Vec<RelationRef>,
    pub collection: Option<CollectionRef>,
}

/// Maps a provider's raw detail payload into one [`RelationsEnvelope`].
///
/// `now` is the reference instant for the "next season strictly in the
/// future" computation; passing it in keeps the function deterministic
/// and testable. An unrecognized provider id yields an empty envelope
/// with `Unknown` status.
pub fn normalize(provider: &str, raw: &Value, now: DateTime<Utc>) -> RelationsEnvelope {
    match provider {
        "anilist" => normalize_anilist(raw),
        "kitsu" => normalize_kitsu(raw),
        "jikan" => normalize_jikan(raw),
        "tmdb" => normalize_tmdb(raw, now),
        _ => RelationsEnvelope::default(),
    }
}

/// AniList status vocabulary → canonical enum.
pub(crate) fn anilist_status(raw: &str) -> MediaStatus {
    match raw {
        "FINISHED" => MediaStatus::Finished,
        "RELEASING" => MediaStatus::Releasing,
        "NOT_YET_RELEASED" => MediaStatus::NotYetReleased,
        "CANCELLED" => MediaStatus::Cancelled,
        _ => MediaStatus::Unknown,
    }
}

/// Kitsu status vocabulary → canonical enum.
pub(crate) fn kitsu_status(raw: &str) -> MediaStatus {
    match raw {
        "finished" => MediaStatus::Finished,
        "current" => MediaStatus::Releasing,
        "upcoming" | "tba" | "unreleased" => MediaStatus::NotYetReleased,
        _ => MediaStatus::Unknown,
    }
}

/// Jikan (MyAnimeList mirror) status vocabulary → canonical enum.
pub(crate) fn jikan_status(raw: &str) -> MediaStatus {
    match raw {
        "Finished Airing" | "Finished" | "Complete" => MediaStatus::Finished,
        "Currently Airing" | "Publishing" => MediaStatus::Releasing,
        "Not yet aired" | "Not yet published" => MediaStatus::NotYetReleased,
        "Discontinued" => MediaStatus::Cancelled,
        _ => MediaStatus::Unknown,
    }
}

/// TMDB production status vocabulary → canonical enum.
pub(crate) fn tmdb_status(raw: &str) -> MediaStatus {
    match raw {
        "Ended" | "Released" => MediaStatus::Finished,
        "Returning Series" => MediaStatus::Releasing,
        "In Production" | "Post Production" | "Planned" | "Rumored" => {
            MediaStatus::NotYetReleased
        }
        "Canceled" | "Cancelled" => MediaStatus::Cancelled,
        _ => MediaStatus::Unknown,
    }
}

fn normalize_anilist(raw: &Value) -> RelationsEnvelope {
    // Detail responses arrive wrapped in data.Media; accept the bare
    // Media object too so fixtures stay short.
    let media = extract_path(raw, "data.Media").unwrap_or(raw);

    let status = extract_str(media, "status")
        .map(anilist_status)
        .unwrap_or_default();

    // nextAiringEpisode carries the airing time as epoch seconds.
    let next_episode = extract_path(media, "nextAiringEpisode").and_then(|next| {
        let episode_number = extract_i64(next, "episode")? as u32;
        let air_date = extract_i64(next, "airingAt")
            .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
            .map(|dt| dt.to_rfc3339());
        Some(NextEpisode {
            episode_number,
            air_date,
        })
    });

    let mut prequel = Vec::new();
    let mut sequel = Vec::new();

    for edge in extract_array(media, "relations.edges") {
        let Some(node) = extract_path(edge, "node") else {
            continue;
        };
        let entry = RelationRef {
            id: extract_i64(node, "id").map(|id| id.to_string()).unwrap_or_default(),
            title: extract_str(node, "title.romaji")
                .or_else(|| extract_str(node, "title.english"))
                .unwrap_or_default()
                .to_string(),
            media_type: extract_str(node, "type").map(str::to_lowercase),
            poster: extract_str(node, "coverImage.large").map(str::to_string),
        };

        match extract_str(edge, "relationType") {
            Some("PREQUEL") => prequel.push(entry),
            Some("SEQUEL") => sequel.push(entry),
            // Adaptations, side stories etc. are not prequel/sequel
            // material and AniList has no recommendation section in
            // this payload, so they are dropped.
            _ => {}
        }
    }

    RelationsEnvelope {
        status,
        next_episode,
        next_season: None,
        prequel,
        sequel,
        related: Vec::new(),
        collection: None,
    }
}

fn normalize_kitsu(raw: &Value) -> RelationsEnvelope {
    let status = extract_str(raw, "data.attributes.status")
        .map(kitsu_status)
        .unwrap_or_default();

    // Kitsu's dedicated upcoming-episode field carries only a date, so the
    // episode number defaults to 0 ("unknown") when the date is present.
    let next_episode = extract_str(raw, "data.attributes.nextRelease").map(|date| NextEpisode {
        episode_number: 0,
        air_date: Some(date.to_string()),
    });

    // JSON:API sideloading: `included` holds both the mediaRelationships
    // resources (which carry the role) and the anime resources they point
    // at (which carry title/poster). Index the latter by id first.
    let included = extract_array(raw, "included");
    let mut titles: HashMap<&str, (&str, Option<&str>)> = HashMap::new();
    for resource in included {
        if extract_str(resource, "type") == Some("anime") {
            if let Some(id) = extract_str(resource, "id") {
                let title = extract_str(resource, "attributes.canonicalTitle").unwrap_or_default();
                let poster = extract_str(resource, "attributes.posterImage.small");
                titles.insert(id, (title, poster));
            }
        }
    }

    let mut prequel = Vec::new();
    let mut sequel = Vec::new();

    for resource in included {
        if extract_str(resource, "type") != Some("mediaRelationships") {
            continue;
        }
        let Some(dest_id) = extract_str(resource, "relationships.destination.data.id") else {
            continue;
        };
        let (title, poster) = titles.get(dest_id).copied().unwrap_or(("", None));
        let entry = RelationRef {
            id: dest_id.to_string(),
            title: title.to_string(),
            media_type: Some("anime".to_string()),
            poster: poster.map(str::to_string),
        };

        match extract_str(resource, "attributes.role") {
            Some("prequel") => prequel.push(entry),
            Some("sequel") => sequel.push(entry),
            _ => {}
        }
    }

    RelationsEnvelope {
        status,
        next_episode,
        next_season: None,
        prequel,
        sequel,
        related: Vec::new(),
        collection: None,
    }
}

fn normalize_jikan(raw: &Value) -> RelationsEnvelope {
    let data = extract_path(raw, "data").unwrap_or(raw);

    let status = extract_str(data, "status")
        .map(jikan_status)
        .unwrap_or_default();

    let mut prequel = Vec::new();
    let mut sequel = Vec::new();

    for group in extract_array(data, "relations") {
        let bucket = match extract_str(group, "relation") {
            Some("Prequel") => &mut prequel,
            Some("Sequel") => &mut sequel,
            _ => continue,
        };
        for entry in extract_array(group, "entry") {
            bucket.push(RelationRef {
                id: extract_i64(entry, "mal_id")
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                title: extract_str(entry, "name").unwrap_or_default().to_string(),
                media_type: extract_str(entry, "type").map(str::to_lowercase),
                poster: None,
            });
        }
    }

    RelationsEnvelope {
        status,
        // The MyAnimeList mirror exposes broadcast day/time strings but no
        // upcoming-episode number, so there is nothing to normalize here.
        next_episode: None,
        next_season: None,
        prequel,
        sequel,
        related: Vec::new(),
        collection: None,
    }
}

fn normalize_tmdb(raw: &Value, now: DateTime<Utc>) -> RelationsEnvelope {
    let status = extract_str(raw, "status")
        .map(tmdb_status)
        .unwrap_or_default();

    let next_episode = extract_path(raw, "next_episode_to_air").and_then(|next| {
        let episode_number = extract_i64(next, "episode_number")? as u32;
        Some(NextEpisode {
            episode_number,
            air_date: extract_str(next, "air_date").map(str::to_string),
        })
    });

    let next_season = nearest_future_season(extract_array(raw, "seasons"), now);

    let collection = extract_path(raw, "belongs_to_collection").and_then(|c| {
        Some(CollectionRef {
            id: extract_i64(c, "id")?.to_string(),
            name: extract_str(c, "name")?.to_string(),
        })
    });

    // Recommendations and similar titles merge into one related list,
    // deduped by id with the first occurrence winning.
    let mut related = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for section in ["recommendations.results", "similar.results"] {
        for entry in extract_array(raw, section) {
            let Some(id) = extract_i64(entry, "id") else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            related.push(RelationRef {
                id: id.to_string(),
                title: extract_str(entry, "title")
                    .or_else(|| extract_str(entry, "name"))
                    .unwrap_or_default()
                    .to_string(),
                media_type: extract_str(entry, "media_type").map(str::to_string),
                poster: extract_str(entry, "poster_path").map(str::to_string),
            });
        }
    }

    RelationsEnvelope {
        status,
        next_episode,
        next_season,
        prequel: Vec::new(),
        sequel: Vec::new(),
        related,
        collection,
    }
}

/// Picks the chronologically nearest season whose air date is strictly
/// after `now`. Seasons without an air date never qualify.
fn nearest_future_season(seasons: &[Value], now: DateTime<Utc>) -> Option<NextSeason> {
    let today = now.date_naive();
    let mut best: Option<(NaiveDate, NextSeason)> = None;

    for season in seasons {
        let Some(date_str) = extract_str(season, "air_date") else {
            continue;
        };
        let Ok(air_date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
            continue;
        };
        if air_date <= today {
            continue;
        }
        let Some(season_number) = extract_i64(season, "season_number") else {
            continue;
        };

        let candidate = NextSeason {
            season_number: season_number as u32,
            air_date: Some(date_str.to_string()),
        };
        match &best {
            Some((current, _)) if *current <= air_date => {}
            _ => best = Some((air_date, candidate)),
        }
    }

    best.map(|(_, season)| season)
}
