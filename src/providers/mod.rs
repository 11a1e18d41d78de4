//! Concrete provider implementations.
//!
//! One module per external catalog service, each owning its wire format,
//! its status-vocabulary table, and its rate-limit policy:
//!
//! - [`AniListProvider`] - GraphQL, native bulk search, 0..100 scores
//! - [`KitsuProvider`] - JSON:API, filter/page query parameters
//! - [`JikanProvider`] - REST mirror of MyAnimeList, ~1 req/s hard limit
//! - [`TmdbProvider`] - general movie/TV REST API, key required

pub mod anilist;
pub mod jikan;
pub mod kitsu;
pub mod tmdb;

pub use anilist::AniListProvider;
pub use jikan::JikanProvider;
pub use kitsu::KitsuProvider;
pub use tmdb::TmdbProvider;
