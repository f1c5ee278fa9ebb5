//! Client for the kinopoisk.dev movie database.
//! Search: GET {base}/movie/search?query=&year=&limit=1
//! Detail: GET {base}/movie/{id}
//! Both carry the API key in an `X-API-KEY` header.

use crate::{MovieData, MovieLookup};
use reqwest::Client;
use serde::Deserialize;

const API_BASE: &str = "https://api.kinopoisk.dev/v1.4";
const PUBLIC_FILM_URL: &str = "https://www.kinopoisk.ru/film";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct MovieResponse {
    id: u64,
    rating: Option<RatingBlock>,
    description: Option<String>,
    poster: Option<PosterBlock>,
}

#[derive(Debug, Deserialize)]
struct RatingBlock {
    kp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PosterBlock {
    url: Option<String>,
}

pub struct KinopoiskClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl KinopoiskClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self::with_base_url(client, api_key, API_BASE.to_string())
    }

    /// Same client against a different endpoint (tests point this at an
    /// unreachable address to exercise the error path).
    pub fn with_base_url(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }

    /// Search by title (and year filter when the schedule page yielded
    /// one), then fetch the best match's detail record. A search with no
    /// hits is a "Not found" placeholder, not an error.
    async fn fetch_movie(
        &self,
        title: &str,
        year: Option<&str>,
    ) -> Result<MovieData, reqwest::Error> {
        let mut params = vec![("query", title), ("limit", "1")];
        if let Some(year) = year {
            params.push(("year", year));
        }

        let search: SearchResponse = self
            .client
            .get(format!("{}/movie/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(doc) = search.docs.first() else {
            return Ok(MovieData::placeholder("Not found"));
        };

        let movie: MovieResponse = self
            .client
            .get(format!("{}/movie/{}", self.base_url, doc.id))
            .header("X-API-KEY", &self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(normalize(movie))
    }
}

/// Map the raw detail payload into the flat result shape.
fn normalize(movie: MovieResponse) -> MovieData {
    MovieData {
        link: format!("{}/{}", PUBLIC_FILM_URL, movie.id),
        rating: movie.rating.and_then(|r| r.kp).unwrap_or(0.0),
        description: movie.description.unwrap_or_default(),
        poster: movie.poster.and_then(|p| p.url).unwrap_or_default(),
    }
}

#[async_trait::async_trait]
impl MovieLookup for KinopoiskClient {
    /// Total lookup: transport and decode failures become an
    /// "Error occurred" placeholder instead of propagating.
    async fn lookup(&self, title: &str, year: Option<&str>) -> MovieData {
        match self.fetch_movie(title, year).await {
            Ok(movie) => movie,
            Err(e) => {
                eprintln!("kinopoisk lookup failed for {title:?}: {e}");
                MovieData::placeholder("Error occurred")
            }
        }
    }
}
