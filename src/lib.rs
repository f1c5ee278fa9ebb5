use serde::{Deserialize, Serialize};

pub mod aggregator;
pub mod kinopoisk;
pub mod listing;
pub mod telegram;
pub mod template;

use crate::listing::ShowDetail;

/// A configured TV schedule source: channel title plus the base URL of its
/// listing page on the programme site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub title: String,
    pub link: String,
}

/// The built-in channel pair used when no `--channels` file is given.
pub fn default_channels() -> Vec<Channel> {
    vec![
        Channel {
            title: "НСТ".to_string(),
            link: "https://tv.mail.ru/sankt_peterburg/channel/929".to_string(),
        },
        Channel {
            title: "Киноужас".to_string(),
            link: "https://tv.mail.ru/sankt_peterburg/channel/3108".to_string(),
        },
    ]
}

/// Normalized movie-database result. Always fully populated: a miss or a
/// transport error yields a tagged placeholder instead of an error, so call
/// sites never need their own recovery.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieData {
    pub link: String,
    pub rating: f64,
    pub description: String,
    pub poster: String,
}

impl MovieData {
    /// Zero-valued placeholder; `tag` lands in the `link` field
    /// ("Not found" for a miss, "Error occurred" for a failed call).
    pub fn placeholder(tag: &str) -> Self {
        Self {
            link: tag.to_string(),
            rating: 0.0,
            description: String::new(),
            poster: String::new(),
        }
    }
}

/// Trait for the external movie lookup so the aggregator can run against a
/// stub in tests. `lookup` is total: it must return a usable `MovieData`
/// for any input, including ones that hit network errors.
#[async_trait::async_trait]
pub trait MovieLookup {
    async fn lookup(&self, title: &str, year: Option<&str>) -> MovieData;
}

/// One render-ready show record: the join of scraped detail-page data and
/// the movie-database lookup. `year` stays absent (not empty) when unknown
/// because the template branches on its presence.
#[derive(Debug, Clone, Serialize)]
pub struct Show {
    pub time: String,
    pub name: String,
    pub rating: f64,
    pub description: String,
    pub link: String,
    pub poster: String,
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub countries: Vec<String>,
    pub frames: Vec<String>,
}

impl Show {
    /// Combine scraped and looked-up data for one broadcast.
    ///
    /// Field precedence, applied the same way for every show:
    /// - `link` always comes from the movie database (placeholder tag on a
    ///   miss or error);
    /// - `rating` takes the database score when positive, else the scraped
    ///   badge text parsed as a number (anything unparsable, negative or
    ///   non-finite becomes 0);
    /// - `description` and `poster` prefer the scraped page and fall back
    ///   to the database value;
    /// - `year`, `countries` and `frames` are scraped only.
    pub fn from_parts(
        channel: &str,
        time: String,
        name: String,
        detail: ShowDetail,
        movie: MovieData,
    ) -> Self {
        let scraped_rating = detail
            .rating
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|r| r.is_finite() && *r >= 0.0)
            .unwrap_or(0.0);

        Self {
            time,
            name,
            rating: if movie.rating > 0.0 {
                movie.rating
            } else {
                scraped_rating
            },
            description: if detail.description.is_empty() {
                movie.description
            } else {
                detail.description
            },
            link: movie.link,
            poster: if detail.poster.is_empty() {
                movie.poster
            } else {
                detail.poster
            },
            channel: channel.to_string(),
            year: detail.year,
            countries: detail.countries,
            frames: detail.frames,
        }
    }
}
