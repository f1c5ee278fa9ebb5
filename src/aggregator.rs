//! Drives the per-channel pipeline: fetch listing, filter, fetch each
//! detail page, look the title up in the movie database, accumulate.
//! Channels and items are processed strictly one at a time to stay polite
//! toward the schedule site; each show costs up to three round-trips.

use crate::listing::{self, ShowDetail};
use crate::{Channel, MovieData, MovieLookup, Show};
use reqwest::Client;

/// One qualifying broadcast, joined with its lookup result but not yet
/// flattened into the output shape.
#[derive(Debug, Clone)]
pub struct ScheduledShow {
    pub time: String,
    pub name: String,
    pub detail: ShowDetail,
    pub movie: MovieData,
}

/// A processed channel: its title and the evening shows that survived
/// extraction.
#[derive(Debug, Clone)]
pub struct ChannelProgram {
    pub title: String,
    pub shows: Vec<ScheduledShow>,
}

pub struct Aggregator<'a, L> {
    client: &'a Client,
    lookup: &'a L,
    programs: Vec<ChannelProgram>,
}

impl<'a, L: MovieLookup> Aggregator<'a, L> {
    pub fn new(client: &'a Client, lookup: &'a L) -> Self {
        Self {
            client,
            lookup,
            programs: Vec::new(),
        }
    }

    /// Process one channel end-to-end. Never fails: a listing that cannot
    /// be fetched or parsed is logged and leaves the channel with an empty
    /// show list; a single bad detail page drops only that show.
    pub async fn process_channel(&mut self, channel: &Channel) {
        let mut program = ChannelProgram {
            title: channel.title.clone(),
            shows: Vec::new(),
        };

        let entries = match listing::fetch_channel(self.client, channel).await {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("error fetching listing for {}: {e}", channel.title);
                self.programs.push(program);
                return;
            }
        };

        for entry in entries {
            let detail =
                match listing::fetch_detail(self.client, &channel.link, &entry.id).await {
                    Ok(detail) => detail,
                    Err(e) => {
                        eprintln!("skipping {} ({}): {e}", entry.name, channel.title);
                        continue;
                    }
                };

            let movie = self
                .lookup
                .lookup(&entry.name, detail.year.as_deref())
                .await;

            program.shows.push(ScheduledShow {
                time: entry.time,
                name: entry.name,
                detail,
                movie,
            });
        }

        self.programs.push(program);
    }

    pub fn programs(&self) -> &[ChannelProgram] {
        &self.programs
    }

    /// Flatten into the render-ready sequence: channel order first, then
    /// document order of the schedule items within each channel.
    pub fn into_shows(self) -> Vec<Show> {
        let mut shows = Vec::new();
        for program in self.programs {
            for item in program.shows {
                shows.push(Show::from_parts(
                    &program.title,
                    item.time,
                    item.name,
                    item.detail,
                    item.movie,
                ));
            }
        }
        shows
    }
}
