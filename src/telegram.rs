//! Optional Telegram notification: a plain-text version of the evening
//! guide sent through the Bot API once the HTML artifact is written.

use crate::Show;
use reqwest::Client;

pub struct TelegramBot {
    token: String,
    chat_id: String,
}

impl TelegramBot {
    pub fn new(token: String, chat_id: String) -> Self {
        Self { token, chat_id }
    }

    pub async fn send_message(&self, client: &Client, text: &str) -> Result<(), reqwest::Error> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        client
            .get(&url)
            .query(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Per-channel text summary of the flattened guide. Shows arrive grouped
/// by channel already, so a header is emitted whenever the channel changes.
pub fn format_summary(shows: &[Show]) -> String {
    let mut out = String::new();
    let mut current: Option<&str> = None;

    for show in shows {
        if current != Some(show.channel.as_str()) {
            if current.is_some() {
                out.push('\n');
            }
            out.push_str(&show.channel);
            out.push('\n');
            current = Some(&show.channel);
        }
        out.push_str(&format!("{} - {}\n", show.time, show.name));
        out.push_str(&format!("{} | {}\n", show.rating, show.link));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(channel: &str, time: &str, name: &str, rating: f64, link: &str) -> Show {
        Show {
            time: time.to_string(),
            name: name.to_string(),
            rating,
            description: String::new(),
            link: link.to_string(),
            poster: String::new(),
            channel: channel.to_string(),
            year: None,
            countries: Vec::new(),
            frames: Vec::new(),
        }
    }

    #[test]
    fn summary_groups_shows_under_channel_headers() {
        let shows = vec![
            show("НСТ", "18", "Movie A", 7.5, "https://kp.example/1"),
            show("НСТ", "21", "Movie B", 0.0, "Not found"),
            show("Киноужас", "19", "Movie C", 6.2, "https://kp.example/3"),
        ];
        let summary = format_summary(&shows);
        assert_eq!(
            summary,
            "НСТ\n\
             18 - Movie A\n7.5 | https://kp.example/1\n\
             21 - Movie B\n0 | Not found\n\
             \n\
             Киноужас\n\
             19 - Movie C\n6.2 | https://kp.example/3\n"
        );
    }

    #[test]
    fn empty_guide_formats_to_empty_text() {
        assert_eq!(format_summary(&[]), "");
    }
}
