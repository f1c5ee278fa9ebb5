use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde_json::json;

use tvguide_scrape::aggregator::Aggregator;
use tvguide_scrape::kinopoisk::KinopoiskClient;
use tvguide_scrape::telegram::{self, TelegramBot};
use tvguide_scrape::{Channel, default_channels, template};

/// Scrapes evening TV listings, enriches them from Kinopoisk and renders a
/// static HTML guide.
#[derive(Parser, Debug)]
struct Args {
    /// JSON file with the channel list (array of {"title", "link"} pairs)
    #[arg(long)]
    channels: Option<PathBuf>,

    /// HTML template for the rendered guide
    #[arg(long, default_value = "templates/template.html")]
    template: PathBuf,

    /// Output path for the rendered guide
    #[arg(long, default_value = "dist/index.html")]
    output: PathBuf,

    /// Kinopoisk API key
    #[arg(long, env = "KINOPOISK_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Telegram bot token; the text summary is only sent when both
    /// Telegram options are set
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    telegram_token: Option<String>,

    /// Telegram chat to receive the summary
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    telegram_chat_id: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("application error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let channels: Vec<Channel> = match &args.channels {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => default_channels(),
    };

    // One shared client; the per-request timeout keeps a hung upstream
    // from stalling the whole run.
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(20))
        .build()?;

    let kinopoisk = KinopoiskClient::new(client.clone(), args.api_key.clone());
    let mut aggregator = Aggregator::new(&client, &kinopoisk);

    for channel in &channels {
        aggregator.process_channel(channel).await;
    }

    let shows = aggregator.into_shows();
    eprintln!(
        "collected {} shows from {} channels",
        shows.len(),
        channels.len()
    );

    let template = fs::read_to_string(&args.template)?;
    let date = chrono::Local::now().format("%d.%m.%Y %H:%M").to_string();
    let html = template::render(&template, &json!({ "date": date, "shows": shows }));

    if let Some(parent) = args.output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.output, html)?;
    eprintln!("wrote {}", args.output.display());

    if let (Some(token), Some(chat_id)) = (args.telegram_token, args.telegram_chat_id) {
        let bot = TelegramBot::new(token, chat_id);
        let summary = telegram::format_summary(&shows);
        if let Err(e) = bot.send_message(&client, &summary).await {
            eprintln!("telegram notification failed: {e}");
        }
    }

    Ok(())
}
