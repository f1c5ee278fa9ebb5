//! Scraper for tv.mail.ru channel schedule pages.
//! Listing: https://tv.mail.ru/sankt_peterburg/channel/<id>/
//! Detail pages live at `{channel link}/{item id}` and carry the rating
//! badge, description, poster, metadata rows and a frame gallery.

use crate::Channel;
use reqwest::{Client, header};
use scraper::{ElementRef, Html, Selector};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// Only evening broadcasts make it into the guide.
const EVENING_HOUR: u32 = 17;

/// Frame gallery images are capped per show.
const MAX_FRAMES: usize = 3;

/// One qualifying item from a channel's listing page (before the detail
/// page is fetched).
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    pub id: String,
    pub time: String,
    pub name: String,
}

/// Everything extracted from one show's detail page. Every field degrades
/// to a safe default when the markup doesn't match; the site changes its
/// layout often enough that no selector can be trusted.
#[derive(Debug, Clone)]
pub struct ShowDetail {
    pub link: String,
    pub rating: String,
    pub description: String,
    pub poster: String,
    pub year: Option<String>,
    pub countries: Vec<String>,
    pub frames: Vec<String>,
}

/// Fetch a channel's listing page and return its evening schedule entries.
pub async fn fetch_channel(
    client: &Client,
    channel: &Channel,
) -> Result<Vec<ScheduleEntry>, Box<dyn std::error::Error>> {
    let resp = client
        .get(&channel.link)
        .header(header::USER_AGENT, USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let body = resp.text().await?;
    parse_listing(&body)
}

/// Fetch one show's detail page and extract its fields.
pub async fn fetch_detail(
    client: &Client,
    channel_link: &str,
    id: &str,
) -> Result<ShowDetail, Box<dyn std::error::Error>> {
    let link = format!("{}/{}", channel_link.trim_end_matches('/'), id);
    let resp = client
        .get(&link)
        .header(header::USER_AGENT, USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let body = resp.text().await?;
    parse_detail(&body, link)
}

/// Parse a listing page into schedule entries.
///
/// Items are `.p-programms__item` nodes. An item qualifies when its
/// `data-start` hour is at or past [`EVENING_HOUR`]; a missing or
/// non-numeric attribute counts as hour 0. Items without a resolvable name
/// or a `data-id` are skipped entirely rather than defaulted.
pub fn parse_listing(html: &str) -> Result<Vec<ScheduleEntry>, Box<dyn std::error::Error>> {
    let document = Html::parse_document(html);
    let item_selector = Selector::parse(".p-programms__item")?;
    let name_selector = Selector::parse(".p-programms__item__name-link")?;
    let name_fallback = Selector::parse(".p-programms__item-name")?;

    let mut entries = Vec::new();

    for item in document.select(&item_selector) {
        let time_attr = item.value().attr("data-start");
        if start_hour(time_attr) < EVENING_HOUR {
            continue;
        }

        // Name: primary link selector, then the plain-name fallback.
        let name = element_text(&item, &name_selector)
            .or_else(|| element_text(&item, &name_fallback));
        let Some(name) = name else { continue };

        let Some(id) = item.value().attr("data-id") else {
            continue;
        };

        entries.push(ScheduleEntry {
            id: id.to_string(),
            time: time_attr.unwrap_or("0").to_string(),
            name,
        });
    }

    Ok(entries)
}

/// Parse a detail page into a [`ShowDetail`], `link` being the page URL.
pub fn parse_detail(html: &str, link: String) -> Result<ShowDetail, Box<dyn std::error::Error>> {
    let document = Html::parse_document(html);

    let rating = first_text(&document, &Selector::parse(".p-rate-flag__imdb-text")?)
        .unwrap_or_else(|| "0".to_string());

    let description =
        first_text(&document, &Selector::parse(".p-show-more__content")?).unwrap_or_default();

    let poster = document
        .select(&Selector::parse(".p-movie-cover__image")?)
        .next()
        .and_then(|img| img.value().attr("src"))
        .unwrap_or_default()
        .to_string();

    // Metadata rows: "Год выхода" / "Year", "Страна" / "Country" and
    // friends, as label/value pairs.
    let row_selector = Selector::parse(".p-movie-info__row")?;
    let label_selector = Selector::parse(".p-movie-info__name")?;
    let value_selector = Selector::parse(".p-movie-info__value")?;

    let mut year: Option<String> = None;
    let mut countries = Vec::new();

    for row in document.select(&row_selector) {
        let Some(label) = element_text(&row, &label_selector) else {
            continue;
        };
        let Some(value) = element_text(&row, &value_selector) else {
            continue;
        };

        if year.is_none() && label.contains("Year") {
            year = Some(value);
        } else if label.contains("Country") {
            // Every Country row contributes; values are comma-separated.
            countries.extend(
                value
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty()),
            );
        }
    }

    // Fallback year strategy: the first 4-digit number in a "black link"
    // anchor, widened to a one-year range either side. The range goes to
    // the movie search as its year filter, which tolerates off-by-one
    // release years between the two sites.
    if year.is_none() {
        let anchor_selector = Selector::parse(".link_black")?;
        for anchor in document.select(&anchor_selector) {
            let text: String = anchor.text().collect();
            if let Some(y) = find_four_digit(&text) {
                year = Some(format!("{}-{}", y - 1, y + 1));
                break;
            }
        }
    }

    // Frames: lazy-loaded gallery images, document order, capped.
    let frame_selector = Selector::parse(".p-picture_object-fit img")?;
    let mut frames = Vec::new();
    for img in document.select(&frame_selector) {
        if let Some(src) = img.value().attr("data-lazy-block-src") {
            frames.push(src.to_string());
            if frames.len() >= MAX_FRAMES {
                break;
            }
        }
    }

    Ok(ShowDetail {
        link,
        rating,
        description,
        poster,
        year,
        countries,
        frames,
    })
}

/// `data-start` hour with parseInt semantics: leading digits only,
/// anything missing or non-numeric is hour 0.
fn start_hour(attr: Option<&str>) -> u32 {
    let digits: String = attr
        .unwrap_or("")
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Joined, trimmed text of the first match under `scope` that has any,
/// or None when every match misses or yields only whitespace.
fn element_text(scope: &ElementRef, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .map(|el| {
            el.text()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .find(|text| !text.is_empty())
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    element_text(&document.root_element(), selector)
}

/// First run of four consecutive ASCII digits in `text`.
fn find_four_digit(text: &str) -> Option<i32> {
    let bytes = text.as_bytes();
    let mut run = 0;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            run += 1;
            if run == 4 {
                return text[i + 1 - 4..=i].parse().ok();
            }
        } else {
            run = 0;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing_item(start: &str, id: &str, name: &str) -> String {
        format!(
            r#"<div class="p-programms__item" data-start="{start}" data-id="{id}">
                 <a class="p-programms__item__name-link">{name}</a>
               </div>"#
        )
    }

    #[test]
    fn evening_threshold_is_inclusive() {
        let html = format!(
            "{}{}{}",
            listing_item("16", "1", "Too early"),
            listing_item("17", "2", "On the line"),
            listing_item("18", "3", "Evening"),
        );
        let entries = parse_listing(&html).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["On the line", "Evening"]);
    }

    #[test]
    fn missing_or_garbage_start_counts_as_hour_zero() {
        let html = concat!(
            r#"<div class="p-programms__item" data-id="1">"#,
            r#"<a class="p-programms__item__name-link">No start</a></div>"#,
            r#"<div class="p-programms__item" data-start="late" data-id="2">"#,
            r#"<a class="p-programms__item__name-link">Bad start</a></div>"#,
        );
        assert!(parse_listing(html).unwrap().is_empty());
    }

    #[test]
    fn name_fallback_selector_is_used() {
        let html = r#"<div class="p-programms__item" data-start="20" data-id="7">
                        <span class="p-programms__item-name">Fallback name</span>
                      </div>"#;
        let entries = parse_listing(html).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Fallback name");
        assert_eq!(entries[0].id, "7");
        assert_eq!(entries[0].time, "20");
    }

    #[test]
    fn items_without_any_name_are_dropped() {
        let html = r#"<div class="p-programms__item" data-start="20" data-id="7">
                        <a class="p-programms__item__name-link">  </a>
                      </div>"#;
        assert!(parse_listing(html).unwrap().is_empty());
    }

    #[test]
    fn items_without_id_are_dropped() {
        let html = r#"<div class="p-programms__item" data-start="20">
                        <a class="p-programms__item__name-link">Nameless id</a>
                      </div>"#;
        assert!(parse_listing(html).unwrap().is_empty());
    }

    #[test]
    fn detail_defaults_when_selectors_miss() {
        let detail = parse_detail("<html><body></body></html>", "x".to_string()).unwrap();
        assert_eq!(detail.rating, "0");
        assert_eq!(detail.description, "");
        assert_eq!(detail.poster, "");
        assert_eq!(detail.year, None);
        assert!(detail.countries.is_empty());
        assert!(detail.frames.is_empty());
    }

    #[test]
    fn detail_extracts_core_fields() {
        let html = r#"
            <span class="p-rate-flag__imdb-text"> 7.5 </span>
            <div class="p-show-more__content">A long description.</div>
            <img class="p-movie-cover__image" src="https://img.example/poster.jpg">
        "#;
        let detail = parse_detail(html, "link".to_string()).unwrap();
        assert_eq!(detail.rating, "7.5");
        assert_eq!(detail.description, "A long description.");
        assert_eq!(detail.poster, "https://img.example/poster.jpg");
    }

    #[test]
    fn year_row_wins_over_anchor_range() {
        let html = r#"
            <div class="p-movie-info__row">
              <span class="p-movie-info__name">Year of release</span>
              <span class="p-movie-info__value">1999</span>
            </div>
            <a class="link_black">Horror, 2020</a>
        "#;
        let detail = parse_detail(html, "link".to_string()).unwrap();
        assert_eq!(detail.year.as_deref(), Some("1999"));
    }

    #[test]
    fn anchor_year_derives_a_range() {
        let html = r#"<a class="link_black">Drama</a>
                      <a class="link_black">2020</a>"#;
        let detail = parse_detail(html, "link".to_string()).unwrap();
        assert_eq!(detail.year.as_deref(), Some("2019-2021"));
    }

    #[test]
    fn two_country_rows_concatenate_in_order() {
        let html = r#"
            <div class="p-movie-info__row">
              <span class="p-movie-info__name">Country</span>
              <span class="p-movie-info__value">USA, Canada</span>
            </div>
            <div class="p-movie-info__row">
              <span class="p-movie-info__name">Country of production</span>
              <span class="p-movie-info__value">France</span>
            </div>
        "#;
        let detail = parse_detail(html, "link".to_string()).unwrap();
        assert_eq!(detail.countries, ["USA", "Canada", "France"]);
    }

    #[test]
    fn frames_cap_at_three() {
        let html = r#"
            <div class="p-picture_object-fit"><img data-lazy-block-src="f1"></div>
            <div class="p-picture_object-fit"><img data-lazy-block-src="f2"></div>
            <div class="p-picture_object-fit"><img src="eager-skipped"></div>
            <div class="p-picture_object-fit"><img data-lazy-block-src="f3"></div>
            <div class="p-picture_object-fit"><img data-lazy-block-src="f4"></div>
        "#;
        let detail = parse_detail(html, "link".to_string()).unwrap();
        assert_eq!(detail.frames, ["f1", "f2", "f3"]);
    }

    #[test]
    fn four_digit_scan_takes_the_first_run() {
        assert_eq!(find_four_digit("since 2020, remade 1999"), Some(2020));
        assert_eq!(find_four_digit("no year here"), None);
        assert_eq!(find_four_digit("123"), None);
    }
}
