use crate::models::Listing;
use chrono::{Datelike, Duration, NaiveDateTime};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Strict layout the normalized date text must match
pub const DATE_TEMPLATE: &str = "%d %m %Y  %H:%M";

/// Badge texts that mark a professional seller or a paid showcase ad
const DEALER_BADGES: [&str; 2] = ["Rivenditore", "Vetrina"];
const SOLD_BADGE_CLASS: &str = "item-sold-badge";

const MONTHS: [(&str, u32); 12] = [
    ("gen", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("mag", 5),
    ("giu", 6),
    ("lug", 7),
    ("ago", 8),
    ("set", 9),
    ("ott", 10),
    ("nov", 11),
    ("dic", 12),
];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("Failed to parse static selector")
}

static CARD_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("div.item-card"));
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("h2"));
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("a"));
static IMAGE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("img"));
static PRICE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("p.price"));
static CITY_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("span.city"));
static SPAN_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("span"));

/// Split a result page into listings, in the order the site renders them.
///
/// `now` anchors relative dates ("Oggi", "Ieri") and month-only dates.
pub fn parse_page(html: &str, now: NaiveDateTime) -> Vec<Listing> {
    let document = Html::parse_document(html);

    let listings: Vec<Listing> = document
        .select(&CARD_SELECTOR)
        .map(|card| parse_listing(card, now))
        .collect();

    debug!("Found {} listing cards in HTML", listings.len());
    listings
}

/// Extract every field of one listing card. Missing fields become `None`.
pub fn parse_listing(card: ElementRef, now: NaiveDateTime) -> Listing {
    Listing {
        title: card.select(&TITLE_SELECTOR).next().map(element_text),
        price: card
            .select(&PRICE_SELECTOR)
            .next()
            .and_then(|el| parse_price(&element_text(el))),
        link: first_attr(card, &LINK_SELECTOR, "href"),
        image_url: first_attr(card, &IMAGE_SELECTOR, "src"),
        posted_at: posted_text(card).and_then(|text| parse_posted_at(&text, now)),
        is_dealer: is_dealer(card),
        raw_html: card.html(),
    }
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>()
}

fn first_attr(card: ElementRef, selector: &Selector, attr: &str) -> Option<String> {
    card.select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

/// True if any badge marks the listing as dealer, showcase or sold
pub fn is_dealer(card: ElementRef) -> bool {
    card.select(&SPAN_SELECTOR).any(|span| {
        let text = element_text(span);
        DEALER_BADGES.contains(&text.as_str())
            || span.value().classes().any(|class| class == SOLD_BADGE_CLASS)
    })
}

/// Parse a price such as "1.250,50\u{a0}€".
///
/// Only the text before the first non-breaking space counts. Italian
/// separators are used: `.` for thousands and `,` for decimals.
pub fn parse_price(text: &str) -> Option<f64> {
    let amount = text.split('\u{a0}').next()?.trim();
    amount.replace('.', "").replace(',', ".").parse::<f64>().ok()
}

/// The date text sits in the first `span` after the city marker
fn posted_text(card: ElementRef) -> Option<String> {
    let city = card.select(&CITY_SELECTOR).next()?;
    city.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "span")
        .map(element_text)
}

/// Rewrite a site date into `DATE_TEMPLATE` form.
///
/// "Oggi" and "Ieri" become today's and yesterday's date, a month
/// abbreviation becomes the month number followed by the year of `now`, and
/// the "alle" connective is dropped. Listings from December seen in January
/// are therefore dated in the wrong year.
pub fn normalize_date(text: &str, now: NaiveDateTime) -> Option<String> {
    let mut tokens: Vec<String> = Vec::with_capacity(4);

    for token in text.split_whitespace() {
        if token.eq_ignore_ascii_case("alle") {
            continue;
        }

        let day = if token.eq_ignore_ascii_case("oggi") {
            Some(now)
        } else if token.eq_ignore_ascii_case("ieri") {
            Some(now - Duration::days(1))
        } else {
            None
        };

        if let Some(day) = day {
            tokens.push(day.format("%d").to_string());
            tokens.push(day.format("%m").to_string());
            tokens.push(day.year().to_string());
        } else if let Some(month) = month_number(token) {
            tokens.push(format!("{:02}", month));
            tokens.push(now.year().to_string());
        } else {
            tokens.push(token.to_string());
        }
    }

    match tokens.as_slice() {
        [day, month, year, time] => Some(format!("{} {} {}  {}", day, month, year, time)),
        _ => None,
    }
}

fn month_number(token: &str) -> Option<u32> {
    let token = token.trim_end_matches('.').to_lowercase();
    MONTHS
        .iter()
        .find(|(abbr, _)| *abbr == token)
        .map(|(_, number)| *number)
}

/// Parse the posting date shown on a listing card, `None` if unreadable
pub fn parse_posted_at(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let normalized = normalize_date(text, now)?;
    NaiveDateTime::parse_from_str(&normalized, DATE_TEMPLATE).ok()
}
