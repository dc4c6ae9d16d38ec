//! Steam games: price vs. owners scatter, colored by review score.

use crate::charts::layout::{histogram, Companion};
use crate::charts::scale::{extent, ColorScale};
use crate::charts::scene::{ChartKind, Encoding};
use crate::data::derive::{category_or_unknown, non_negative, range_max, rating_ratios, year_or};
use crate::data::filter::{Bound, RangeFilter, Threshold, TopN};
use crate::data::record::cell;
use crate::data::{Datum, DetailCard, FieldSpec, FilterState, FilteredSet, RawRecord};
use crate::format;
use crate::pages::{Controls, PageSpec, ThresholdControl};

/// Release year used when the date has no four-digit year.
pub const FALLBACK_YEAR: i32 = 2000;
pub const DEFAULT_TOP_N: i64 = 500;
/// Number of round price ticks the histogram bins are cut on.
const PRICE_BINS: usize = 30;

const PRICE_CHOICES: &[(&str, Option<f64>)] = &[
    ("All prices", None),
    ("Free", Some(0.0)),
    ("Up to $5", Some(5.0)),
    ("Up to $10", Some(10.0)),
    ("Up to $20", Some(20.0)),
    ("Up to $50", Some(50.0)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SteamField {
    Price,
    Owners,
    PositivePct,
    NegativePct,
    TotalRatings,
    ReleaseYear,
    AveragePlaytime,
}

impl FieldSpec for SteamField {
    fn label(self) -> &'static str {
        match self {
            SteamField::Price => "Price ($)",
            SteamField::Owners => "Owners",
            SteamField::PositivePct => "Positive reviews (%)",
            SteamField::NegativePct => "Negative reviews (%)",
            SteamField::TotalRatings => "Ratings",
            SteamField::ReleaseYear => "Release year",
            SteamField::AveragePlaytime => "Average playtime (min)",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SteamGame {
    pub id: String,
    pub name: String,
    pub release_year: i32,
    /// First entry of the `;`-separated genre list.
    pub genre: String,
    pub genres: String,
    pub developer: String,
    pub publisher: String,
    pub price: f64,
    pub owners: f64,
    pub positive_ratings: f64,
    pub negative_ratings: f64,
    pub positive_pct: f64,
    pub negative_pct: f64,
    pub average_playtime: f64,
}

impl SteamGame {
    pub fn total_ratings(&self) -> f64 {
        self.positive_ratings + self.negative_ratings
    }
}

impl Datum for SteamGame {
    type Field = SteamField;

    fn from_raw(row: usize, raw: &RawRecord) -> Option<Self> {
        let positive_ratings = non_negative(cell(raw, "positive_ratings"));
        let negative_ratings = non_negative(cell(raw, "negative_ratings"));
        let (positive_pct, negative_pct) = rating_ratios(positive_ratings, negative_ratings);
        let genres = category_or_unknown(cell(raw, "genres"));
        let genre = category_or_unknown(genres.split(';').next());

        Some(Self {
            id: cell(raw, "appid")
                .map(str::to_string)
                .unwrap_or_else(|| format!("row-{row}")),
            name: category_or_unknown(cell(raw, "name")),
            release_year: year_or(cell(raw, "release_date"), FALLBACK_YEAR),
            genre,
            genres,
            developer: category_or_unknown(cell(raw, "developer")),
            publisher: category_or_unknown(cell(raw, "publisher")),
            price: non_negative(cell(raw, "price")),
            owners: range_max(cell(raw, "owners")),
            positive_ratings,
            negative_ratings,
            positive_pct,
            negative_pct,
            average_playtime: non_negative(cell(raw, "average_playtime")),
        })
    }

    fn key(&self) -> String {
        self.id.clone()
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.genre
    }

    fn value(&self, field: SteamField) -> f64 {
        match field {
            SteamField::Price => self.price,
            SteamField::Owners => self.owners,
            SteamField::PositivePct => self.positive_pct,
            SteamField::NegativePct => self.negative_pct,
            SteamField::TotalRatings => self.total_ratings(),
            SteamField::ReleaseYear => self.release_year as f64,
            SteamField::AveragePlaytime => self.average_playtime,
        }
    }

    fn tooltip(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            format!("Price: {}", format::dollars(self.price)),
            format!("Owners: up to {}", format::compact(self.owners)),
            format!("Positive reviews: {:.1}%", self.positive_pct),
            format!("Released: {}", self.release_year),
        ]
    }

    fn details(&self) -> Vec<DetailCard> {
        vec![
            DetailCard::new("Game", &self.name, format!("{} • {}", self.genres, self.release_year)),
            DetailCard::new("Price", format::dollars(self.price), ""),
            DetailCard::new("Owners", format::compact(self.owners), "upper bound of the owners range"),
            DetailCard::new(
                "Reviews",
                format!("{:.1}% positive", self.positive_pct),
                format!(
                    "{} positive / {} negative",
                    format::compact(self.positive_ratings),
                    format::compact(self.negative_ratings)
                ),
            ),
            DetailCard::new("Average playtime", format::minutes(self.average_playtime), ""),
            DetailCard::new("Developer", &self.developer, format!("Published by {}", self.publisher)),
        ]
    }
}

fn defaults(records: &[SteamGame]) -> FilterState<SteamField> {
    let (first, last) = extent(records.iter().map(|g| g.release_year as f64))
        .unwrap_or((FALLBACK_YEAR as f64, FALLBACK_YEAR as f64));

    let mut state = FilterState::new(SteamField::Owners);
    state.threshold = Some(Threshold {
        field: SteamField::Price,
        bound: Bound::AtMost,
        value: None,
    });
    state.range = Some(RangeFilter::new(SteamField::ReleaseYear, first, last));
    state.sort = Some(SteamField::Owners);
    state.top_n = TopN::new(DEFAULT_TOP_N).ok();
    state
}

fn companions(records: &[SteamGame], filtered: &FilteredSet) -> Vec<Companion> {
    let prices = filtered.values(records, SteamField::Price);
    let max = extent(prices.iter().copied()).map_or(0.0, |(_, hi)| hi);
    let domain = (0.0, if max > 0.0 { max } else { 1.0 });

    vec![Companion::Histogram {
        title: "Price distribution",
        x_label: "Game Price ($)",
        bins: histogram(&prices, domain, PRICE_BINS),
    }]
}

pub fn spec() -> PageSpec<SteamGame> {
    PageSpec {
        title: "Steam Games",
        required_columns: &[
            "name",
            "release_date",
            "genres",
            "price",
            "owners",
            "positive_ratings",
            "negative_ratings",
        ],
        encoding: Encoding {
            chart: ChartKind::Scatter {
                x: SteamField::Price,
                size: Some(SteamField::TotalRatings),
            },
            measure: SteamField::Owners,
            color_field: Some(SteamField::PositivePct),
        },
        controls: Controls {
            category: Some("Genre"),
            threshold: Some(("Price", ThresholdControl::Choices(PRICE_CHOICES))),
            range: Some("Release year"),
            measures: &[SteamField::Owners, SteamField::TotalRatings, SteamField::AveragePlaytime],
            sort_buttons: &[SteamField::Owners, SteamField::Price],
            sort_by_measure: false,
            top_n: true,
        },
        defaults,
        color: |_| ColorScale::percent(),
        companions,
        stats_fields: &[SteamField::Price, SteamField::PositivePct, SteamField::Owners],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::apply;

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn derives_price_year_and_ratings() {
        let game = SteamGame::from_raw(
            0,
            &raw(&[
                ("price", "19.99"),
                ("release_date", "2015-08-01"),
                ("positive_ratings", "80"),
                ("negative_ratings", "20"),
            ]),
        )
        .unwrap();

        assert_eq!(game.price, 19.99);
        assert_eq!(game.release_year, 2015);
        assert_eq!(game.positive_ratings, 80.0);
        assert_eq!(game.negative_ratings, 20.0);
        assert_eq!(game.positive_pct, 80.0);
        assert_eq!(game.negative_pct, 20.0);
        assert_eq!(game.genre, crate::data::derive::UNKNOWN);
        assert_eq!(game.key(), "row-0");
    }

    #[test]
    fn owners_range_and_zero_ratings() {
        let game = SteamGame::from_raw(
            3,
            &raw(&[
                ("appid", "10"),
                ("owners", "10000000-20000000"),
                ("positive_ratings", "0"),
                ("negative_ratings", "0"),
                ("genres", "Action;Indie"),
                ("release_date", "someday"),
            ]),
        )
        .unwrap();

        assert_eq!(game.owners, 20_000_000.0);
        assert_eq!((game.positive_pct, game.negative_pct), (0.0, 0.0));
        assert_eq!(game.genre, "Action");
        assert_eq!(game.release_year, FALLBACK_YEAR);
        assert_eq!(game.key(), "10");
    }

    #[test]
    fn price_choice_is_an_upper_bound() {
        let games: Vec<SteamGame> = [("1", "0"), ("2", "4.99"), ("3", "19.99")]
            .iter()
            .map(|(id, price)| {
                SteamGame::from_raw(0, &raw(&[("appid", id), ("price", price), ("release_date", "2010")])).unwrap()
            })
            .collect();

        let state = defaults(&games)
            .reduce(crate::data::FilterEvent::SetThreshold(Some(5.0)))
            .unwrap();
        let keys: Vec<String> = apply(&games, &state).iter(&games).map(|g| g.key()).collect();
        assert_eq!(keys, vec!["1", "2"]);
    }

    #[test]
    fn histogram_counts_every_filtered_game() {
        let games: Vec<SteamGame> = ["0", "9.99", "14.99", "59.99"]
            .iter()
            .map(|price| SteamGame::from_raw(0, &raw(&[("price", price)])).unwrap())
            .collect();
        let filtered = apply(&games, &FilterState::new(SteamField::Owners));

        let Companion::Histogram { bins, .. } = &companions(&games, &filtered)[0] else {
            panic!("expected histogram");
        };
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(bins.last().map(|b| b.x1), Some(59.99));
    }
}
