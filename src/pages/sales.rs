//! Video game sales: top-20 bars per region plus yearly, genre and
//! NA-vs-EU overviews of the whole catalogue.

use crate::charts::layout::{pie, stack_by, totals_by_label, Companion, ScatterPoint};
use crate::charts::scale::ColorScale;
use crate::charts::scene::{ChartKind, Encoding};
use crate::data::derive::{category_or_unknown, extract_year, non_negative};
use crate::data::filter::TopN;
use crate::data::record::cell;
use crate::data::{Datum, DetailCard, FieldSpec, FilterState, FilteredSet, RawRecord};
use crate::format;
use crate::pages::{categories, Controls, PageSpec};
use egui::Color32;

pub const DEFAULT_TOP_N: i64 = 20;
/// Genres selling less than this (millions) get no pie label.
pub const PIE_LABEL_MIN: f64 = 20.0;
/// Companion scatter radius per square-rooted million of global sales.
const SCATTER_RADIUS_FACTOR: f64 = 0.8;

const REGIONS: [&str; 4] = ["NA_Sales", "EU_Sales", "JP_Sales", "Other_Sales"];
const REGION_COLORS: [Color32; 4] = [
    Color32::from_rgb(0xff, 0x6b, 0x6b),
    Color32::from_rgb(0x4e, 0xcd, 0xc4),
    Color32::from_rgb(0x45, 0xb7, 0xd1),
    Color32::from_rgb(0x96, 0xce, 0xb4),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SalesField {
    Na,
    Eu,
    Jp,
    Other,
    Global,
}

impl FieldSpec for SalesField {
    fn label(self) -> &'static str {
        match self {
            SalesField::Na => "NA Sales (M)",
            SalesField::Eu => "EU Sales (M)",
            SalesField::Jp => "JP Sales (M)",
            SalesField::Other => "Other Sales (M)",
            SalesField::Global => "Global Sales (M)",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoGame {
    pub rank: u32,
    pub name: String,
    pub platform: String,
    /// `None` for "N/A" years; such games are left out of per-year totals.
    pub year: Option<i32>,
    pub genre: String,
    pub publisher: String,
    pub na: f64,
    pub eu: f64,
    pub jp: f64,
    pub other: f64,
    pub global: f64,
}

impl VideoGame {
    fn year_text(&self) -> String {
        self.year.map_or_else(|| "N/A".to_string(), |y| y.to_string())
    }
}

impl Datum for VideoGame {
    type Field = SalesField;

    fn from_raw(row: usize, raw: &RawRecord) -> Option<Self> {
        let rank = cell(raw, "Rank")
            .and_then(|r| r.trim().parse::<u32>().ok())
            .unwrap_or(row as u32 + 1);

        Some(Self {
            rank,
            name: category_or_unknown(cell(raw, "Name")),
            platform: category_or_unknown(cell(raw, "Platform")),
            year: extract_year(cell(raw, "Year")),
            genre: category_or_unknown(cell(raw, "Genre")),
            publisher: category_or_unknown(cell(raw, "Publisher")),
            na: non_negative(cell(raw, "NA_Sales")),
            eu: non_negative(cell(raw, "EU_Sales")),
            jp: non_negative(cell(raw, "JP_Sales")),
            other: non_negative(cell(raw, "Other_Sales")),
            global: non_negative(cell(raw, "Global_Sales")),
        })
    }

    fn key(&self) -> String {
        self.rank.to_string()
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.genre
    }

    fn value(&self, field: SalesField) -> f64 {
        match field {
            SalesField::Na => self.na,
            SalesField::Eu => self.eu,
            SalesField::Jp => self.jp,
            SalesField::Other => self.other,
            SalesField::Global => self.global,
        }
    }

    fn tooltip(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            format!("Genre: {}", self.genre),
            format!("Platform: {}", self.platform),
            format!("Year: {}", self.year_text()),
            format!(
                "NA {} / EU {} / JP {} millions",
                format::plain(self.na),
                format::plain(self.eu),
                format::plain(self.jp)
            ),
        ]
    }

    fn details(&self) -> Vec<DetailCard> {
        vec![
            DetailCard::new("Game", &self.name, format!("{} • {}", self.platform, self.year_text())),
            DetailCard::new(
                "Global sales",
                format!("{} M", format::plain(self.global)),
                format!("Rank #{}", self.rank),
            ),
            DetailCard::new(
                "North America / Europe",
                format!("{} M / {} M", format::plain(self.na), format::plain(self.eu)),
                "",
            ),
            DetailCard::new(
                "Japan / Other",
                format!("{} M / {} M", format::plain(self.jp), format::plain(self.other)),
                "",
            ),
            DetailCard::new("Publisher", &self.publisher, self.genre.clone()),
        ]
    }
}

/// Catalogue order (by rank) until a sort is requested.
fn defaults(_records: &[VideoGame]) -> FilterState<SalesField> {
    let mut state = FilterState::new(SalesField::Na);
    state.top_n = TopN::new(DEFAULT_TOP_N).ok();
    state
}

/// Overviews of the whole catalogue; the bar filters do not apply to them.
fn companions(records: &[VideoGame], _filtered: &FilteredSet) -> Vec<Companion> {
    let by_year = stack_by(
        records
            .iter()
            .filter_map(|g| g.year.map(|y| (y, [g.na, g.eu, g.jp, g.other]))),
        REGIONS,
    );

    let by_genre = totals_by_label(records.iter().map(|g| (g.genre.as_str(), g.global)));

    let points = records
        .iter()
        .map(|g| ScatterPoint {
            x: g.na,
            y: g.eu,
            radius: g.global.sqrt() * SCATTER_RADIUS_FACTOR,
            category: g.genre.clone(),
        })
        .collect();

    vec![
        Companion::StackedArea {
            title: "Regional sales by year",
            series: by_year,
            colors: REGION_COLORS.to_vec(),
        },
        Companion::Pie {
            title: "Global sales by genre",
            slices: pie(&by_genre),
            label_min: PIE_LABEL_MIN,
        },
        Companion::Scatter {
            title: "North America vs Europe",
            x_label: "North America sales (millions)",
            y_label: "Europe sales (millions)",
            points,
        },
    ]
}

pub fn spec() -> PageSpec<VideoGame> {
    PageSpec {
        title: "Video Game Sales",
        required_columns: &[
            "Rank",
            "Name",
            "Platform",
            "Year",
            "Genre",
            "Publisher",
            "NA_Sales",
            "EU_Sales",
            "JP_Sales",
            "Other_Sales",
            "Global_Sales",
        ],
        encoding: Encoding {
            chart: ChartKind::Bars,
            measure: SalesField::Na,
            color_field: None,
        },
        controls: Controls {
            category: Some("Genre"),
            threshold: None,
            range: None,
            measures: &[
                SalesField::Na,
                SalesField::Eu,
                SalesField::Jp,
                SalesField::Other,
                SalesField::Global,
            ],
            sort_buttons: &[],
            sort_by_measure: true,
            top_n: false,
        },
        defaults,
        color: |records| ColorScale::categorical(categories(records)),
        companions,
        stats_fields: &[SalesField::Global, SalesField::Na, SalesField::Eu],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::apply;
    use crate::data::FilterEvent;

    fn game(rank: &str, year: &str, genre: &str, na: &str, eu: &str, global: &str) -> VideoGame {
        let raw: RawRecord = [
            ("Rank", rank),
            ("Name", "Game"),
            ("Year", year),
            ("Genre", genre),
            ("NA_Sales", na),
            ("EU_Sales", eu),
            ("Global_Sales", global),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        VideoGame::from_raw(0, &raw).unwrap()
    }

    fn catalogue() -> Vec<VideoGame> {
        vec![
            game("1", "2006", "Sports", "41.49", "29.02", "82.74"),
            game("2", "1985", "Platform", "29.08", "3.58", "40.24"),
            game("3", "2008", "Racing", "15.85", "12.88", "35.82"),
            game("4", "N/A", "Sports", "15.75", "11.01", "33.0"),
        ]
    }

    #[test]
    fn missing_year_stays_unknown() {
        let games = catalogue();
        assert_eq!(games[3].year, None);
        assert_eq!(games[3].tooltip()[3], "Year: N/A");
        assert_eq!(games[0].key(), "1");
    }

    #[test]
    fn sort_uses_selected_region() {
        let games = catalogue();
        let state = defaults(&games);
        let ranks = |state: &FilterState<SalesField>| -> Vec<String> {
            apply(&games, state).iter(&games).map(|g| g.key()).collect()
        };
        assert_eq!(ranks(&state), vec!["1", "2", "3", "4"]);

        let state = state
            .reduce(FilterEvent::SelectMeasure(SalesField::Eu))
            .and_then(|s| s.reduce(FilterEvent::SortBy(SalesField::Eu)))
            .unwrap();
        assert_eq!(ranks(&state), vec!["1", "3", "4", "2"]);
    }

    #[test]
    fn companions_skip_unknown_years_and_sort_genres() {
        let games = catalogue();
        let filtered = apply(&games, &defaults(&games));
        let charts = companions(&games, &filtered);

        let Companion::StackedArea { series, .. } = &charts[0] else {
            panic!("expected stacked area");
        };
        let years: Vec<f64> = series[0].points.iter().map(|p| p.0).collect();
        assert_eq!(years, vec![1985.0, 2006.0, 2008.0]);

        let Companion::Pie { slices, .. } = &charts[1] else {
            panic!("expected pie");
        };
        assert_eq!(slices[0].label, "Sports");
        assert!((slices[0].value - 115.74).abs() < 1e-9);

        let Companion::Scatter { points, .. } = &charts[2] else {
            panic!("expected scatter");
        };
        assert_eq!(points.len(), 4);
    }
}
