//! Twitch streamers: zoomable top-N bar chart.

use crate::charts::layout::Companion;
use crate::charts::scale::{extent, ColorScale};
use crate::charts::scene::{ChartKind, Encoding};
use crate::data::derive::{category_or_unknown, flag, non_negative, number_or};
use crate::data::filter::{Bound, Threshold, TopN};
use crate::data::record::cell;
use crate::data::{Datum, DetailCard, FieldSpec, FilterState, FilteredSet, RawRecord};
use crate::format;
use crate::pages::{Controls, PageSpec, ThresholdControl};

pub const DEFAULT_TOP_N: i64 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TwitchField {
    Followers,
    AverageViewers,
    StreamTime,
    WatchTime,
    PeakViewers,
    FollowersGained,
    ViewsGained,
}

impl FieldSpec for TwitchField {
    fn label(self) -> &'static str {
        match self {
            TwitchField::Followers => "Followers",
            TwitchField::AverageViewers => "Average Viewers",
            TwitchField::StreamTime => "Stream time (min)",
            TwitchField::WatchTime => "Watch time (min)",
            TwitchField::PeakViewers => "Peak viewers",
            TwitchField::FollowersGained => "Followers gained",
            TwitchField::ViewsGained => "Views gained",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Streamer {
    /// Row of the streamer in the CSV.
    pub id: usize,
    pub channel: String,
    pub watch_time: f64,
    pub stream_time: f64,
    pub peak_viewers: f64,
    pub average_viewers: f64,
    pub followers: f64,
    pub followers_gained: f64,
    pub views_gained: f64,
    pub partnered: bool,
    pub mature: bool,
    pub language: String,
}

impl Datum for Streamer {
    type Field = TwitchField;

    /// Channels without followers or viewers are not charted.
    fn from_raw(row: usize, raw: &RawRecord) -> Option<Self> {
        let followers = non_negative(cell(raw, "Followers"));
        let average_viewers = non_negative(cell(raw, "Average viewers"));
        if followers <= 0.0 || average_viewers <= 0.0 {
            return None;
        }

        Some(Self {
            id: row,
            channel: category_or_unknown(cell(raw, "Channel")),
            watch_time: number_or(cell(raw, "Watch time(Minutes)"), 0.0),
            stream_time: non_negative(cell(raw, "Stream time(minutes)")),
            peak_viewers: number_or(cell(raw, "Peak viewers"), 0.0),
            average_viewers,
            followers,
            followers_gained: number_or(cell(raw, "Followers gained"), 0.0),
            views_gained: number_or(cell(raw, "Views gained"), 0.0),
            partnered: flag(cell(raw, "Partnered")),
            mature: flag(cell(raw, "Mature")),
            language: category_or_unknown(cell(raw, "Language")),
        })
    }

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> &str {
        &self.channel
    }

    fn category(&self) -> &str {
        &self.language
    }

    fn value(&self, field: TwitchField) -> f64 {
        match field {
            TwitchField::Followers => self.followers,
            TwitchField::AverageViewers => self.average_viewers,
            TwitchField::StreamTime => self.stream_time,
            TwitchField::WatchTime => self.watch_time,
            TwitchField::PeakViewers => self.peak_viewers,
            TwitchField::FollowersGained => self.followers_gained,
            TwitchField::ViewsGained => self.views_gained,
        }
    }

    fn tooltip(&self) -> Vec<String> {
        vec![
            self.channel.clone(),
            format!("{} followers", format::compact(self.followers)),
            format!("{} avg viewers", format::compact(self.average_viewers)),
            format!("{} hours streamed", format::compact((self.stream_time / 60.0).round())),
            self.language.clone(),
            "Click for details".to_string(),
        ]
    }

    fn details(&self) -> Vec<DetailCard> {
        let mut status = format!(
            "{} • {}",
            self.language,
            if self.partnered { "Partnered" } else { "Not Partnered" }
        );
        if self.mature {
            status.push_str(" • Mature");
        }

        vec![
            DetailCard::new("Channel", &self.channel, status),
            DetailCard::new(
                "Followers",
                format::compact(self.followers),
                format!("+{} gained recently", format::compact(self.followers_gained)),
            ),
            DetailCard::new(
                "Viewership",
                format::compact(self.average_viewers),
                format!("Peak: {} viewers", format::compact(self.peak_viewers)),
            ),
            DetailCard::new(
                "Stream Time",
                format::minutes(self.stream_time),
                format!("Total watch time: {}", format::minutes(self.watch_time)),
            ),
            DetailCard::new("Engagement", format::compact(self.views_gained), "Views gained recently"),
        ]
    }
}

fn defaults(_records: &[Streamer]) -> FilterState<TwitchField> {
    let mut state = FilterState::new(TwitchField::Followers);
    state.threshold = Some(Threshold {
        field: TwitchField::Followers,
        bound: Bound::AtLeast,
        value: None,
    });
    state.sort = Some(TwitchField::Followers);
    state.linked_sort = true;
    state.top_n = TopN::new(DEFAULT_TOP_N).ok();
    state
}

/// Bars are colored by average viewers, normalized over the whole dataset.
fn color(records: &[Streamer]) -> ColorScale {
    let input = extent(records.iter().map(|s| s.average_viewers)).unwrap_or((0.0, 1.0));
    ColorScale::normalized(input)
}

fn companions(_records: &[Streamer], _filtered: &FilteredSet) -> Vec<Companion> {
    Vec::new()
}

pub fn spec() -> PageSpec<Streamer> {
    PageSpec {
        title: "Twitch Streamers",
        required_columns: &[
            "Channel",
            "Watch time(Minutes)",
            "Stream time(minutes)",
            "Peak viewers",
            "Average viewers",
            "Followers",
            "Followers gained",
            "Views gained",
            "Partnered",
            "Mature",
            "Language",
        ],
        encoding: Encoding {
            chart: ChartKind::Bars,
            measure: TwitchField::Followers,
            color_field: Some(TwitchField::AverageViewers),
        },
        controls: Controls {
            category: Some("Language"),
            threshold: Some(("Min followers", ThresholdControl::Slider)),
            range: None,
            measures: &[],
            sort_buttons: &[TwitchField::Followers, TwitchField::AverageViewers],
            sort_by_measure: false,
            top_n: true,
        },
        defaults,
        color,
        companions,
        stats_fields: &[
            TwitchField::Followers,
            TwitchField::AverageViewers,
            TwitchField::StreamTime,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::apply;
    use crate::data::FilterEvent;

    fn streamer(row: usize, channel: &str, followers: &str, viewers: &str, language: &str) -> Option<Streamer> {
        let raw: RawRecord = [
            ("Channel", channel),
            ("Followers", followers),
            ("Average viewers", viewers),
            ("Stream time(minutes)", "-30"),
            ("Language", language),
            ("Partnered", "True"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Streamer::from_raw(row, &raw)
    }

    fn sample() -> Vec<Streamer> {
        [
            streamer(0, "alpha", "3000000", "20000", "English"),
            streamer(1, "bravo", "9000000", "5000", "English"),
            streamer(2, "charlie", "500000", "45000", "French"),
            streamer(3, "ghost", "0", "100", "English"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    #[test]
    fn drops_channels_without_audience_and_clamps() {
        let records = sample();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|s| s.stream_time == 0.0));
        assert!(records[0].partnered && !records[0].mature);
        assert_eq!(records[2].key(), "2");
    }

    #[test]
    fn sorting_by_viewers_also_plots_viewers() {
        let records = sample();
        let state = defaults(&records);
        let order = |state: &FilterState<TwitchField>| -> Vec<String> {
            apply(&records, state).iter(&records).map(|s| s.channel.clone()).collect()
        };
        assert_eq!(order(&state), vec!["bravo", "alpha", "charlie"]);

        let state = state.reduce(FilterEvent::SortBy(TwitchField::AverageViewers)).unwrap();
        assert_eq!(state.measure, TwitchField::AverageViewers);
        assert_eq!(order(&state), vec!["charlie", "alpha", "bravo"]);
    }

    #[test]
    fn follower_slider_is_a_lower_bound() {
        let records = sample();
        let state = defaults(&records)
            .reduce(FilterEvent::SetThreshold(Some(3_000_000.0)))
            .unwrap();
        let filtered = apply(&records, &state);
        let kept: Vec<&str> = filtered.iter(&records).map(|s| s.label()).collect();
        assert_eq!(kept, vec!["bravo", "alpha"]);
    }

    #[test]
    fn details_mention_partnership_and_time() {
        let records = sample();
        let cards = records[0].details();
        assert_eq!(cards[0].subtext, "English • Partnered");
        assert_eq!(cards[3].value, "0h 0m");
        assert_eq!(cards[1].value, "3.0M");
    }
}
