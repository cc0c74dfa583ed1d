//! Dashboard view model
//!
//! Turns an hourly [`ForecastSeries`] into a grid of days by hours where each
//! cell carries a ride grade and preformatted display strings.

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::Serialize;

use crate::weather::{DataPoint, ForecastSeries};

/// Hours shown on the dashboard, independent of the forecast content
pub const HOUR_AXIS: [&str; 13] = [
    "08:00", "09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00",
    "18:00", "19:00", "20:00",
];

const DAY_LABEL_FORMAT: &str = "%A %d/%m";
const HOUR_LABEL_FORMAT: &str = "%H:%M";

/// How pleasant an hour is for a ride, from 0 (poor) to 4 (excellent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Grade(u8);

impl Grade {
    pub const POOR: Grade = Grade(0);
    pub const FAIR: Grade = Grade(1);
    pub const DECENT: Grade = Grade(2);
    pub const GOOD: Grade = Grade(3);
    pub const EXCELLENT: Grade = Grade(4);

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "poor",
            1 => "fair",
            2 => "decent",
            3 => "good",
            _ => "excellent",
        }
    }
}

/// Weather figures the grading rule looks at
#[derive(Debug, Clone, Copy)]
pub struct Conditions {
    /// Apparent temperature in Celsius
    pub temperature: f64,
    /// Precipitation probability, 0 to 1
    pub precipitation: f64,
    /// Wind speed in m/s
    pub wind: f64,
}

impl From<&DataPoint> for Conditions {
    fn from(point: &DataPoint) -> Self {
        Self {
            temperature: point.apparent_temperature,
            precipitation: point.precip_probability,
            wind: point.wind_speed,
        }
    }
}

type Tier = (fn(&Conditions) -> bool, Grade);

// Evaluated top to bottom, first match wins. The tiers overlap on purpose.
const GRADE_TIERS: [Tier; 4] = [
    (
        |c: &Conditions| {
            c.temperature > 15.0
                && c.temperature < 30.0
                && c.precipitation == 0.0
                && c.wind < 6.0
        },
        Grade::EXCELLENT,
    ),
    (
        |c: &Conditions| c.temperature > 10.0 && c.precipitation == 0.0 && c.wind < 6.0,
        Grade::GOOD,
    ),
    (
        |c: &Conditions| c.temperature > 10.0 && c.precipitation < 0.1 && c.wind < 6.0,
        Grade::DECENT,
    ),
    (
        |c: &Conditions| c.temperature > 10.0 && c.precipitation < 0.2,
        Grade::FAIR,
    ),
];

/// Grades an hour with the first matching tier, [`Grade::POOR`] otherwise
#[must_use]
pub fn grade(conditions: &Conditions) -> Grade {
    GRADE_TIERS
        .iter()
        .find(|(matches, _)| matches(conditions))
        .map_or(Grade::POOR, |(_, grade)| *grade)
}

/// One hour of one day, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub grade: Grade,
    /// Name of the grade, e.g. `excellent`
    pub rating: &'static str,
    /// e.g. `42%`
    pub precip_probability: String,
    /// e.g. `18.5°`
    pub apparent_temperature: String,
    /// e.g. `3m/s`
    pub wind_speed: String,
    /// Wind bearing in whole degrees, used to rotate the direction arrow
    pub wind_rotation: i32,
}

impl Cell {
    #[must_use]
    pub fn from_point(point: &DataPoint) -> Self {
        let grade = grade(&Conditions::from(point));
        Self {
            grade,
            rating: grade.label(),
            precip_probability: format_percentage(point.precip_probability),
            apparent_temperature: format_temperature(point.apparent_temperature),
            wind_speed: format_wind_speed(point.wind_speed),
            wind_rotation: point.wind_bearing.trunc() as i32,
        }
    }
}

#[must_use]
pub fn format_percentage(probability: f64) -> String {
    format!("{:.0}%", probability * 100.0)
}

#[must_use]
pub fn format_temperature(celsius: f64) -> String {
    format!("{celsius:.1}°")
}

#[must_use]
pub fn format_wind_speed(speed: f64) -> String {
    format!("{speed:.0}m/s")
}

/// Cells of one calendar day keyed by hour-label
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayBucket {
    pub cells: BTreeMap<String, Cell>,
}

impl DayBucket {
    #[must_use]
    pub fn cell(&self, hour_label: &str) -> Option<&Cell> {
        self.cells.get(hour_label)
    }
}

/// Rendering-ready forecast: days in order of first appearance, each with
/// its hourly cells, plus the fixed hour axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewGrid {
    pub days: IndexMap<String, DayBucket>,
    pub hours: Vec<String>,
}

impl ViewGrid {
    /// A grid without days, carrying the full hour axis
    #[must_use]
    pub fn empty() -> Self {
        Self {
            days: IndexMap::new(),
            hours: HOUR_AXIS.iter().map(|h| (*h).to_string()).collect(),
        }
    }

    /// Day-labels in order of first appearance
    pub fn day_labels(&self) -> impl Iterator<Item = &str> {
        self.days.keys().map(String::as_str)
    }

    #[must_use]
    pub fn day(&self, day_label: &str) -> Option<&DayBucket> {
        self.days.get(day_label)
    }
}

#[must_use]
pub fn day_label(timestamp: &DateTime<Tz>) -> String {
    timestamp.format(DAY_LABEL_FORMAT).to_string()
}

#[must_use]
pub fn hour_label(timestamp: &DateTime<Tz>) -> String {
    timestamp.format(HOUR_LABEL_FORMAT).to_string()
}

/// Builds the dashboard grid out of a forecast series
pub struct ViewBuilder;

impl ViewBuilder {
    /// Buckets every point by local day and hour.
    ///
    /// Days keep the order in which the series first mentions them. When two
    /// points map to the same day and hour, the later one wins.
    #[must_use]
    pub fn build(series: &ForecastSeries) -> ViewGrid {
        let mut grid = ViewGrid::empty();

        for point in &series.points {
            let local = point.timestamp.with_timezone(&series.timezone);
            grid.days
                .entry(day_label(&local))
                .or_default()
                .cells
                .insert(hour_label(&local), Cell::from_point(point));
        }

        grid
    }
}
