//! Rows as the table shows them.

use serde::Serialize;
use weatherdash_weather::Weather;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    pub city_id: String,
    /// Name the weather service answered with
    pub display_name: String,
    pub weather: Weather,
    pub is_favorite: bool,
}

impl DisplayRow {
    pub fn new(city_id: impl Into<String>, weather: Weather, is_favorite: bool) -> Self {
        let city_id = city_id.into();
        let display_name = if weather.location_name.trim().is_empty() {
            city_id.clone()
        } else {
            weather.location_name.clone()
        };

        Self {
            city_id,
            display_name,
            weather,
            is_favorite,
        }
    }
}

/// Plain-text table of `rows`, one line per city, in the given order.
pub fn render_table(rows: &[DisplayRow]) -> String {
    let width = rows
        .iter()
        .map(|r| r.display_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("City".len());

    let mut out = format!(
        "  {:<width$}  {:>9}  {:>7}  {:>8}  {:>10}\n",
        "City", "Temp", "Precip", "Humidity", "Wind"
    );

    for row in rows {
        let w = &row.weather;
        out.push_str(&format!(
            "{} {:<width$}  {:>3}°C/{:>3}°F  {:>5}mm  {:>7}%  {:>6}km/h\n",
            if row.is_favorite { '*' } else { ' ' },
            row.display_name,
            w.temperature.round() as i64,
            w.fahrenheit(),
            w.precipitation,
            w.humidity,
            w.wind_speed,
        ));
    }

    out
}
