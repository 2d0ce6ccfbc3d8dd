//! Current weather conditions for a searched region

use serde::{Deserialize, Serialize};

/// Current conditions as delivered by the weather backend
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    /// Temperature in Celsius
    pub temperature: f32,
    /// Relative humidity in percent
    pub humidity: f32,
    /// Probability of precipitation in percent
    pub precipitation_probability: f32,
    /// Fine dust concentration in µg/m³
    #[serde(alias = "particulateMatter25")]
    pub pm25: f32,
    /// WMO weather interpretation code
    pub weather_code: u16,
}

/// PM2.5 air quality grade
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AirQuality {
    Good,
    Moderate,
    Bad,
    VeryBad,
}

impl AirQuality {
    #[must_use]
    pub fn from_pm25(pm25: f32) -> Self {
        match pm25 {
            v if v <= 15.0 => AirQuality::Good,
            v if v <= 35.0 => AirQuality::Moderate,
            v if v <= 75.0 => AirQuality::Bad,
            _ => AirQuality::VeryBad,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            AirQuality::Good => "Good",
            AirQuality::Moderate => "Moderate",
            AirQuality::Bad => "Bad",
            AirQuality::VeryBad => "Very bad",
        }
    }
}

impl WeatherSnapshot {
    /// Coarse condition for the weather code groups
    #[must_use]
    pub fn condition(&self) -> &'static str {
        match self.weather_code {
            0 => "Clear",
            1..=3 => "Cloudy",
            45 | 48 => "Fog",
            51..=57 => "Drizzle",
            61..=67 => "Rain",
            71..=77 => "Snow",
            80..=82 => "Rain showers",
            85 | 86 => "Snow showers",
            95..=99 => "Thunderstorm",
            _ => "Unknown",
        }
    }

    #[must_use]
    pub fn air_quality(&self) -> AirQuality {
        AirQuality::from_pm25(self.pm25)
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }

    /// One-line summary shown on the weather card
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}, {} · humidity {:.0}% · rain {:.0}% · PM2.5 {:.0}µg/m³ ({})",
            self.condition(),
            self.format_temperature(),
            self.humidity,
            self.precipitation_probability,
            self.pm25,
            self.air_quality().label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn snapshot(code: u16, pm25: f32) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: 21.34,
            humidity: 55.0,
            precipitation_probability: 20.0,
            pm25,
            weather_code: code,
        }
    }

    #[rstest]
    #[case(0.0, AirQuality::Good)]
    #[case(15.0, AirQuality::Good)]
    #[case(15.5, AirQuality::Moderate)]
    #[case(35.0, AirQuality::Moderate)]
    #[case(75.0, AirQuality::Bad)]
    #[case(120.0, AirQuality::VeryBad)]
    fn test_air_quality_grades(#[case] pm25: f32, #[case] expected: AirQuality) {
        assert_eq!(AirQuality::from_pm25(pm25), expected);
    }

    #[rstest]
    #[case(0, "Clear")]
    #[case(2, "Cloudy")]
    #[case(63, "Rain")]
    #[case(95, "Thunderstorm")]
    #[case(42, "Unknown")]
    fn test_condition(#[case] code: u16, #[case] expected: &str) {
        assert_eq!(snapshot(code, 10.0).condition(), expected);
    }

    #[test]
    fn test_backend_field_names() {
        let weather: WeatherSnapshot = serde_json::from_str(
            r#"{"temperature": 3.5, "humidity": 40, "precipitationProbability": 10,
                "particulateMatter25": 28, "weatherCode": 3}"#,
        )
        .unwrap();
        assert_eq!(weather.pm25, 28.0);
        assert_eq!(weather.weather_code, 3);
    }

    #[test]
    fn test_summary() {
        let summary = snapshot(0, 40.0).summary();
        assert!(summary.starts_with("Clear, 21.3°C"));
        assert!(summary.contains("(Bad)"));
    }
}
