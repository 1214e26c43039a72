use chrono::NaiveDateTime;

use crate::error::{CommonError, CommonResult};

/// Locale rules applied when rendering dates and numbers for display.
///
/// Only the general date/time pattern and the decimal separator are modeled.
/// Numbers are never grouped, which matches the general numeric format of
/// the cultures below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Culture {
    name: &'static str,
    decimal_separator: char,
    datetime_pattern: &'static str,
}

const CULTURES: &[Culture] = &[
    Culture {
        name: "invariant",
        decimal_separator: '.',
        datetime_pattern: "%m/%d/%Y %H:%M:%S",
    },
    Culture {
        name: "en-US",
        decimal_separator: '.',
        datetime_pattern: "%-m/%-d/%Y %-I:%M:%S %p",
    },
    Culture {
        name: "en-GB",
        decimal_separator: '.',
        datetime_pattern: "%d/%m/%Y %H:%M:%S",
    },
    Culture {
        name: "de-DE",
        decimal_separator: ',',
        datetime_pattern: "%d.%m.%Y %H:%M:%S",
    },
    Culture {
        name: "fr-FR",
        decimal_separator: ',',
        datetime_pattern: "%d/%m/%Y %H:%M:%S",
    },
    Culture {
        name: "nl-NL",
        decimal_separator: ',',
        datetime_pattern: "%-d-%-m-%Y %-H:%M:%S",
    },
];

impl Culture {
    pub fn invariant() -> Self {
        CULTURES[0].clone()
    }

    /// Looks up a culture by name, ignoring case.
    /// An empty name resolves to the invariant culture.
    pub fn from_name(name: &str) -> CommonResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Self::invariant());
        }
        CULTURES
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| CommonError::UnsupportedCulture(name.to_string()))
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn format_datetime(&self, value: &NaiveDateTime) -> String {
        value.format(self.datetime_pattern).to_string()
    }

    /// Replaces the invariant decimal point in an already rendered number.
    pub fn localize_number(&self, text: String) -> String {
        if self.decimal_separator == '.' {
            text
        } else {
            text.replace('.', &self.decimal_separator.to_string())
        }
    }
}

impl Default for Culture {
    fn default() -> Self {
        Self::invariant()
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn sample() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(15, 4, 5)
            .unwrap()
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(Culture::from_name("DE-de").unwrap().name(), "de-DE");
        assert_eq!(Culture::from_name("").unwrap(), Culture::invariant());
        assert!(matches!(
            Culture::from_name("xx-XX"),
            Err(CommonError::UnsupportedCulture(name)) if name == "xx-XX"
        ));
    }

    #[test]
    fn test_datetime_patterns() {
        let value = sample();
        let render = |name: &str| Culture::from_name(name).unwrap().format_datetime(&value);
        assert_eq!(render("invariant"), "03/07/2024 15:04:05");
        assert_eq!(render("en-US"), "3/7/2024 3:04:05 PM");
        assert_eq!(render("en-GB"), "07/03/2024 15:04:05");
        assert_eq!(render("de-DE"), "07.03.2024 15:04:05");
        assert_eq!(render("fr-FR"), "07/03/2024 15:04:05");
        assert_eq!(render("nl-NL"), "7-3-2024 15:04:05");
        let morning = NaiveDate::from_ymd_opt(2024, 11, 23)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let culture = Culture::from_name("nl-NL").unwrap();
        assert_eq!(culture.format_datetime(&morning), "23-11-2024 9:30:00");
    }

    #[test]
    fn test_decimal_separator() {
        let culture = Culture::from_name("fr-FR").unwrap();
        assert_eq!(culture.localize_number("-12.50".to_string()), "-12,50");
        let culture = Culture::invariant();
        assert_eq!(culture.localize_number("12.50".to_string()), "12.50");
    }
}
