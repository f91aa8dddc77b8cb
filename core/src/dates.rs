use chrono::NaiveDate;

/// Input templates tried in order. Formats carrying time-of-day still parse
/// through `NaiveDate`, which ignores the parsed time fields.
const TEMPLATES: [&str; 11] = [
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H",
    "%d %b %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%B %d %Y",
    "%Y %b %d",
    "%Y %B %d",
    "%Y",
];

fn bare_year(s: &str) -> Option<String> {
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("01/01/{s}"))
    } else {
        None
    }
}

/// Normalize a free-form date-like string to `DD/MM/YYYY`.
///
/// Separators are canonicalized first (commas and `T` become spaces, `Z` is
/// dropped), then each template is tried in order. A bare 4-digit year is
/// anchored to January 1st. Returns the empty string when nothing matches;
/// never fails.
pub fn ddmmyyyy(date_like: &str) -> String {
    if date_like.trim().is_empty() {
        return String::new();
    }
    let s = date_like.trim().replace(',', " ").replace('T', " ").replace('Z', "");
    let s = s.split_whitespace().collect::<Vec<_>>().join(" ");

    for fmt in TEMPLATES {
        if fmt == "%Y" {
            if let Some(out) = bare_year(&s) {
                return out;
            }
            continue;
        }
        if let Ok(date) = NaiveDate::parse_from_str(&s, fmt) {
            return date.format("%d/%m/%Y").to_string();
        }
    }
    // Already canonical input passes through unchanged.
    if let Ok(date) = NaiveDate::parse_from_str(&s, "%d/%m/%Y") {
        return date.format("%d/%m/%Y").to_string();
    }
    bare_year(&s).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_date() {
        assert_eq!(ddmmyyyy("2023-04-09"), "09/04/2023");
    }

    #[test]
    fn iso_datetime_with_zone_marker() {
        assert_eq!(ddmmyyyy("2021-01-05T12:30:00Z"), "05/01/2021");
    }

    #[test]
    fn month_names_both_orders() {
        assert_eq!(ddmmyyyy("3 Jan 2020"), "03/01/2020");
        assert_eq!(ddmmyyyy("Jan 3, 2020"), "03/01/2020");
        assert_eq!(ddmmyyyy("2021 Jan 1"), "01/01/2021");
        assert_eq!(ddmmyyyy("12 December 1999"), "12/12/1999");
    }

    #[test]
    fn bare_year_anchors_to_january_first() {
        assert_eq!(ddmmyyyy("2022"), "01/01/2022");
    }

    #[test]
    fn canonical_input_round_trips() {
        assert_eq!(ddmmyyyy("07/11/2018"), "07/11/2018");
    }

    #[test]
    fn garbage_returns_empty() {
        assert_eq!(ddmmyyyy("2021 Jan-Feb"), "");
        assert_eq!(ddmmyyyy("not a date"), "");
        assert_eq!(ddmmyyyy(""), "");
    }
}
