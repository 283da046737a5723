/// Utility functions for data formatting
use time::{format_description, OffsetDateTime};

/// Format a timestamp for the published data file and log messages
///
/// Converts an OffsetDateTime to MM/DD/YYYY HH:MM:SS format.
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    let format = format_description::parse("[month]/[day]/[year] [hour]:[minute]:[second]")
        .expect("Failed to create format description");
    dt.format(&format).unwrap_or_else(|_| dt.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_formats_as_expected() {
        // 2021-12-12 09:05:03 UTC
        let dt = OffsetDateTime::from_unix_timestamp(1_639_299_903).unwrap();
        assert_eq!(format_datetime(&dt), "12/12/2021 09:05:03");
    }
}
