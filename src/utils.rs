/// Shared utility functions for the rain verdict service
///
/// Parse a decimal number written with either a comma or a dot as separator
///
/// Climatology extracts use the French decimal comma ("12,3"). Only the first comma is
/// replaced before parsing, matching how the upstream files are written. Blank, non-numeric
/// and non-finite values yield `None`.
///
/// # Examples
///
/// ```
/// use rain_verdict_service::utils::parse_decimal;
///
/// assert_eq!(parse_decimal("12,3"), Some(12.3));
/// assert_eq!(parse_decimal("12.3"), Some(12.3));
/// assert_eq!(parse_decimal(" 0,0 "), Some(0.0));
/// assert_eq!(parse_decimal(""), None);
/// assert_eq!(parse_decimal("mq"), None);
/// ```
pub fn parse_decimal(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = trimmed.replacen(',', ".", 1);
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Extract an 8-digit station ID from a string that may contain additional text
///
/// Station identifiers are 8 digits (2-digit departement + 3-digit commune + 3-digit
/// station). Station pickers often label them as "74211002 - PERS-JUSSY" or
/// "PERS-JUSSY (74211002)", so the first 8-digit token wins.
///
/// # Examples
///
/// ```
/// use rain_verdict_service::utils::extract_station_id;
///
/// assert_eq!(extract_station_id("74211002").unwrap(), "74211002");
/// assert_eq!(extract_station_id("74211002 - PERS-JUSSY").unwrap(), "74211002");
/// assert_eq!(extract_station_id("PERS-JUSSY (74211002)").unwrap(), "74211002");
/// ```
pub fn extract_station_id(value: &str) -> Result<String, &'static str> {
    for part in value.split(|c: char| !c.is_ascii_digit()) {
        if part.len() == 8 {
            return Ok(part.to_string());
        }
    }

    Err("No valid 8 digit station ID found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_comma_and_dot_agree() {
        assert_eq!(parse_decimal("12,3"), parse_decimal("12.3"));
        assert_eq!(parse_decimal("12,3"), Some(12.3));
    }

    #[test]
    fn test_parse_decimal_only_first_comma_replaced() {
        // "1.234,5" would need locale-aware grouping; the source never writes it
        assert_eq!(parse_decimal("1,2,3"), None);
    }

    #[test]
    fn test_parse_decimal_negative() {
        assert_eq!(parse_decimal("-3,5"), Some(-3.5));
    }

    #[test]
    fn test_parse_decimal_rejects_non_finite() {
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("inf"), None);
    }

    #[test]
    fn test_parse_decimal_blank() {
        assert_eq!(parse_decimal("   "), None);
    }

    #[test]
    fn test_extract_station_id_clean() {
        assert_eq!(extract_station_id("74211002").unwrap(), "74211002");
    }

    #[test]
    fn test_extract_station_id_with_label() {
        assert_eq!(
            extract_station_id("74056001 - CHAMONIX").unwrap(),
            "74056001"
        );
    }

    #[test]
    fn test_extract_station_id_too_short() {
        assert!(extract_station_id("7421100").is_err());
    }

    #[test]
    fn test_extract_station_id_too_long() {
        assert!(extract_station_id("742110021").is_err());
    }

    #[test]
    fn test_extract_station_id_non_numeric() {
        assert!(extract_station_id("JUSSY").is_err());
    }
}
