use crate::error::{BundleError, Result};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Converts a byte count to binary megabytes.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Strictly greater: an archive of exactly the ceiling does not warn.
pub fn exceeds_ceiling(size_mb: f64, ceiling_mb: f64) -> bool {
    size_mb > ceiling_mb
}

/// Parse human-readable sizes in both binary (Ki/Mi/Gi) and decimal (KB/MB/GB) units.
/// Examples: "512Mi", "10Gi", "1MB", "500kb", "1024", "2.5GB"
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_ascii_lowercase();

    let (multiplier, number_str) = if s.ends_with("ki") {
        (1024_u64, &s[..s.len() - 2])
    } else if s.ends_with("mi") {
        (1024_u64.pow(2), &s[..s.len() - 2])
    } else if s.ends_with("gi") {
        (1024_u64.pow(3), &s[..s.len() - 2])
    } else if s.ends_with("kb") {
        (1000_u64, &s[..s.len() - 2])
    } else if s.ends_with("mb") {
        (1000_u64.pow(2), &s[..s.len() - 2])
    } else if s.ends_with("gb") {
        (1000_u64.pow(3), &s[..s.len() - 2])
    } else {
        (1_u64, s.as_str())
    };

    let number: f64 = number_str
        .trim()
        .parse()
        .map_err(|_| BundleError::InvalidSize(s.clone()))?;
    if !number.is_finite() || number < 0.0 {
        return Err(BundleError::InvalidSize(s));
    }

    Ok((number * multiplier as f64) as u64)
}

/// Convert bytes into a human-friendly string using binary (KiB, MiB, GiB...) units.
pub fn encode_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if (size * 10.0) % 10.0 == 0.0 {
        format!("{:.0} {}", size, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mb_is_binary() {
        assert_eq!(bytes_to_mb(40 * 1024 * 1024), 40.0);
        assert_eq!(bytes_to_mb(512 * 1024), 0.5);
    }

    #[test]
    fn ceiling_is_strict() {
        assert!(!exceeds_ceiling(40.0, 40.0));
        assert!(!exceeds_ceiling(bytes_to_mb(40 * 1024 * 1024), 40.0));
        assert!(exceeds_ceiling(bytes_to_mb(40 * 1024 * 1024 + 1), 40.0));
        assert!(!exceeds_ceiling(0.0, 40.0));
    }

    #[test]
    fn parses_binary_and_decimal_units() {
        assert_eq!(parse_size("40Mi").unwrap(), 40 * 1024 * 1024);
        assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
        assert_eq!(parse_size(" 2.5gi ").unwrap(), 2_684_354_560);
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert!(parse_size("lots").is_err());
        assert!(parse_size("-1Mi").is_err());
        assert!(parse_size("nan").is_err());
        assert!(parse_size("inf").is_err());
        assert!(parse_size("infMi").is_err());
    }

    #[test]
    fn encodes_sizes() {
        assert_eq!(encode_size(0), "0 B");
        assert_eq!(encode_size(1024), "1 KiB");
        assert_eq!(encode_size(1536), "1.5 KiB");
        assert_eq!(encode_size(40 * 1024 * 1024), "40 MiB");
    }
}
