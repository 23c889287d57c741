//! Human-readable capacity strings ("512B", "1KB", "64MB", "2GB").

use crate::error::{CacheError, Result};

/// Parses a capacity string into bytes. Units are binary (1KB = 1024 bytes);
/// a bare number is taken as bytes.
pub fn parse_capacity(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);

    if digits.is_empty() {
        return Err(CacheError::Config(format!(
            "capacity '{}' must start with a number",
            input
        )));
    }

    let amount: u64 = digits
        .parse()
        .map_err(|_| CacheError::Config(format!("capacity '{}' is out of range", input)))?;

    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1024,
        "MB" | "M" => 1024 * 1024,
        "GB" | "G" => 1024 * 1024 * 1024,
        other => {
            return Err(CacheError::Config(format!(
                "unknown capacity unit '{}' in '{}'",
                other, input
            )))
        }
    };

    let bytes = amount
        .checked_mul(multiplier)
        .ok_or_else(|| CacheError::Config(format!("capacity '{}' overflows", input)))?;

    if bytes == 0 {
        return Err(CacheError::Config(format!(
            "capacity '{}' must be greater than zero",
            input
        )));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_capacity("512").unwrap(), 512);
        assert_eq!(parse_capacity("512B").unwrap(), 512);
        assert_eq!(parse_capacity("1KB").unwrap(), 1024);
        assert_eq!(parse_capacity("64mb").unwrap(), 64 * 1024 * 1024);
        assert_eq!(parse_capacity(" 2 GB ").unwrap(), 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(parse_capacity("KB"), Err(CacheError::Config(_))));
        assert!(matches!(parse_capacity("10TB"), Err(CacheError::Config(_))));
        assert!(matches!(parse_capacity("0MB"), Err(CacheError::Config(_))));
        assert!(matches!(parse_capacity(""), Err(CacheError::Config(_))));
        assert!(matches!(
            parse_capacity("99999999999999999999GB"),
            Err(CacheError::Config(_))
        ));
    }
}
