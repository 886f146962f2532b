// Copyright (c) 2024 The Botho Foundation

//! Amount parsing and display.

use anyhow::{anyhow, bail, Result};
use bth_staking_core::{Amount, UNITS_PER_TOKEN};

/// Number of decimal places in a whole token.
const TOKEN_DECIMALS: usize = 18;

/// Suffix marking a decimal token amount, e.g. `1.5tok`.
const TOKEN_SUFFIX: &str = "tok";

/// Parse either a raw integer in smallest units or a decimal token value
/// with a `tok` suffix.
pub fn parse_amount(s: &str) -> Result<Amount> {
    let s = s.trim();
    let Some(tokens) = s.strip_suffix(TOKEN_SUFFIX) else {
        return s
            .parse::<Amount>()
            .map_err(|e| anyhow!("Invalid amount '{}': {}", s, e));
    };

    let (whole, frac) = tokens.split_once('.').unwrap_or((tokens, ""));
    if whole.is_empty() && frac.is_empty() {
        bail!("Invalid amount '{}': no digits", s);
    }
    if frac.len() > TOKEN_DECIMALS {
        bail!(
            "Invalid amount '{}': at most {} decimal places",
            s,
            TOKEN_DECIMALS
        );
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        bail!("Invalid amount '{}': not a number", s);
    }

    let whole: Amount = if whole.is_empty() { 0 } else { whole.parse()? };
    let frac: Amount = if frac.is_empty() {
        0
    } else {
        format!("{:0<width$}", frac, width = TOKEN_DECIMALS).parse()?
    };

    whole
        .checked_mul(UNITS_PER_TOKEN)
        .and_then(|units| units.checked_add(frac))
        .ok_or_else(|| anyhow!("Invalid amount '{}': too large", s))
}

/// Render an amount as a decimal token value.
pub fn format_tokens(amount: Amount) -> String {
    let whole = amount / UNITS_PER_TOKEN;
    let frac = amount % UNITS_PER_TOKEN;
    if frac == 0 {
        return format!("{} {}", whole, TOKEN_SUFFIX);
    }

    let frac = format!("{:0width$}", frac, width = TOKEN_DECIMALS);
    format!("{}.{} {}", whole, frac.trim_end_matches('0'), TOKEN_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_raw_units() {
        assert_eq!(parse_amount("42").unwrap(), 42);
        assert_eq!(parse_amount(" 7 ").unwrap(), 7);
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!(parse_amount("1tok").unwrap(), UNITS_PER_TOKEN);
        assert_eq!(parse_amount("0.5tok").unwrap(), UNITS_PER_TOKEN / 2);
        assert_eq!(parse_amount(".25tok").unwrap(), UNITS_PER_TOKEN / 4);
        assert_eq!(
            parse_amount("2.000000000000000001tok").unwrap(),
            2 * UNITS_PER_TOKEN + 1
        );
        assert!(parse_amount("0.0000000000000000001tok").is_err());
        assert!(parse_amount("tok").is_err());
        assert!(parse_amount("1.-5tok").is_err());
    }

    #[test]
    fn test_format_tokens() {
        assert_eq!(format_tokens(UNITS_PER_TOKEN), "1 tok");
        assert_eq!(format_tokens(UNITS_PER_TOKEN / 2), "0.5 tok");
        assert_eq!(format_tokens(3 * UNITS_PER_TOKEN + 1), "3.000000000000000001 tok");
        assert_eq!(format_tokens(0), "0 tok");
    }
}
