//! Unit conversion and display formatting.
//!
//! Ledger amounts are integers in base units (10^18 per whole token). Conversion to and
//! from decimal strings is exact; floating point only enters for percentages and
//! display-currency formatting.

use crate::{
    config::CurrencySettings,
    errors::{Error, Result},
};
use alloy::primitives::U256;

/// Fractional digits of the native token.
pub const ETHER_DECIMALS: u8 = 18;
/// Fractional digits of a gwei amount expressed in wei.
pub const GWEI_DECIMALS: u8 = 9;

/// Parses an unsigned decimal string into base units with `decimals` fractional digits.
///
/// # Errors
/// Returns [`Error::Parse`] for empty input, signs, exponents, non-digit characters,
/// more fractional digits than `decimals`, or values that overflow 256 bits.
pub fn parse_units(input: &str, decimals: u8) -> Result<U256> {
    let fail = |reason: String| Error::Parse {
        input: input.to_string(),
        reason,
    };

    let trimmed = input.trim();
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(fail("no digits".to_string()));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(fail("expected an unsigned decimal number".to_string()));
    }
    let width = usize::from(decimals);
    if fraction.len() > width {
        return Err(fail(format!("more than {decimals} fractional digits")));
    }

    let digits = format!("{whole}{fraction:0<width$}");
    U256::from_str_radix(&digits, 10).map_err(|e| fail(e.to_string()))
}

/// Parses a native token amount (18 decimals).
pub fn parse_ether(input: &str) -> Result<U256> {
    parse_units(input, ETHER_DECIMALS)
}

/// Formats base units as a decimal string with trailing zeros trimmed, keeping at
/// least one fractional digit (`1000000000000000000` → `"1.0"`).
#[must_use]
pub fn format_units(amount: U256, decimals: u8) -> String {
    let base = U256::from(10u8).pow(U256::from(decimals));
    let whole = amount / base;
    let fraction = (amount % base).to_string();
    let padded = format!("{fraction:0>width$}", width = usize::from(decimals));
    let trimmed = padded.trim_end_matches('0');
    if trimmed.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{trimmed}")
    }
}

/// Formats a native token amount (18 decimals).
#[must_use]
pub fn format_ether(amount: U256) -> String {
    format_units(amount, ETHER_DECIMALS)
}

/// Native token amount as a float, for percentages and display only.
#[must_use]
pub fn ether_to_f64(amount: U256) -> f64 {
    format_ether(amount).parse().unwrap_or(0.0)
}

/// `part / whole * 100`, or 0 when `whole` is zero.
#[must_use]
pub fn percent_of(part: U256, whole: U256) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    ether_to_f64(part) / ether_to_f64(whole) * 100.0
}

/// Converts native token amounts into the display currency at a fixed rate.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyConverter {
    symbol: String,
    rate: f64,
}

impl CurrencyConverter {
    /// Creates a converter with a display symbol and a native → display rate.
    #[must_use]
    pub fn new(symbol: impl Into<String>, rate: f64) -> Self {
        Self {
            symbol: symbol.into(),
            rate,
        }
    }

    /// Display symbol, e.g. `"RM"`.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Native → display multiplier.
    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// Native amount converted to display currency.
    #[must_use]
    pub fn to_display(&self, native: f64) -> f64 {
        native * self.rate
    }

    /// Formats a native amount in display currency, collapsing thousands and millions.
    ///
    /// With decimals: `RM 1.50M`, `RM 4.5K`, `RM 12.00`. Without: `RM 2M`, `RM 5K`, `RM 12`.
    /// Non-finite input formats as zero.
    #[must_use]
    pub fn format(&self, native: f64, show_decimals: bool) -> String {
        let symbol = &self.symbol;
        if !native.is_finite() {
            return format!("{symbol} 0.00");
        }
        let display = self.to_display(native);

        if show_decimals {
            if display >= 1_000_000.0 {
                format!("{symbol} {:.2}M", display / 1_000_000.0)
            } else if display >= 1_000.0 {
                format!("{symbol} {:.1}K", display / 1_000.0)
            } else {
                format!("{symbol} {display:.2}")
            }
        } else if display >= 1_000_000.0 {
            format!("{symbol} {}M", (display / 1_000_000.0).round())
        } else if display >= 1_000.0 {
            format!("{symbol} {}K", (display / 1_000.0).round())
        } else {
            format!("{symbol} {}", display.round())
        }
    }

    /// Formats a decimal native amount string; unparseable input formats as zero.
    #[must_use]
    pub fn format_str(&self, native: &str, show_decimals: bool) -> String {
        self.format(native.trim().parse().unwrap_or(f64::NAN), show_decimals)
    }

    /// Formats base units in display currency.
    #[must_use]
    pub fn format_units(&self, amount: U256, show_decimals: bool) -> String {
        self.format(ether_to_f64(amount), show_decimals)
    }
}

impl From<&CurrencySettings> for CurrencyConverter {
    fn from(settings: &CurrencySettings) -> Self {
        Self::new(settings.symbol.clone(), settings.rate)
    }
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self::from(&CurrencySettings::default())
    }
}

/// Percentage with one decimal place, e.g. `"68.6%"`.
#[must_use]
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

/// Rating with one decimal place and a star, e.g. `"4.5⭐"`.
#[must_use]
pub fn format_rating(value: f64) -> String {
    format!("{value:.1}⭐")
}
