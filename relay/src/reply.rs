//! Reply text for the host.

use convrelay_common::{ConversionRequest, ConversionResult};
use convrelay_units::{UnitCatalog, UnitCategory};

use crate::error::RelayError;

/// Format the outcome of a conversion request.
///
/// Unit results keep four decimals, currency results two.
pub fn format_reply(request: &ConversionRequest, result: &ConversionResult) -> String {
    let from = request.from.to_uppercase();
    let to = request.to.to_uppercase();

    match result {
        ConversionResult::Unit(value) => {
            format!("{} {} = {:.4} {}", request.amount, from, value, to)
        }
        ConversionResult::Currency(value) => {
            format!("{} {} = {:.2} {}", request.amount, from, value, to)
        }
        ConversionResult::Failed(_) => format!(
            "Could not convert {} to {}.\nCheck the spelling of the units or currencies, or try /help.",
            from, to
        ),
        ConversionResult::Unrecognized => format!(
            "Could not recognize units/currencies: '{}' or '{}'.\nCheck the spelling or try /help.",
            request.from, request.to
        ),
    }
}

/// Reply for input that could not be turned into a request.
pub fn error_reply(error: &RelayError) -> String {
    match error {
        RelayError::MalformedCommand { .. } => usage_text(),
        RelayError::InvalidAmount { amount } => {
            format!("Error: '{}' is not a valid number.", amount)
        }
        RelayError::UnknownCommand { .. } => {
            "Sorry, I don't understand that command. Try /help.".to_string()
        }
        RelayError::Config(message) => format!("Relay misconfigured: {}", message),
    }
}

/// Usage hint for malformed commands.
pub fn usage_text() -> String {
    [
        "Invalid command format.",
        "Use: /convert <amount> <from> to <to>",
        "Example: /convert 100 USD to UAH",
        "Try /help for more.",
    ]
    .join("\n")
}

/// Greeting for `/start`.
pub fn start_text() -> String {
    [
        "Hi! I convert currencies and units of measurement.",
        "",
        "Send a message in the format:",
        "/convert <amount> <from> to <to>",
        "",
        "Examples:",
        "/convert 100 USD to UAH",
        "/convert 5 km to m",
        "/convert 10 kg to lb",
        "",
        "Use /help for details.",
    ]
    .join("\n")
}

/// Help text listing the supported units per category.
pub fn help_text(catalog: &UnitCatalog) -> String {
    let mut lines = vec![
        "Send a command in the format:".to_string(),
        "/convert <amount> <from> to <to>".to_string(),
        String::new(),
        "Examples:".to_string(),
        "  /convert 100 USD to UAH   (currency)".to_string(),
        "  /convert 5 km to m        (length)".to_string(),
        "  /convert 10 kg to lb      (mass)".to_string(),
        "  /convert 2.5 l to ml      (volume)".to_string(),
        String::new(),
        "Currencies: any three-letter code known to the rate provider (USD, EUR, UAH, GBP, PLN, ...).".to_string(),
        String::new(),
        "Units:".to_string(),
    ];

    for category in UnitCategory::all() {
        let units: Vec<&str> = catalog.units_in(*category).collect();
        lines.push(format!("  {}: {}", capitalize(category.name()), units.join(", ")));
    }

    lines.push(String::new());
    lines.push("Units only convert within one category (meters to kilometers, not kilograms to meters).".to_string());
    lines.join("\n")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convrelay_common::FailureReason;

    #[test]
    fn test_unit_reply() {
        let request = ConversionRequest::new(7.32, "m", "yd");
        let reply = format_reply(&request, &ConversionResult::Unit(7.32 / 0.9144));
        assert_eq!(reply, "7.32 M = 8.0052 YD");
    }

    #[test]
    fn test_currency_reply() {
        let request = ConversionRequest::new(100.0, "usd", "uah");
        let reply = format_reply(&request, &ConversionResult::Currency(3950.0));
        assert_eq!(reply, "100 USD = 3950.00 UAH");
    }

    #[test]
    fn test_failure_replies() {
        let request = ConversionRequest::new(1.0, "eur", "gbp");
        let failed = format_reply(
            &request,
            &ConversionResult::Failed(FailureReason::CurrencyNotResolved),
        );
        assert!(failed.starts_with("Could not convert EUR to GBP."));

        let request = ConversionRequest::new(1.0, "foo", "bars");
        let unrecognized = format_reply(&request, &ConversionResult::Unrecognized);
        assert!(unrecognized.contains("'foo' or 'bars'"));
    }

    #[test]
    fn test_error_replies() {
        let reply = error_reply(&RelayError::InvalidAmount {
            amount: "ten".to_string(),
        });
        assert_eq!(reply, "Error: 'ten' is not a valid number.");

        let reply = error_reply(&RelayError::MalformedCommand {
            input: "100 USD".to_string(),
        });
        assert_eq!(reply, usage_text());
    }

    #[test]
    fn test_help_lists_catalog() {
        let help = help_text(&UnitCatalog::standard());
        assert!(help.contains("Length: mm, cm, m, km, in, ft, yd, mi"));
        assert!(help.contains("Mass: mg, g, kg, t, oz, lb"));
        assert!(help.contains("Volume: ml, l, m3, gal"));
    }
}
