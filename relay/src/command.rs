//! Command parsing.
//!
//! Accepted conversion syntax is `[/convert] <amount> <from> to <to>`.
//! The amount may use `,` as the decimal separator.

use convrelay_common::ConversionRequest;

use crate::error::{RelayError, RelayResult};

const CONVERT: &str = "/convert";
const START: &str = "/start";
const HELP: &str = "/help";

/// A parsed line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Greeting.
    Start,
    /// Usage and supported units.
    Help,
    /// Conversion request.
    Convert(ConversionRequest),
}

/// Parse any input line into a command.
pub fn parse(text: &str) -> RelayResult<Command> {
    let trimmed = text.trim();
    let Some(first) = trimmed.split_whitespace().next() else {
        return Err(RelayError::MalformedCommand {
            input: trimmed.to_string(),
        });
    };

    if !first.starts_with('/') {
        return parse_command(trimmed).map(Command::Convert);
    }

    match first.to_ascii_lowercase().as_str() {
        START => Ok(Command::Start),
        HELP => Ok(Command::Help),
        CONVERT => parse_command(trimmed).map(Command::Convert),
        _ => Err(RelayError::UnknownCommand {
            command: first.to_string(),
        }),
    }
}

/// Parse a conversion command into a request.
pub fn parse_command(text: &str) -> RelayResult<ConversionRequest> {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    if words
        .first()
        .is_some_and(|word| word.eq_ignore_ascii_case(CONVERT))
    {
        words.remove(0);
    }

    let [amount, from, keyword, to] = words.as_slice() else {
        return Err(malformed(text));
    };
    if !keyword.eq_ignore_ascii_case("to") {
        return Err(malformed(text));
    }

    let amount = parse_amount(amount)?;
    Ok(ConversionRequest::new(amount, *from, *to))
}

fn parse_amount(token: &str) -> RelayResult<f64> {
    token
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| RelayError::InvalidAmount {
            amount: token.to_string(),
        })
}

fn malformed(text: &str) -> RelayError {
    RelayError::MalformedCommand {
        input: text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert() {
        let request = parse_command("/convert 100 USD to UAH").unwrap();
        assert_eq!(request.amount, 100.0);
        assert_eq!(request.from, "USD");
        assert_eq!(request.to, "UAH");
    }

    #[test]
    fn test_prefix_is_optional() {
        let request = parse_command("  7.32 m TO yd ").unwrap();
        assert_eq!(request.amount, 7.32);
        assert_eq!(request.from, "m");
        assert_eq!(request.to, "yd");
    }

    #[test]
    fn test_comma_decimal_separator() {
        let request = parse_command("/convert 2,5 l to ml").unwrap();
        assert_eq!(request.amount, 2.5);
    }

    #[test]
    fn test_malformed() {
        for text in ["", "/convert", "100 USD UAH", "100 USD into UAH", "1 2 to 3 4"] {
            assert!(
                matches!(parse_command(text), Err(RelayError::MalformedCommand { .. })),
                "{text:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_invalid_amount() {
        for amount in ["abc", "inf", "NaN", "1.2.3"] {
            let text = format!("/convert {amount} kg to lb");
            assert_eq!(
                parse_command(&text),
                Err(RelayError::InvalidAmount {
                    amount: amount.to_string()
                })
            );
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("/start"), Ok(Command::Start));
        assert_eq!(parse("/HELP"), Ok(Command::Help));
        assert!(matches!(parse("5 km to m"), Ok(Command::Convert(_))));
        assert!(matches!(parse("/convert 5 km to m"), Ok(Command::Convert(_))));
        assert_eq!(
            parse("/weather kyiv"),
            Err(RelayError::UnknownCommand {
                command: "/weather".to_string()
            })
        );
        assert!(matches!(parse("   "), Err(RelayError::MalformedCommand { .. })));
    }
}
