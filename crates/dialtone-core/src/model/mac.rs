// Hardware addresses and their text forms.
//
// A `MacAddr` always holds 12 lowercase hex digits internally; every
// accepted input form (colons, dashes, Cisco dot-triplets, mixed case,
// surrounding whitespace) is normalized away on parse and reproduced on
// demand by `format`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A canonicalized 48-bit hardware address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr(String);

/// Output styles for [`MacAddr::format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MacStyle {
    /// `001565aabbcc`
    Bare,
    /// `00:15:65:aa:bb:cc`
    Colon,
    /// `00-15-65-aa-bb-cc`
    Dash,
    /// `0015.65aa.bbcc`
    Dot,
}

impl MacAddr {
    /// Parse any accepted text form into the canonical representation.
    ///
    /// Strips `:`/`-`/`.` separators and surrounding whitespace, then
    /// lowercases; anything that does not reduce to exactly 12 hex
    /// digits is rejected.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let canonical: String = input
            .trim()
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if canonical.len() != 12 || !canonical.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidMac {
                input: input.trim().to_owned(),
            });
        }
        Ok(Self(canonical))
    }

    /// Canonical form: 12 lowercase hex digits, no separators.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Vendor prefix: the first six hex digits, uppercase.
    pub fn oui(&self) -> String {
        self.0[..6].to_ascii_uppercase()
    }

    /// Render the address in the requested style.
    pub fn format(&self, style: MacStyle, uppercase: bool) -> String {
        let digits = if uppercase {
            self.0.to_ascii_uppercase()
        } else {
            self.0.clone()
        };
        match style {
            MacStyle::Bare => digits,
            MacStyle::Colon => join_groups(&digits, 2, ':'),
            MacStyle::Dash => join_groups(&digits, 2, '-'),
            MacStyle::Dot => join_groups(&digits, 4, '.'),
        }
    }
}

fn join_groups(digits: &str, group: usize, separator: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / group);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && i % group == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddr {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MacAddr {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MacAddr> for String {
    fn from(mac: MacAddr) -> Self {
        mac.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_every_accepted_form() {
        let forms = [
            "001565aabbcc",
            "001565AABBCC",
            "00:15:65:aa:bb:cc",
            "00:15:65:AA:BB:CC",
            "00-15-65-aa-bb-cc",
            "0015.65aa.bbcc",
            "0015.65AA.BBCC",
            "  001565aabbcc  ",
        ];
        for form in forms {
            let mac = MacAddr::parse(form).unwrap();
            assert_eq!(mac.as_str(), "001565aabbcc", "from {form:?}");
        }
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        let bad = [
            "",
            "001565aabbc",
            "001565aabbccdd",
            "001565aabbcg",
            "00:15:65",
            "not a mac!!",
        ];
        for input in bad {
            assert!(MacAddr::parse(input).is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn test_oui_is_uppercase_prefix() {
        let mac = MacAddr::parse("80:5e:0c:11:22:33").unwrap();
        assert_eq!(mac.oui(), "805E0C");
    }

    #[test]
    fn test_format_styles() {
        let mac = MacAddr::parse("001565aabbcc").unwrap();
        assert_eq!(mac.format(MacStyle::Bare, false), "001565aabbcc");
        assert_eq!(mac.format(MacStyle::Colon, false), "00:15:65:aa:bb:cc");
        assert_eq!(mac.format(MacStyle::Dash, true), "00-15-65-AA-BB-CC");
        assert_eq!(mac.format(MacStyle::Dot, false), "0015.65aa.bbcc");
    }

    #[test]
    fn test_display_is_bare_canonical() {
        let mac = MacAddr::parse("0C:38:3E:01:02:03").unwrap();
        assert_eq!(mac.to_string(), "0c383e010203");
    }

    #[test]
    fn test_yaml_round_trip_normalizes() {
        let mac: MacAddr = serde_yaml::from_str("00:15:65:AA:BB:CC").unwrap();
        assert_eq!(mac.as_str(), "001565aabbcc");
        assert_eq!(serde_yaml::to_string(&mac).unwrap().trim(), "001565aabbcc");
    }

    #[test]
    fn test_yaml_rejects_malformed_address() {
        let result: Result<MacAddr, _> = serde_yaml::from_str("not-a-mac");
        assert!(result.is_err());
    }
}
