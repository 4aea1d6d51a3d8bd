/// Placeholder name for a check line that carries only a phone.
pub const UNKNOWN_NAME: &str = "unknown";

/// One non-blank line of operator input: a phone followed by an optional name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLine {
    pub raw_phone: String,
    pub name: String,
}

/// Strips every character that is not an ASCII digit.
pub fn normalize(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Splits a line into phone and name. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<InputLine> {
    let mut tokens = line.split_whitespace();
    let raw_phone = tokens.next()?.to_string();
    let name = tokens.collect::<Vec<_>>().join(" ");
    Some(InputLine { raw_phone, name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_formatting() {
        assert_eq!(normalize("+38 (099) 123-45-67"), "380991234567");
        assert_eq!(normalize("tel:380.99.123"), "38099123");
        assert_eq!(normalize("no digits"), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["+380 99 111 11 11", "(050)-000", "", "12ab34"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn parse_line_collapses_whitespace_in_name() {
        let line = parse_line("  +380991234567   Ivan \t Franko  ").unwrap();
        assert_eq!(line.raw_phone, "+380991234567");
        assert_eq!(line.name, "Ivan Franko");
    }

    #[test]
    fn parse_line_phone_only_has_empty_name() {
        let line = parse_line("380991234567").unwrap();
        assert_eq!(line.raw_phone, "380991234567");
        assert!(line.name.is_empty());
    }

    #[test]
    fn parse_line_skips_blank_lines() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   \t "), None);
    }
}
