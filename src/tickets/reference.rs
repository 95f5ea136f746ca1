use std::fmt;
use std::str::FromStr;

/// How a user points at a ticket: its row id (`12`, `#12`) or its printed
/// number (`T202409-0001`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TicketRef {
    Id(i64),
    Number(String),
}

impl TicketRef {
    /// `T` + `YYYYMM` + `-` + four or more digits, any case.
    fn looks_like_number(text: &str) -> bool {
        let bytes = text.as_bytes();
        bytes.len() >= 12
            && bytes[0].eq_ignore_ascii_case(&b'T')
            && bytes[1..7].iter().all(u8::is_ascii_digit)
            && bytes[7] == b'-'
            && bytes[8..].iter().all(u8::is_ascii_digit)
    }
}

impl From<i64> for TicketRef {
    fn from(id: i64) -> Self {
        TicketRef::Id(id)
    }
}

impl From<&TicketRef> for TicketRef {
    fn from(reference: &TicketRef) -> Self {
        reference.clone()
    }
}

impl FromStr for TicketRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if TicketRef::looks_like_number(text) {
            return Ok(TicketRef::Number(text.to_ascii_uppercase()));
        }
        match text.trim_start_matches('#').parse::<i64>() {
            Ok(id) if id > 0 => Ok(TicketRef::Id(id)),
            _ => Err(format!("invalid ticket reference: {}", s)),
        }
    }
}

impl fmt::Display for TicketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketRef::Id(id) => write!(f, "#{}", id),
            TicketRef::Number(number) => f.write_str(number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids_and_numbers() {
        assert_eq!("12".parse::<TicketRef>(), Ok(TicketRef::Id(12)));
        assert_eq!("#12".parse::<TicketRef>(), Ok(TicketRef::Id(12)));
        assert_eq!(
            "t202409-0001".parse::<TicketRef>(),
            Ok(TicketRef::Number("T202409-0001".to_string()))
        );
        assert_eq!(
            "T202409-12345".parse::<TicketRef>(),
            Ok(TicketRef::Number("T202409-12345".to_string()))
        );
    }

    #[test]
    fn test_rejects_garbage() {
        for text in ["", "#", "abc", "0", "-3", "T2024-0001", "T202409_0001", "T202409-"] {
            assert!(text.parse::<TicketRef>().is_err(), "{}", text);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(TicketRef::Id(7).to_string(), "#7");
        assert_eq!(TicketRef::Number("T202409-0001".into()).to_string(), "T202409-0001");
    }
}
