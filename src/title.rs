use std::sync::OnceLock;

use regex::Regex;

/// Fields extracted from a calendar event title.
///
/// Grammar: `Artist | Event, Location SUB Substitute`, with precedence
/// `|` first, then the LAST `,`, then the whole word `SUB`. A missing
/// delimiter yields an empty field, never an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTitle {
    pub artist: String,
    pub event: String,
    pub location: String,
    pub substitute: String,
}

fn sub_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bSUB\b").unwrap())
}

pub fn parse_title(title: &str) -> ParsedTitle {
    let mut parsed = ParsedTitle::default();
    let title = title.trim();
    if title.is_empty() {
        return parsed;
    }

    let rest = match title.split_once('|') {
        Some((artist, rest)) => {
            parsed.artist = artist.trim().to_string();
            rest.trim()
        }
        None => {
            parsed.artist = title.to_string();
            ""
        }
    };

    let location_tail = match rest.rsplit_once(',') {
        Some((event, tail)) => {
            parsed.event = event.trim().to_string();
            tail.trim()
        }
        None => {
            parsed.event = rest.to_string();
            ""
        }
    };

    match sub_marker().find(location_tail) {
        Some(m) => {
            parsed.location = location_tail[..m.start()].trim().to_string();
            parsed.substitute = location_tail[m.end()..].trim().to_string();
        }
        None => parsed.location = location_tail.to_string(),
    }

    parsed
}
