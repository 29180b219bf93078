use arrayvec::ArrayString;
use core::fmt::{self, Write};
use thiserror::Error;

/// Longest sentence permitted by the standard, including `$` and `\r\n`.
pub const MAX_SENTENCE_LENGTH: usize = 82;
/// Working capacity for sentence assembly.
pub const SENTENCE_CAPACITY: usize = 255;

pub type SentenceText = heapless::String<SENTENCE_CAPACITY>;
pub type SentenceId = ArrayString<8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SentenceError {
    #[error("sentence exceeds {SENTENCE_CAPACITY} bytes")]
    TooLong,
    #[error("sentence does not start with '$' or '!'")]
    MissingStart,
    #[error("sentence has no checksum delimiter")]
    MissingChecksum,
    #[error("checksum mismatch: computed {computed:02X}, sentence carries {stated:02X}")]
    BadChecksum { computed: u8, stated: u8 },
    #[error("sentence identifier is malformed")]
    BadIdentifier,
}

/// XOR of all bytes supplied. Pass the bytes strictly between `$` and `*`.
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Incremental sentence assembly: `$`, identifier, comma-separated fields,
/// then checksum and line ending on [`SentenceBuilder::finish`].
#[derive(Debug, Clone)]
pub struct SentenceBuilder {
    text: SentenceText,
}

impl SentenceBuilder {
    pub fn new(talker: &str, kind: &str) -> Result<Self, SentenceError> {
        let mut text = SentenceText::new();
        write!(text, "${}{}", talker, kind).map_err(|_| SentenceError::TooLong)?;
        Ok(Self { text })
    }

    pub fn push_field(&mut self, value: impl fmt::Display) -> Result<&mut Self, SentenceError> {
        write!(self.text, ",{}", value).map_err(|_| SentenceError::TooLong)?;
        Ok(self)
    }

    pub fn finish(mut self) -> Result<SentenceText, SentenceError> {
        let sum = checksum(&self.text.as_bytes()[1..]);
        write!(self.text, "*{:02X}\r\n", sum).map_err(|_| SentenceError::TooLong)?;
        Ok(self.text)
    }
}

/// An angle split for degrees-and-minutes output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleParts {
    pub degrees: u32,
    pub minutes: f64,
    /// True for north/east, false for south/west.
    pub positive: bool,
}

impl AngleParts {
    pub fn hemisphere(&self, positive: char, negative: char) -> char {
        if self.positive {
            positive
        } else {
            negative
        }
    }
}

/// Split signed decimal degrees into whole degrees, the fractional degree and a
/// hemisphere flag. The fraction is printed in the minutes slot unscaled, as
/// the logger firmware's sentences do.
pub fn format_angle(angle: f64) -> AngleParts {
    let magnitude = angle.abs();
    AngleParts {
        degrees: magnitude.trunc() as u32,
        minutes: magnitude - magnitude.trunc(),
        positive: angle >= 0.0,
    }
}

/// Seconds truncated to milliseconds so that `{:06.3}` never shows `60.000`.
pub fn clamp_seconds(seconds: f64) -> f64 {
    (seconds * 1000.0).floor() / 1000.0
}

/// Whether a finished sentence (including `\r\n`) fits the standard length.
pub fn within_standard_length(text: &str) -> bool {
    text.len() <= MAX_SENTENCE_LENGTH
}

/// A received sentence split into identifier and fields, checksum verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSentence<'a> {
    pub talker: &'a str,
    pub kind: &'a str,
    pub fields: Vec<&'a str>,
}

/// Check framing and checksum of a received sentence.
pub fn parse(text: &str) -> Result<ParsedSentence<'_>, SentenceError> {
    let line = text.trim_end_matches(['\r', '\n']);
    if line.len() > SENTENCE_CAPACITY {
        return Err(SentenceError::TooLong);
    }
    let body = line
        .strip_prefix('$')
        .or_else(|| line.strip_prefix('!'))
        .ok_or(SentenceError::MissingStart)?;
    let (payload, stated) = body.rsplit_once('*').ok_or(SentenceError::MissingChecksum)?;

    let stated = u8::from_str_radix(stated, 16).map_err(|_| SentenceError::MissingChecksum)?;
    let computed = checksum(payload.as_bytes());
    if computed != stated {
        return Err(SentenceError::BadChecksum { computed, stated });
    }

    let mut parts = payload.split(',');
    let identifier = parts.next().unwrap_or_default();
    if identifier.len() < 3 || !identifier.is_ascii() {
        return Err(SentenceError::BadIdentifier);
    }
    let (talker, kind) = identifier.split_at(identifier.len() - 3);

    Ok(ParsedSentence {
        talker,
        kind,
        fields: parts.collect(),
    })
}

/// Three-letter sentence type (e.g. `GGA` from `$GPGGA,...`), without checking
/// the checksum.
pub fn sentence_type(text: &str) -> Option<&str> {
    let body = text.strip_prefix('$').or_else(|| text.strip_prefix('!'))?;
    let identifier = body.split([',', '*']).next()?;
    if identifier.len() < 3 || !identifier.is_ascii() {
        return None;
    }
    Some(&identifier[identifier.len() - 3..])
}

/// Set of sentence types accepted for recording. An empty filter accepts all.
#[derive(Debug, Clone, Default)]
pub struct SentenceFilter {
    accepted: Vec<SentenceId>,
}

impl SentenceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: &str) -> Result<(), SentenceError> {
        let id = SentenceId::from(kind).map_err(|_| SentenceError::BadIdentifier)?;
        if !self.accepted.contains(&id) {
            self.accepted.push(id);
        }
        Ok(())
    }

    pub fn accepts(&self, text: &str) -> bool {
        if self.accepted.is_empty() {
            return true;
        }
        match sentence_type(text) {
            Some(kind) => self.accepted.iter().any(|id| id.as_str() == kind),
            None => false,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.accepted.iter().map(|id| id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dbt_checksum() {
        let sentence = "$SDDBT,1.0,f,2.0,M,3.0,F*";
        let expected = "SDDBT,1.0,f,2.0,M,3.0,F"
            .bytes()
            .fold(0u8, |acc, b| acc ^ b);

        assert_eq!(checksum(&sentence.as_bytes()[1..sentence.len() - 1]), expected);
    }

    #[test]
    fn test_builder_output_parses() {
        let mut builder = SentenceBuilder::new("SD", "DBT").unwrap();
        builder
            .push_field(format_args!("{:.1}", 1.0))
            .unwrap()
            .push_field("f")
            .unwrap();
        let text = builder.finish().unwrap();

        assert!(text.starts_with("$SDDBT,1.0,f*"));
        assert!(text.ends_with("\r\n"));
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.talker, "SD");
        assert_eq!(parsed.kind, "DBT");
        assert_eq!(parsed.fields, vec!["1.0", "f"]);
    }

    #[test]
    fn test_known_sentence_checksum() {
        let parsed = parse("$GPZDA,160012.71,11,03,2004,-1,00*7D\r\n").unwrap();
        assert_eq!(parsed.kind, "ZDA");
        assert!(matches!(
            parse("$GPZDA,160012.71,11,03,2004,-1,00*7E"),
            Err(SentenceError::BadChecksum { .. })
        ));
    }

    #[test]
    fn test_format_angle() {
        let north = format_angle(43.5);
        assert_eq!(north.degrees, 43);
        assert!((north.minutes - 0.5).abs() < 1e-9);
        assert_eq!(north.hemisphere('N', 'S'), 'N');

        let west = format_angle(-75.25);
        assert_eq!(west.degrees, 75);
        assert!((west.minutes - 0.25).abs() < 1e-9);
        assert_eq!(west.hemisphere('E', 'W'), 'W');
    }

    #[test]
    fn test_format_angle_keeps_fraction_unscaled() {
        let north = format_angle(43.5);
        let west = format_angle(-75.25);
        let text = format!(
            "{:02}{:09.6},{:03}{:09.6}",
            north.degrees, north.minutes, west.degrees, west.minutes
        );
        assert_eq!(text, "4300.500000,07500.250000");
    }

    #[test]
    fn test_filter() {
        let mut filter = SentenceFilter::new();
        assert!(filter.accepts("$GPGGA,x*00"));

        filter.add("GGA").unwrap();
        filter.add("ZDA").unwrap();
        assert!(filter.accepts("$GPGGA,123519*00"));
        assert!(filter.accepts("$INZDA,1*00"));
        assert!(!filter.accepts("$SDDBT,1.0*00"));
        assert!(!filter.accepts("garbage"));
    }
}
