// Timedtext document parser
//
// Caption tracks are served as a small XML document:
//
//   <transcript>
//     <text start="0.5" dur="1.54">Hey there</text>
//     ...
//   </transcript>
//
// Element text is entity-encoded twice (XML, then HTML) and may carry inline markup.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::models::TranscriptSegment;
use crate::providers::ProviderError;

lazy_static! {
    static ref TEXT_ELEMENT_RE: Regex =
        Regex::new(r#"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)"#).expect("valid text element regex");
    static ref START_ATTR_RE: Regex =
        Regex::new(r#"\bstart="([^"]*)""#).expect("valid start attribute regex");
    static ref DUR_ATTR_RE: Regex =
        Regex::new(r#"\bdur="([^"]*)""#).expect("valid dur attribute regex");
    static ref TAG_RE: Regex =
        Regex::new(r"</?([A-Za-z][A-Za-z0-9]*)\b[^>]*>").expect("valid tag regex");
}

/// Inline tags kept when formatting is preserved
const FORMATTING_TAGS: [&str; 10] = [
    "strong", "em", "b", "i", "mark", "small", "del", "ins", "sub", "sup",
];

/// Parser for timedtext caption documents
#[derive(Debug, Clone, Copy, Default)]
pub struct TimedTextParser {
    preserve_formatting: bool,
}

impl TimedTextParser {
    pub fn new(preserve_formatting: bool) -> Self {
        Self {
            preserve_formatting,
        }
    }

    /// Parse a caption document into ordered segments
    ///
    /// Elements whose text is empty after cleanup are skipped.
    pub fn parse(&self, document: &str) -> Result<Vec<TranscriptSegment>, ProviderError> {
        if !document.contains("<transcript") {
            return Err(ProviderError::UnexpectedResponse(
                "caption document has no <transcript> root".to_string(),
            ));
        }

        let mut segments = Vec::new();
        for element in TEXT_ELEMENT_RE.captures_iter(document) {
            let attributes = element.get(1).map_or("", |m| m.as_str());
            let raw_text = element.get(2).map_or("", |m| m.as_str());

            let start = attribute(&START_ATTR_RE, attributes)
                .ok_or_else(|| {
                    ProviderError::UnexpectedResponse(format!(
                        "caption element without a valid start: <text{}>",
                        attributes
                    ))
                })?;
            let duration = attribute(&DUR_ATTR_RE, attributes).unwrap_or(0.0);

            let text = self.clean_text(raw_text);
            if text.trim().is_empty() {
                continue;
            }

            segments.push(TranscriptSegment {
                text,
                start,
                duration,
            });
        }

        Ok(segments)
    }

    fn clean_text(&self, raw: &str) -> String {
        let xml_decoded = html_escape::decode_html_entities(raw);
        let decoded = html_escape::decode_html_entities(&xml_decoded);

        let cleaned = TAG_RE.replace_all(&decoded, |caps: &Captures| {
            let tag = caps[1].to_ascii_lowercase();
            if self.preserve_formatting && FORMATTING_TAGS.contains(&tag.as_str()) {
                caps[0].to_string()
            } else {
                String::new()
            }
        });

        cleaned.into_owned()
    }
}

fn attribute(re: &Regex, attributes: &str) -> Option<f64> {
    re.captures(attributes)
        .and_then(|caps| caps[1].trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r##"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0.0" dur="1.54">[&amp;#39;Music&amp;#39;]</text>
<text start="18.8" dur="1.7">We&amp;#39;re no strangers to &lt;i&gt;love&lt;/i&gt;</text>
<text start="21.1" dur="4.4">You know the &lt;b&gt;rules&lt;/b&gt; and &lt;font color="#E5E5E5"&gt;so do I&lt;/font&gt;</text>
<text start="25.5"></text>
<text start="26.0" dur="0.5">   </text>
<text start="27.0">no duration</text>
</transcript>"##;

    #[test]
    fn test_parse_strips_markup_by_default() {
        let segments = TimedTextParser::new(false).parse(DOCUMENT).unwrap();

        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].text, "['Music']");
        assert_eq!(segments[0].start, 0.0);
        assert_eq!(segments[0].duration, 1.54);
        assert_eq!(segments[1].text, "We're no strangers to love");
        assert_eq!(segments[2].text, "You know the rules and so do I");
    }

    #[test]
    fn test_parse_preserves_formatting_tags_only() {
        let segments = TimedTextParser::new(true).parse(DOCUMENT).unwrap();

        assert_eq!(segments[1].text, "We're no strangers to <i>love</i>");
        assert_eq!(segments[2].text, "You know the <b>rules</b> and so do I");
    }

    #[test]
    fn test_missing_duration_defaults_to_zero() {
        let segments = TimedTextParser::default().parse(DOCUMENT).unwrap();
        let last = segments.last().unwrap();
        assert_eq!(last.text, "no duration");
        assert_eq!(last.start, 27.0);
        assert_eq!(last.duration, 0.0);
    }

    #[test]
    fn test_segments_keep_document_order() {
        let segments = TimedTextParser::default().parse(DOCUMENT).unwrap();
        let starts: Vec<f64> = segments.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0.0, 18.8, 21.1, 27.0]);
    }

    #[test]
    fn test_non_caption_document_is_rejected() {
        let err = TimedTextParser::default().parse("").unwrap_err();
        assert!(matches!(err, ProviderError::UnexpectedResponse(_)));

        let err = TimedTextParser::default()
            .parse("<html><body>Sorry</body></html>")
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_missing_start_is_rejected() {
        let err = TimedTextParser::default()
            .parse(r#"<transcript><text dur="1.0">hi</text></transcript>"#)
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_empty_transcript_has_no_segments() {
        let segments = TimedTextParser::default()
            .parse("<transcript></transcript>")
            .unwrap();
        assert!(segments.is_empty());
    }
}
