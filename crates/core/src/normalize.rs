use crate::error::IngestError;
use regex::Regex;

/// Characters that survive normalization: ASCII letters and digits, Hangul syllables,
/// CJK ideographs, whitespace and a fixed punctuation set.
const DISALLOWED_CHARACTERS: &str =
    r#"[^A-Za-z0-9가-힣一-龥.?!,()~‘’“”":%&《》〈〉'㈜·\-+\s]"#;

#[derive(Debug, Clone)]
pub struct TextNormalizer {
    disallowed: Regex,
    whitespace: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self, IngestError> {
        Ok(Self {
            disallowed: Regex::new(DISALLOWED_CHARACTERS)?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    pub fn normalize(&self, raw: &str) -> String {
        let spaced = raw.replace('\n', " ").replace("\\n", " ").replace('#', " ");
        let filtered = self.disallowed.replace_all(&spaced, "");
        self.whitespace
            .replace_all(&filtered, " ")
            .trim()
            .to_string()
    }
}
