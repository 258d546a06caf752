use std::collections::HashMap;

/// Injected lookup table from normalized provider keys to image references.
/// Misses fall back to the default image, which also serves as the
/// placeholder for newly created additive records.
#[derive(Debug, Clone)]
pub struct ImageTable {
    entries: HashMap<String, String>,
    default_image: String,
}

impl ImageTable {
    pub fn new(entries: HashMap<String, String>, default_image: impl Into<String>) -> Self {
        Self {
            entries,
            default_image: default_image.into(),
        }
    }

    /// key shape: `{type}_{name}_{location}`
    pub fn provider_image(&self, kind: &str, name: &str, location: &str) -> &str {
        let key = normalize_key(&format!("{kind}_{name}_{location}"));
        self.entries
            .get(&key)
            .map(String::as_str)
            .unwrap_or(&self.default_image)
    }

    pub fn default_image(&self) -> &str {
        &self.default_image
    }
}

/// lowercased, separators to `_`, german umlauts transliterated
pub fn normalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    for ch in raw.to_lowercase().chars() {
        match ch {
            'ä' => key.push_str("ae"),
            'ö' => key.push_str("oe"),
            'ü' => key.push_str("ue"),
            'ß' => key.push_str("ss"),
            ' ' | '-' => key.push('_'),
            _ => key.push(ch),
        }
    }

    key
}
