use serde::{Deserialize, Serialize};

/// An entity type classification split on `::` into up to four levels,
/// e.g. `Framework::Backend::Python` becomes
/// `(type_primary="Framework", type_sub1=Some("Backend"), type_sub2=Some("Python"))`.
///
/// `type_full` is always the canonical `::`-joined reconstruction, kept
/// alongside the split levels so graph queries can index on either shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchicalType {
    pub type_primary: String,
    pub type_sub1: Option<String>,
    pub type_sub2: Option<String>,
    pub type_sub3: Option<String>,
    pub type_full: String,
}

impl HierarchicalType {
    /// Parses a raw `type` label (as emitted by the LLM or NER model) into
    /// its hierarchy levels. An empty or whitespace-only label becomes the
    /// `Unknown` primary type rather than an empty string, so downstream
    /// indexes never see a blank `type_primary`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let mut levels = trimmed
            .split("::")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let type_primary = levels.next().unwrap_or_else(|| "Unknown".to_string());
        let type_sub1 = levels.next();
        let type_sub2 = levels.next();
        let type_sub3 = levels.next();

        let mut parts = vec![type_primary.clone()];
        parts.extend(type_sub1.clone());
        parts.extend(type_sub2.clone());
        parts.extend(type_sub3.clone());
        let type_full = parts.join("::");

        Self {
            type_primary,
            type_sub1,
            type_sub2,
            type_sub3,
            type_full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_four_levels() {
        let parsed = HierarchicalType::parse("Framework::Backend::Python::Django");
        assert_eq!(parsed.type_primary, "Framework");
        assert_eq!(parsed.type_sub1.as_deref(), Some("Backend"));
        assert_eq!(parsed.type_sub2.as_deref(), Some("Python"));
        assert_eq!(parsed.type_sub3.as_deref(), Some("Django"));
        assert_eq!(parsed.type_full, "Framework::Backend::Python::Django");
    }

    #[test]
    fn extra_levels_beyond_four_are_dropped_from_splits_but_full_reflects_only_kept_levels() {
        let parsed = HierarchicalType::parse("A::B::C::D::E");
        assert_eq!(parsed.type_full, "A::B::C::D");
    }

    #[test]
    fn single_level_has_no_subs() {
        let parsed = HierarchicalType::parse("Technology");
        assert_eq!(parsed.type_primary, "Technology");
        assert!(parsed.type_sub1.is_none());
        assert_eq!(parsed.type_full, "Technology");
    }

    #[test]
    fn blank_label_becomes_unknown() {
        let parsed = HierarchicalType::parse("   ");
        assert_eq!(parsed.type_primary, "Unknown");
        assert_eq!(parsed.type_full, "Unknown");
    }
}
