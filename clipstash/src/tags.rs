//! Tag categories and the custom tag registry
//!
//! Built-in categories resolve through an explicit name → style table; any
//! other name is a custom tag and gets the fallback style.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Reserved tag kept in sync with an item's favorite flag
pub const FAVORITES_TAG: &str = "Favorites";

const CUSTOM_TAG_ICON: &str = "tag";
const CUSTOM_TAG_COLOR: &str = "cyan";

/// Built-in semantic categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagCategory {
    Links,
    Code,
    Text,
    Apis,
    Passwords,
    Emails,
    Numbers,
    Images,
    Custom,
}

impl TagCategory {
    pub const ALL: [TagCategory; 9] = [
        TagCategory::Links,
        TagCategory::Code,
        TagCategory::Text,
        TagCategory::Apis,
        TagCategory::Passwords,
        TagCategory::Emails,
        TagCategory::Numbers,
        TagCategory::Images,
        TagCategory::Custom,
    ];

    /// Canonical tag name as stored on items
    pub fn name(self) -> &'static str {
        match self {
            TagCategory::Links => "Links",
            TagCategory::Code => "Code",
            TagCategory::Text => "Text",
            TagCategory::Apis => "APIs",
            TagCategory::Passwords => "Passwords",
            TagCategory::Emails => "Emails",
            TagCategory::Numbers => "Numbers",
            TagCategory::Images => "Images",
            TagCategory::Custom => "Custom",
        }
    }

    /// SF Symbol name
    pub fn icon(self) -> &'static str {
        match self {
            TagCategory::Links => "link",
            TagCategory::Code => "chevron.left.forwardslash.chevron.right",
            TagCategory::Text => "text.alignleft",
            TagCategory::Apis => "key",
            TagCategory::Passwords => "lock",
            TagCategory::Emails => "envelope",
            TagCategory::Numbers => "phone",
            TagCategory::Images => "photo",
            TagCategory::Custom => "tag",
        }
    }

    /// CSS color name
    pub fn color(self) -> &'static str {
        match self {
            TagCategory::Links => "blue",
            TagCategory::Code => "purple",
            TagCategory::Text => "gray",
            TagCategory::Apis => "orange",
            TagCategory::Passwords => "red",
            TagCategory::Emails => "green",
            TagCategory::Numbers => "cyan",
            TagCategory::Images => "pink",
            TagCategory::Custom => "yellow",
        }
    }

    /// Look up a built-in category by its canonical name
    pub fn from_name(name: &str) -> Option<TagCategory> {
        BUILTIN_STYLES.get(name).map(|(category, _)| *category)
    }
}

/// Display metadata for a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagStyle {
    pub icon: &'static str,
    pub color: &'static str,
    /// Color as 0xRRGGBBAA
    pub rgba: u32,
}

impl TagStyle {
    fn new(icon: &'static str, color: &'static str) -> Self {
        Self { icon, color, rgba: color_to_rgba(color) }
    }
}

static BUILTIN_STYLES: Lazy<HashMap<&'static str, (TagCategory, TagStyle)>> = Lazy::new(|| {
    TagCategory::ALL
        .iter()
        .map(|&c| (c.name(), (c, TagStyle::new(c.icon(), c.color()))))
        .collect()
});

static CUSTOM_STYLE: Lazy<TagStyle> = Lazy::new(|| TagStyle::new(CUSTOM_TAG_ICON, CUSTOM_TAG_COLOR));

/// Parse a CSS color to RGBA u32 (0xRRGGBBAA). Unparseable names map to opaque gray.
fn color_to_rgba(color: &str) -> u32 {
    match csscolorparser::parse(color) {
        Ok(parsed) => {
            let [r, g, b, a] = parsed.to_rgba8();
            ((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | (a as u32)
        }
        Err(_) => 0x808080FF,
    }
}

/// Resolve any tag name to its display style
pub fn tag_style(name: &str) -> TagStyle {
    BUILTIN_STYLES
        .get(name)
        .map(|(_, style)| *style)
        .unwrap_or(*CUSTOM_STYLE)
}

/// Built-in category names and the favorites tag can't be custom tags
pub fn is_reserved(name: &str) -> bool {
    name == FAVORITES_TAG || BUILTIN_STYLES.contains_key(name)
}

/// User-created tag names, in creation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRegistry {
    custom: Vec<String>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted names, dropping blanks and duplicates
    pub fn from_names<I: IntoIterator<Item = String>>(names: I) -> Self {
        let mut registry = Self::new();
        for name in names {
            registry.add(&name);
        }
        registry
    }

    /// Add a custom tag. Returns false for blank, reserved or already-known names.
    pub fn add(&mut self, name: &str) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty() || is_reserved(trimmed) || self.contains(trimmed) {
            return false;
        }
        self.custom.push(trimmed.to_string());
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.custom.len();
        self.custom.retain(|t| t != name);
        self.custom.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.custom.iter().any(|t| t == name)
    }

    pub fn custom_tags(&self) -> &[String] {
        &self.custom
    }

    pub fn style(&self, name: &str) -> TagStyle {
        tag_style(name)
    }

    /// Sorted union of built-in names, custom tags and the given item tags
    pub fn all_tags<'a, I>(&self, item_tags: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut all: Vec<String> = TagCategory::ALL
            .iter()
            .map(|c| c.name().to_string())
            .chain(self.custom.iter().cloned())
            .chain(item_tags.into_iter().map(str::to_string))
            .collect();
        all.sort();
        all.dedup();
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_style_lookup() {
        let style = tag_style("Links");
        assert_eq!(style.icon, "link");
        assert_eq!(style.color, "blue");
        assert_eq!(style.rgba, 0x0000FFFF);

        assert_eq!(tag_style("APIs").icon, "key");
        assert_eq!(TagCategory::from_name("Passwords"), Some(TagCategory::Passwords));
    }

    #[test]
    fn test_custom_tag_falls_back() {
        let style = tag_style("work");
        assert_eq!(style.icon, "tag");
        assert_eq!(style.color, "cyan");
        assert_eq!(style.rgba, 0x00FFFFFF);

        // Lookup is by exact canonical name
        assert_eq!(TagCategory::from_name("links"), None);
        assert_eq!(tag_style("links").icon, "tag");
    }

    #[test]
    fn test_registry_add_is_idempotent() {
        let mut registry = TagRegistry::new();
        assert!(registry.add("work"));
        assert!(!registry.add("work"));
        assert!(!registry.add("  work  "));
        assert!(!registry.add(""));
        assert!(!registry.add("   \n"));
        assert_eq!(registry.custom_tags(), &["work".to_string()]);
    }

    #[test]
    fn test_registry_rejects_reserved_names() {
        let mut registry = TagRegistry::new();
        assert!(!registry.add("Links"));
        assert!(!registry.add(FAVORITES_TAG));
        assert!(registry.add("links"));
        assert!(is_reserved("Images"));
        assert!(!is_reserved("links"));
    }

    #[test]
    fn test_registry_remove() {
        let mut registry = TagRegistry::from_names(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(registry.custom_tags().len(), 2);
        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert_eq!(registry.custom_tags(), &["b".to_string()]);
    }

    #[test]
    fn test_all_tags_sorted_union() {
        let registry = TagRegistry::from_names(vec!["zeta".into()]);
        let all = registry.all_tags(["Favorites", "Links", "alpha"]);
        assert!(all.contains(&"Images".to_string()));
        assert!(all.contains(&"zeta".to_string()));
        assert!(all.contains(&"alpha".to_string()));
        assert_eq!(all.iter().filter(|t| *t == "Links").count(), 1);
        let mut sorted = all.clone();
        sorted.sort();
        assert_eq!(all, sorted);
    }
}
