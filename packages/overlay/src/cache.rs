//! Rendered-icon cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::icon::render_circular_icon;

/// Cache of rendered icon SVGs keyed by `(image_url, category)`.
///
/// The overlay layer is rebuilt from scratch on every visible-set change;
/// this cache is what keeps those rebuilds from re-rendering identical
/// icons. Entries live until [`IconCache::invalidate`] — a rebuild never
/// clears them.
///
/// Methods panic only if the interior lock is poisoned.
#[derive(Default)]
pub struct IconCache {
    icons: RwLock<HashMap<(String, String), Arc<String>>>,
}

impl IconCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the icon for an image/category pair, rendering it on the
    /// first request.
    #[must_use]
    pub fn icon(&self, image_url: &str, marker_category: &str) -> Arc<String> {
        let key = (image_url.to_string(), marker_category.to_string());

        if let Some(icon) = self
            .icons
            .read()
            .expect("icon cache lock poisoned")
            .get(&key)
        {
            return Arc::clone(icon);
        }

        let icon = Arc::new(render_circular_icon(image_url, marker_category));
        self.icons
            .write()
            .expect("icon cache lock poisoned")
            .entry(key)
            .or_insert(icon)
            .clone()
    }

    /// Number of cached renderings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.icons.read().expect("icon cache lock poisoned").len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached rendering.
    pub fn invalidate(&self) {
        self.icons
            .write()
            .expect("icon cache lock poisoned")
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_requests_share_one_rendering() {
        let cache = IconCache::new();
        let a = cache.icon("https://cdn.example/a.jpg", "crime");
        let b = cache.icon("https://cdn.example/a.jpg", "crime");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn category_is_part_of_the_key() {
        let cache = IconCache::new();
        let crime = cache.icon("https://cdn.example/a.jpg", "crime");
        let tourism = cache.icon("https://cdn.example/a.jpg", "tourism");
        assert!(!Arc::ptr_eq(&crime, &tourism));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_clears_renderings() {
        let cache = IconCache::new();
        let _ = cache.icon("https://cdn.example/a.jpg", "crime");
        cache.invalidate();
        assert!(cache.is_empty());
    }
}
