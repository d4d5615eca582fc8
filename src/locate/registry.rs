//! The locator registry: a read-only mapping from element names to
//! descriptors, loaded once per environment and never mutated at runtime.
//!
//! [`Registry::earthtime`] carries the predefined catalog for EarthTime
//! pages. Names are also reachable in relaxed spellings: `"theme headers"`
//! and `"theme_headers"` both land on `ThemeHeaders`.

use crate::driver::Strategy;
use crate::locate::locator::Locator;
use indexmap::IndexMap;

/// Normalize a relaxed name ("theme headers", "theme_headers") into catalog
/// form ("ThemeHeaders")
pub fn canonical_name(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Prepend `prefix` unless `value` already starts with it
fn prefixed(value: &str, prefix: &str) -> String {
    if value.starts_with(prefix) {
        value.to_string()
    } else {
        format!("{}{}", prefix, value)
    }
}

/// A read-only, insertion-ordered catalog of named locators
#[derive(Debug, Clone, Default)]
pub struct Registry {
    map: IndexMap<String, Locator>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            map: IndexMap::new(),
        }
    }

    /// Register a descriptor under a name. Intended for catalog construction;
    /// a registry handed to an environment is not mutated afterwards.
    pub fn register(&mut self, name: impl Into<String>, locator: Locator) {
        self.map.insert(name.into(), locator);
    }

    /// Look up a descriptor, accepting relaxed spellings of the name.
    /// Returns the canonical name alongside the descriptor.
    pub fn lookup(&self, name: &str) -> Option<(&str, &Locator)> {
        if let Some((_, key, locator)) = self.map.get_full(name) {
            return Some((key.as_str(), locator));
        }

        let canonical = canonical_name(name);
        self.map
            .get_full(&canonical)
            .map(|(_, key, locator)| (key.as_str(), locator))
    }

    pub fn get(&self, name: &str) -> Option<&Locator> {
        self.lookup(name).map(|(_, locator)| locator)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Catalog names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// The predefined catalog of EarthTime page elements
    pub fn earthtime() -> Self {
        let mut r = Registry::new();

        // Top navigation
        r.register("TopNavigation", Locator::by(Strategy::Id, "top-nav"));
        r.register(
            "EarthTimeLogo",
            // Clicking the logo reloads the explore page
            Locator::by(Strategy::Id, "menu-logo").navigating(),
        );
        r.register("StoriesMenu", Locator::by(Strategy::Id, "stories-menu-choice"));
        r.register("DataLibraryMenu", Locator::by(Strategy::Id, "layers-menu-choice"));
        r.register("ShareButton", Locator::by(Strategy::Id, "share-menu-choice"));
        r.register(
            "StoryEditorButton",
            Locator::by(Strategy::Id, "story-editor-menu-choice"),
        );

        // Location search
        r.register("LocationSearchIcon", Locator::by(Strategy::Id, "location_search_icon"));
        r.register("LocationSearchInput", Locator::by(Strategy::Id, "location_search"));
        r.register(
            "LocationSearchClearButton",
            Locator::by(Strategy::Id, "location_search_clear_icon"),
        );

        // Stories menu and themes
        r.register("StoriesMenuContainer", Locator::by(Strategy::Id, "theme-menu"));
        r.register(
            "StoriesMenuHeader",
            Locator::css("#theme-menu > label[for='theme-selection']"),
        );
        r.register("ThemeMenu", Locator::css("div.themes-div"));
        r.register(
            "ThemeHeaders",
            Locator::css("div.themes-div > h3[data-enabled='true']").list(),
        );
        r.register(
            "ThemeTables",
            Locator::css("div.themes-div > table[data-enabled='true']").list(),
        );
        r.register(
            "ThemeHeader",
            Locator::template(Strategy::Css, 1, |t| format!("h3#{}", t[0])).or_template(
                Strategy::Css,
                1,
                |t| {
                    format!(
                        "div.themes-div > h3[aria-controls='{}']",
                        prefixed(&t[0], "theme_")
                    )
                },
            ),
        );
        r.register(
            "ThemeTable",
            Locator::template(Strategy::Css, 1, |t| {
                format!("table#{}", prefixed(&t[0], "theme_"))
            })
            .or_template(Strategy::Css, 1, |t| {
                format!("div.themes-div > table[aria-labelledby='{}']", t[0])
            }),
        );
        r.register(
            "ThemeStories",
            Locator::template(Strategy::Css, 1, |t| {
                format!("table#{} tr:not(:first-child)", prefixed(&t[0], "theme_"))
            })
            .or_template(Strategy::Css, 1, |t| {
                format!(
                    "div.themes-div > table[aria-labelledby='{}'] tr:not(:first-child)",
                    t[0]
                )
            })
            .list(),
        );
        r.register(
            "ThemeDescription",
            Locator::template(Strategy::Css, 1, |t| {
                format!(
                    "table#{} #theme_description > td > p",
                    prefixed(&t[0], "theme_")
                )
            }),
        );

        // Stories
        r.register(
            "StoryInfo",
            Locator::template(Strategy::Css, 1, |t| {
                format!("#{} > td", prefixed(&t[0], "story_"))
            })
            .list(),
        );
        r.register(
            "StoryThumbnail",
            Locator::template(Strategy::Css, 1, |t| {
                format!("#{} img", prefixed(&t[0], "story_"))
            }),
        );
        r.register(
            "StoryRadioButton",
            Locator::template(Strategy::Css, 1, |t| {
                format!("#{} input", prefixed(&t[0], "story_"))
            }),
        );
        r.register(
            "StoryTitle",
            Locator::template(Strategy::Css, 1, |t| {
                format!("#{} > td:nth-child(3)", prefixed(&t[0], "story_"))
            }),
        );

        // Data library
        r.register("DataLibraryMenuContainer", Locator::by(Strategy::Id, "layers-menu"));
        r.register(
            "DataLibraryMenuHeader",
            Locator::css("#layers-menu > label[for='layer-selection']"),
        );
        r.register(
            "DataLibrarySearchContainer",
            Locator::by(Strategy::Id, "search-content"),
        );
        r.register(
            "DataLibrarySearchIcon",
            Locator::css("span.layer-search-box-icon"),
        );
        r.register(
            "DataLibrarySearchInput",
            Locator::by(Strategy::Id, "layer-search-box"),
        );
        r.register(
            "DataLibrarySearchClearButton",
            Locator::by(Strategy::Id, "layer-search-clear-icon"),
        );
        r.register(
            "DataLibraryClearActiveLayersButton",
            Locator::css("div.clearLayers"),
        );
        r.register(
            "DataLibraryEmptySearchResultsMessage",
            Locator::by(Strategy::Id, "layer-search-results-empty-msg"),
        );
        r.register(
            "DataLibrarySearchResultsContainer",
            Locator::by(Strategy::Id, "layer-search-results"),
        );
        r.register(
            "DataLibrarySearchResultsCategories",
            Locator::css("#layer-search-results > div").list(),
        );
        r.register(
            "DataLibrarySearchResultsLabels",
            Locator::css("#layer-search-results > label").list(),
        );
        r.register(
            "DataLibrarySearchFoundCategories",
            Locator::css(
                "#layer-search-results > div:not([style*='display: none']):not([style*='display:none'])",
            )
            .list(),
        );
        r.register(
            "DataLibrarySearchFoundLabels",
            Locator::css(
                "#layer-search-results > label:not([style*='display: none']):not([style*='display:none'])",
            )
            .list(),
        );
        r.register(
            "DataLibrarySearchFoundLabelsFollowing",
            Locator::template(Strategy::XPath, 1, |t| {
                format!(
                    "//*[@id=\"layer-search-results\"]/label[preceding-sibling::div[text()=\"{}\"] \
                     and not(contains(@style, \"display: none\") or contains(@style, \"display:none\"))]",
                    t[0]
                )
            })
            .list(),
        );

        // Base layers and categories
        r.register("BaseLayersHeader", Locator::by(Strategy::Id, "category-base-layers"));
        r.register(
            "BaseLayerRows",
            Locator::css("#category-base-layers > tbody > tr").list(),
        );
        r.register(
            "CategoryMenu",
            Locator::css(
                "div.map-layer-div:not([style*='display: none']):not([style*='display:none'])",
            )
            .or(Strategy::Css, "div#featured-layers"),
        );
        r.register(
            "CategoryHeader",
            Locator::template(Strategy::Css, 1, |t| format!("h3#{}", t[0])).or_template(
                Strategy::Css,
                1,
                |t| {
                    format!(
                        "h3[aria-controls='{}']",
                        prefixed(&t[0], "category-")
                    )
                },
            ),
        );

        // Waypoints: the page framework handles these transitions in place,
        // so they are deliberately not marked navigating
        r.register("WaypointSlides", Locator::css("div.snaplapse_keyframe_list div.snaplapse_keyframe_list_item").list());
        r.register(
            "Waypoint",
            Locator::template(Strategy::Css, 1, |t| {
                format!("#timeMachine_snaplapse_keyframe_{} div.snaplapse_keyframe_list_item_thumbnail_container_touch", t[0])
            }),
        );

        // Player chrome
        r.register("Timeline", Locator::by(Strategy::Id, "timeMachine_timelapse"));
        r.register("PlayPauseButton", Locator::css("button.playbackButton"));
        r.register("Legend", Locator::by(Strategy::Id, "layers-legend"));

        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("theme headers"), "ThemeHeaders");
        assert_eq!(canonical_name("theme_headers"), "ThemeHeaders");
        assert_eq!(canonical_name("theme-headers"), "ThemeHeaders");
        assert_eq!(canonical_name("ThemeHeaders"), "ThemeHeaders");
        assert_eq!(canonical_name("earth time logo"), "EarthTimeLogo");
    }

    #[test]
    fn test_lookup_relaxed_spelling() {
        let registry = Registry::earthtime();

        let (name, _) = registry.lookup("theme_headers").unwrap();
        assert_eq!(name, "ThemeHeaders");

        assert!(registry.contains("data library menu"));
        assert!(!registry.contains("NoSuchElement"));
    }

    #[test]
    fn test_catalog_declaration_order_is_priority() {
        let registry = Registry::earthtime();

        let theme_header = registry.get("ThemeHeader").unwrap();
        assert_eq!(theme_header.pairs().len(), 2);

        // id-like query outranks the attribute-based fallback
        let terms = vec!["biodiversity".to_string()];
        assert_eq!(theme_header.pairs()[0].query.format(&terms), "h3#biodiversity");
        assert_eq!(
            theme_header.pairs()[1].query.format(&terms),
            "div.themes-div > h3[aria-controls='theme_biodiversity']"
        );
    }

    #[test]
    fn test_catalog_prefix_normalization() {
        let registry = Registry::earthtime();
        let theme_table = registry.get("ThemeTable").unwrap();

        let bare = vec!["forests".to_string()];
        let already = vec!["theme_forests".to_string()];
        assert_eq!(theme_table.pairs()[0].query.format(&bare), "table#theme_forests");
        assert_eq!(
            theme_table.pairs()[0].query.format(&already),
            "table#theme_forests"
        );
    }

    #[test]
    fn test_catalog_flags() {
        let registry = Registry::earthtime();

        assert!(registry.get("EarthTimeLogo").unwrap().navigates());
        assert!(!registry.get("Waypoint").unwrap().navigates());
        assert!(registry.get("ThemeHeaders").unwrap().is_list());
        assert!(!registry.get("ThemeHeader").unwrap().is_list());
    }

    #[test]
    fn test_register_and_names_order() {
        let mut registry = Registry::new();
        registry.register("First", Locator::by(Strategy::Id, "a"));
        registry.register("Second", Locator::by(Strategy::Id, "b"));

        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert_eq!(registry.len(), 2);
    }
}
