//! Shopping list built from the ingredients of several recipes.
//!
//! [`GroceryStore`] is a plain owned value: every operation takes it
//! explicitly, and persisting it is left to a [`GroceryBackend`].

mod backend;

pub use backend::{BackendFactory, GroceryBackend, GroceryService, JsonFileBackend, MemoryBackend};

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ingredients::{format_quantity, ingredient_key, parse_ingredient, ParsedIngredient};

/// One recipe's contribution to the list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryRecipe {
    pub title: String,
    #[serde(default)]
    pub fork: Option<String>,
    #[serde(default)]
    pub servings: Option<String>,
    pub items: Vec<ParsedIngredient>,
}

/// A user-defined line that replaces several `slug:key` ingredient entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomCombine {
    pub keys: Vec<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryStore {
    #[serde(default)]
    pub recipes: IndexMap<String, GroceryRecipe>,
    #[serde(default)]
    pub checked: Vec<String>,
    #[serde(default)]
    pub custom_combines: Vec<CustomCombine>,
}

/// An aggregated line of the shopping list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedItem {
    pub key: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub name: String,
    pub display_text: String,
    /// Titles of the recipes this line came from, without duplicates
    pub sources: Vec<String>,
    pub checked: bool,
}

impl GroceryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty() && self.custom_combines.is_empty()
    }

    /// Parse `ingredients` and store them under `slug`, replacing any
    /// earlier entry for the same slug in place.
    pub fn add_recipe(
        &mut self,
        slug: &str,
        title: &str,
        ingredients: &[String],
        fork: Option<&str>,
        servings: Option<&str>,
    ) {
        let items: Vec<ParsedIngredient> = ingredients
            .iter()
            .map(|line| parse_ingredient(line))
            .collect();
        info!("Adding {} ingredients from '{}' to grocery list", items.len(), slug);
        self.recipes.insert(
            slug.to_string(),
            GroceryRecipe {
                title: title.to_string(),
                fork: fork.map(String::from),
                servings: servings.map(String::from),
                items,
            },
        );
    }

    /// Returns whether the recipe was on the list.
    pub fn remove_recipe(&mut self, slug: &str) -> bool {
        let removed = self.recipes.shift_remove(slug).is_some();
        if removed {
            info!("Removed '{}' from grocery list", slug);
        }
        removed
    }

    /// Flip the checked state of an ingredient key; returns the new state.
    pub fn toggle_checked(&mut self, key: &str) -> bool {
        if let Some(pos) = self.checked.iter().position(|k| k == key) {
            self.checked.remove(pos);
            false
        } else {
            self.checked.push(key.to_string());
            true
        }
    }

    pub fn clear_checked(&mut self) {
        self.checked.clear();
    }

    /// Drop an ingredient key from every recipe. Recipes left with no
    /// ingredients are removed, and the key is unchecked.
    pub fn remove_item(&mut self, key: &str) {
        for recipe in self.recipes.values_mut() {
            recipe.items.retain(|item| ingredient_key(item) != key);
        }
        self.recipes.retain(|_, recipe| !recipe.items.is_empty());
        self.checked.retain(|k| k != key);
        info!("Removed item '{}' from grocery list", key);
    }

    pub fn add_custom_combine(
        &mut self,
        keys: Vec<String>,
        quantity: Option<f64>,
        unit: Option<String>,
        name: &str,
    ) {
        self.custom_combines.push(CustomCombine {
            keys,
            quantity,
            unit,
            name: name.to_string(),
        });
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
        info!("Cleared grocery list");
    }

    pub fn merged_items(&self) -> Vec<MergedItem> {
        get_merged_items(self)
    }

    /// Plain-text rendering of the list, unchecked lines first.
    pub fn export_text(&self) -> String {
        let items = self.merged_items();
        let (checked, unchecked): (Vec<&MergedItem>, Vec<&MergedItem>) =
            items.iter().partition(|item| item.checked);

        let mut lines = Vec::new();
        if !unchecked.is_empty() {
            lines.push("To buy:".to_string());
            lines.extend(unchecked.iter().map(|item| format!("[ ] {}", item.display_text)));
        }
        if !checked.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push("Got it:".to_string());
            lines.extend(checked.iter().map(|item| format!("[x] {}", item.display_text)));
        }
        if lines.is_empty() {
            lines.push("Grocery list is empty.".to_string());
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

struct Accumulator {
    quantity: Option<f64>,
    unit: Option<String>,
    name: String,
    sources: Vec<String>,
}

fn merged_display_text(quantity: Option<f64>, unit: Option<&str>, name: &str) -> String {
    let qty_str = quantity.map(format_quantity).unwrap_or_default();
    [qty_str.as_str(), unit.unwrap_or(""), name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Aggregate every recipe's ingredients into one list sorted by name.
///
/// Entries sharing an ingredient key are merged. Quantities only add up
/// when both are known and the units agree; otherwise the first quantity
/// seen is kept. Ingredients absorbed by a custom combine are skipped and
/// each combine contributes a `custom:<name>` line of its own.
pub fn get_merged_items(store: &GroceryStore) -> Vec<MergedItem> {
    let combined: HashSet<&str> = store
        .custom_combines
        .iter()
        .flat_map(|combine| combine.keys.iter().map(String::as_str))
        .collect();

    let mut merged: IndexMap<String, Accumulator> = IndexMap::new();
    for (slug, recipe) in &store.recipes {
        for item in &recipe.items {
            let key = ingredient_key(item);
            if combined.contains(format!("{slug}:{key}").as_str()) {
                continue;
            }

            match merged.get_mut(&key) {
                Some(existing) => {
                    if let (Some(total), Some(qty)) = (existing.quantity.as_mut(), item.quantity) {
                        if existing.unit == item.unit {
                            *total += qty;
                        }
                    }
                    if !existing.sources.contains(&recipe.title) {
                        existing.sources.push(recipe.title.clone());
                    }
                }
                None => {
                    merged.insert(
                        key,
                        Accumulator {
                            quantity: item.quantity,
                            unit: item.unit.clone(),
                            name: item.name.clone(),
                            sources: vec![recipe.title.clone()],
                        },
                    );
                }
            }
        }
    }

    for combine in &store.custom_combines {
        merged.insert(
            format!("custom:{}", combine.name),
            Accumulator {
                quantity: combine.quantity,
                unit: combine.unit.clone(),
                name: combine.name.clone(),
                sources: Vec::new(),
            },
        );
    }

    let mut items: Vec<MergedItem> = merged
        .into_iter()
        .map(|(key, acc)| MergedItem {
            display_text: merged_display_text(acc.quantity, acc.unit.as_deref(), &acc.name),
            checked: store.checked.contains(&key),
            key,
            quantity: acc.quantity,
            unit: acc.unit,
            name: acc.name,
            sources: acc.sources,
        })
        .collect();
    items.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    debug!("Merged grocery list into {} items", items.len());
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_matching_units_sum() {
        let mut store = GroceryStore::new();
        store.add_recipe("cake", "Cake", &lines(&["- 1 cup sugar"]), None, None);
        store.add_recipe("pie", "Pie", &lines(&["- 1 cup sugar"]), None, None);

        let items = store.merged_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, Some(2.0));
        assert_eq!(items[0].display_text, "2 cup sugar");
        assert_eq!(items[0].sources, vec!["Cake", "Pie"]);
    }

    #[test]
    fn test_differing_units_keep_first_quantity() {
        let mut store = GroceryStore::new();
        store.add_recipe("cake", "Cake", &lines(&["1 cup sugar"]), None, None);
        store.add_recipe("pie", "Pie", &lines(&["200 g sugar"]), None, None);

        let items = store.merged_items();
        let cup = items.iter().find(|i| i.unit.as_deref() == Some("cup")).unwrap();
        assert_eq!(cup.quantity, Some(1.0));
        let grams = items.iter().find(|i| i.unit.as_deref() == Some("g")).unwrap();
        assert_eq!(grams.quantity, Some(200.0));
    }

    #[test]
    fn test_missing_quantity_does_not_sum() {
        let mut store = GroceryStore::new();
        store.add_recipe("a", "A", &lines(&["salt"]), None, None);
        store.add_recipe("b", "B", &lines(&["salt"]), None, None);
        let items = store.merged_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, None);
        assert_eq!(items[0].display_text, "salt");
    }

    #[test]
    fn test_sources_deduplicated() {
        let mut store = GroceryStore::new();
        store.add_recipe("a", "Soup", &lines(&["1 cup water", "1 cup water"]), None, None);
        let items = store.merged_items();
        assert_eq!(items[0].quantity, Some(2.0));
        assert_eq!(items[0].sources, vec!["Soup"]);
    }

    #[test]
    fn test_custom_combine() {
        let mut store = GroceryStore::new();
        store.add_recipe("a", "A", &lines(&["2 cloves garlic", "1 onion"]), None, None);
        store.add_recipe("b", "B", &lines(&["1 tsp garlic"]), None, None);
        store.add_custom_combine(
            vec!["a:clove:garlic".to_string(), "b:tsp:garlic".to_string()],
            Some(1.0),
            Some("head".to_string()),
            "garlic",
        );

        let items = store.merged_items();
        let keys: Vec<&str> = items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["custom:garlic", "_:onion"]);
        assert_eq!(items[0].display_text, "1 head garlic");
        assert!(items[0].sources.is_empty());
    }

    #[test]
    fn test_add_recipe_replaces_in_place() {
        let mut store = GroceryStore::new();
        store.add_recipe("a", "A", &lines(&["1 egg"]), None, None);
        store.add_recipe("b", "B", &lines(&["1 egg"]), None, None);
        store.add_recipe("a", "A2", &lines(&["2 eggs"]), Some("spicy"), Some("4"));

        let slugs: Vec<&String> = store.recipes.keys().collect();
        assert_eq!(slugs, vec!["a", "b"]);
        assert_eq!(store.recipes["a"].title, "A2");
        assert_eq!(store.recipes["a"].fork.as_deref(), Some("spicy"));
    }

    #[test]
    fn test_toggle_and_clear_checked() {
        let mut store = GroceryStore::new();
        store.add_recipe("a", "A", &lines(&["1 cup flour"]), None, None);
        assert!(store.toggle_checked("cup:flour"));
        assert!(store.merged_items()[0].checked);
        assert!(!store.toggle_checked("cup:flour"));
        store.toggle_checked("cup:flour");
        store.clear_checked();
        assert!(store.checked.is_empty());
    }

    #[test]
    fn test_remove_item_drops_empty_recipes() {
        let mut store = GroceryStore::new();
        store.add_recipe("a", "A", &lines(&["1 cup flour"]), None, None);
        store.add_recipe("b", "B", &lines(&["1 cup flour", "2 eggs"]), None, None);
        store.toggle_checked("cup:flour");

        store.remove_item("cup:flour");
        assert!(!store.recipes.contains_key("a"));
        assert_eq!(store.recipes["b"].items.len(), 1);
        assert!(store.checked.is_empty());
    }

    #[test]
    fn test_remove_recipe_and_clear_all() {
        let mut store = GroceryStore::new();
        store.add_recipe("a", "A", &lines(&["1 egg"]), None, None);
        assert!(store.remove_recipe("a"));
        assert!(!store.remove_recipe("a"));

        store.add_recipe("a", "A", &lines(&["1 egg"]), None, None);
        store.toggle_checked("_:egg");
        store.clear_all();
        assert_eq!(store, GroceryStore::default());
    }

    #[test]
    fn test_export_text() {
        let mut store = GroceryStore::new();
        assert_eq!(store.export_text(), "Grocery list is empty.\n");

        store.add_recipe("a", "A", &lines(&["2 cups flour", "1 egg"]), None, None);
        store.toggle_checked("_:egg");
        assert_eq!(
            store.export_text(),
            "To buy:\n[ ] 2 cup flour\n\nGot it:\n[x] 1 egg\n"
        );
    }

    #[test]
    fn test_store_json_shape() {
        let mut store = GroceryStore::new();
        store.add_recipe("a", "A", &lines(&["1 egg"]), None, None);
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json["recipes"]["a"]["items"][0]["displayText"], "egg");
        assert!(json["customCombines"].as_array().unwrap().is_empty());

        let restored: GroceryStore =
            serde_json::from_str(r#"{"recipes": {}, "checked": ["x"]}"#).unwrap();
        assert_eq!(restored.checked, vec!["x"]);
    }
}
