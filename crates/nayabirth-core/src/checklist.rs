//! Hospital bag checklist.
//!
//! A fixed catalog of packing items grouped by category, plus items the
//! user adds per category. Checked items, custom items and which categories
//! are expanded are persisted after every change.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::storage::{self, KeyValueStore, CHECKLIST_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub essential: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistCategory {
    pub id: String,
    pub title: String,
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub categories: Vec<ChecklistCategory>,
    /// Things the hospital usually supplies, shown so they aren't packed.
    pub hospital_provides: Vec<String>,
}

fn category(id: &str, title: &str, items: &[(&str, &str, bool)]) -> ChecklistCategory {
    ChecklistCategory {
        id: id.to_string(),
        title: title.to_string(),
        items: items
            .iter()
            .map(|(id, label, essential)| ChecklistItem {
                id: id.to_string(),
                label: label.to_string(),
                essential: *essential,
            })
            .collect(),
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::hospital_bag()
    }
}

impl Catalog {
    /// Built-in hospital bag list.
    pub fn hospital_bag() -> Self {
        Self {
            categories: vec![
                category(
                    "documents",
                    "Documents",
                    &[
                        ("photo-id", "Photo ID", true),
                        ("insurance-card", "Insurance card", true),
                        ("birth-plan-copies", "Copies of your birth plan", false),
                        ("hospital-forms", "Pre-registration forms", false),
                    ],
                ),
                category(
                    "mom",
                    "For Mom",
                    &[
                        ("phone-charger", "Phone and long charger cable", true),
                        ("toiletries", "Toiletries", true),
                        ("nursing-bras", "Nursing bras", false),
                        ("robe", "Robe", false),
                        ("slippers", "Slippers or grip socks", false),
                        ("lip-balm", "Lip balm", false),
                        ("going-home-outfit", "Loose going-home outfit", false),
                    ],
                ),
                category(
                    "baby",
                    "For Baby",
                    &[
                        ("car-seat", "Installed car seat", true),
                        ("baby-outfit", "Going-home outfit", true),
                        ("swaddle", "Swaddle blanket", false),
                        ("hat-mittens", "Hat and mittens", false),
                    ],
                ),
                category(
                    "partner",
                    "For Partner",
                    &[
                        ("partner-clothes", "Change of clothes", false),
                        ("snacks", "Snacks and water bottle", false),
                        ("pillow", "Pillow and blanket", false),
                        ("partner-toiletries", "Toiletries", false),
                    ],
                ),
            ],
            hospital_provides: vec![
                "Diapers and wipes".into(),
                "Mesh underwear and pads".into(),
                "Receiving blankets".into(),
                "Newborn hat".into(),
                "Peri bottle".into(),
            ],
        }
    }

    pub fn category(&self, id: &str) -> Option<&ChecklistCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn contains_item(&self, id: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.items.iter().any(|item| item.id == id))
    }

    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    fn category_ids(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.id.clone()).collect()
    }
}

/// A user-added item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomItem {
    /// `custom-{category}-{epoch millis}`
    pub id: String,
    pub label: String,
}

/// The persisted half of the checklist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistState {
    pub checked_items: Vec<String>,
    /// Category id to items, in insertion order.
    pub custom_items: BTreeMap<String, Vec<CustomItem>>,
    pub expanded_categories: Vec<String>,
}

/// On-disk form; any missing field falls back to its default.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredChecklist {
    #[serde(default)]
    checked_items: Option<Vec<String>>,
    #[serde(default)]
    custom_items: Option<BTreeMap<String, Vec<CustomItem>>>,
    #[serde(default)]
    expanded_categories: Option<Vec<String>>,
}

impl ChecklistState {
    /// Nothing checked, every category expanded.
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            checked_items: Vec::new(),
            custom_items: BTreeMap::new(),
            expanded_categories: catalog.category_ids(),
        }
    }

    fn from_stored(stored: StoredChecklist, catalog: &Catalog) -> Self {
        Self {
            checked_items: stored.checked_items.unwrap_or_default(),
            custom_items: stored.custom_items.unwrap_or_default(),
            expanded_categories: stored
                .expanded_categories
                .unwrap_or_else(|| catalog.category_ids()),
        }
    }

    pub fn is_checked(&self, item_id: &str) -> bool {
        self.checked_items.iter().any(|id| id == item_id)
    }

    pub fn is_expanded(&self, category_id: &str) -> bool {
        self.expanded_categories.iter().any(|id| id == category_id)
    }

    pub fn custom_items(&self, category_id: &str) -> &[CustomItem] {
        self.custom_items
            .get(category_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn contains_custom(&self, item_id: &str) -> bool {
        self.custom_items
            .values()
            .any(|items| items.iter().any(|item| item.id == item_id))
    }

    pub fn checked_count(&self) -> usize {
        self.checked_items.len()
    }

    pub fn custom_count(&self) -> usize {
        self.custom_items.values().map(Vec::len).sum()
    }

    /// Flip an item. Returns whether it is now checked.
    pub fn toggle_item(&mut self, item_id: &str) -> bool {
        if let Some(pos) = self.checked_items.iter().position(|id| id == item_id) {
            self.checked_items.remove(pos);
            false
        } else {
            self.checked_items.push(item_id.to_string());
            true
        }
    }

    /// Flip a category. Returns whether it is now expanded.
    pub fn toggle_category(&mut self, category_id: &str) -> bool {
        if let Some(pos) = self
            .expanded_categories
            .iter()
            .position(|id| id == category_id)
        {
            self.expanded_categories.remove(pos);
            false
        } else {
            self.expanded_categories.push(category_id.to_string());
            true
        }
    }

    /// Append a custom item. The id is derived from `now`, bumped until it
    /// is unused.
    pub fn add_custom_item(
        &mut self,
        category_id: &str,
        label: &str,
        now: DateTime<Utc>,
    ) -> CustomItem {
        let mut millis = now.timestamp_millis();
        let mut id = format!("custom-{category_id}-{millis}");
        while self.contains_custom(&id) {
            millis += 1;
            id = format!("custom-{category_id}-{millis}");
        }
        let item = CustomItem {
            id,
            label: label.to_string(),
        };
        self.custom_items
            .entry(category_id.to_string())
            .or_default()
            .push(item.clone());
        item
    }

    /// Remove a custom item and its check mark. Returns the owning
    /// category, or `None` if no custom item has that id.
    pub fn remove_custom_item(&mut self, item_id: &str) -> Option<String> {
        let category_id = self
            .custom_items
            .iter()
            .find(|(_, items)| items.iter().any(|item| item.id == item_id))
            .map(|(category_id, _)| category_id.clone())?;
        if let Some(items) = self.custom_items.get_mut(&category_id) {
            items.retain(|item| item.id != item_id);
        }
        self.checked_items.retain(|id| id != item_id);
        Some(category_id)
    }
}

/// Packing progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistProgress {
    pub checked: usize,
    pub total: usize,
}

/// Catalog plus persisted state, writing through an injected store.
pub struct HospitalChecklist<S: KeyValueStore> {
    store: S,
    catalog: Catalog,
    state: ChecklistState,
}

impl<S: KeyValueStore> HospitalChecklist<S> {
    pub fn open(store: S) -> Self {
        Self::with_catalog(store, Catalog::hospital_bag())
    }

    pub fn with_catalog(store: S, catalog: Catalog) -> Self {
        let state = storage::read_json::<StoredChecklist, _>(&store, CHECKLIST_KEY)
            .map(|stored| ChecklistState::from_stored(stored, &catalog))
            .unwrap_or_else(|| ChecklistState::new(&catalog));
        Self {
            store,
            catalog,
            state,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &ChecklistState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn progress(&self) -> ChecklistProgress {
        ChecklistProgress {
            checked: self.state.checked_count(),
            total: self.catalog.item_count() + self.state.custom_count(),
        }
    }

    fn persist(&mut self) {
        storage::write_json(&mut self.store, CHECKLIST_KEY, &self.state);
    }

    /// `None` if the id names neither a catalog item nor a custom item.
    pub fn toggle_item_at(&mut self, item_id: &str, now: DateTime<Utc>) -> Option<Event> {
        if !self.catalog.contains_item(item_id) && !self.state.contains_custom(item_id) {
            return None;
        }
        let checked = self.state.toggle_item(item_id);
        self.persist();
        Some(Event::ChecklistItemToggled {
            item_id: item_id.to_string(),
            checked,
            at: now,
        })
    }

    /// `None` for an unknown category or a blank label. The label is
    /// trimmed.
    pub fn add_custom_item_at(
        &mut self,
        category_id: &str,
        label: &str,
        now: DateTime<Utc>,
    ) -> Option<Event> {
        let label = label.trim();
        if label.is_empty() || self.catalog.category(category_id).is_none() {
            return None;
        }
        let item = self.state.add_custom_item(category_id, label, now);
        self.persist();
        Some(Event::ChecklistItemAdded {
            category_id: category_id.to_string(),
            item,
            at: now,
        })
    }

    pub fn remove_custom_item_at(&mut self, item_id: &str, now: DateTime<Utc>) -> Option<Event> {
        let category_id = self.state.remove_custom_item(item_id)?;
        self.persist();
        Some(Event::ChecklistItemRemoved {
            category_id,
            item_id: item_id.to_string(),
            at: now,
        })
    }

    pub fn toggle_category_at(&mut self, category_id: &str, now: DateTime<Utc>) -> Option<Event> {
        self.catalog.category(category_id)?;
        let expanded = self.state.toggle_category(category_id);
        self.persist();
        Some(Event::ChecklistCategoryToggled {
            category_id: category_id.to_string(),
            expanded,
            at: now,
        })
    }

    /// Uncheck everything, drop custom items and forget the stored state.
    pub fn reset_at(&mut self, now: DateTime<Utc>) -> Event {
        self.state = ChecklistState::new(&self.catalog);
        storage::remove_key(&mut self.store, CHECKLIST_KEY);
        Event::ChecklistReset { at: now }
    }
}
