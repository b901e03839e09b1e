//! Qualified display titles for runtime ID slots.
//!
//! Sets are addressed by their bare title. Layers are addressed as
//! `Parent Title::Layer Title` so that identically named layers under
//! different sets stay distinguishable. When the parent set cannot be
//! resolved the raw parent key stands in for its title.

use std::collections::HashMap;

use crate::mappings::slots::{enumerate_slots, Slot, SlotKind};
use crate::mappings::Document;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleEntry {
    pub runtime_id: u32,
    pub qualified: String,
}

#[derive(Debug, Clone, Default)]
pub struct TitleCatalog {
    entries: Vec<TitleEntry>,
    by_title: HashMap<String, u32>,
}

impl TitleCatalog {
    pub fn from_document(doc: &Document) -> Self {
        Self::from_slots(&enumerate_slots(doc))
    }

    pub fn from_slots(slots: &[Slot]) -> Self {
        let set_titles: HashMap<&str, &str> = slots
            .iter()
            .filter(|slot| slot.kind == SlotKind::ActionSet)
            .map(|slot| (slot.key.as_str(), slot.title.as_str()))
            .collect();

        let mut entries = Vec::with_capacity(slots.len());
        for slot in slots {
            let qualified = match (slot.kind, slot.parent_key.as_deref()) {
                (SlotKind::ActionLayer, Some(parent)) => {
                    let parent_title = set_titles.get(parent).copied().unwrap_or(parent);
                    format!("{parent_title}::{}", slot.title)
                }
                _ => slot.title.clone(),
            };
            entries.push(TitleEntry {
                runtime_id: slot.runtime_id,
                qualified,
            });
        }

        // On duplicate qualified titles the later slot wins the reverse
        // lookup.
        let by_title = entries
            .iter()
            .map(|entry| (entry.qualified.clone(), entry.runtime_id))
            .collect();

        TitleCatalog { entries, by_title }
    }

    /// Entries in ascending runtime ID order.
    pub fn entries(&self) -> &[TitleEntry] {
        &self.entries
    }

    pub fn id_for(&self, qualified: &str) -> Option<u32> {
        self.by_title.get(qualified).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::TitleCatalog;
    use crate::mappings::Document;

    fn catalog(text: &str) -> TitleCatalog {
        let doc = Document::parse(text).expect("test layout should parse");
        TitleCatalog::from_document(&doc)
    }

    #[test]
    fn layers_qualify_with_parent_title() {
        let catalog = catalog(
            r#"{"controller_mappings":{
                "actions":{"Preset_1":{"title":"Gameplay"}},
                "action_layers":{"Preset_2":{"title":"Gyro Off","parent_set_name":"Preset_1"}}
            }}"#,
        );

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].qualified, "Gameplay");
        assert_eq!(catalog.entries()[1].qualified, "Gameplay::Gyro Off");
        assert_eq!(catalog.id_for("Gameplay::Gyro Off"), Some(2));
    }

    #[test]
    fn unresolvable_parent_falls_back_to_key() {
        let catalog = catalog(
            r#"{"controller_mappings":{
                "action_layers":{"Preset_9":{"title":"Orphan","parent_set_name":"Preset_404"}}
            }}"#,
        );

        assert_eq!(catalog.entries()[0].qualified, "Preset_404::Orphan");
    }

    #[test]
    fn empty_document_yields_empty_catalog() {
        let catalog = catalog(r#"{"controller_mappings":{}}"#);
        assert!(catalog.is_empty());
        assert_eq!(catalog.id_for("Anything"), None);
    }

    #[test]
    fn parentless_layer_uses_bare_title() {
        let catalog = catalog(
            r#"{"controller_mappings":{
                "action_layers":{"Preset_5":{"title":"Floating"}}
            }}"#,
        );

        assert_eq!(catalog.entries()[0].qualified, "Floating");
        assert_eq!(catalog.id_for("Floating"), Some(1));
    }
}
