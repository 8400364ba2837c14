//! Tab strip model handed to the embedding UI.

use crate::app::tab_registry::{TabRegistry, TabSlot};

/// One rendered slot of the tab strip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabLabel {
    pub slot: TabSlot,
    pub title: String,
    pub modified: bool,
    pub selected: bool,
}

/// Labels in visual order; the "+" marker is always last
pub fn tab_labels(registry: &TabRegistry) -> Vec<TabLabel> {
    let selected = registry.selected();
    registry
        .visual_order()
        .into_iter()
        .map(|slot| {
            let (title, modified) = match slot {
                TabSlot::Document(id) => registry
                    .entry(id)
                    .map(|e| (e.title.clone(), e.session.is_modified()))
                    .unwrap_or_default(),
                TabSlot::AddTab => ("+".to_string(), false),
            };
            TabLabel {
                slot,
                title,
                modified,
                selected: slot == selected,
            }
        })
        .collect()
}

/// Single-line text rendering: modified tabs carry `*`, the selected one is
/// bracketed
pub fn render_strip(labels: &[TabLabel]) -> String {
    labels
        .iter()
        .map(|label| {
            let mut text = label.title.clone();
            if label.modified {
                text.push('*');
            }
            if label.selected {
                text = format!("[{text}]");
            }
            text
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
