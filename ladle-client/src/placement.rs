//! Drag-and-drop placement rules: what a drag event carries, which drops are
//! legal, and what a freshly placed ingredient defaults to.

use ladle::recipe_json::{CatalogIngredient, ContainerClass, IngredientKind, PlacedIngredient};
use serde::{Deserialize, Serialize};

/// Which catalog panel a fresh drag started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanelKind {
    IngredientList,
    SeasoningList,
    WaterOilList,
}

impl PanelKind {
    pub fn class(self) -> ContainerClass {
        match self {
            PanelKind::IngredientList => ContainerClass::Main,
            PanelKind::SeasoningList => ContainerClass::Seasoning,
            PanelKind::WaterOilList => ContainerClass::WaterOil,
        }
    }
}

/// The payload a drag event carries, validated at the drop boundary rather
/// than trusted as an ad hoc JSON blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DragPayload {
    /// Dragged fresh out of a catalog panel.
    CatalogItem {
        ingredient: CatalogIngredient,
        #[serde(rename = "originPanel")]
        origin_panel: PanelKind,
    },
    /// Moved out of another container; quantity, units and prep travel along.
    ContainerItem {
        ingredient: PlacedIngredient,
        #[serde(rename = "originContainerId")]
        origin_container_id: u8,
    },
}

impl DragPayload {
    /// The container class this payload belongs in. Catalog drags are classed
    /// by the panel they left; container moves by the ingredient itself.
    pub fn effective_class(&self) -> ContainerClass {
        match self {
            DragPayload::CatalogItem { origin_panel, .. } => origin_panel.class(),
            DragPayload::ContainerItem { ingredient, .. } => {
                ContainerClass::for_kind(ingredient.kind)
            }
        }
    }

    /// Parse the text payload carried by a drop event. Drag payloads are
    /// caller-controlled strings, so this is the validation boundary.
    pub fn parse(text: &str) -> Result<Self, PlacementError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn ingredient_id(&self) -> &str {
        match self {
            DragPayload::CatalogItem { ingredient, .. } => &ingredient.id,
            DragPayload::ContainerItem { ingredient, .. } => &ingredient.id,
        }
    }
}

/// A drop that could not be applied. State is left untouched in every case.
#[derive(thiserror::Error, Debug)]
pub enum PlacementError {
    #[error("container {0} does not exist")]
    UnknownContainer(u8),
    #[error("only {expected} items can go in this container")]
    IncompatibleDrop { expected: ContainerClass },
    #[error("unreadable drag payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

pub fn is_valid_drop(target: ContainerClass, payload: &DragPayload) -> bool {
    target == payload.effective_class()
}

/// Unit a new placement starts with when the author has not picked one yet.
pub fn default_units(kind: IngredientKind, name: &str) -> &'static str {
    match kind {
        IngredientKind::Water | IngredientKind::Oil => "ml",
        _ if name.to_lowercase().contains("water") => "ml",
        _ => "gm",
    }
}
