//! The persisted `recipe_json` document shape, shared between the authoring
//! client and the marketplace server. Field names are wire-compatible with
//! the documents already in the database, so several structs mix camelCase
//! renames with snake_case fields, and steps keep the legacy
//! `additionalData.instructions.Instructions` nesting.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// What an ingredient fundamentally is, as the catalog records it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IngredientKind {
    Ingredient,
    Seasoning,
    Water,
    Oil,
}

/// Which family of ingredients a container accepts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ContainerClass {
    Main,
    Seasoning,
    WaterOil,
}

impl ContainerClass {
    /// Whether an ingredient of this kind may be placed in a container of
    /// this class.
    pub fn accepts(self, kind: IngredientKind) -> bool {
        matches!(
            (self, kind),
            (ContainerClass::Main, IngredientKind::Ingredient)
                | (ContainerClass::Seasoning, IngredientKind::Seasoning)
                | (ContainerClass::WaterOil, IngredientKind::Water)
                | (ContainerClass::WaterOil, IngredientKind::Oil)
        )
    }

    /// The class an ingredient of this kind belongs in.
    pub fn for_kind(kind: IngredientKind) -> Self {
        match kind {
            IngredientKind::Ingredient => ContainerClass::Main,
            IngredientKind::Seasoning => ContainerClass::Seasoning,
            IngredientKind::Water | IngredientKind::Oil => ContainerClass::WaterOil,
        }
    }
}

/// One catalog entry, immutable once fetched. Owned by the catalog endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CatalogIngredient {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: IngredientKind,
    #[serde(rename = "imageRef", default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

/// An ingredient placed into a container, with placement-specific fields.
/// Each container holds its own copy; nothing is shared across containers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlacedIngredient {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: IngredientKind,
    pub quantity: f64,
    pub units: String,
    #[serde(rename = "prepType", default, skip_serializing_if = "Option::is_none")]
    pub prep_type: Option<String>,
}

/// One typed slot of the authoring grid. The `class` field is authoritative
/// for compatibility checks; ids are stable labels, not capability ranges.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Container {
    pub id: u8,
    pub name: String,
    pub class: ContainerClass,
    pub ingredients: Vec<PlacedIngredient>,
}

/// A structured instruction derived from one line of a step description.
/// `step` is the 1-based line index within the owning step, not global.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InstructionEntry {
    pub step: u32,
    pub instruction: String,
    pub quantity: String,
    pub units: String,
    pub raw: String,
    pub image_url: String,
}

/// One authored cooking step. Ids are monotonic within a session and are
/// never renumbered after removal.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecipeStep {
    pub id: u32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i32>,
    #[serde(
        rename = "additionalData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_data: Option<StepAdditionalData>,
}

impl RecipeStep {
    /// The derived instruction entries for this step, if any.
    pub fn instructions(&self) -> &[InstructionEntry] {
        self.additional_data
            .as_ref()
            .and_then(|d| d.instructions.as_ref())
            .map(|set| set.entries.as_slice())
            .unwrap_or_default()
    }

    pub fn set_instructions(&mut self, entries: Vec<InstructionEntry>) {
        self.additional_data = Some(StepAdditionalData {
            instructions: Some(InstructionSet { entries }),
        });
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StepAdditionalData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<InstructionSet>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InstructionSet {
    #[serde(rename = "Instructions")]
    pub entries: Vec<InstructionEntry>,
}

/// Recipe metadata the author fills in directly.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct RecipeMeta {
    pub name: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    #[serde(rename = "cookingTime")]
    pub cooking_time: u32,
    pub cuisine_type: String,
    pub recipe_type: String,
    pub price: f64,
    #[serde(rename = "servingSize")]
    pub serving_size: u32,
}

/// The whole structured recipe document, exactly as persisted in the
/// `recipe_json` column and reloaded for re-edit round-trips.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecipeData {
    #[serde(flatten)]
    pub meta: RecipeMeta,
    pub containers: Vec<Container>,
    pub steps: Vec<RecipeStep>,
    pub instructions_array: Vec<InstructionEntry>,
}

/// What the client actually uploads: the flattened text blocks the legacy
/// schema stores as plain strings, plus the structured document.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecipeForUpload {
    pub ingredients: String,
    pub instructions: String,
    pub recipe_json: RecipeData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_classes_accept_only_their_kind() {
        assert!(ContainerClass::Main.accepts(IngredientKind::Ingredient));
        assert!(!ContainerClass::Main.accepts(IngredientKind::Seasoning));
        assert!(!ContainerClass::Main.accepts(IngredientKind::Water));
        assert!(ContainerClass::Seasoning.accepts(IngredientKind::Seasoning));
        assert!(!ContainerClass::Seasoning.accepts(IngredientKind::Oil));
        assert!(ContainerClass::WaterOil.accepts(IngredientKind::Water));
        assert!(ContainerClass::WaterOil.accepts(IngredientKind::Oil));
        assert!(!ContainerClass::WaterOil.accepts(IngredientKind::Ingredient));
    }

    #[test]
    fn step_serializes_with_legacy_instruction_nesting() {
        let mut step = RecipeStep {
            id: 1,
            description: "Add Salt (5g)".into(),
            time: None,
            temperature: None,
            additional_data: None,
        };
        step.set_instructions(vec![InstructionEntry {
            step: 1,
            instruction: "Salt".into(),
            quantity: "5".into(),
            units: "g".into(),
            raw: "Add Salt (5g)".into(),
            image_url: String::new(),
        }]);
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(
            json["additionalData"]["instructions"]["Instructions"][0]["instruction"],
            "Salt"
        );
        let back: RecipeStep = serde_json::from_value(json).unwrap();
        assert_eq!(back, step);
    }

    #[test]
    fn meta_uses_wire_field_names() {
        let meta = RecipeMeta {
            name: "Dal".into(),
            cooking_time: 45,
            serving_size: 4,
            ..Default::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["cookingTime"], 45);
        assert_eq!(json["servingSize"], 4);
        assert!(json.get("cooking_time").is_none());
    }
}
