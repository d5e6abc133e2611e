//! Turns a validated session into the upload payload. The legacy schema
//! stores ingredients and instructions as plain text while `recipe_json`
//! keeps the structured document, so both renditions are produced here.

use crate::instructions::derive_instructions;
use itertools::Itertools;
use ladle::recipe_json::{
    Container, InstructionEntry, RecipeData, RecipeForUpload, RecipeMeta, RecipeStep,
};

/// Why an assembly was refused. Reported in rule order; nothing is sent to
/// the backend when any rule fails.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("recipe name is required")]
    MissingName,
    #[error("add at least one ingredient to a container")]
    NoIngredients,
    #[error("step {0} has an empty description")]
    BlankStepDescription(u32),
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Validate and assemble. Pure: the caller decides what to do with the
/// payload, and nothing is mutated here.
pub fn assemble(
    meta: &RecipeMeta,
    containers: &[Container],
    steps: &[RecipeStep],
) -> Result<RecipeForUpload, ValidationError> {
    if meta.name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if containers.iter().all(|c| c.ingredients.is_empty()) {
        return Err(ValidationError::NoIngredients);
    }
    if let Some(blank) = steps.iter().find(|s| s.description.trim().is_empty()) {
        return Err(ValidationError::BlankStepDescription(blank.id));
    }
    for (field, value) in [
        ("cuisine_type", &meta.cuisine_type),
        ("category", &meta.category),
        ("recipe_type", &meta.recipe_type),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(field));
        }
    }

    Ok(RecipeForUpload {
        ingredients: ingredients_text(containers),
        instructions: instructions_text(steps),
        recipe_json: RecipeData {
            meta: meta.clone(),
            containers: containers.to_vec(),
            steps: steps.to_vec(),
            instructions_array: instructions_array(steps),
        },
    })
}

/// One line per placed ingredient across all containers:
/// `<quantity> <units> <prepType> <name>`.
fn ingredients_text(containers: &[Container]) -> String {
    containers
        .iter()
        .flat_map(|c| &c.ingredients)
        .map(|i| match &i.prep_type {
            Some(prep) => format!("{} {} {} {}", fmt_quantity(i.quantity), i.units, prep, i.name),
            None => format!("{} {} {}", fmt_quantity(i.quantity), i.units, i.name),
        })
        .join("\n")
}

/// One numbered line per step; descriptions spanning multiple lines are
/// folded onto one.
fn instructions_text(steps: &[RecipeStep]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let folded = step.description.lines().map(str::trim).join("; ");
            format!("{}. {}", index + 1, folded)
        })
        .join("\n")
}

/// The flat instruction list across all steps. Steps that already carry
/// derived entries are trusted as-is; the rest are derived here.
fn instructions_array(steps: &[RecipeStep]) -> Vec<InstructionEntry> {
    steps
        .iter()
        .flat_map(|step| {
            let stored = step.instructions();
            if stored.is_empty() {
                derive_instructions(&step.description)
            } else {
                stored.to_vec()
            }
        })
        .collect()
}

/// Quantities display without a trailing `.0` when they are whole.
fn fmt_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        format!("{quantity}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladle::recipe_json::{ContainerClass, IngredientKind, PlacedIngredient};

    fn meta() -> RecipeMeta {
        RecipeMeta {
            name: "Dal Tadka".into(),
            description: "Comfort food".into(),
            category: "Curry".into(),
            difficulty: "easy".into(),
            cooking_time: 40,
            cuisine_type: "Indian".into(),
            recipe_type: "veg".into(),
            price: 9.5,
            serving_size: 2,
        }
    }

    fn containers() -> Vec<Container> {
        vec![Container {
            id: 1,
            name: "Container 1".into(),
            class: ContainerClass::Main,
            ingredients: vec![
                PlacedIngredient {
                    id: "lentils".into(),
                    name: "Lentils".into(),
                    kind: IngredientKind::Ingredient,
                    quantity: 200.0,
                    units: "gm".into(),
                    prep_type: Some("rinsed".into()),
                },
                PlacedIngredient {
                    id: "onion".into(),
                    name: "Onion".into(),
                    kind: IngredientKind::Ingredient,
                    quantity: 1.5,
                    units: "gm".into(),
                    prep_type: None,
                },
            ],
        }]
    }

    fn steps() -> Vec<RecipeStep> {
        vec![
            RecipeStep {
                id: 1,
                description: "Add Lentils (200gm)\nBoil".into(),
                time: Some(20),
                temperature: None,
                additional_data: None,
            },
            RecipeStep {
                id: 2,
                description: "Serve hot".into(),
                time: None,
                temperature: None,
                additional_data: None,
            },
        ]
    }

    #[test]
    fn empty_name_is_the_first_violation_reported() {
        let mut m = meta();
        m.name = "".into();
        assert_eq!(
            assemble(&m, &containers(), &steps()).unwrap_err(),
            ValidationError::MissingName
        );
    }

    #[test]
    fn at_least_one_placed_ingredient_is_required() {
        let empty = vec![Container {
            id: 1,
            name: "Container 1".into(),
            class: ContainerClass::Main,
            ingredients: vec![],
        }];
        assert_eq!(
            assemble(&meta(), &empty, &steps()).unwrap_err(),
            ValidationError::NoIngredients
        );
    }

    #[test]
    fn blank_step_descriptions_are_named_by_id() {
        let mut s = steps();
        s[1].description = "   ".into();
        assert_eq!(
            assemble(&meta(), &containers(), &s).unwrap_err(),
            ValidationError::BlankStepDescription(2)
        );
    }

    #[test]
    fn missing_taxonomy_fields_are_reported_by_name() {
        let mut m = meta();
        m.cuisine_type = "".into();
        assert_eq!(
            assemble(&m, &containers(), &steps()).unwrap_err(),
            ValidationError::MissingField("cuisine_type")
        );
        let mut m = meta();
        m.recipe_type = " ".into();
        assert_eq!(
            assemble(&m, &containers(), &steps()).unwrap_err(),
            ValidationError::MissingField("recipe_type")
        );
    }

    #[test]
    fn text_blocks_flatten_both_renditions() {
        let upload = assemble(&meta(), &containers(), &steps()).unwrap();
        assert_eq!(
            upload.ingredients,
            "200 gm rinsed Lentils\n1.5 gm Onion"
        );
        assert_eq!(
            upload.instructions,
            "1. Add Lentils (200gm); Boil\n2. Serve hot"
        );
    }

    #[test]
    fn instructions_array_spans_all_steps() {
        let upload = assemble(&meta(), &containers(), &steps()).unwrap();
        let raws: Vec<&str> = upload
            .recipe_json
            .instructions_array
            .iter()
            .map(|e| e.raw.as_str())
            .collect();
        assert_eq!(raws, vec!["Add Lentils (200gm)", "Boil", "Serve hot"]);
        // Indexing restarts per step.
        assert_eq!(upload.recipe_json.instructions_array[2].step, 1);
    }

    #[test]
    fn assembly_passes_structured_data_through_unchanged() {
        let upload = assemble(&meta(), &containers(), &steps()).unwrap();
        assert_eq!(upload.recipe_json.meta, meta());
        assert_eq!(upload.recipe_json.containers, containers());
        assert_eq!(upload.recipe_json.steps, steps());
    }
}
