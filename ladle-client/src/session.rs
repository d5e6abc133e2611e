//! The recipe authoring session: one struct owning the container grid, the
//! step sequence, and the recipe metadata, mutated only through the methods
//! here. UI layers observe it; they never hold fragments of its state.

use crate::assemble;
use crate::instructions::derive_instructions;
use crate::placement::{default_units, DragPayload, PlacementError};
use ladle::recipe_json::{
    Container, ContainerClass, PlacedIngredient, RecipeData, RecipeForUpload, RecipeMeta,
    RecipeStep,
};

/// What a successful drop did to the target container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// A new entry was inserted.
    Placed,
    /// The target already held this ingredient; its quantity grew by one.
    Merged,
    /// Dropped back onto its own container; nothing to do.
    Unchanged,
}

/// Fields of a step an edit may change. `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct StepPatch {
    pub description: Option<String>,
    pub time: Option<u32>,
    pub temperature: Option<i32>,
}

pub struct RecipeAuthoringSession {
    pub meta: RecipeMeta,
    containers: Vec<Container>,
    steps: Vec<RecipeStep>,
    // High-water mark so retired step ids are never reissued.
    next_step_id: u32,
}

impl Default for RecipeAuthoringSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeAuthoringSession {
    /// A fresh session: the standard sixteen-container grid and one empty
    /// default step.
    pub fn new() -> Self {
        Self {
            meta: RecipeMeta::default(),
            containers: standard_containers(),
            steps: vec![RecipeStep {
                id: 1,
                description: String::new(),
                time: None,
                temperature: None,
                additional_data: None,
            }],
            next_step_id: 2,
        }
    }

    /// Rebuild a session from a persisted `recipe_json` document, e.g. when
    /// re-editing a recipe. The structured arrays are trusted as-is; nothing
    /// is re-derived on load.
    pub fn from_recipe_data(data: RecipeData) -> Self {
        let next_step_id = data.steps.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        Self {
            meta: data.meta,
            containers: data.containers,
            steps: data.steps,
            next_step_id,
        }
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn steps(&self) -> &[RecipeStep] {
        &self.steps
    }

    /// Handle a raw drag payload as it comes off the drop event. A payload
    /// that does not parse is logged and ignored; drag payloads are
    /// caller-controlled strings, not trusted input.
    pub fn handle_drop_text(
        &mut self,
        payload_json: &str,
        target_container_id: u8,
    ) -> Result<Option<DropOutcome>, PlacementError> {
        let payload = match DragPayload::parse(payload_json) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(%error, "discarding unreadable drag payload");
                return Ok(None);
            }
        };
        self.apply_drop(payload, target_container_id).map(Some)
    }

    /// Validate and apply one drop. On any error the container set is left
    /// exactly as it was.
    pub fn apply_drop(
        &mut self,
        payload: DragPayload,
        target_container_id: u8,
    ) -> Result<DropOutcome, PlacementError> {
        let target_index = self
            .containers
            .iter()
            .position(|c| c.id == target_container_id)
            .ok_or(PlacementError::UnknownContainer(target_container_id))?;
        let target_class = self.containers[target_index].class;
        if payload.effective_class() != target_class {
            return Err(PlacementError::IncompatibleDrop {
                expected: target_class,
            });
        }

        // Build the entry to land, detaching it from its source container
        // first so quantity, units and prep travel with the move.
        let placed = match payload {
            DragPayload::ContainerItem {
                ingredient,
                origin_container_id,
            } => {
                if origin_container_id == target_container_id {
                    return Ok(DropOutcome::Unchanged);
                }
                if let Some(source) = self
                    .containers
                    .iter_mut()
                    .find(|c| c.id == origin_container_id)
                {
                    source.ingredients.retain(|i| i.id != ingredient.id);
                }
                ingredient
            }
            DragPayload::CatalogItem { ingredient, .. } => PlacedIngredient {
                units: default_units(ingredient.kind, &ingredient.name).to_string(),
                id: ingredient.id,
                name: ingredient.name,
                kind: ingredient.kind,
                quantity: 1.0,
                prep_type: None,
            },
        };

        let target = &mut self.containers[target_index];
        match target.ingredients.iter_mut().find(|i| i.id == placed.id) {
            Some(existing) => {
                existing.quantity += 1.0;
                Ok(DropOutcome::Merged)
            }
            None => {
                target.ingredients.push(placed);
                Ok(DropOutcome::Placed)
            }
        }
    }

    /// Delete an ingredient from a container. Absent entries are a no-op.
    pub fn remove_ingredient(&mut self, container_id: u8, ingredient_id: &str) -> bool {
        let Some(container) = self.containers.iter_mut().find(|c| c.id == container_id) else {
            return false;
        };
        let before = container.ingredients.len();
        container.ingredients.retain(|i| i.id != ingredient_id);
        container.ingredients.len() != before
    }

    /// Set quantity, units and prep for a placed ingredient, e.g. from the
    /// details dialog after a drop. A quantity of zero or less removes the
    /// entry instead.
    pub fn update_ingredient_quantity(
        &mut self,
        container_id: u8,
        ingredient_id: &str,
        quantity: f64,
        units: Option<String>,
        prep_type: Option<String>,
    ) -> bool {
        if quantity <= 0.0 {
            return self.remove_ingredient(container_id, ingredient_id);
        }
        let Some(entry) = self
            .containers
            .iter_mut()
            .find(|c| c.id == container_id)
            .and_then(|c| c.ingredients.iter_mut().find(|i| i.id == ingredient_id))
        else {
            return false;
        };
        entry.quantity = quantity;
        if let Some(units) = units {
            entry.units = units;
        }
        if let Some(prep) = prep_type {
            entry.prep_type = Some(prep);
        }
        true
    }

    /// Append a new empty step and return its id. Ids only ever grow, so a
    /// removed step's id is never reissued within the session.
    pub fn add_step(&mut self) -> u32 {
        let id = self.next_step_id;
        self.next_step_id += 1;
        self.steps.push(RecipeStep {
            id,
            description: String::new(),
            time: None,
            temperature: None,
            additional_data: None,
        });
        id
    }

    /// Merge a patch into the step with this id, re-deriving its structured
    /// instructions when the description changed. Returns false when no such
    /// step exists.
    pub fn update_step(&mut self, id: u32, patch: StepPatch) -> bool {
        let Some(step) = self.steps.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        if let Some(time) = patch.time {
            step.time = Some(time);
        }
        if let Some(temperature) = patch.temperature {
            step.temperature = Some(temperature);
        }
        if let Some(description) = patch.description {
            let derived = derive_instructions(&description);
            step.description = description;
            // Skip the write when derivation produced the same entries, so
            // observers don't see a phantom change.
            if step.instructions() != derived.as_slice() {
                step.set_instructions(derived);
            }
        }
        true
    }

    /// Remove a step. Remaining ids are stable identifiers and are not
    /// renumbered.
    pub fn remove_step(&mut self, id: u32) -> bool {
        let before = self.steps.len();
        self.steps.retain(|s| s.id != id);
        self.steps.len() != before
    }

    /// Validate the session and produce the upload payload. See
    /// [`assemble::assemble`] for the rules.
    pub fn assemble(&self) -> Result<RecipeForUpload, assemble::ValidationError> {
        assemble::assemble(&self.meta, &self.containers, &self.steps)
    }
}

/// The standard authoring grid: six main-ingredient containers, eight
/// seasoning containers, and two water/oil containers.
pub fn standard_containers() -> Vec<Container> {
    (1..=16u8)
        .map(|id| {
            let class = match id {
                1..=6 => ContainerClass::Main,
                7..=14 => ContainerClass::Seasoning,
                _ => ContainerClass::WaterOil,
            };
            Container {
                id,
                name: format!("Container {id}"),
                class,
                ingredients: vec![],
            }
        })
        .collect()
}
