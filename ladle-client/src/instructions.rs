//! Derives structured instruction entries from a step's free-text
//! description. This is a best-effort heuristic over lines shaped like
//! `Add Salt (5g)`; anything else still yields an entry, with `raw`
//! preserved and the structured fields left empty. The derivation is pure,
//! so re-running it on an unchanged description yields identical output.

use ladle::recipe_json::InstructionEntry;
use regex::Regex;

lazy_static::lazy_static! {
    // Optional "Add " prefix, a name running up to an optional
    // "(<number><unit>)" suffix. Unmatched lines fall through with empty
    // structured fields rather than erroring.
    static ref LINE: Regex = Regex::new(
        r"^(?:[Aa]dd\s+)?([^(]*?)\s*(?:\(\s*(\d+(?:\.\d+)?)\s*([A-Za-z]*)\s*\))?$"
    ).expect("instruction line pattern");
}

/// Parse a step description into one ordered entry per non-blank line.
/// `step` is the 1-based line index within this description.
pub fn derive_instructions(description: &str) -> Vec<InstructionEntry> {
    description
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| {
            let caps = LINE.captures(line);
            let group = |n| {
                caps.as_ref()
                    .and_then(|c| c.get(n))
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default()
            };
            InstructionEntry {
                step: index as u32 + 1,
                instruction: group(1),
                quantity: group(2),
                units: group(3),
                raw: line.to_string(),
                image_url: String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_quantity_and_units() {
        let entries = derive_instructions("Add Salt (5g)\nStir");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].step, 1);
        assert_eq!(entries[0].instruction, "Salt");
        assert_eq!(entries[0].quantity, "5");
        assert_eq!(entries[0].units, "g");
        assert_eq!(entries[0].raw, "Add Salt (5g)");
        assert_eq!(entries[1].step, 2);
        assert_eq!(entries[1].instruction, "Stir");
        assert_eq!(entries[1].quantity, "");
        assert_eq!(entries[1].units, "");
        assert_eq!(entries[1].raw, "Stir");
    }

    #[test]
    fn blank_lines_are_dropped_and_numbering_stays_dense() {
        let entries = derive_instructions("Add Onion (50gm)\n\n   \nSimmer");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].step, 1);
        assert_eq!(entries[1].step, 2);
        assert_eq!(entries[1].raw, "Simmer");
    }

    #[test]
    fn derivation_is_idempotent() {
        let description = "Add Salt (5g)\nBoil for ten minutes\nAdd Rice (200 gm)";
        assert_eq!(
            derive_instructions(description),
            derive_instructions(description)
        );
    }

    #[test]
    fn fractional_quantities_are_kept_verbatim() {
        let entries = derive_instructions("Add Turmeric (0.5g)");
        assert_eq!(entries[0].quantity, "0.5");
        assert_eq!(entries[0].units, "g");
    }

    #[test]
    fn malformed_lines_never_panic_and_keep_raw() {
        for line in ["(((", "Add (", ")5g(", "Add  (5)", "🍲🍲🍲"] {
            let entries = derive_instructions(line);
            assert_eq!(entries.len(), 1, "line {line:?}");
            assert_eq!(entries[0].raw, line);
            assert_eq!(entries[0].image_url, "");
        }
    }

    #[test]
    fn empty_description_derives_nothing() {
        assert!(derive_instructions("").is_empty());
        assert!(derive_instructions("\n\n").is_empty());
    }
}
