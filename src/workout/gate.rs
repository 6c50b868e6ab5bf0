//! Dirty/serialization gate
//!
//! Compares the current document against the components as first loaded
//! and produces the key-free payload sent to the backend.

use std::str::FromStr;

use super::document::Document;
use super::RawComponent;

/// What the current document is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirtyBaseline {
    /// Components exactly as the backend sent them. A workout missing its
    /// warmup or cooldown is dirty as soon as the editor opens.
    #[default]
    Received,
    /// Components after normalization, so synthesized sections alone
    /// don't count as a change.
    Normalized,
}

impl FromStr for DirtyBaseline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "received" => Ok(DirtyBaseline::Received),
            "normalized" | "normalised" => Ok(DirtyBaseline::Normalized),
            other => Err(format!("unknown dirty baseline: {}", other)),
        }
    }
}

/// Holds the baseline snapshot for one editing session
#[derive(Debug, Clone)]
pub struct Gate {
    original: Vec<RawComponent>,
}

impl Gate {
    /// Snapshot the baseline. For `Normalized` the freshly loaded document
    /// is the baseline.
    pub fn new(received: &[RawComponent], loaded: &Document, baseline: DirtyBaseline) -> Self {
        let original = match baseline {
            DirtyBaseline::Received => received.to_vec(),
            DirtyBaseline::Normalized => loaded.to_raw(),
        };
        Self { original }
    }

    pub fn original(&self) -> &[RawComponent] {
        &self.original
    }

    /// Structural comparison with keys stripped: count, order, and every
    /// value down to equipment tag order.
    pub fn is_dirty(&self, current: &Document) -> bool {
        self.serialize(current) != self.original
    }

    /// The only representation ever handed to persistence
    pub fn serialize(&self, current: &Document) -> Vec<RawComponent> {
        current.to_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::{CircuitField, ExerciseField, Key, SectionKind};
    use serde_json::{Value, json};

    fn full_workout() -> Value {
        json!([
            {"id": 1, "workout_id": 3, "component_type": "warmup", "order_index": 0,
             "data": ["Jog 5 min", "Arm circles"]},
            {"id": 2, "workout_id": 3, "component_type": "circuit", "order_index": 1, "data": {
                "rounds": 3, "work_seconds": 45, "rest_seconds": 15, "rest_between_rounds": 60,
                "exercises": [
                    {"name": "Push-ups", "reps": "10-15", "equipment": []},
                    {"name": "Rows", "reps": "12", "equipment": ["band"], "category": "hpl"}
                ]}},
            {"id": 3, "workout_id": 3, "component_type": "cardio", "order_index": 99,
             "data": {"type": "Intervals", "duration_minutes": 20,
                      "details": {"rounds": 8, "instructions": "Sprint 400m"}}},
            {"id": 4, "workout_id": 3, "component_type": "cooldown", "order_index": 100,
             "data": ["Walk", "Stretch"]}
        ])
    }

    fn open(value: Value, baseline: DirtyBaseline) -> (Document, Gate) {
        let raw: Vec<RawComponent> = serde_json::from_value(value).unwrap();
        let doc = Document::load(&raw);
        let gate = Gate::new(&raw, &doc, baseline);
        (doc, gate)
    }

    fn key_of(doc: &Document, kind: SectionKind) -> Key {
        doc.sections().iter().find(|s| s.kind == kind).unwrap().key.clone().unwrap()
    }

    fn contains_field(value: &Value, field: &str) -> bool {
        match value {
            Value::Object(map) => {
                map.contains_key(field) || map.values().any(|v| contains_field(v, field))
            }
            Value::Array(items) => items.iter().any(|v| contains_field(v, field)),
            _ => false,
        }
    }

    #[test]
    fn test_clean_after_load() {
        let (doc, gate) = open(full_workout(), DirtyBaseline::Received);
        assert!(!gate.is_dirty(&doc));
        assert_eq!(serde_json::to_value(gate.serialize(&doc)).unwrap(), full_workout());
    }

    #[test]
    fn test_null_exercise_fields_stay_clean() {
        let mut input = full_workout();
        input[1]["data"]["exercises"][0] = json!({"name": "Plank", "reps": null, "equipment": null});
        let (mut doc, gate) = open(input.clone(), DirtyBaseline::Received);
        assert!(!gate.is_dirty(&doc));
        assert_eq!(serde_json::to_value(gate.serialize(&doc)).unwrap(), input);

        let circuit = key_of(&doc, SectionKind::Circuit);
        doc.add_equipment(&circuit, 0, "mat");
        let wire = serde_json::to_value(gate.serialize(&doc)).unwrap();
        assert_eq!(wire[1]["data"]["exercises"][0]["equipment"], json!(["mat"]));
        assert_eq!(wire[1]["data"]["exercises"][0]["reps"], Value::Null);
    }

    #[test]
    fn test_serialized_form_has_no_keys() {
        let (mut doc, gate) = open(full_workout(), DirtyBaseline::Received);
        let circuit = doc.add_circuit();
        doc.add_exercise(&circuit);
        let wire = serde_json::to_value(gate.serialize(&doc)).unwrap();
        for key in doc.sections().iter().filter_map(|s| s.key.as_ref()) {
            assert!(!wire.to_string().contains(key.as_str()));
        }
        assert!(!contains_field(&wire, "key"));
    }

    #[test]
    fn test_dirty_after_change_and_clean_after_revert() {
        let (mut doc, gate) = open(full_workout(), DirtyBaseline::Received);
        let circuit = key_of(&doc, SectionKind::Circuit);

        doc.set_circuit_field(&circuit, CircuitField::Rounds, "4");
        assert!(gate.is_dirty(&doc));
        doc.set_circuit_field(&circuit, CircuitField::Rounds, "3");
        assert!(!gate.is_dirty(&doc));

        doc.update_exercise(&circuit, 0, ExerciseField::Name("Pike push-ups".into()));
        assert!(gate.is_dirty(&doc));
        doc.update_exercise(&circuit, 0, ExerciseField::Name("Push-ups".into()));
        assert!(!gate.is_dirty(&doc));

        doc.add_equipment(&circuit, 1, "bench");
        assert!(gate.is_dirty(&doc));
        doc.remove_equipment(&circuit, 1, "bench");
        assert!(!gate.is_dirty(&doc));
    }

    #[test]
    fn test_text_edit_round_trip() {
        let (mut doc, gate) = open(full_workout(), DirtyBaseline::Received);
        let warmup = key_of(&doc, SectionKind::Warmup);
        doc.set_text_lines(&warmup, "Jog 5 min");
        assert!(gate.is_dirty(&doc));
        doc.set_text_lines(&warmup, "Jog 5 min\nArm circles");
        assert!(!gate.is_dirty(&doc));
    }

    #[test]
    fn test_equipment_order_matters() {
        let (mut doc, gate) = open(full_workout(), DirtyBaseline::Received);
        let circuit = key_of(&doc, SectionKind::Circuit);
        doc.update_exercise(&circuit, 1, ExerciseField::Equipment(vec!["band".into(), "bar".into()]));
        let dirty_with_two = gate.is_dirty(&doc);
        doc.update_exercise(&circuit, 1, ExerciseField::Equipment(vec!["band".into()]));
        assert!(dirty_with_two);
        assert!(!gate.is_dirty(&doc));
    }

    #[test]
    fn test_removing_section_is_dirty() {
        let (mut doc, gate) = open(full_workout(), DirtyBaseline::Received);
        let cardio = key_of(&doc, SectionKind::Cardio);
        doc.remove_section(&cardio);
        assert!(gate.is_dirty(&doc));
        assert_eq!(gate.serialize(&doc).len(), 3);
    }

    #[test]
    fn test_circuit_only_scenario() {
        let input = json!([{"component_type": "circuit", "order_index": 1, "data": {
            "rounds": 3, "work_seconds": 45, "rest_seconds": 15, "rest_between_rounds": 60,
            "exercises": [{"name": "Push-ups", "reps": "10-15", "equipment": []}]}}]);
        let (doc, gate) = open(input.clone(), DirtyBaseline::Received);

        assert_eq!(doc.sections().len(), 3);
        let exercise = &doc.sections()[1].payload.as_circuit().unwrap().exercises[0];
        assert!(!exercise.key.as_ref().unwrap().as_str().is_empty());

        let expected = json!([
            {"component_type": "warmup", "order_index": 0, "data": []},
            input[0].clone(),
            {"component_type": "cooldown", "order_index": 100, "data": []}
        ]);
        assert_eq!(serde_json::to_value(gate.serialize(&doc)).unwrap(), expected);

        // Synthesized sections differ from what was received
        assert!(gate.is_dirty(&doc));
    }

    #[test]
    fn test_normalized_baseline_ignores_synthesized_sections() {
        let input = json!([{"component_type": "cardio", "order_index": 99,
                            "data": {"type": "Distance", "duration_minutes": 45}}]);
        let (mut doc, gate) = open(input, DirtyBaseline::Normalized);
        assert!(!gate.is_dirty(&doc));
        assert_eq!(gate.original().len(), 3);

        doc.add_circuit();
        assert!(gate.is_dirty(&doc));
    }

    #[test]
    fn test_remove_only_exercise_serializes_empty_circuit() {
        let (mut doc, gate) = open(full_workout(), DirtyBaseline::Received);
        let circuit = key_of(&doc, SectionKind::Circuit);
        doc.remove_exercise(&circuit, 1);
        doc.remove_exercise(&circuit, 0);
        let wire = gate.serialize(&doc);
        assert_eq!(wire[1].component_type, "circuit");
        assert_eq!(wire[1].data["exercises"], json!([]));
    }

    #[test]
    fn test_baseline_from_str() {
        assert_eq!("received".parse::<DirtyBaseline>(), Ok(DirtyBaseline::Received));
        assert_eq!("Normalized".parse::<DirtyBaseline>(), Ok(DirtyBaseline::Normalized));
        assert!("sometimes".parse::<DirtyBaseline>().is_err());
    }
}
