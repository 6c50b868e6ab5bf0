//! Structure normalizer - canonical warmup/cooldown and key assignment

use rand::Rng;
use rand::distributions::Alphanumeric;

use super::{Key, Payload, Section, SectionKind};

/// order_index used for a synthesized warmup
pub const WARMUP_ORDER_INDEX: i64 = 0;
/// order_index used for a synthesized cooldown
pub const COOLDOWN_ORDER_INDEX: i64 = 100;

/// Ephemeral key generator. One per document: the random prefix keeps keys
/// from different sessions apart, the counter keeps them unique within one.
#[derive(Debug, Clone)]
pub struct KeyGen {
    prefix: String,
    next: u64,
}

impl KeyGen {
    pub fn new() -> Self {
        let prefix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();
        Self { prefix, next: 0 }
    }

    pub fn fresh(&mut self) -> Key {
        self.next += 1;
        Key::from(format!("{}-{}", self.prefix, self.next))
    }

    /// Fill in a missing key, leave an existing one alone
    fn ensure(&mut self, key: &mut Option<Key>) {
        if key.is_none() {
            *key = Some(self.fresh());
        }
    }

    /// Key every circuit exercise of a payload that doesn't have one yet
    pub fn ensure_payload(&mut self, payload: &mut Payload) {
        if let Payload::Circuit(circuit) = payload {
            for exercise in circuit.exercises.iter_mut() {
                self.ensure(&mut exercise.key);
            }
        }
    }
}

impl Default for KeyGen {
    fn default() -> Self {
        Self::new()
    }
}

/// Ensure a warmup and a cooldown exist and every section and circuit
/// exercise carries a key. Nothing else is added, removed or reordered.
pub fn normalize(sections: impl IntoIterator<Item = Section>, keys: &mut KeyGen) -> Vec<Section> {
    let mut sections: Vec<Section> = sections.into_iter().collect();

    if !sections.iter().any(|s| s.kind == SectionKind::Warmup) {
        sections.insert(
            0,
            Section::new(SectionKind::Warmup, WARMUP_ORDER_INDEX, Payload::Lines(Vec::new())),
        );
    }

    if !sections.iter().any(|s| s.kind == SectionKind::Cooldown) {
        sections.push(Section::new(
            SectionKind::Cooldown,
            COOLDOWN_ORDER_INDEX,
            Payload::Lines(Vec::new()),
        ));
    }

    for section in sections.iter_mut() {
        keys.ensure(&mut section.key);
        keys.ensure_payload(&mut section.payload);
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::{Key, RawComponent};
    use serde_json::{Value, json};
    use std::collections::HashSet;

    fn sections(value: Value) -> Vec<Section> {
        let raw: Vec<RawComponent> = serde_json::from_value(value).unwrap();
        raw.into_iter().map(Section::from).collect()
    }

    fn all_keys(sections: &[Section]) -> Vec<Key> {
        let mut keys = Vec::new();
        for s in sections {
            keys.extend(s.key.clone());
            if let Some(c) = s.payload.as_circuit() {
                keys.extend(c.exercises.iter().filter_map(|e| e.key.clone()));
            }
        }
        keys
    }

    fn kinds(sections: &[Section]) -> Vec<&str> {
        sections.iter().map(|s| s.kind.as_str()).collect()
    }

    #[test]
    fn test_synthesizes_warmup_and_cooldown() {
        let mut keys = KeyGen::new();
        let result = normalize(
            sections(json!([{"component_type": "cardio", "order_index": 99,
                             "data": {"type": "Distance", "duration_minutes": 40}}])),
            &mut keys,
        );
        assert_eq!(kinds(&result), vec!["warmup", "cardio", "cooldown"]);
        assert_eq!(result[0].payload, Payload::Lines(vec![]));
        assert_eq!(result[0].order_index, 0);
        assert_eq!(result[2].payload, Payload::Lines(vec![]));
        assert_eq!(result[2].order_index, 100);
    }

    #[test]
    fn test_existing_sections_not_duplicated() {
        let mut keys = KeyGen::new();
        let result = normalize(
            sections(json!([
                {"component_type": "cooldown", "order_index": 100, "data": ["Stretch"]},
                {"component_type": "warmup", "order_index": 0, "data": ["Jog"]}
            ])),
            &mut keys,
        );
        // Order as received, nothing synthesized
        assert_eq!(kinds(&result), vec!["cooldown", "warmup"]);
    }

    #[test]
    fn test_empty_input() {
        let mut keys = KeyGen::new();
        let result = normalize(Vec::new(), &mut keys);
        assert_eq!(kinds(&result), vec!["warmup", "cooldown"]);
    }

    #[test]
    fn test_every_section_and_exercise_keyed_uniquely() {
        let mut keys = KeyGen::new();
        let result = normalize(
            sections(json!([
                {"component_type": "circuit", "order_index": 1, "data": {
                    "rounds": 3, "work_seconds": 45, "rest_seconds": 15, "rest_between_rounds": 60,
                    "exercises": [
                        {"name": "Push-ups", "reps": "10-15", "equipment": []},
                        {"name": "Rows", "reps": "12", "equipment": ["band"]}
                    ]}},
                {"component_type": "circuit", "order_index": 2, "data": {
                    "rounds": 2, "work_seconds": 30, "rest_seconds": 30, "rest_between_rounds": 90,
                    "exercises": [{"name": "Squats", "reps": "20", "equipment": []}]}}
            ])),
            &mut keys,
        );
        let all = all_keys(&result);
        // 4 sections + 3 exercises
        assert_eq!(all.len(), 7);
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), 7);
    }

    #[test]
    fn test_idempotent() {
        let mut keys = KeyGen::new();
        let once = normalize(
            sections(json!([{"component_type": "circuit", "order_index": 1, "data": {
                "rounds": 3, "work_seconds": 45, "rest_seconds": 15, "rest_between_rounds": 60,
                "exercises": [{"name": "Push-ups", "reps": "10-15", "equipment": []}]}}])),
            &mut keys,
        );
        let twice = normalize(once.clone(), &mut keys);
        assert_eq!(once, twice);
        assert_eq!(all_keys(&once), all_keys(&twice));
    }

    #[test]
    fn test_fills_only_missing_keys() {
        let mut keys = KeyGen::new();
        let mut once = normalize(Vec::new(), &mut keys);
        let warmup_key = once[0].key.clone();
        once[1].key = None;

        let again = normalize(once, &mut keys);
        assert_eq!(again[0].key, warmup_key);
        assert!(again[1].key.is_some());
        assert_ne!(again[1].key, warmup_key);
    }

    #[test]
    fn test_keygen_never_repeats() {
        let mut keys = KeyGen::new();
        let generated: HashSet<_> = (0..1000).map(|_| keys.fresh()).collect();
        assert_eq!(generated.len(), 1000);
    }
}
