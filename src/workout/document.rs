//! Editable document - in-memory copy of one workout's sections
//!
//! Sections are addressed by key, exercises by (circuit key, position).
//! Operations on a key that isn't there do nothing: the editor only issues
//! them for entities it has just displayed.

use tracing::debug;

use super::normalize::{KeyGen, normalize};
use super::{Circuit, Exercise, Key, Payload, RawComponent, Section, SectionKind};
use super::{NEW_EXERCISE_NAME, NEW_EXERCISE_REPS};

/// Numeric circuit settings editable as text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitField {
    Rounds,
    WorkSeconds,
    RestSeconds,
    RestBetweenRounds,
}

impl CircuitField {
    pub fn all() -> &'static [CircuitField] {
        &[
            CircuitField::Rounds,
            CircuitField::WorkSeconds,
            CircuitField::RestSeconds,
            CircuitField::RestBetweenRounds,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            CircuitField::Rounds => "Rounds",
            CircuitField::WorkSeconds => "Work (s)",
            CircuitField::RestSeconds => "Rest (s)",
            CircuitField::RestBetweenRounds => "Round rest (s)",
        }
    }

    pub fn get(&self, circuit: &Circuit) -> u32 {
        match self {
            CircuitField::Rounds => circuit.rounds,
            CircuitField::WorkSeconds => circuit.work_seconds,
            CircuitField::RestSeconds => circuit.rest_seconds,
            CircuitField::RestBetweenRounds => circuit.rest_between_rounds,
        }
    }

    fn slot<'a>(&self, circuit: &'a mut Circuit) -> &'a mut u32 {
        match self {
            CircuitField::Rounds => &mut circuit.rounds,
            CircuitField::WorkSeconds => &mut circuit.work_seconds,
            CircuitField::RestSeconds => &mut circuit.rest_seconds,
            CircuitField::RestBetweenRounds => &mut circuit.rest_between_rounds,
        }
    }
}

/// New value for one exercise field
#[derive(Debug, Clone, PartialEq)]
pub enum ExerciseField {
    Name(String),
    Reps(String),
    Equipment(Vec<String>),
}

/// Lenient integer parse for form input: skips leading whitespace, accepts
/// one `+` and takes the leading digits ("12abc" -> 12, "3.5" -> 3).
/// Negative numbers and text without leading digits are 0. Values too large
/// for `u32` saturate.
pub fn parse_count(raw: &str) -> u32 {
    let raw = raw.trim_start();
    if raw.starts_with('-') {
        return 0;
    }
    let unsigned = raw.strip_prefix('+').unwrap_or(raw);
    let digits: String = unsigned.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u32::MAX)
}

/// Split textarea content into lines. Empty text means no lines, where a
/// plain `split('\n')` would give one empty line: a cleared warmup then
/// serializes as `[]`, the same shape a synthesized one has.
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Mutable, normalized section list of one workout
#[derive(Debug, Clone)]
pub struct Document {
    sections: Vec<Section>,
    keys: KeyGen,
}

impl Document {
    /// Copy the backend components and normalize them
    pub fn load(components: &[RawComponent]) -> Self {
        let mut keys = KeyGen::new();
        let sections = normalize(components.iter().cloned().map(Section::from), &mut keys);
        debug!("Loaded document with {} sections", sections.len());
        Self { sections, keys }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, key: &Key) -> Option<&Section> {
        self.sections.iter().find(|s| s.has_key(key))
    }

    fn section_mut(&mut self, key: &Key) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.has_key(key))
    }

    fn circuit_mut(&mut self, key: &Key) -> Option<&mut Circuit> {
        self.section_mut(key).and_then(|s| s.payload.as_circuit_mut())
    }

    fn exercise_mut(&mut self, key: &Key, index: usize) -> Option<&mut Exercise> {
        self.circuit_mut(key).and_then(|c| c.exercises.get_mut(index))
    }

    pub fn circuit_count(&self) -> usize {
        self.sections.iter().filter(|s| s.kind == SectionKind::Circuit).count()
    }

    /// Sections in editor order: warmup, circuits, cardio, cooldown.
    /// Unrecognized types are left out.
    pub fn display_order(&self) -> Vec<&Section> {
        let mut ordered = Vec::with_capacity(self.sections.len());
        for kind in [
            SectionKind::Warmup,
            SectionKind::Circuit,
            SectionKind::Cardio,
            SectionKind::Cooldown,
        ] {
            ordered.extend(self.sections.iter().filter(|s| s.kind == kind));
        }
        ordered
    }

    /// Wire form in document order, keys stripped
    pub fn to_raw(&self) -> Vec<RawComponent> {
        self.sections.iter().map(Section::to_raw).collect()
    }

    /// Replace a section's payload wholesale. Circuit exercises that come
    /// in without a key get one; existing keys are kept.
    pub fn update_payload(&mut self, key: &Key, mut payload: Payload) {
        let Some(index) = self.sections.iter().position(|s| s.has_key(key)) else {
            return;
        };
        self.keys.ensure_payload(&mut payload);
        self.sections[index].payload = payload;
    }

    pub fn remove_section(&mut self, key: &Key) {
        self.sections.retain(|s| !s.has_key(key));
    }

    /// Warmup/cooldown text editing: one line per entry
    pub fn set_text_lines(&mut self, key: &Key, text: &str) {
        self.update_payload(key, Payload::Lines(split_lines(text)));
    }

    pub fn set_circuit_field(&mut self, key: &Key, field: CircuitField, raw: &str) {
        if let Some(circuit) = self.circuit_mut(key) {
            *field.slot(circuit) = parse_count(raw);
        }
    }

    /// Add a default circuit in front of the first cardio (or cooldown)
    /// section, so circuits always come before them.
    pub fn add_circuit(&mut self) -> Key {
        let mut circuit = Circuit::default();
        for exercise in circuit.exercises.iter_mut() {
            exercise.key = Some(self.keys.fresh());
        }

        let key = self.keys.fresh();
        let mut section = Section::new(
            SectionKind::Circuit,
            self.circuit_count() as i64 + 1,
            Payload::Circuit(circuit),
        );
        section.key = Some(key.clone());

        let position = self
            .sections
            .iter()
            .position(|s| s.kind == SectionKind::Cardio)
            .or_else(|| self.sections.iter().position(|s| s.kind == SectionKind::Cooldown))
            .unwrap_or(self.sections.len());
        self.sections.insert(position, section);

        debug!("Added circuit {} at position {}", key, position);
        key
    }

    /// Append a default exercise to a circuit
    pub fn add_exercise(&mut self, circuit: &Key) -> Option<Key> {
        let key = self.keys.fresh();
        let target = self.circuit_mut(circuit)?;
        let mut exercise = Exercise::new(NEW_EXERCISE_NAME, NEW_EXERCISE_REPS);
        exercise.key = Some(key.clone());
        target.exercises.push(exercise);
        Some(key)
    }

    pub fn update_exercise(&mut self, circuit: &Key, index: usize, field: ExerciseField) {
        let Some(exercise) = self.exercise_mut(circuit, index) else {
            return;
        };
        match field {
            ExerciseField::Name(name) => exercise.name = name,
            ExerciseField::Reps(reps) => exercise.reps = Some(Some(reps)),
            ExerciseField::Equipment(tags) => exercise.equipment = Some(Some(tags)),
        }
    }

    pub fn remove_exercise(&mut self, circuit: &Key, index: usize) {
        if let Some(target) = self.circuit_mut(circuit)
            && index < target.exercises.len()
        {
            target.exercises.remove(index);
        }
    }

    /// Add a trimmed equipment tag unless blank or already present
    pub fn add_equipment(&mut self, circuit: &Key, index: usize, tag: &str) {
        let tag = tag.trim();
        if tag.is_empty() {
            return;
        }
        let Some(exercise) = self.exercise_mut(circuit, index) else {
            return;
        };
        let tags = exercise.equipment.get_or_insert(None).get_or_insert_with(Vec::new);
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }

    /// Remove every occurrence of an exact tag
    pub fn remove_equipment(&mut self, circuit: &Key, index: usize, tag: &str) {
        if let Some(exercise) = self.exercise_mut(circuit, index)
            && let Some(Some(tags)) = exercise.equipment.as_mut()
        {
            tags.retain(|t| t != tag);
        }
    }
}
