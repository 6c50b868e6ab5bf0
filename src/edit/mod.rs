//! Edit session - one open workout editor
//!
//! Ties the document and its dirty gate to a persistence collaborator and a
//! confirmation collaborator. Saves are one at a time: a save requested
//! while another is in flight, or with nothing changed, is skipped.

use std::future::Future;

use tracing::{info, warn};

use crate::workout::{DirtyBaseline, Document, Gate, Key, RawComponent, SectionKind};

/// Persistence collaborator: replaces every component of one workout
pub trait WorkoutStore {
    fn replace_components(
        &self,
        workout_id: i64,
        components: &[RawComponent],
    ) -> impl Future<Output = anyhow::Result<()>>;
}

/// Yes/no question put to the user before something destructive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
    pub destructive: bool,
}

impl ConfirmPrompt {
    pub fn discard_changes() -> Self {
        Self {
            title: "Discard changes?".to_string(),
            message: "You have unsaved changes. Are you sure you want to discard them?"
                .to_string(),
            destructive: true,
        }
    }

    pub fn delete_section() -> Self {
        Self {
            title: "Delete section".to_string(),
            message: "Delete this entire section?".to_string(),
            destructive: true,
        }
    }
}

/// Confirmation collaborator
pub trait Confirm {
    fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Result of a save request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Nothing changed or a save is already running
    Skipped,
    /// Store rejected the save; the document is untouched
    Failed(String),
}

pub struct EditSession<S> {
    workout_id: i64,
    doc: Document,
    gate: Gate,
    store: S,
    saving: bool,
}

impl<S: WorkoutStore> EditSession<S> {
    /// Open an editor on a workout's components
    pub fn open(
        workout_id: i64,
        components: &[RawComponent],
        baseline: DirtyBaseline,
        store: S,
    ) -> Self {
        let doc = Document::load(components);
        let gate = Gate::new(components, &doc, baseline);
        info!(workout_id, sections = doc.sections().len(), "Opened workout editor");
        Self {
            workout_id,
            doc,
            gate,
            store,
            saving: false,
        }
    }

    pub fn workout_id(&self) -> i64 {
        self.workout_id
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable access for the editor's field operations
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn is_dirty(&self) -> bool {
        self.gate.is_dirty(&self.doc)
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn can_save(&self) -> bool {
        self.is_dirty() && !self.saving
    }

    pub fn payload(&self) -> Vec<RawComponent> {
        self.gate.serialize(&self.doc)
    }

    pub async fn save(&mut self) -> SaveOutcome {
        if !self.can_save() {
            return SaveOutcome::Skipped;
        }

        let payload = self.payload();
        let result = {
            let _in_flight = InFlight::start(&mut self.saving);
            self.store.replace_components(self.workout_id, &payload).await
        };

        match result {
            Ok(()) => {
                info!(workout_id = self.workout_id, components = payload.len(), "Workout saved");
                SaveOutcome::Saved
            }
            Err(e) => {
                warn!(workout_id = self.workout_id, "Failed to save workout: {:#}", e);
                SaveOutcome::Failed(e.to_string())
            }
        }
    }

    /// Whether the editor may close. Unsaved changes need confirmation.
    pub fn request_cancel(&self, confirm: &impl Confirm) -> bool {
        if !self.is_dirty() {
            return true;
        }
        confirm.confirm(&ConfirmPrompt::discard_changes())
    }

    /// Remove a circuit or cardio section after confirmation.
    /// Returns whether it was removed.
    pub fn remove_section_confirmed(&mut self, key: &Key, confirm: &impl Confirm) -> bool {
        let removable = self
            .doc
            .section(key)
            .is_some_and(|s| matches!(s.kind, SectionKind::Circuit | SectionKind::Cardio));
        if !removable || !confirm.confirm(&ConfirmPrompt::delete_section()) {
            return false;
        }
        self.doc.remove_section(key);
        true
    }
}

/// Holds the save-in-flight flag up while alive. Dropping the save future
/// mid-request still clears it.
struct InFlight<'a> {
    flag: &'a mut bool,
}

impl<'a> InFlight<'a> {
    fn start(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::CircuitField;
    use serde_json::json;
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    /// In-memory store that records every replace call
    #[derive(Default)]
    struct MemoryStore {
        saved: RefCell<Vec<(i64, Vec<RawComponent>)>>,
        fail: bool,
        hang: bool,
    }

    impl WorkoutStore for MemoryStore {
        async fn replace_components(
            &self,
            workout_id: i64,
            components: &[RawComponent],
        ) -> anyhow::Result<()> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            if self.fail {
                anyhow::bail!("HTTP 500: database is locked");
            }
            self.saved.borrow_mut().push((workout_id, components.to_vec()));
            Ok(())
        }
    }

    /// Answers every prompt the same way and remembers what it was asked
    struct Scripted {
        answer: bool,
        asked: RefCell<Vec<ConfirmPrompt>>,
        calls: Cell<usize>,
    }

    impl Scripted {
        fn new(answer: bool) -> Self {
            Self {
                answer,
                asked: RefCell::new(Vec::new()),
                calls: Cell::new(0),
            }
        }
    }

    impl Confirm for Scripted {
        fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.asked.borrow_mut().push(prompt.clone());
            self.answer
        }
    }

    fn components() -> Vec<RawComponent> {
        serde_json::from_value(json!([
            {"component_type": "warmup", "order_index": 0, "data": ["Jog"]},
            {"component_type": "circuit", "order_index": 1, "data": {
                "rounds": 3, "work_seconds": 45, "rest_seconds": 15, "rest_between_rounds": 60,
                "exercises": [{"name": "Push-ups", "reps": "10", "equipment": []}]}},
            {"component_type": "cardio", "order_index": 99, "data": {"type": "Tempo", "duration_minutes": 25}},
            {"component_type": "cooldown", "order_index": 100, "data": ["Stretch"]}
        ]))
        .unwrap()
    }

    fn open(store: MemoryStore) -> EditSession<MemoryStore> {
        EditSession::open(7, &components(), DirtyBaseline::Received, store)
    }

    fn circuit_key(session: &EditSession<MemoryStore>) -> Key {
        session.document().sections()[1].key.clone().unwrap()
    }

    #[tokio::test]
    async fn test_save_skipped_when_clean() {
        let mut session = open(MemoryStore::default());
        assert!(!session.can_save());
        assert_eq!(session.save().await, SaveOutcome::Skipped);
        assert!(session.store.saved.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_save_sends_stripped_payload() {
        let mut session = open(MemoryStore::default());
        let key = circuit_key(&session);
        session.document_mut().set_circuit_field(&key, CircuitField::Rounds, "5");
        assert!(session.can_save());

        assert_eq!(session.save().await, SaveOutcome::Saved);
        assert!(!session.is_saving());

        let saved = session.store.saved.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, 7);
        assert_eq!(saved[0].1[1].data["rounds"], json!(5));
        assert_eq!(saved[0].1.len(), 4);
    }

    #[tokio::test]
    async fn test_save_skipped_while_in_flight() {
        let mut session = open(MemoryStore::default());
        let key = circuit_key(&session);
        session.document_mut().set_circuit_field(&key, CircuitField::Rounds, "5");
        session.saving = true;
        assert!(!session.can_save());
        assert_eq!(session.save().await, SaveOutcome::Skipped);
        assert!(session.store.saved.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_save_clears_in_flight() {
        let mut session = open(MemoryStore { hang: true, ..Default::default() });
        let key = circuit_key(&session);
        session.document_mut().set_circuit_field(&key, CircuitField::Rounds, "5");

        let abandoned = tokio::time::timeout(Duration::from_millis(20), session.save()).await;
        assert!(abandoned.is_err());
        assert!(!session.is_saving());
        assert!(session.can_save());
        assert!(session.store.saved.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_document() {
        let mut session = open(MemoryStore { fail: true, ..Default::default() });
        let key = circuit_key(&session);
        session.document_mut().set_circuit_field(&key, CircuitField::Rounds, "5");
        let before = session.payload();

        match session.save().await {
            SaveOutcome::Failed(msg) => assert!(msg.contains("500")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(session.payload(), before);
        assert!(session.is_dirty());
        assert!(session.can_save());
    }

    #[test]
    fn test_cancel_clean_needs_no_confirmation() {
        let session = open(MemoryStore::default());
        let confirm = Scripted::new(false);
        assert!(session.request_cancel(&confirm));
        assert_eq!(confirm.calls.get(), 0);
    }

    #[test]
    fn test_cancel_dirty_asks_first() {
        let mut session = open(MemoryStore::default());
        let key = circuit_key(&session);
        session.document_mut().add_exercise(&key);

        let declined = Scripted::new(false);
        assert!(!session.request_cancel(&declined));
        assert_eq!(declined.asked.borrow()[0], ConfirmPrompt::discard_changes());
        assert!(declined.asked.borrow()[0].destructive);

        let accepted = Scripted::new(true);
        assert!(session.request_cancel(&accepted));
    }

    #[test]
    fn test_remove_section_confirmed() {
        let mut session = open(MemoryStore::default());
        let key = circuit_key(&session);

        assert!(!session.remove_section_confirmed(&key, &Scripted::new(false)));
        assert_eq!(session.document().circuit_count(), 1);

        assert!(session.remove_section_confirmed(&key, &Scripted::new(true)));
        assert_eq!(session.document().circuit_count(), 0);
        assert!(session.is_dirty());
    }

    #[test]
    fn test_warmup_not_removable_through_editor() {
        let mut session = open(MemoryStore::default());
        let warmup = session.document().sections()[0].key.clone().unwrap();
        let confirm = Scripted::new(true);
        assert!(!session.remove_section_confirmed(&warmup, &confirm));
        assert_eq!(confirm.calls.get(), 0);
        assert_eq!(session.document().sections().len(), 4);
    }
}
