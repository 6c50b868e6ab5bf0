//! Workout module - wire shapes and the typed editing model
//!
//! The backend speaks in rows: `{component_type, order_index, data}` where
//! `data` depends on the type. Editing happens on `Section`, which keeps the
//! same information with a decoded payload and an ephemeral key.

pub mod document;
pub mod gate;
pub mod normalize;
pub mod reps;

pub use document::{CircuitField, Document, ExerciseField};
pub use gate::{DirtyBaseline, Gate};
pub use normalize::{KeyGen, normalize};
pub use reps::Reps;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Component as sent/received by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawComponent {
    pub component_type: String,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default)]
    pub data: Value,
    /// Row fields we don't interpret (`id`, `workout_id`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One day of a program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    #[serde(default)]
    pub program_id: Option<i64>,
    #[serde(default)]
    pub day_number: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub focus: Option<String>,
    #[serde(default)]
    pub components: Vec<RawComponent>,
}

/// Training program with its workouts, as returned by `/active-program`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub workouts: Vec<Workout>,
}

/// Ephemeral identity of a section or exercise. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(String);

impl Key {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Section type, discriminated by `component_type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKind {
    Warmup,
    Circuit,
    Cardio,
    Cooldown,
    /// Unrecognized type, preserved verbatim
    Other(String),
}

impl SectionKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "warmup" => SectionKind::Warmup,
            "circuit" => SectionKind::Circuit,
            "cardio" => SectionKind::Cardio,
            "cooldown" => SectionKind::Cooldown,
            other => SectionKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SectionKind::Warmup => "warmup",
            SectionKind::Circuit => "circuit",
            SectionKind::Cardio => "cardio",
            SectionKind::Cooldown => "cooldown",
            SectionKind::Other(s) => s,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            SectionKind::Warmup => "Warm-up",
            SectionKind::Circuit => "Circuit",
            SectionKind::Cardio => "Cardio",
            SectionKind::Cooldown => "Cooldown",
            SectionKind::Other(s) => s,
        }
    }
}

/// Exercise inside a circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    #[serde(skip)]
    pub key: Option<Key>,
    pub name: String,
    /// Stored as text: "10", "8-12", "20+". Outer `None` is a missing
    /// field, `Some(None)` an explicit `null`.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub reps: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub equipment: Option<Option<Vec<String>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Exercise {
    pub fn new(name: &str, reps: &str) -> Self {
        Self {
            key: None,
            name: name.to_string(),
            reps: Some(Some(reps.to_string())),
            equipment: Some(Some(Vec::new())),
            extra: Map::new(),
        }
    }

    pub fn equipment(&self) -> &[String] {
        self.equipment.as_ref().and_then(|tags| tags.as_deref()).unwrap_or(&[])
    }

    pub fn reps(&self) -> &str {
        self.reps.as_ref().and_then(|reps| reps.as_deref()).unwrap_or("")
    }
}

/// A present field, `null` included, becomes `Some`. Missing fields are
/// left to `#[serde(default)]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Circuit payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub rounds: u32,
    pub work_seconds: u32,
    pub rest_seconds: u32,
    pub rest_between_rounds: u32,
    pub exercises: Vec<Exercise>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Circuit {
    fn default() -> Self {
        Self {
            rounds: 3,
            work_seconds: 45,
            rest_seconds: 15,
            rest_between_rounds: 60,
            exercises: vec![Exercise::new(NEW_EXERCISE_NAME, NEW_EXERCISE_REPS)],
            extra: Map::new(),
        }
    }
}

pub const NEW_EXERCISE_NAME: &str = "New Exercise";
pub const NEW_EXERCISE_REPS: &str = "10";

/// Decoded section payload
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Warmup / cooldown free-text lines
    Lines(Vec<String>),
    Circuit(Circuit),
    /// Cardio is read-only here
    Cardio(Value),
    /// Anything that didn't decode for its type
    Opaque(Value),
}

impl Payload {
    /// Decode `data` according to the section type. Never fails: what
    /// doesn't fit is kept as `Opaque`.
    pub fn decode(kind: &SectionKind, data: Value) -> Self {
        match kind {
            SectionKind::Warmup | SectionKind::Cooldown => {
                match serde_json::from_value::<Vec<String>>(data.clone()) {
                    Ok(lines) => Payload::Lines(lines),
                    Err(_) => Payload::Opaque(data),
                }
            }
            SectionKind::Circuit => match serde_json::from_value::<Circuit>(data.clone()) {
                Ok(circuit) => Payload::Circuit(circuit),
                Err(e) => {
                    tracing::debug!("circuit payload kept opaque: {}", e);
                    Payload::Opaque(data)
                }
            },
            SectionKind::Cardio => Payload::Cardio(data),
            SectionKind::Other(_) => Payload::Opaque(data),
        }
    }

    /// Encode back to the wire value. Keys are not part of the output.
    pub fn encode(&self) -> Value {
        match self {
            Payload::Lines(lines) => {
                Value::Array(lines.iter().cloned().map(Value::String).collect())
            }
            Payload::Circuit(circuit) => serde_json::to_value(circuit).unwrap_or(Value::Null),
            Payload::Cardio(v) | Payload::Opaque(v) => v.clone(),
        }
    }

    pub fn as_circuit(&self) -> Option<&Circuit> {
        match self {
            Payload::Circuit(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_circuit_mut(&mut self) -> Option<&mut Circuit> {
        match self {
            Payload::Circuit(c) => Some(c),
            _ => None,
        }
    }

    pub fn lines(&self) -> Option<&[String]> {
        match self {
            Payload::Lines(lines) => Some(lines),
            _ => None,
        }
    }
}

/// Editable section of a workout
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub key: Option<Key>,
    pub kind: SectionKind,
    pub order_index: i64,
    pub payload: Payload,
    pub extra: Map<String, Value>,
}

impl Section {
    pub fn new(kind: SectionKind, order_index: i64, payload: Payload) -> Self {
        Self {
            key: None,
            kind,
            order_index,
            payload,
            extra: Map::new(),
        }
    }

    pub fn has_key(&self, key: &Key) -> bool {
        self.key.as_ref() == Some(key)
    }

    /// Wire form with the ephemeral keys stripped
    pub fn to_raw(&self) -> RawComponent {
        RawComponent {
            component_type: self.kind.as_str().to_string(),
            order_index: self.order_index,
            data: self.payload.encode(),
            extra: self.extra.clone(),
        }
    }
}

impl From<RawComponent> for Section {
    fn from(raw: RawComponent) -> Self {
        let kind = SectionKind::parse(&raw.component_type);
        let payload = Payload::decode(&kind, raw.data);
        Self {
            key: None,
            kind,
            order_index: raw.order_index,
            payload,
            extra: raw.extra,
        }
    }
}
