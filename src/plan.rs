//! Plan rendering - day summary, workout detail and weekly schedule as text

use serde_json::Value;

use crate::workout::reps::reps_label;
use crate::workout::{Payload, Program, Section, SectionKind, Workout};

/// Format seconds as "45s", "1m 30s", "1h 5m"
pub fn format_duration(secs: u32) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        if secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{}m {}s", secs / 60, secs % 60)
        }
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Today's workout. Programs don't carry a calendar yet, so it's day one.
pub fn todays_workout(program: &Program) -> Option<&Workout> {
    program.workouts.first()
}

fn sections(workout: &Workout) -> Vec<Section> {
    workout.components.iter().cloned().map(Section::from).collect()
}

fn of_kind(sections: &[Section], kind: SectionKind) -> impl Iterator<Item = &Section> {
    sections.iter().filter(move |s| s.kind == kind)
}

/// First line plus "+N more"
fn first_line_summary(lines: &[String]) -> Option<String> {
    let first = lines.first()?;
    if lines.len() > 1 {
        Some(format!("{} (+{} more)", first, lines.len() - 1))
    } else {
        Some(first.clone())
    }
}

fn cardio_type(data: &Value) -> Option<&str> {
    data.get("type").and_then(Value::as_str)
}

/// Label/value rows for the home screen schedule table
pub fn summary_rows(workout: &Workout) -> Vec<(&'static str, String)> {
    let sections = sections(workout);
    let mut rows = Vec::new();

    let warmup = of_kind(&sections, SectionKind::Warmup)
        .next()
        .and_then(|s| s.payload.lines())
        .and_then(first_line_summary);
    if let Some(value) = warmup {
        rows.push(("Warm-up", value));
    }

    let circuits = of_kind(&sections, SectionKind::Circuit).count();
    if circuits > 0 {
        rows.push(("Strength", format!("{} Circuit(s) - See Details", circuits)));
    }

    if let Some(cardio) = of_kind(&sections, SectionKind::Cardio).next() {
        let data = cardio.payload.encode();
        if !data.is_null() {
            let kind = cardio_type(&data).unwrap_or("Cardio Session");
            rows.push(("Cardio", kind.to_string()));
        }
    }

    let cooldown = of_kind(&sections, SectionKind::Cooldown)
        .next()
        .and_then(|s| s.payload.lines())
        .and_then(first_line_summary);
    if let Some(value) = cooldown {
        rows.push(("Cooldown", value));
    }

    rows
}

fn push_lines(out: &mut Vec<String>, title: &str, lines: &[String]) {
    out.push(format!("{}:", title.to_uppercase()));
    for line in lines {
        out.push(format!("  • {}", line));
    }
    out.push(String::new());
}

fn push_section(out: &mut Vec<String>, section: &Section, circuit_no: &mut usize) {
    match (&section.kind, &section.payload) {
        (SectionKind::Warmup | SectionKind::Cooldown, Payload::Lines(lines)) if !lines.is_empty() => {
            push_lines(out, section.kind.title(), lines);
        }
        (SectionKind::Circuit, Payload::Circuit(circuit)) => {
            *circuit_no += 1;
            out.push(format!("CIRCUIT {} - {} rounds", circuit_no, circuit.rounds));
            out.push(format!(
                "Work: {} | Rest: {} | Round Rest: {}",
                format_duration(circuit.work_seconds),
                format_duration(circuit.rest_seconds),
                format_duration(circuit.rest_between_rounds)
            ));
            for (i, ex) in circuit.exercises.iter().enumerate() {
                let equipment = if ex.equipment().is_empty() {
                    "Bodyweight".to_string()
                } else {
                    ex.equipment().join(", ")
                };
                out.push(format!("  {}. {} - {}", i + 1, ex.name, reps_label(ex.reps())));
                out.push(format!("     Equipment: {}", equipment));
            }
            out.push(String::new());
        }
        (SectionKind::Cardio, Payload::Cardio(data)) => {
            out.push(format!("CARDIO: {}", cardio_type(data).unwrap_or("Cardio Session")));
            if let Some(minutes) = data.get("duration_minutes").and_then(Value::as_f64) {
                out.push(format!("Duration: {} minutes", minutes));
            }
            if let Some(details) = data.get("details").and_then(Value::as_object) {
                for (key, value) in details {
                    if key == "instructions" {
                        continue;
                    }
                    let value = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    out.push(format!("  • {}: {}", key, value));
                }
                if let Some(instructions) = details.get("instructions").and_then(Value::as_str) {
                    out.push(format!("  → {}", instructions));
                }
            }
            out.push(String::new());
        }
        _ => {}
    }
}

/// Full workout card, sections grouped warmup, circuits, cardio, cooldown
pub fn format_detail(workout: &Workout) -> String {
    let sections = sections(workout);
    let mut out = Vec::new();
    let title = workout.name.clone().unwrap_or_else(|| match workout.day_number {
        Some(day) => format!("Day {}", day),
        None => format!("Workout {}", workout.id),
    });
    out.push(format!("{} - {}", title, workout.focus.as_deref().unwrap_or("General Fitness")));
    out.push(format!("{:=<60}", ""));

    let mut circuit_no = 0;
    for kind in [
        SectionKind::Warmup,
        SectionKind::Circuit,
        SectionKind::Cardio,
        SectionKind::Cooldown,
    ] {
        for section in of_kind(&sections, kind.clone()) {
            push_section(&mut out, section, &mut circuit_no);
        }
    }

    out.join("\n")
}

/// Every workout of the program, in day order as received
pub fn format_week(program: &Program) -> String {
    let mut out = Vec::new();
    out.push(program.name.clone());
    if let Some(description) = &program.description {
        out.push(description.clone());
    }
    out.push(String::new());
    for workout in &program.workouts {
        out.push(format_detail(workout));
        out.push(String::new());
    }
    out.join("\n")
}
