//! ptcommand - PT COMMAND fitness program planner

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use ptcommand::api::{ApiClient, DEFAULT_API_URL};
use ptcommand::chat::{ChatSession, Role};
use ptcommand::edit::{Confirm, ConfirmPrompt, EditSession};
use ptcommand::plan::{format_detail, format_week, summary_rows, todays_workout};
use ptcommand::tui::{App, EditorExit};
use ptcommand::workout::{DirtyBaseline, Program, Workout};

#[derive(Parser)]
#[command(name = "ptcommand")]
#[command(author, version, about = "PT COMMAND - fitness program planner")]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = "PT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Baseline for unsaved-change detection: "received" or "normalized"
    #[arg(long, global = true, env = "PT_DIRTY_BASELINE", default_value = "received")]
    dirty_baseline: DirtyBaseline,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's workout
    Today,

    /// Show the weekly plan
    Week,

    /// Show one workout in detail
    Show {
        /// Workout id
        workout_id: i64,
    },

    /// Edit a workout in the terminal editor
    Edit {
        /// Workout id
        workout_id: i64,
    },

    /// Build a new plan by chatting with the coach
    Chat,

    /// Delete a workout from the active program
    DeleteWorkout {
        workout_id: i64,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete a whole program
    DeleteProgram {
        program_id: i64,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

/// Confirmation on stdin, or always yes with `--yes`
struct StdinConfirm {
    assume_yes: bool,
}

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{} [y/N] ", prompt.message);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes")
    }
}

async fn load_program(api: &ApiClient) -> Result<Program> {
    match api.active_program().await.context("Failed to fetch active program")? {
        Some(program) => Ok(program),
        None => bail!("No active plan. Run `ptcommand chat` to build one."),
    }
}

fn find_workout(program: &Program, workout_id: i64) -> Result<&Workout> {
    program
        .workouts
        .iter()
        .find(|w| w.id == workout_id)
        .with_context(|| format!("Workout {} not found in {}", workout_id, program.name))
}

async fn run_chat(api: &ApiClient) -> Result<()> {
    let mut chat = ChatSession::new();
    let reply = api.chat("", &serde_json::Value::Null).await.context("Failed to connect to chat backend")?;
    chat.apply_reply(reply);
    print_last(&chat);

    println!("(/plan: view plan | /save: add plan | /restart: start over | /quit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/restart" => {
                chat.reset();
                let reply = api.chat("", chat.state()).await?;
                chat.apply_reply(reply);
                print_last(&chat);
            }
            "/plan" => match chat.plan() {
                Some(plan) => println!("{}", serde_json::to_string_pretty(plan)?),
                None => println!("No plan yet."),
            },
            "/save" => match chat.plan() {
                Some(plan) => match api.save_plan(plan).await {
                    Ok(()) => {
                        println!("Plan added.");
                        break;
                    }
                    Err(e) => println!("Failed to save plan. Please try again. ({})", e),
                },
                None => println!("No plan yet."),
            },
            _ => {
                let Some(message) = chat.push_user(&line) else {
                    continue;
                };
                match api.chat(&message, chat.state()).await {
                    Ok(reply) => {
                        chat.apply_reply(reply);
                        print_last(&chat);
                        if chat.can_save_plan() {
                            println!("Plan ready. /plan to view, /save to add it, /restart to start over.");
                        }
                    }
                    Err(e) => tracing::error!("Error sending message: {}", e),
                }
            }
        }
    }

    Ok(())
}

fn print_last(chat: &ChatSession) {
    if let Some(msg) = chat.messages().last() {
        let who = match msg.role {
            Role::Coach => "COACH",
            Role::User => "YOU",
        };
        println!("[{}] {}: {}", msg.at.format("%H:%M"), who, msg.text);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let api = ApiClient::new(&cli.api_url);

    match cli.command.unwrap_or(Commands::Today) {
        Commands::Today => {
            let program = load_program(&api).await?;
            let Some(workout) = todays_workout(&program) else {
                println!("{}: no workouts scheduled", program.name);
                return Ok(());
            };
            println!("PT SCHEDULE - {}", chrono::Local::now().format("%A, %d %B"));
            println!("Objective: {}", workout.focus.as_deref().unwrap_or("General Fitness"));
            println!("{:-<60}", "");
            for (label, value) in summary_rows(workout) {
                println!("{:12} | {}", label, value);
            }
        }

        Commands::Week => {
            let program = load_program(&api).await?;
            println!("{}", format_week(&program));
        }

        Commands::Show { workout_id } => {
            let program = load_program(&api).await?;
            println!("{}", format_detail(find_workout(&program, workout_id)?));
        }

        Commands::Edit { workout_id } => {
            let program = load_program(&api).await?;
            let workout = find_workout(&program, workout_id)?;
            let title = workout.name.clone().unwrap_or_else(|| format!("Workout {}", workout_id));
            let session = EditSession::open(workout_id, &workout.components, cli.dirty_baseline, api.clone());

            let mut app = App::new(title, session);
            match app.run().await? {
                EditorExit::Saved => {
                    // Show what the backend now has
                    let program = load_program(&api).await?;
                    println!("Saved.\n");
                    println!("{}", format_detail(find_workout(&program, workout_id)?));
                }
                EditorExit::Cancelled => println!("No changes saved."),
            }
        }

        Commands::Chat => run_chat(&api).await?,

        Commands::DeleteWorkout { workout_id, yes } => {
            let prompt = ConfirmPrompt {
                title: "Delete workout".to_string(),
                message: format!("Delete workout {}?", workout_id),
                destructive: true,
            };
            if (StdinConfirm { assume_yes: yes }).confirm(&prompt) {
                api.delete_workout(workout_id).await.context("Failed to delete workout")?;
                println!("Workout {} deleted.", workout_id);
            }
        }

        Commands::DeleteProgram { program_id, yes } => {
            let prompt = ConfirmPrompt {
                title: "Delete program".to_string(),
                message: format!("Delete program {} and all its workouts?", program_id),
                destructive: true,
            };
            if (StdinConfirm { assume_yes: yes }).confirm(&prompt) {
                api.delete_program(program_id).await.context("Failed to delete program")?;
                println!("Program {} deleted.", program_id);
            }
        }
    }

    Ok(())
}
