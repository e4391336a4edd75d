#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # bandmark
//!
//! Grades IELTS-style essays against the four public band descriptors and
//! runs an interactive tutoring session over a piece of learning material.
//!
//! Set `BANDMARK_GRADING_API_KEY` (or `GEMINI_API_KEY`) for live grading;
//! without a key an offline estimate is produced instead. Tutoring needs
//! `BANDMARK_TUTOR_API_KEY` (or `DEEPSEEK_API_KEY`).

use anyhow::{Context, Result, bail};
use bandmark::{
    assessment::{EssayTask, TaskKind},
    backend::Credential,
    catalog, config,
    grading::Grader,
    render, store,
    tutor::{TutorReply, TutorSession},
};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, util::SubscriberInitExt};

/// Where the essay prompt comes from.
#[derive(Debug, Clone)]
enum TaskSource {
    /// A built-in catalog entry.
    Catalog(String),
    /// A prompt given on the command line.
    Custom {
        /// Task kind.
        kind:   TaskKind,
        /// Prompt text.
        prompt: String,
    },
}

impl TaskSource {
    /// Resolves the source into a gradable task.
    fn resolve(self) -> Result<EssayTask> {
        match self {
            TaskSource::Catalog(id) => catalog::find(&id)
                .map(|entry| entry.task())
                .with_context(|| format!("No task with id `{id}`; run `bandmark tasks` to list them")),
            TaskSource::Custom { kind, prompt } => Ok(EssayTask::new(kind, prompt)),
        }
    }
}

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade an essay file
    Grade {
        /// Task the essay answers.
        source: TaskSource,
        /// API key overriding the configured one.
        key:    Option<String>,
        /// Print the assessment as JSON.
        json:   bool,
        /// Path to the essay.
        essay:  String,
    },
    /// List built-in practice tasks
    Tasks,
    /// Start a tutoring session
    Tutor {
        /// Transcript owner.
        user:     String,
        /// API key overriding the configured one.
        key:      Option<String>,
        /// Path to the learning material.
        material: String,
    },
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses an API key override
    fn k() -> impl Parser<Option<String>> {
        long("key")
            .help("API key to use instead of the configured one")
            .argument::<String>("KEY")
            .optional()
    }

    let catalog_task = long("task")
        .help("ID of a built-in practice task")
        .argument::<String>("ID")
        .map(TaskSource::Catalog);
    let kind = long("kind")
        .help("Task kind: task1 or task2")
        .argument::<TaskKind>("KIND");
    let prompt = long("prompt")
        .help("Prompt the essay answers")
        .argument::<String>("TEXT");
    let custom_task = construct!(TaskSource::Custom { kind, prompt });
    let source = construct!([catalog_task, custom_task]);

    let key = k();
    let json = long("json")
        .help("Print the assessment as JSON")
        .switch();
    let essay = positional::<String>("ESSAY_FILE").help("Path to the essay text");
    let grade = construct!(Cmd::Grade {
        source,
        key,
        json,
        essay
    })
    .to_options()
    .command("grade")
    .help("Grade an essay");

    let tasks = pure(Cmd::Tasks)
        .to_options()
        .command("tasks")
        .help("List built-in practice tasks");

    let user = long("user")
        .help("Whose saved conversation to continue")
        .argument::<String>("ID")
        .fallback("local".to_string());
    let key = k();
    let material = positional::<String>("MATERIAL_FILE").help("Path to the learning material");
    let tutor = construct!(Cmd::Tutor {
        user,
        key,
        material
    })
    .to_options()
    .command("tutor")
    .help("Practice with the tutor over a piece of learning material");

    let cmd = construct!([grade, tasks, tutor]);

    cmd.to_options()
        .descr("Essay band scoring and tutoring")
        .run()
}

/// Grades one essay file and prints the result.
async fn grade(source: TaskSource, key: Option<String>, json: bool, essay: String) -> Result<()> {
    let task = source.resolve()?;
    let text = tokio::fs::read_to_string(&essay)
        .await
        .with_context(|| format!("Could not read essay from {essay}"))?;

    let result = match Grader::from_config()
        .grade(&task, &text, key.as_deref())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            bail!("{}", e.user_hint());
        }
    };

    let submission_id = uuid::Uuid::new_v4().to_string();
    match store::from_config()
        .save_assessment(&submission_id, &result)
        .await
    {
        Ok(()) => tracing::info!("Saved assessment as {submission_id}"),
        Err(e) => tracing::warn!("Could not save assessment: {e:#}"),
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize assessment")?
        );
    } else {
        println!("{}", render::report(&task, &text, &result));
    }
    Ok(())
}

/// Prints a tutor reply, marking failures.
fn show(reply: &TutorReply) {
    if reply.is_success() {
        println!("\n{} {}\n", "tutor>".bright_green().bold(), reply.text());
    } else {
        eprintln!("\n{}\n", reply.text().yellow());
    }
}

/// Runs the interactive tutoring loop on stdin.
async fn tutor(user: String, key: Option<String>, material: String) -> Result<()> {
    let raw_key = key
        .or_else(config::tutor_api_key)
        .context("No tutoring API key configured; set BANDMARK_TUTOR_API_KEY or pass --key")?;
    let credential = Credential::parse(&raw_key)?;
    let material = tokio::fs::read_to_string(&material)
        .await
        .with_context(|| format!("Could not read learning material from {material}"))?;

    let store = store::from_config();
    let history = store.load_transcript(&user).await.unwrap_or_else(|e| {
        tracing::warn!("Could not load saved conversation: {e:#}");
        Vec::new()
    });

    let mut session = TutorSession::from_config(credential);
    let restored = history.len();
    session.start(&material, history);
    if restored == 0 {
        show(&session.open().await);
    } else {
        eprintln!("Continuing conversation ({restored} turns restored).");
    }
    eprintln!("Commands: /idea  /example  /reset  /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read from stdin")?
    {
        let line = line.trim();
        let reply = match line {
            "" => continue,
            "/quit" => break,
            "/idea" => session.request_idea().await,
            "/example" => session.request_example().await,
            "/reset" => {
                session.reset();
                session.start(&material, Vec::new());
                session.open().await
            }
            message => session.send(message).await,
        };
        show(&reply);

        if let Err(e) = store.save_transcript(&user, session.transcript()).await {
            tracing::warn!("Could not save conversation: {e:#}");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    config::ensure_initialized().context("Failed to load configuration")?;

    match options() {
        Cmd::Grade {
            source,
            key,
            json,
            essay,
        } => grade(source, key, json, essay).await?,
        Cmd::Tasks => println!("{}", render::catalog_table(catalog::all())),
        Cmd::Tutor {
            user,
            key,
            material,
        } => tutor(user, key, material).await?,
    };

    Ok(())
}
