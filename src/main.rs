//! Command-line front end for the nlvocab_rs flash-card library.
//!
//! Lists lessons, shows the words of the selected lesson, records which words
//! are learned, looks up pronunciations, and can run the audio proxy.

use clap::{Parser, Subcommand};
use colored::*;
use log::{LevelFilter, error, info};
use nlvocab_rs::{
    AudioClient, AudioEndpoints, AudioPlayer, AudioSource, DictionaryClient, LoadOptions, Mode,
    Session, SqliteStore, error::Result,
};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Dutch vocabulary flash cards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a custom state database file (optional)
    #[arg(long, global = true)]
    db_path: Option<String>,

    /// Path to a word list JSON file to use instead of the built-in one
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// Resolve audio through this proxy URL instead of calling the dictionary directly
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Set verbosity level (use -v, -vv, or -vvv for increasing verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all lessons with learned counts
    Lessons,
    /// Show the words of the selected lesson
    Words {
        /// Show target words in Check mode
        #[arg(long, default_value_t = false)]
        reveal: bool,
        /// Move learned words to the end (Learn mode)
        #[arg(long, default_value_t = false)]
        learned_last: bool,
    },
    /// Select a lesson by id ("3#Dieren") or number ("3")
    Select { lesson: String },
    /// Switch study mode (learn, check)
    Mode { mode: Mode },
    /// Show or hide example sentences
    Examples {
        #[arg(action = clap::ArgAction::Set)]
        show: bool,
    },
    /// Mark a word of the selected lesson as learned
    Mark { word: String },
    /// Mark a word of the selected lesson as not learned
    Unmark { word: String },
    /// Look up the pronunciation audio URL of a word
    Play { word: String },
    /// Run the audio proxy endpoint
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
    /// Clear the state database (progress and preferences)
    ClearDb,
}

/// Sets up logging based on verbosity level.
fn setup_logging(verbose: u8) {
    let log_level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter(None, log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let options = LoadOptions {
        db_path: cli.db_path.as_ref().map(PathBuf::from),
        catalog_path: cli.catalog.as_ref().map(PathBuf::from),
    };

    match cli.command {
        Commands::Serve { bind } => {
            if let Err(e) = run_proxy(bind).await {
                error!("Audio proxy failed: {}", e);
                eprintln!("{}", format!("Error running proxy: {}", e).red());
                std::process::exit(1);
            }
            return Ok(());
        }
        Commands::ClearDb => {
            info!("Clearing database...");
            match nlvocab_rs::clear_database(options.db_path.clone()) {
                Ok(_) => println!("{}", "Database cleared successfully.".green()),
                Err(e) => {
                    error!("Failed to clear database: {}", e);
                    eprintln!("{}", format!("Error clearing database: {}", e).red());
                    std::process::exit(1);
                }
            }
            return Ok(());
        }
        _ => {}
    }

    let mut session = match nlvocab_rs::open_session(&options).await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to open session: {}", e);
            eprintln!("{}", format!("Error: {}", e).red());
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Lessons => handle_lessons(&session),
        Commands::Words {
            reveal,
            learned_last,
        } => handle_words(&session, reveal, learned_last),
        Commands::Select { lesson } => handle_select(&mut session, &lesson),
        Commands::Mode { mode } => session.set_mode(mode).map(|_| {
            println!("Mode: {}", mode.to_string().bold());
        }),
        Commands::Examples { show } => session.set_show_examples(show).map(|_| {
            println!("Examples: {}", if show { "shown" } else { "hidden" });
        }),
        Commands::Mark { word } => handle_mark(&mut session, &word, true),
        Commands::Unmark { word } => handle_mark(&mut session, &word, false),
        Commands::Play { word } => handle_play(&session, &word, cli.proxy).await,
        Commands::Serve { .. } | Commands::ClearDb => Ok(()),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }

    Ok(())
}

fn handle_lessons(session: &Session<SqliteStore>) -> Result<()> {
    for lesson in session.catalog().lessons() {
        let id = lesson.id();
        let marker = if id == session.lesson_id() { "*" } else { " " };
        let learned = session.progress().learned_count(&id);
        println!(
            "{} {}  {}",
            marker.green().bold(),
            lesson.label().bold(),
            format!("{}/{} learned", learned, lesson.words.len()).dimmed()
        );
    }
    Ok(())
}

fn handle_words(session: &Session<SqliteStore>, reveal: bool, learned_last: bool) -> Result<()> {
    let lesson = session.current_lesson()?;
    let words = if learned_last {
        session.visible_words_learned_last()?
    } else {
        session.visible_words()?
    };

    println!(
        "{} ({} mode)\n",
        lesson.label().bold().cyan(),
        session.mode().to_string().italic()
    );

    if words.is_empty() {
        println!("{}", "Every word in this lesson is learned.".green());
        return Ok(());
    }

    let hide_target = session.mode() == Mode::Check && !reveal;
    for entry in words {
        let check = if session.is_learned(entry) {
            "✔".green()
        } else {
            "·".dimmed()
        };
        let target = if hide_target {
            "?".repeat(entry.dutch.chars().count()).dimmed()
        } else {
            entry.dutch.bold()
        };
        println!("{} {}  {}", check, entry.english.dimmed(), target);

        if session.show_examples() && !hide_target && !entry.example.is_empty() {
            println!("      {}", entry.example.italic());
            println!("      {}", entry.translation.dimmed());
        }
    }
    Ok(())
}

fn handle_select(session: &mut Session<SqliteStore>, input: &str) -> Result<()> {
    let lesson_id = session.catalog().resolve(input)?.id();
    session.set_lesson(&lesson_id)?;
    let label = session.current_lesson()?.label();
    println!("Selected lesson: {}", label.bold());
    Ok(())
}

fn handle_mark(session: &mut Session<SqliteStore>, word: &str, learned: bool) -> Result<()> {
    session.set_learned(word, learned)?;
    let state = if learned {
        "learned".green()
    } else {
        "not learned".yellow()
    };
    println!("{} marked as {}.", word.bold(), state);
    Ok(())
}

async fn run_proxy(bind: SocketAddr) -> Result<()> {
    let dictionary = DictionaryClient::new(AudioEndpoints::default())?;
    nlvocab_rs::server::serve(bind, dictionary).await
}

async fn handle_play(
    session: &Session<SqliteStore>,
    word: &str,
    proxy: Option<String>,
) -> Result<()> {
    let source = match proxy {
        Some(url) => AudioSource::proxy(url)?,
        None => AudioSource::Direct(DictionaryClient::new(AudioEndpoints::default())?),
    };
    let player = AudioPlayer::new(AudioClient::new(source));

    let playback = match session.catalog().find_word(session.lesson_id(), word) {
        Some(entry) => session.play(&player, entry).await,
        None => player.request(word).await,
    };

    match playback {
        Some(playback) => println!("{}  {}", playback.word.bold().cyan(), playback.render_key),
        None => println!("No audio available for '{}'.", word.yellow()),
    }
    Ok(())
}
