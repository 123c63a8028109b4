//! Convee terminal client
//!
//! Picks languages and a scenario, then runs the chat loop against the
//! configured completion endpoint.

use convee::alignment::TokenLayout;
use convee::config::AppConfig;
use convee::conversation::{ConversationContext, LanguagePair, Scenario, TranslationTarget, Turn};
use convee::llm::{ChatService, LoggingService, OpenAIService};
use convee::orchestrator::{SessionEvent, TurnOrchestrator};
use convee::preferences::{FilePreferenceStore, PreferenceStore};
use convee::translation::LlmTranslationClient;
use crossterm::style::Stylize;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Input = Lines<BufReader<Stdin>>;
type Orchestrator = TurnOrchestrator<LlmTranslationClient>;

/// Space between words, in terminal columns
const WORD_PADDING: f64 = 1.0;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Tap(TranslationTarget, usize, usize),
    Retry,
    Restart,
    Exit,
    Languages,
    Quit,
    Say(String),
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let Some(rest) = line.trim().strip_prefix('/') else {
        return Command::Say(line.to_string());
    };
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let mut position = || -> Option<(usize, usize)> {
        let row = parts.next()?.parse().ok()?;
        let col = parts.next()?.parse().ok()?;
        Some((row, col))
    };
    match name {
        "tap" => position().map_or_else(
            || Command::Unknown(line.to_string()),
            |(r, c)| Command::Tap(TranslationTarget::Correction, r, c),
        ),
        "reply" => position().map_or_else(
            || Command::Unknown(line.to_string()),
            |(r, c)| Command::Tap(TranslationTarget::Reply, r, c),
        ),
        "retry" => Command::Retry,
        "restart" => Command::Restart,
        "exit" => Command::Exit,
        "languages" => Command::Languages,
        "quit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

fn char_width(token: &str) -> f64 {
    f64::from(u32::try_from(token.chars().count()).unwrap_or(u32::MAX))
}

fn terminal_width() -> f64 {
    let columns = crossterm::terminal::size().map_or(80, |(columns, _)| columns);
    f64::from(columns.saturating_sub(6))
}

async fn prompt(input: &mut Input, label: &str) -> std::io::Result<Option<String>> {
    print!("{} ", label.bold());
    std::io::stdout().flush()?;
    input.next_line().await
}

async fn prompt_languages(input: &mut Input) -> std::io::Result<Option<LanguagePair>> {
    let Some(target) = prompt(input, "Language to practise:").await? else {
        return Ok(None);
    };
    let Some(starting) = prompt(input, "Language you already speak:").await? else {
        return Ok(None);
    };
    Ok(Some(LanguagePair::new(target.trim(), starting.trim())))
}

async fn choose_scenario(input: &mut Input) -> std::io::Result<Option<Scenario>> {
    let scenarios = Scenario::builtin();
    loop {
        println!();
        for (i, scenario) in scenarios.iter().enumerate() {
            println!("{} {}", format!("[{}]", i + 1).cyan(), scenario.description);
        }
        let Some(answer) = prompt(input, "Pick a scenario:").await? else {
            return Ok(None);
        };
        let picked = answer
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| scenarios.get(i));
        match picked {
            Some(scenario) => return Ok(Some(scenario.clone())),
            None => println!("{}", "No such scenario".yellow()),
        }
    }
}

fn render_turn(turn: &Turn) {
    let width = terminal_width();
    if let Some(message) = &turn.user_message {
        println!("{} {}", "you:".dim(), message);
    }

    if let Some(layout) = TokenLayout::for_turn(
        turn,
        TranslationTarget::Correction,
        char_width,
        width,
        WORD_PADDING,
    ) {
        for (r, row) in layout.rows().iter().enumerate() {
            let words: Vec<String> = row
                .iter()
                .map(|token| match token.in_original {
                    Some(true) => token.text.as_str().green().to_string(),
                    _ => token.text.as_str().yellow().to_string(),
                })
                .collect();
            println!("{} {}", format!("{r:>2}|").dim(), words.join(" "));
        }
    }

    if let Some(layout) =
        TokenLayout::for_turn(turn, TranslationTarget::Reply, char_width, width, WORD_PADDING)
    {
        for (r, row) in layout.rows().iter().enumerate() {
            let words: Vec<&str> = row.iter().map(|token| token.text.as_str()).collect();
            println!("{} {}", format!("{r:>2}>").dim(), words.join(" ").bold());
        }
        let glossed: Vec<&str> = turn
            .aligned_translations(TranslationTarget::Reply)
            .into_iter()
            .map(|t| t.unwrap_or("?"))
            .collect();
        if turn.reply_translation.is_some() {
            println!("   {}", glossed.join(" ").dim());
        }
    }
}

fn render_latest(orchestrator: &Orchestrator) {
    if let Some(turn) = orchestrator.turns().last() {
        render_turn(turn);
    }
}

fn lookup(orchestrator: &Orchestrator, target: TranslationTarget, row: usize, col: usize) {
    let turns = orchestrator.turns();
    let Some(turn) = turns.iter().rev().find(|t| t.tokens(target).is_some()) else {
        println!("{}", "Nothing to look up yet".yellow());
        return;
    };
    let layout = TokenLayout::for_turn(turn, target, char_width, terminal_width(), WORD_PADDING);
    let found = layout.as_ref().and_then(|l| {
        let token = l.token_at(row, col)?;
        Some((token.text.clone(), l.translation_at(turn, row, col)))
    });
    match found {
        Some((word, Some(translation))) => println!("{} = {}", word.bold(), translation),
        Some((word, None)) => println!("{} = {}", word.bold(), "no translation".dim()),
        None => println!("{}", format!("No word at {row} {col}").yellow()),
    }
}

async fn submit(orchestrator: &Orchestrator, text: &str) {
    orchestrator.set_pending_input(text);
    match orchestrator.submit_turn(text).await {
        Ok(_) => render_latest(orchestrator),
        Err(e) => println!("{}", e.to_string().yellow()),
    }
}

/// Chat loop for one context. Returns `false` when the user quits.
async fn chat(
    orchestrator: &Orchestrator,
    preferences: &FilePreferenceStore,
    input: &mut Input,
    context: ConversationContext,
) -> Result<bool, Box<dyn std::error::Error>> {
    orchestrator.initialize_turn(context.clone()).await;
    render_latest(orchestrator);

    while let Some(line) = prompt(input, ">").await? {
        match parse_command(&line) {
            Command::Quit => return Ok(false),
            Command::Exit => {
                orchestrator.reset_to_context_selection();
                return Ok(true);
            }
            Command::Languages => {
                preferences.clear()?;
                orchestrator.reset_to_context_selection();
                return Ok(true);
            }
            Command::Restart => {
                orchestrator.restart();
                orchestrator.initialize_turn(context.clone()).await;
                render_latest(orchestrator);
            }
            Command::Retry => {
                let text = orchestrator.pending_input();
                submit(orchestrator, &text).await;
            }
            Command::Tap(target, row, col) => lookup(orchestrator, target, row, col),
            Command::Say(text) => submit(orchestrator, &text).await,
            Command::Unknown(line) => println!("{}", format!("Unknown command: {line}").yellow()),
        }
    }
    Ok(false)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they stay out of the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "convee=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = AppConfig::from_env()?;
    let openai = OpenAIService::new(&config.llm)?;
    tracing::info!(model = %openai.model_id(), "Completion service ready");
    let service: Arc<dyn ChatService> = Arc::new(LoggingService::new(Arc::new(openai)));
    let orchestrator = TurnOrchestrator::new(Arc::new(LlmTranslationClient::new(service)));
    let preferences = FilePreferenceStore::new(&config.preferences_path);

    let mut events = orchestrator.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::Error(signal)) => println!("{}", signal.message.red()),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let languages = match preferences.load()? {
            Some(languages) => languages,
            None => {
                let Some(languages) = prompt_languages(&mut input).await? else {
                    return Ok(());
                };
                preferences.save(&languages)?;
                languages
            }
        };
        println!(
            "{}",
            format!("Practising {} from {}", languages.target, languages.starting).dim()
        );

        let Some(scenario) = choose_scenario(&mut input).await? else {
            return Ok(());
        };
        let context = ConversationContext::new(scenario, languages);
        if !chat(&orchestrator, &preferences, &mut input, context).await? {
            return Ok(());
        }
    }
}
