//! Interactive reading REPL.

use super::render::EventPrinter;
use anyhow::Result;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::future::Future;
use tarot_application::{ReadingSessionUseCase, SessionOptions, build_gemini_session};
use tarot_core::config::ModelTier;
use tarot_core::session::{Phase, SessionEvent};
use tarot_core::spread::SpreadChoice;
use tarot_infrastructure::{ConfigService, SecretServiceImpl};
use tarot_interaction::supported_models::is_supported_model;
use tokio::sync::mpsc::{self, UnboundedReceiver};

const HELP: &str = "/reset 重新提问  /quit 退出";

/// What the user asked for at a prompt.
enum Input {
    Line(String),
    Reset,
    Quit,
}

fn read_input(rl: &mut DefaultEditor, prompt: &str) -> Result<Input> {
    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                match trimmed {
                    "/quit" | "/exit" | "quit" | "exit" => return Ok(Input::Quit),
                    "/reset" => return Ok(Input::Reset),
                    "/help" => {
                        println!("{}", HELP.bright_black());
                        continue;
                    }
                    _ => {}
                }
                if !trimmed.is_empty() {
                    let _ = rl.add_history_entry(trimmed);
                }
                return Ok(Input::Line(trimmed.to_string()));
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => return Ok(Input::Quit),
            Err(err) => return Err(err.into()),
        }
    }
}

/// Drives `operation` while printing every event it publishes, so output
/// appears live and is fully flushed before the next prompt.
async fn with_events<F: Future>(
    operation: F,
    events: &mut UnboundedReceiver<SessionEvent>,
    printer: &mut EventPrinter,
) -> F::Output {
    tokio::pin!(operation);
    loop {
        tokio::select! {
            output = &mut operation => {
                while let Ok(event) = events.try_recv() {
                    printer.print(event);
                }
                return output;
            }
            Some(event) = events.recv() => printer.print(event),
        }
    }
}

pub async fn run(
    question: Option<String>,
    spread: &str,
    pro: bool,
    local_random: bool,
) -> Result<()> {
    let config = ConfigService::default().get_config();
    let secrets = SecretServiceImpl::new(None)?;
    let options = SessionOptions {
        tier: if pro { ModelTier::Pro } else { ModelTier::Flash },
        local_random,
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut use_case = build_gemini_session(&config, &secrets, options)
        .await?
        .with_events(tx);
    if !is_supported_model(use_case.model()) {
        tracing::warn!("Model '{}' is not in the supported list", use_case.model());
    }

    let mut printer = EventPrinter::default();
    let mut rl = DefaultEditor::new()?;
    let choice = SpreadChoice::parse(spread);

    println!("{}", "=== 量子塔罗 Quantum Tarot ===".bright_magenta().bold());
    println!("{}", HELP.bright_black());
    println!();

    let mut pending_question = question;
    loop {
        let question = match pending_question.take() {
            Some(q) => q,
            None => match read_input(&mut rl, "你的问题> ")? {
                Input::Line(q) => q,
                Input::Reset => continue,
                Input::Quit => break,
            },
        };

        let submitted = with_events(
            use_case.submit(&question, choice.clone()),
            &mut rx,
            &mut printer,
        )
        .await;
        if let Err(e) = submitted {
            println!("{}", format!("Error: {}", e).red());
            if use_case.session().phase() != Phase::Input {
                with_events(async { use_case.reset() }, &mut rx, &mut printer).await;
            }
            continue;
        }

        match draw_all(&mut use_case, &mut rl, &mut rx, &mut printer).await? {
            Input::Quit => break,
            Input::Reset => {
                with_events(async { use_case.reset() }, &mut rx, &mut printer).await;
                continue;
            }
            Input::Line(_) => {}
        }

        match chat(&mut use_case, &mut rl, &mut rx, &mut printer).await? {
            Input::Quit => break,
            _ => {
                with_events(async { use_case.reset() }, &mut rx, &mut printer).await;
            }
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

async fn draw_all(
    use_case: &mut ReadingSessionUseCase,
    rl: &mut DefaultEditor,
    rx: &mut UnboundedReceiver<SessionEvent>,
    printer: &mut EventPrinter,
) -> Result<Input> {
    while use_case.session().phase() == Phase::Drawing {
        let total = use_case
            .session()
            .spread()
            .map(|s| s.card_count())
            .unwrap_or_default();
        let next = total - use_case.session().remaining_draws() + 1;
        let prompt = format!("按回车抽第 {}/{} 张牌> ", next, total);

        match read_input(rl, &prompt)? {
            Input::Line(_) => {
                with_events(use_case.draw(), rx, printer).await?;
            }
            other => return Ok(other),
        }
    }
    Ok(Input::Line(String::new()))
}

async fn chat(
    use_case: &mut ReadingSessionUseCase,
    rl: &mut DefaultEditor,
    rx: &mut UnboundedReceiver<SessionEvent>,
    printer: &mut EventPrinter,
) -> Result<Input> {
    println!("{}", "可以继续追问，/reset 开始新的占卜。".bright_black());
    loop {
        match read_input(rl, "追问> ")? {
            Input::Line(message) if message.is_empty() => continue,
            Input::Line(message) => {
                if let Err(e) = with_events(use_case.send_follow_up(&message), rx, printer).await {
                    println!("{}", format!("Error: {}", e).red());
                }
            }
            other => return Ok(other),
        }
    }
}
