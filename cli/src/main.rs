//! Demo host embedding the chat widget.
//!
//! Owns the terminal, the crossterm event stream, and the app-event channel;
//! everything the widget mutates happens on this loop. Engine completions
//! arrive as [`AppEvent::EngineReplyReady`] and are handed back to the
//! widget here, never applied from the background task.

use std::fs::File;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use clap::ValueEnum;
use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use palaver_protocol::EngineError;
use palaver_protocol::SharedEngine;
use palaver_tui::AppEvent;
use palaver_tui::AppEventSender;
use palaver_tui::ChatWidget;
use palaver_tui::ChatWidgetParams;
use palaver_tui::Renderable;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::StreamExt;

/// Artificial latency so the typing indicator is visible in the demo.
const REPLY_DELAY: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    /// Echo the message back, quoted.
    Echo,
    /// Shout the message back in uppercase.
    Upper,
    /// Reply with a markdown sample to exercise the renderer.
    Showcase,
    /// Always fail, to exercise the failure notice.
    Failing,
}

#[derive(Debug, Parser)]
#[command(name = "palaver", about = "Terminal chat widget demo")]
struct Cli {
    /// Which sample reply engine to plug into the widget.
    #[arg(long, value_enum, default_value = "echo")]
    engine: EngineKind,

    /// Placeholder name inserted into the composer with Ctrl+P.
    #[arg(long, default_value = "topic")]
    placeholder: String,

    /// Append logs to this file when RUST_LOG is set.
    #[arg(long, default_value = "palaver.log")]
    log_file: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_file)?;

    let (tx, rx) = unbounded_channel();
    let mut widget = ChatWidget::new(ChatWidgetParams {
        app_event_tx: AppEventSender::new(tx),
        engine: Some(build_engine(cli.engine)),
        placeholder_text: "Send a message (Enter to send, Ctrl+C to quit)".to_string(),
    })?;

    let mut terminal = ratatui::init();
    let _ = crossterm::execute!(std::io::stdout(), crossterm::event::EnableBracketedPaste);
    let result = run(&mut terminal, &mut widget, rx, &cli.placeholder).await;
    let _ = crossterm::execute!(std::io::stdout(), crossterm::event::DisableBracketedPaste);
    ratatui::restore();
    result
}

async fn run(
    terminal: &mut DefaultTerminal,
    widget: &mut ChatWidget,
    mut app_events: UnboundedReceiver<AppEvent>,
    placeholder_name: &str,
) -> Result<()> {
    let mut terminal_events = EventStream::new();
    let mut needs_redraw = true;
    loop {
        if needs_redraw {
            terminal.draw(|frame| {
                let area = frame.area();
                widget.render(area, frame.buffer_mut());
                if let Some((x, y)) = widget.cursor_pos(area) {
                    frame.set_cursor_position((x, y));
                }
            })?;
            needs_redraw = false;
        }

        tokio::select! {
            maybe_event = terminal_events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind != KeyEventKind::Release => {
                    if is_quit(key) {
                        return Ok(());
                    }
                    needs_redraw = handle_key(widget, key, placeholder_name);
                }
                Some(Ok(Event::Paste(pasted))) => needs_redraw = widget.handle_paste(pasted),
                Some(Ok(Event::Resize(..))) => needs_redraw = true,
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
                None => return Ok(()),
            },
            maybe_event = app_events.recv() => match maybe_event {
                Some(AppEvent::EngineReplyReady(result)) => {
                    widget.on_engine_reply(result);
                    needs_redraw = true;
                }
                Some(AppEvent::RequestFrame) => needs_redraw = true,
                None => return Ok(()),
            },
        }
    }
}

fn handle_key(widget: &mut ChatWidget, key: KeyEvent, placeholder_name: &str) -> bool {
    if key.code == KeyCode::Char('p') && key.modifiers.contains(KeyModifiers::CONTROL) {
        widget.insert_placeholder(placeholder_name);
        return true;
    }
    widget.handle_key_event(key)
}

fn is_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d'))
        && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn build_engine(kind: EngineKind) -> SharedEngine {
    match kind {
        EngineKind::Echo => Arc::new(|prompt: &str| {
            thread::sleep(REPLY_DELAY);
            Ok::<_, EngineError>(format!("You said: \"{}\"", prompt.trim()))
        }),
        EngineKind::Upper => Arc::new(|prompt: &str| {
            thread::sleep(REPLY_DELAY);
            Ok::<_, EngineError>(prompt.to_uppercase())
        }),
        EngineKind::Showcase => Arc::new(|prompt: &str| {
            thread::sleep(REPLY_DELAY);
            Ok::<_, EngineError>(showcase_reply(prompt.trim()))
        }),
        EngineKind::Failing => Arc::new(|_: &str| {
            thread::sleep(REPLY_DELAY);
            Err::<String, _>(EngineError::Failed(
                "this engine always fails".to_string(),
            ))
        }),
    }
}

fn showcase_reply(prompt: &str) -> String {
    format!(
        "# About `{prompt}`\n\n\
         A few things the renderer can do:\n\n\
         - *emphasis* and **strong** text\n\
         - `inline code`\n\
         - nested lists\n  - like this one\n\n\
         ```rust\nfn main() {{\n    println!(\"hello\");\n}}\n```\n\n\
         > And a closing quote."
    )
}

fn init_tracing(log_file: &str) -> Result<()> {
    // Logging is opt-in: without RUST_LOG the TUI runs quiet. Logs go to a
    // file because stderr is unreadable while the terminal is in raw mode.
    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }
    let file = File::options().create(true).append(true).open(log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
