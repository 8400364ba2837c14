use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use crossterm::event::KeyEvent;
use graphpad::app::{AppState, Collaborators, TabLifecycleController, TabSlot, UiEvent};
use graphpad::config::{Config, DirectoryContext};
use graphpad::input::keybindings::{parse_key, parse_modifiers};
use graphpad::logging;
use graphpad::services::chooser::QueuedChooser;
use graphpad::services::engine::{EngineDispatcher, OutlineEngine, DEFAULT_ENGINE_TIMEOUT};
use graphpad::services::fs::LocalFileSystem;
use graphpad::services::surface::HeadlessSurfaceFactory;
use graphpad::view::save_dialog::SaveChoice;
use graphpad::view::tabs::render_strip;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tabbed document sessions for RDF/Turtle files.
///
/// Reads a command script from stdin, one command per line (`help` lists
/// them), and drives headless editing surfaces with it.
#[derive(Parser, Debug)]
#[command(name = "graphpad")]
#[command(about = "Tabbed document sessions for RDF/Turtle files", long_about = None)]
#[command(version)]
struct Args {
    /// Files to open
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to log file (default: graphpad.log in the data directory)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Print the JSON Schema of the configuration file and exit
    #[arg(long)]
    dump_schema: bool,
}

const HELP: &str = "\
commands:
  open [PATH]          open a file (no path: ask the chooser)
  new                  new untitled tab
  type TEXT            type at the end of the selected tab (JSON string literals allowed)
  replace TEXT         replace the selected tab's text as the user
  save                 save the selected tab
  choose PATH|cancel   queue an answer for the next file chooser
  close                close the selected tab
  answer s|d|c         answer the open save confirmation
  key KEY              press a key, e.g. ctrl+s, ctrl+pagedown, f5, esc
  select N|+           select tab N (1-based) or the + marker
  next | prev          cycle tabs
  rule NAME            toggle an engine rule
  run                  run the engine on the selected tab
  wait                 wait for engine results
  show                 print the selected tab's text
  list                 print the tab strip
  quit                 quit (asks about unsaved changes)";

struct Driver {
    controller: TabLifecycleController,
    surfaces: HeadlessSurfaceFactory,
    chooser: QueuedChooser,
}

/// The config to run with, plus a warning when a broken user config was skipped.
///
/// Runs before logging is set up, so the warning is also printed to stderr.
fn load_config(
    args: &Args,
    dir_context: &DirectoryContext,
) -> AnyhowResult<(Config, Option<String>)> {
    match &args.config {
        Some(path) => Config::load_from_file(path)
            .map(|config| (config, None))
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => match Config::load_user_config(dir_context) {
            Ok(config) => Ok((config, None)),
            Err(e) => {
                let warning = format!(
                    "ignoring config {}: {}",
                    dir_context.config_path().display(),
                    e
                );
                eprintln!("warning: {warning}");
                Ok((Config::default(), Some(warning)))
            }
        },
    }
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();

    if args.dump_schema {
        let schema = serde_json::to_string_pretty(&Config::json_schema())?;
        println!("{schema}");
        return Ok(());
    }

    let dir_context =
        DirectoryContext::from_system().context("Failed to determine user directories")?;
    let (config, config_warning) = load_config(&args, &dir_context)?;

    if args.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let log_file = args
        .log_file
        .clone()
        .or_else(|| config.logging.file.clone())
        .unwrap_or_else(|| dir_context.log_path());
    logging::init_tracing(Some(&log_file), &config.logging.filter)?;
    tracing::info!(log_file = %log_file.display(), "graphpad starting");
    if let Some(warning) = &config_warning {
        tracing::warn!("{}", warning);
    }

    let surfaces = HeadlessSurfaceFactory::new();
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let chooser = QueuedChooser::new().with_base_dir(cwd);
    let engine = EngineDispatcher::new(Arc::new(OutlineEngine))?;

    let controller = TabLifecycleController::new(
        AppState::new(config),
        Collaborators {
            surfaces: Box::new(surfaces.clone()),
            fs: Box::new(LocalFileSystem),
            chooser: Box::new(chooser.clone()),
            engine: Some(engine),
        },
    );
    let mut driver = Driver {
        controller,
        surfaces,
        chooser,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for file in &args.files {
        if let Err(e) = driver.controller.open_file(file) {
            writeln!(out, "error: {e}")?;
        }
    }
    driver.flush(&mut out)?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read command")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Err(e) = driver.execute(line, &mut out) {
            writeln!(out, "error: {e:#}")?;
        }
        driver.flush(&mut out)?;
        if driver.controller.is_quit_requested() {
            break;
        }
    }

    tracing::info!("graphpad exiting");
    Ok(())
}

impl Driver {
    fn execute(&mut self, line: &str, out: &mut impl Write) -> AnyhowResult<()> {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        tracing::debug!(command, "script command");

        match command {
            "open" if rest.is_empty() => {
                self.controller.open_with_chooser()?;
            }
            "open" => {
                self.controller.open_file(Path::new(rest))?;
            }
            "new" => {
                self.controller.new_tab()?;
            }
            "type" | "replace" => {
                // Let the surface finish initializing first
                self.controller.pump();
                let text = script_text(rest)?;
                let tab = self
                    .controller
                    .registry()
                    .selected_tab()
                    .context("no document tab selected")?;
                let surface = self
                    .controller
                    .session(tab)
                    .context("selected tab has no session")?
                    .bridge()
                    .id();
                let handle = self
                    .surfaces
                    .handle(surface)
                    .context("selected tab has no surface")?;
                if command == "type" {
                    handle.type_text(&text);
                } else {
                    handle.replace_text(&text);
                }
            }
            "save" => {
                self.controller.save_current()?;
            }
            "choose" if rest == "cancel" => self.chooser.push_cancel(),
            "choose" => self.chooser.push_answer(rest),
            "close" => {
                self.controller.close_current()?;
            }
            "answer" => {
                self.controller.resolve_confirmation(SaveChoice::parse(rest))?;
            }
            "key" => {
                let key = parse_key_spec(rest).with_context(|| format!("unknown key `{rest}`"))?;
                if !self.controller.handle_key(&key)? {
                    writeln!(out, "key {rest} is not bound")?;
                }
            }
            "select" if rest == "+" => {
                self.controller.select(TabSlot::AddTab)?;
            }
            "select" => {
                let index: usize = rest.parse().context("expected a tab number")?;
                let tab = index
                    .checked_sub(1)
                    .and_then(|i| self.controller.registry().ids().get(i).copied())
                    .with_context(|| format!("no tab {index}"))?;
                self.controller.select(TabSlot::Document(tab))?;
            }
            "next" => {
                self.controller.next_tab();
            }
            "prev" => {
                self.controller.prev_tab();
            }
            "rule" => {
                let enabled = self.controller.state_mut().toggle_rule(rest);
                writeln!(out, "rule {rest}: {}", if enabled { "on" } else { "off" })?;
            }
            "run" => {
                self.controller.run_current()?;
            }
            "wait" => self.wait_for_engine(out)?,
            "show" => {
                let tab = self
                    .controller
                    .registry()
                    .selected_tab()
                    .context("no document tab selected")?;
                if let Some(session) = self.controller.session(tab) {
                    writeln!(out, "{}", session.content())?;
                }
            }
            "list" => {
                writeln!(out, "{}", render_strip(&self.controller.tab_labels()))?;
            }
            "quit" => {
                self.controller.request_quit()?;
            }
            "help" => writeln!(out, "{HELP}")?,
            other => anyhow::bail!("unknown command `{other}` (try `help`)"),
        }
        Ok(())
    }

    fn wait_for_engine(&mut self, out: &mut impl Write) -> AnyhowResult<()> {
        // Runs that overrun report a timeout failure, so this only trips on a stuck runtime
        let deadline = Instant::now() + DEFAULT_ENGINE_TIMEOUT + Duration::from_secs(5);
        while self.controller.pending_engine_jobs() > 0 {
            if Instant::now() > deadline {
                anyhow::bail!("engine did not finish in time");
            }
            std::thread::sleep(Duration::from_millis(10));
            self.flush(out)?;
        }
        Ok(())
    }

    /// Pump pending messages and print what changed
    fn flush(&mut self, out: &mut impl Write) -> AnyhowResult<()> {
        self.controller.pump();
        for event in self.controller.drain_events() {
            writeln!(out, "{}", describe(&self.controller, &event))?;
        }
        Ok(())
    }
}

/// Bare text, or a JSON string literal for text with escapes
fn script_text(rest: &str) -> AnyhowResult<String> {
    if rest.starts_with('"') {
        serde_json::from_str(rest).context("invalid string literal")
    } else {
        Ok(rest.to_string())
    }
}

/// "ctrl+shift+s" style key description
fn parse_key_spec(spec: &str) -> Option<KeyEvent> {
    let mut parts: Vec<&str> = spec.split('+').collect();
    // "ctrl++" style specs are not supported; the last part is the key
    let key = parts.pop()?;
    let modifiers: Vec<String> = parts.iter().map(|m| m.to_string()).collect();
    Some(KeyEvent::new(parse_key(key)?, parse_modifiers(&modifiers)))
}

fn describe(controller: &TabLifecycleController, event: &UiEvent) -> String {
    match event {
        UiEvent::TabOpened { tab, title } => format!("opened {tab}: {title}"),
        UiEvent::TabSelected(TabSlot::Document(tab)) => {
            format!("selected {tab}: {}", controller.title(*tab).unwrap_or("?"))
        }
        UiEvent::TabSelected(TabSlot::AddTab) => "selected +".to_string(),
        UiEvent::TabRemoved(tab) => format!("closed {tab}"),
        UiEvent::TitleChanged { tab, title } => format!("renamed {tab}: {title}"),
        UiEvent::ModifiedChanged { tab, modified } => {
            format!("{tab} {}", if *modified { "modified" } else { "saved" })
        }
        UiEvent::ConfirmationRequested { message } => format!("confirm: {message}"),
        UiEvent::Notification(message) => format!("note: {message}"),
        UiEvent::EngineFinished {
            tab,
            job_id,
            result: Ok(report),
        } => {
            let mut text = format!("engine job {job_id} on {tab}:\n{}", report.output);
            for diagnostic in &report.diagnostics {
                text.push_str(&format!(
                    "\n  line {} {:?}: {}",
                    diagnostic.line, diagnostic.severity, diagnostic.message
                ));
            }
            text
        }
        UiEvent::EngineFinished {
            tab,
            job_id,
            result: Err(error),
        } => format!("engine job {job_id} on {tab} failed: {error}"),
        UiEvent::QuitRequested => "quit".to_string(),
    }
}
