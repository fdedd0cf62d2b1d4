use crate::{
    feeders::spawn_tui_feeders,
    input::InputField,
    status_log::StatusLog,
    styles,
    view,
};
use anyhow::Result;
use crossterm::{
    cursor::Show,
    event::{Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dirscout_common::ScoutError;
use dirscout_scraper::{read_listings, ListingRecord, RunEvent, RunOutcome, ScrapeController};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};
use tokio::sync::mpsc::{self, Receiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const MAILBOX: usize = 256;
const PAGE_SCROLL: usize = 5;

pub enum TuiMsg {
    InputEvent(CtEvent),
    Tick,
    Run(RunEvent),
    OpError(String),
}

/// What a key press asks the shell to do beyond redrawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start { term: String, location: String },
    Cancel,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Term,
    Location,
}

/// Everything the screen shows, independent of the terminal.
pub struct TuiState {
    pub(crate) term: InputField,
    pub(crate) location: InputField,
    pub(crate) focus: Focus,
    pub(crate) log: StatusLog,
    pub(crate) listings: Vec<ListingRecord>,
    pub(crate) running: bool,
    spin_idx: usize,
    dirty: bool,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        let mut log = StatusLog::default();
        log.push(
            "Enter a search term and a location, then press Enter. Tab switches fields, Esc cancels a run, Ctrl-Q quits.",
            styles::dim(),
        );
        Self {
            term: InputField::new("Search term"),
            location: InputField::new("Location"),
            focus: Focus::Term,
            log,
            listings: Vec::new(),
            running: false,
            spin_idx: 0,
            dirty: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn listings(&self) -> &[ListingRecord] {
        &self.listings
    }

    pub(crate) fn spinner(&self) -> &'static str {
        if self.running {
            BRAILLE_FRAMES[self.spin_idx % BRAILLE_FRAMES.len()]
        } else {
            " "
        }
    }

    fn step_spinner(&mut self) {
        if self.running {
            self.spin_idx = (self.spin_idx + 1) % BRAILLE_FRAMES.len();
            self.dirty = true;
        }
    }

    fn focused(&mut self) -> &mut InputField {
        match self.focus {
            Focus::Term => &mut self.term,
            Focus::Location => &mut self.location,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Term => Focus::Location,
            Focus::Location => Focus::Term,
        };
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        self.dirty = true;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => return Some(Action::Quit),
            KeyCode::Tab | KeyCode::BackTab => self.toggle_focus(),
            KeyCode::Enter => return self.submit(),
            KeyCode::Esc => {
                if self.running {
                    return Some(Action::Cancel);
                }
            }
            KeyCode::PageUp => self.log.scroll_up(PAGE_SCROLL),
            KeyCode::PageDown => self.log.scroll_down(PAGE_SCROLL),
            KeyCode::Up => self.log.scroll_up(1),
            KeyCode::Down => self.log.scroll_down(1),
            KeyCode::Left => self.focused().left(),
            KeyCode::Right => self.focused().right(),
            KeyCode::Home => self.focused().home(),
            KeyCode::End => self.focused().end(),
            KeyCode::Backspace => self.focused().backspace(),
            KeyCode::Delete => self.focused().delete(),
            KeyCode::Char(ch) if !ctrl => self.focused().insert(ch),
            _ => {}
        }
        None
    }

    fn submit(&mut self) -> Option<Action> {
        if self.running {
            self.log
                .push("A scraping run is already in progress.", styles::error());
            return None;
        }
        let term = self.term.text().trim();
        let location = self.location.text().trim();
        if term.is_empty() || location.is_empty() {
            self.log
                .push("Please enter both search term and location.", styles::error());
            return None;
        }
        Some(Action::Start {
            term: term.to_string(),
            location: location.to_string(),
        })
    }

    pub fn run_started(&mut self) {
        self.running = true;
        self.listings.clear();
        self.log.scroll_down(usize::MAX);
        self.dirty = true;
    }

    pub fn start_rejected(&mut self, err: &ScoutError) {
        let message = match err {
            ScoutError::InvalidQuery(reason) => reason.clone(),
            other => other.to_string(),
        };
        self.log.push(message, styles::error());
        self.dirty = true;
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.log.push(message, styles::error());
        self.dirty = true;
    }

    pub fn apply(&mut self, event: RunEvent) {
        self.dirty = true;
        match event {
            RunEvent::Status(line) => {
                let style = if line.starts_with("Scraping error") {
                    styles::error()
                } else {
                    styles::status()
                };
                self.log.push(line, style);
            }
            RunEvent::BatchSaved { records, .. } => self.listings.extend(records),
            RunEvent::Finished(report) => {
                self.running = false;
                match &report.output_path {
                    Some(path) => {
                        match read_listings(path) {
                            Ok(rows) => self.listings = rows,
                            Err(e) => self.log.push(
                                format!("Could not reload {}: {e}", path.display()),
                                styles::error(),
                            ),
                        }
                        self.log.push(
                            format!(
                                "{} records saved to {}",
                                report.records_written,
                                path.display()
                            ),
                            styles::saved(),
                        );
                    }
                    None if report.outcome != RunOutcome::Failed => {
                        self.log.push("No records were saved.", styles::dim());
                    }
                    None => {}
                }
            }
        }
    }
}

/// Terminal front end: owns the screen, the run controller and the event
/// sender every run reports through.
pub struct ScoutTui {
    state: TuiState,
    term: Terminal<CrosstermBackend<Stdout>>,
    controller: ScrapeController,
    events: UnboundedSender<RunEvent>,
    tick_rate: Duration,
    last_tick: Instant,
}

impl ScoutTui {
    pub fn new(controller: ScrapeController, events: UnboundedSender<RunEvent>) -> Result<Self> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut term = Terminal::new(backend)?;
        term.clear()?;

        Ok(Self {
            state: TuiState::new(),
            term,
            controller,
            events,
            tick_rate: Duration::from_millis(80),
            last_tick: Instant::now(),
        })
    }

    fn draw(&mut self) -> Result<()> {
        view::draw(&mut self.term, &self.state)
    }

    fn perform(&mut self, action: Action) -> bool {
        match action {
            Action::Start { term, location } => {
                match self.controller.start(&term, &location, self.events.clone()) {
                    Ok(()) => self.state.run_started(),
                    Err(e) => self.state.start_rejected(&e),
                }
            }
            Action::Cancel => {
                if self.controller.cancel() {
                    self.state
                        .log
                        .push("Cancelling after the current page...", styles::status());
                }
            }
            Action::Quit => return false,
        }
        true
    }

    /// Returns `false` once the UI should close.
    fn handle(&mut self, msg: TuiMsg) -> Result<bool> {
        match msg {
            TuiMsg::InputEvent(CtEvent::Key(key)) => {
                if let Some(action) = self.state.handle_key(key) {
                    return Ok(self.perform(action));
                }
            }
            TuiMsg::InputEvent(CtEvent::Resize(..)) => self.state.dirty = true,
            TuiMsg::InputEvent(_) => {}
            TuiMsg::Run(event) => self.state.apply(event),
            TuiMsg::OpError(e) => self.state.push_error(format!("Error: {e}")),
            TuiMsg::Tick => {
                self.state.step_spinner();
                if self.state.dirty || self.last_tick.elapsed() >= self.tick_rate {
                    self.draw()?;
                    self.last_tick = Instant::now();
                    self.state.dirty = false;
                }
            }
        }
        Ok(true)
    }

    async fn event_loop(
        &mut self,
        mailbox: &mut Receiver<TuiMsg>,
        stop: &CancellationToken,
    ) -> Result<()> {
        loop {
            let msg = tokio::select! {
                _ = stop.cancelled() => break,
                msg = mailbox.recv() => msg,
            };
            let Some(msg) = msg else { break };
            if !self.handle(msg)? {
                break;
            }
        }
        Ok(())
    }

    async fn teardown(mut self) {
        if self.controller.cancel() {
            info!("waiting for the active run to stop");
        }
        self.controller.wait().await;
        disable_raw_mode().ok();
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, Show) {
            warn!(error = %e, "failed to restore terminal");
        }
    }
}

/// Run the interactive shell until the user quits or `shutdown` fires. Any
/// active run is cancelled and awaited before returning.
pub async fn run_tui(controller: ScrapeController, shutdown: CancellationToken) -> Result<()> {
    let (tx, mut mailbox) = mpsc::channel(MAILBOX);
    let (run_tx, run_rx) = mpsc::unbounded_channel();
    let ui_stop = shutdown.child_token();

    let mut tui = ScoutTui::new(controller, run_tx)?;
    spawn_tui_feeders(tx, run_rx, ui_stop.clone());

    let result = tui.event_loop(&mut mailbox, &ui_stop).await;
    ui_stop.cancel();
    tui.teardown().await;
    result
}
