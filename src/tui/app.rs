use std::time::{Duration, Instant};

use ratatui::widgets::{ScrollbarState, TableState};

use super::models::{InputMode, intent_for_input, neighbour_list};
use crate::models::{Rating, TrackedItemRecord};
use crate::tracker::{Intent, Notification, Outcome, Tracker};

const STATUS_TTL: Duration = Duration::from_secs(5);

pub struct App {
    pub tracker: Tracker,
    pub list_name: String,
    pub list_names: Vec<String>,
    pub records: Vec<TrackedItemRecord>,
    pub table_state: TableState,
    pub scroll_state: ScrollbarState,
    pub show_help: bool,
    pub show_episodes: bool,
    pub input_mode: InputMode,
    pub input: String,
    pub status: Option<Notification>,
    pub status_time: Option<Instant>,
    /// Intent waiting for the next loop turn, so a "working" status is drawn first.
    pub pending: Option<Intent>,
    pub should_quit: bool,
}

impl App {
    /// Builds the initial state from whatever part of the active list can be shown. Problems
    /// loading it end up on the status line.
    pub async fn load(tracker: Tracker) -> Self {
        let outcome = tracker.current().await;

        let mut app = Self {
            tracker,
            list_name: String::new(),
            list_names: vec![outcome.list_name.clone()],
            records: Vec::new(),
            table_state: TableState::default(),
            scroll_state: ScrollbarState::default(),
            show_help: false,
            show_episodes: false,
            input_mode: InputMode::Normal,
            input: String::new(),
            status: None,
            status_time: None,
            pending: None,
            should_quit: false,
        };
        app.apply_outcome(outcome).await;
        app
    }

    pub fn selected_record(&self) -> Option<&TrackedItemRecord> {
        self.table_state
            .selected()
            .and_then(|index| self.records.get(index))
    }

    pub fn next(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < self.records.len() => i + 1,
            _ => 0,
        };
        self.select(i);
    }

    pub fn previous(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => self.records.len() - 1,
            Some(i) => i - 1,
        };
        self.select(i);
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn toggle_episodes(&mut self) {
        self.show_episodes = !self.show_episodes;
    }

    pub fn set_status(&mut self, notification: Notification) {
        self.status = Some(notification);
        self.status_time = Some(Instant::now());
    }

    pub fn clear_status_if_expired(&mut self) {
        if let Some(time) = self.status_time
            && time.elapsed() > STATUS_TTL
        {
            self.status = None;
            self.status_time = None;
        }
    }

    /// Queues an intent; it runs after the next draw.
    pub fn queue(&mut self, intent: Intent, working: &str) {
        self.set_status(Notification::success(working));
        self.pending = Some(intent);
    }

    pub fn rate_selected(&mut self, rating: Option<Rating>) {
        if let Some(record) = self.selected_record() {
            let id = record.id;
            self.queue(Intent::Rate(id, rating), "Saving rating...");
        }
    }

    pub fn remove_selected(&mut self) {
        if let Some(record) = self.selected_record() {
            let id = record.id;
            self.queue(Intent::Remove(id), "Removing...");
        }
    }

    pub fn switch_list(&mut self, forward: bool) {
        if let Some(name) = neighbour_list(&self.list_names, &self.list_name, forward) {
            let name = name.to_string();
            self.queue(Intent::SwitchList(name), "Switching list...");
        }
    }

    /// Puts the playback link of the next unwatched episode on the status line.
    pub fn show_continue_url(&mut self) {
        if let Some(record) = self.selected_record() {
            let message = format!("{}: {}", record.title, record.continue_url());
            self.set_status(Notification::success(message));
        }
    }

    pub fn begin_input(&mut self, mode: InputMode) {
        self.input_mode = mode;
        self.input = match mode {
            InputMode::RenameList => self.list_name.clone(),
            _ => String::new(),
        };
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
    }

    pub fn submit_input(&mut self) {
        let mode = self.input_mode;
        match intent_for_input(mode, &self.input, &self.list_name) {
            Ok(Some(intent)) => self.queue(intent, "Working..."),
            Ok(None) => {}
            Err(message) => self.set_status(Notification::failure(message)),
        }
        self.cancel_input();
    }

    pub fn confirm_delete(&mut self) {
        let name = self.list_name.clone();
        self.cancel_input();
        self.queue(Intent::DeleteList(name), "Deleting list...");
    }

    /// Runs the queued intent, if any, and takes over the re-read list.
    pub async fn run_pending(&mut self) {
        let Some(intent) = self.pending.take() else {
            return;
        };

        let outcome = self.tracker.handle(intent).await;
        self.apply_outcome(outcome).await;
    }

    async fn apply_outcome(&mut self, outcome: Outcome) {
        let Outcome {
            notification,
            list_name,
            records,
        } = outcome;

        if list_name != self.list_name {
            self.table_state.select(None);
            self.show_episodes = false;
        }
        self.list_name = list_name;
        self.set_records(records);

        match self.tracker.list_names().await {
            Ok(names) => self.list_names = names,
            Err(error) => tracing::warn!(%error, "could not re-read list names"),
        }
        self.set_status(notification);
    }

    fn set_records(&mut self, records: Vec<TrackedItemRecord>) {
        self.records = records;
        let selected = match self.table_state.selected() {
            _ if self.records.is_empty() => None,
            Some(i) => Some(i.min(self.records.len() - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
        self.scroll_state =
            ScrollbarState::new(self.records.len()).position(selected.unwrap_or(0));
    }

    fn select(&mut self, index: usize) {
        self.table_state.select(Some(index));
        self.scroll_state = ScrollbarState::new(self.records.len()).position(index);
    }
}
