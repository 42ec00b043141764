use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::Config;
use crate::core::{render_record, Browser, FetchStatus, GridRow, GridView, Record};
use crate::utils::error::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    BlockNumber,
    Search,
}

/// Terminal front-end state layered over a [`Browser`].
pub struct App {
    browser: Browser,
    grid: GridView,
    mode: InputMode,
    input: String,
    detail_indent: usize,
    exit: bool,
}

impl App {
    pub fn new(browser: Browser, config: &Config) -> Self {
        Self {
            browser,
            grid: GridView::new(config.page_size),
            mode: InputMode::Normal,
            input: String::new(),
            detail_indent: config.detail_indent,
            exit: false,
        }
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    pub fn grid(&self) -> &GridView {
        &self.grid
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn should_exit(&self) -> bool {
        self.exit
    }

    pub fn mount(&mut self, start_block: Option<u64>) {
        self.browser.mount(start_block);
    }

    /// Applies finished fetches; called once per frame.
    pub fn tick(&mut self) {
        if self.browser.poll_outcomes() > 0 {
            self.follow_selection();
        }
    }

    /// Waits for one fetch to finish and applies it.
    pub async fn wait_for_fetch(&mut self) {
        if self.browser.next_outcome().await {
            self.follow_selection();
        }
    }

    pub fn rows(&self) -> Vec<GridRow> {
        self.grid.rows(self.records())
    }

    pub fn records(&self) -> &[Record] {
        self.browser.controller().records()
    }

    pub fn detail_text(&self) -> String {
        render_record(self.browser.controller().selected(), self.detail_indent)
    }

    pub fn status_line(&self) -> String {
        let controller = self.browser.controller();
        match controller.status() {
            FetchStatus::Idle => "Enter a block number".to_string(),
            FetchStatus::Loading { key } => format!("Loading block {key}..."),
            FetchStatus::Loaded { key, count } => {
                let mut line = format!("{count} transactions in block {key}");
                if let Some(at) = self.browser.last_updated() {
                    line.push_str(&format!(" (updated {})", at.format("%H:%M:%S")));
                }
                line
            }
            FetchStatus::Failed {
                error: ProviderError::NotFound { key },
                ..
            } => format!("No such block: {key}"),
            FetchStatus::Failed { error, .. } => error.to_string(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.exit = true;
            return;
        }
        match self.mode {
            InputMode::Normal => self.handle_normal_key(key.code),
            InputMode::BlockNumber | InputMode::Search => self.handle_edit_key(key.code),
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) {
        let row_count = self.rows().len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.exit = true,
            KeyCode::Char('b') => {
                self.input = self
                    .browser
                    .controller()
                    .key()
                    .map(|k| k.to_string())
                    .unwrap_or_default();
                self.mode = InputMode::BlockNumber;
            }
            KeyCode::Char('/') => {
                self.input = self.grid.search().to_string();
                self.mode = InputMode::Search;
            }
            KeyCode::Char('c') => self.grid.toggle_case_sensitive(),
            KeyCode::Char('s') => self.grid.cycle_sort(),
            KeyCode::Char('o') => self.grid.flip_sort_order(),
            KeyCode::Char('g') => self.grid.cycle_group_by(),
            KeyCode::Char('r') => self.browser.refresh(),
            KeyCode::Char('+') => self.grid.step_page_size(true),
            KeyCode::Char('-') => self.grid.step_page_size(false),
            KeyCode::Up | KeyCode::Char('k') => self.grid.move_by(-1, row_count),
            KeyCode::Down | KeyCode::Char('j') => self.grid.move_by(1, row_count),
            KeyCode::PageUp => self.grid.page_up(row_count),
            KeyCode::PageDown => self.grid.page_down(row_count),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let rows = self.rows();
                self.grid.toggle_group(&rows);
            }
            _ => return,
        }
        self.select_under_cursor();
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.input.clear();
                self.mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.input);
                match self.mode {
                    InputMode::BlockNumber => self.browser.set_key_input(&text),
                    InputMode::Search => {
                        self.grid.set_search(&text);
                        self.select_under_cursor();
                    }
                    InputMode::Normal => {}
                }
                self.mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    // Details always show the record under the cursor, or nothing when the
    // cursor is on a group header or the view is empty.
    fn select_under_cursor(&mut self) {
        let rows = self.rows();
        match self.grid.cursor_record(&rows) {
            Some(index) => {
                self.browser.select_index(index);
            }
            None => self.browser.clear_selection(),
        }
    }

    // The list was replaced: start from the top and put the cursor on the
    // record the controller selected. If the search hides that record, the
    // first visible one is selected instead so grid and details agree.
    fn follow_selection(&mut self) {
        self.grid.reset();
        let Some(index) = self.browser.controller().selected_index() else {
            return;
        };
        self.grid.reveal_record(index, self.browser.controller().records());

        let rows = self.rows();
        if !self.grid.focus_record(index, &rows) {
            self.select_under_cursor();
        }
    }
}
