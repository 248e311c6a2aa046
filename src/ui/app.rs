use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::error;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tui_widgets::popup::PopupState;

use crate::config::Config;
use crate::fields::FieldId;
use crate::relay::RelayHandle;
use crate::tiles::{self, FieldSnapshot, Tile};

use super::draw;
use super::form::FormField;

/// What currently receives keystrokes: a form control or the tile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Field(usize),
    Chips,
}

/// Option picker for one selector field.
#[derive(Debug, Clone)]
pub struct SelectModal {
    pub field_index: usize,
    pub selected: usize,
}

/// Help modal state with scroll support
#[derive(Debug, Clone)]
pub struct HelpModal {
    /// Current scroll offset (line index at top of viewport)
    pub scroll: usize,
    /// Total number of content lines
    pub total_lines: usize,
    /// Viewport height (set during rendering)
    pub viewport_height: usize,
}

impl HelpModal {
    pub fn new(total_lines: usize) -> Self {
        Self {
            scroll: 0,
            total_lines,
            viewport_height: 10,
        }
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max_scroll = self.total_lines.saturating_sub(self.viewport_height);
        self.scroll = (self.scroll + lines).min(max_scroll);
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }
}

/// A single help entry (action name + key bindings)
pub struct HelpEntry {
    pub action: &'static str,
    pub keys: String,
}

pub struct App<'a> {
    config: &'a Config,
    relay: &'a RelayHandle,
    pub fields: Vec<FormField>,
    pub focus: Focus,
    /// In-memory copy of the tile list driving the chip row. Replaced
    /// wholesale on apply, shrunk by chip removal, cleared on reset.
    pub tiles: Vec<Tile>,
    pub chip_index: usize,
    pub status: Option<String>,
    pub select_modal: Option<SelectModal>,
    pub help_modal: Option<HelpModal>,
    // Popup state for modal dialogs (tui-widgets popup)
    pub modal_popup: PopupState,
}

impl<'a> App<'a> {
    /// Build the editor and pre-fill it from the persisted tile list. A
    /// relay failure leaves the form at its defaults.
    pub fn new(config: &'a Config, relay: &'a RelayHandle) -> Self {
        let fields = FieldId::ALL.into_iter().map(FormField::new).collect();
        let mut app = Self {
            config,
            relay,
            fields,
            focus: Focus::Field(0),
            tiles: Vec::new(),
            chip_index: 0,
            status: None,
            select_modal: None,
            help_modal: None,
            modal_popup: PopupState::default(),
        };
        app.initialize();
        app
    }

    fn initialize(&mut self) {
        match self.relay.get_tiles() {
            Ok(stored) => {
                for tile in &stored {
                    self.prefill(tile);
                }
                self.tiles = stored;
            }
            Err(err) => {
                error!("failed to load stored tiles: {err}");
                self.set_status("Could not load saved parameters");
            }
        }
    }

    /// Re-apply one persisted tile to its form control. Tiles whose key
    /// matches no control are skipped.
    fn prefill(&mut self, tile: &Tile) {
        let Some(id) = tile.field_id() else {
            return;
        };
        if let Some(field) = self.fields.iter_mut().find(|f| f.id == id) {
            field.restore(&tile.raw_value);
        }
    }

    /// Snapshot every control in catalog order, rebuild the tile list, and
    /// persist it. On a storage failure the in-memory list stays untouched.
    pub fn submit(&mut self) {
        let snapshot: Vec<FieldSnapshot> = self
            .fields
            .iter()
            .map(|field| FieldSnapshot {
                id: field.id,
                raw: field.raw_value().to_string(),
                select_label: field.select_label().map(str::to_string),
            })
            .collect();
        let new_tiles = tiles::build_tiles(snapshot);

        match self.relay.set_tiles(new_tiles.clone()) {
            Ok(()) => {
                let count = new_tiles.len();
                self.tiles = new_tiles;
                self.chip_index = 0;
                self.set_status(match count {
                    0 => "Cleared all parameters".to_string(),
                    1 => "Applied 1 parameter".to_string(),
                    n => format!("Applied {n} parameters"),
                });
            }
            Err(err) => {
                error!("failed to persist tiles: {err}");
                self.set_status("Could not save parameters");
            }
        }
    }

    /// Blank every control and clear the tile list, persisted copy included.
    pub fn reset_all(&mut self) {
        for field in &mut self.fields {
            field.reset();
        }
        self.tiles.clear();
        self.chip_index = 0;
        if let Err(err) = self.relay.set_tiles(Vec::new()) {
            error!("failed to clear persisted tiles: {err}");
            self.set_status("Could not clear saved parameters");
        } else {
            self.set_status("Form reset");
        }
    }

    /// Drop the tile with `key` from the in-memory list and reset its form
    /// control. Not persisted until the next apply.
    pub fn remove_tile(&mut self, key: &str) {
        let before = self.tiles.len();
        self.tiles.retain(|tile| tile.key != key);
        if self.tiles.len() == before {
            return;
        }

        if let Some(id) = FieldId::from_name(key) {
            if let Some(field) = self.fields.iter_mut().find(|f| f.id == id) {
                field.reset();
            }
        }

        if self.chip_index >= self.tiles.len() {
            self.chip_index = self.tiles.len().saturating_sub(1);
        }
        self.set_status("Parameter removed (apply to save)");
    }

    fn remove_selected_chip(&mut self) {
        let Some(tile) = self.tiles.get(self.chip_index) else {
            self.set_status("No parameter selected");
            return;
        };
        let key = tile.key.clone();
        self.remove_tile(&key);
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }

    pub fn focused_field(&self) -> Option<&FormField> {
        match self.focus {
            Focus::Field(index) => self.fields.get(index),
            Focus::Chips => None,
        }
    }

    /// Cycle focus over the fields and the chip row.
    fn advance_focus(&mut self, delta: i64) {
        let stops = self.fields.len() as i64 + 1;
        let current = match self.focus {
            Focus::Field(index) => index as i64,
            Focus::Chips => stops - 1,
        };
        let next = (current + delta).rem_euclid(stops);
        self.focus = if next == stops - 1 {
            Focus::Chips
        } else {
            Focus::Field(next as usize)
        };
    }

    fn open_select_modal(&mut self, field_index: usize) {
        let Some(field) = self.fields.get(field_index) else {
            return;
        };
        let Some(selected) = field.select_index() else {
            return;
        };
        self.modal_popup = PopupState::default();
        self.select_modal = Some(SelectModal {
            field_index,
            selected,
        });
    }

    fn show_help(&mut self) {
        let total = self.help_entries().len() + 2;
        self.modal_popup = PopupState::default();
        self.help_modal = Some(HelpModal::new(total));
    }

    pub fn help_entries(&self) -> Vec<HelpEntry> {
        let keys = &self.config.keys;
        let join = |bindings: &[String]| bindings.join(" / ");
        vec![
            HelpEntry {
                action: "Apply parameters",
                keys: join(&keys.global.apply),
            },
            HelpEntry {
                action: "Reset form",
                keys: join(&keys.global.reset),
            },
            HelpEntry {
                action: "Next field",
                keys: join(&keys.form.next),
            },
            HelpEntry {
                action: "Previous field",
                keys: join(&keys.form.prev),
            },
            HelpEntry {
                action: "Open selector / apply from field",
                keys: join(&keys.form.confirm),
            },
            HelpEntry {
                action: "Remove selected tile",
                keys: join(&keys.form.remove),
            },
            HelpEntry {
                action: "Help",
                keys: join(&keys.global.help),
            },
            HelpEntry {
                action: "Quit",
                keys: format!("{} / Ctrl+C", join(&keys.global.quit)),
            },
        ]
    }

    // =========================================================================
    // Event loop
    // =========================================================================

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            draw::render(terminal, self)?;

            if event::poll(Duration::from_millis(250))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key) {
                            break;
                        }
                    }
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Returns true when the editor should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        // Ctrl+C always quits (hardcoded for safety)
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return true;
        }

        // Modals swallow everything while open
        if self.help_modal.is_some() {
            self.handle_help_modal_key(key);
            return false;
        }
        if self.select_modal.is_some() {
            self.handle_select_modal_key(key);
            return false;
        }

        let global = &self.config.keys.global;
        if key_matches_any(&key, &global.quit) {
            return true;
        }
        if key_matches_any(&key, &global.apply) {
            self.submit();
            return false;
        }
        if key_matches_any(&key, &global.reset) {
            self.reset_all();
            return false;
        }
        if key_matches_any(&key, &global.help) {
            self.show_help();
            return false;
        }

        let form = &self.config.keys.form;
        if key_matches_any(&key, &form.next) {
            self.advance_focus(1);
            return false;
        }
        if key_matches_any(&key, &form.prev) {
            self.advance_focus(-1);
            return false;
        }

        match self.focus {
            Focus::Field(index) => {
                if key_matches_any(&key, &form.confirm) {
                    if self.fields.get(index).is_some_and(FormField::is_select) {
                        self.open_select_modal(index);
                    } else {
                        // Enter in a text control applies the whole form
                        self.submit();
                    }
                    return false;
                }
                if let Some(field) = self.fields.get_mut(index) {
                    field.handle_key_event(key);
                }
            }
            Focus::Chips => {
                if key_matches_any(&key, &form.confirm) || key_matches_any(&key, &form.remove) {
                    self.remove_selected_chip();
                    return false;
                }
                match key.code {
                    KeyCode::Left => {
                        self.chip_index = self.chip_index.saturating_sub(1);
                    }
                    KeyCode::Right => {
                        if self.chip_index + 1 < self.tiles.len() {
                            self.chip_index += 1;
                        }
                    }
                    _ => {}
                }
            }
        }

        false
    }

    fn handle_select_modal_key(&mut self, key: KeyEvent) {
        let modal_keys = &self.config.keys.modal;
        let Some(modal) = self.select_modal.as_mut() else {
            return;
        };
        let Some(spec) = self
            .fields
            .get(modal.field_index)
            .and_then(|field| field.id.select_spec())
        else {
            self.select_modal = None;
            return;
        };
        let count = spec.options.len();

        if key_matches_any(&key, &modal_keys.cancel) {
            self.select_modal = None;
        } else if key_matches_any(&key, &modal_keys.next) {
            modal.selected = (modal.selected + 1) % count;
        } else if key_matches_any(&key, &modal_keys.prev) {
            modal.selected = if modal.selected == 0 {
                count - 1
            } else {
                modal.selected - 1
            };
        } else if key_matches_any(&key, &modal_keys.confirm) {
            let (field_index, selected) = (modal.field_index, modal.selected);
            if let Some(field) = self.fields.get_mut(field_index) {
                field.set_select_index(selected);
            }
            self.select_modal = None;
        }
    }

    fn handle_help_modal_key(&mut self, key: KeyEvent) {
        let modal_keys = &self.config.keys.modal;
        let Some(modal) = self.help_modal.as_mut() else {
            return;
        };

        if key_matches_any(&key, &modal_keys.cancel) {
            self.help_modal = None;
        } else if key_matches_any(&key, &modal_keys.next) {
            modal.scroll_down(1);
        } else if key_matches_any(&key, &modal_keys.prev) {
            modal.scroll_up(1);
        }
    }
}

/// Check if the key event matches any binding in the list
pub fn key_matches_any(event: &KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|b| key_matches_single(event, b))
}

/// Check if the key event matches a single binding string
fn key_matches_single(event: &KeyEvent, binding: &str) -> bool {
    let trimmed = binding.trim();
    if trimmed.is_empty() {
        return false;
    }

    // Ctrl/Alt/Super bindings are not supported
    let disallowed = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER;
    if event.modifiers.intersects(disallowed) {
        return false;
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "enter" => matches!(event.code, KeyCode::Enter),
        "tab" => matches!(event.code, KeyCode::Tab),
        "backtab" | "shift+tab" => matches!(event.code, KeyCode::BackTab),
        "backspace" => matches!(event.code, KeyCode::Backspace),
        "esc" | "escape" => matches!(event.code, KeyCode::Esc),
        "space" => matches!(event.code, KeyCode::Char(' ')),
        "delete" => matches!(event.code, KeyCode::Delete),
        "up" => matches!(event.code, KeyCode::Up),
        "down" => matches!(event.code, KeyCode::Down),
        "left" => matches!(event.code, KeyCode::Left),
        "right" => matches!(event.code, KeyCode::Right),
        "pageup" | "page_up" => matches!(event.code, KeyCode::PageUp),
        "pagedown" | "page_down" => matches!(event.code, KeyCode::PageDown),
        "home" => matches!(event.code, KeyCode::Home),
        "end" => matches!(event.code, KeyCode::End),
        "f1" => matches!(event.code, KeyCode::F(1)),
        "f2" => matches!(event.code, KeyCode::F(2)),
        "f3" => matches!(event.code, KeyCode::F(3)),
        "f4" => matches!(event.code, KeyCode::F(4)),
        "f5" => matches!(event.code, KeyCode::F(5)),
        "f6" => matches!(event.code, KeyCode::F(6)),
        "f7" => matches!(event.code, KeyCode::F(7)),
        "f8" => matches!(event.code, KeyCode::F(8)),
        "f9" => matches!(event.code, KeyCode::F(9)),
        "f10" => matches!(event.code, KeyCode::F(10)),
        "f11" => matches!(event.code, KeyCode::F(11)),
        "f12" => matches!(event.code, KeyCode::F(12)),
        // Single character - case-sensitive (x != X, since X requires Shift)
        _ => {
            let mut chars = trimmed.chars();
            if let (Some(first), None) = (chars.next(), chars.next()) {
                matches!(event.code, KeyCode::Char(c) if c == first)
            } else {
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fields::FieldId;
    use crate::relay::{self, RelayHandle};
    use crate::store::MemoryStore;
    use crate::tiles::Tile;

    fn test_config() -> Config {
        Config {
            config_path: None,
            tiles_path: std::path::PathBuf::from("/nonexistent/tiles.json"),
            keys: Default::default(),
            commands: Default::default(),
        }
    }

    fn relay_with(tiles: Vec<Tile>) -> RelayHandle {
        relay::spawn(Box::new(MemoryStore::with_tiles(tiles)))
    }

    fn field_mut<'a>(app: &'a mut App<'_>, id: FieldId) -> &'a mut FormField {
        app.fields.iter_mut().find(|f| f.id == id).unwrap()
    }

    #[test]
    fn test_initialize_prefills_form_from_store() {
        let config = test_config();
        let relay = relay_with(vec![
            Tile::from_field(FieldId::FileType, "pdf", None).unwrap(),
            Tile::from_field(FieldId::DateRange, "qdr:y", Some("Past year")).unwrap(),
        ]);
        let app = App::new(&config, &relay);

        assert_eq!(app.tiles.len(), 2);
        let filetype = app.fields.iter().find(|f| f.id == FieldId::FileType).unwrap();
        assert_eq!(filetype.raw_value(), "pdf");
        let tbs = app.fields.iter().find(|f| f.id == FieldId::DateRange).unwrap();
        assert_eq!(tbs.raw_value(), "qdr:y");
        assert_eq!(tbs.select_label(), Some("Past year"));
    }

    #[test]
    fn test_initialize_skips_unmatched_tile_keys() {
        let config = test_config();
        let stale = Tile {
            key: "as_oq".to_string(),
            label: "Any of these words".to_string(),
            value: "&as_oq=cats".to_string(),
            raw_value: "cats".to_string(),
            select_label: None,
        };
        let relay = relay_with(vec![stale]);
        let app = App::new(&config, &relay);
        // The stale tile still shows as a chip, but no control was touched
        assert_eq!(app.tiles.len(), 1);
        assert!(app.fields.iter().all(|f| f.raw_value().is_empty()));
    }

    #[test]
    fn test_submit_persists_non_blank_fields() {
        let config = test_config();
        let relay = relay_with(Vec::new());
        let mut app = App::new(&config, &relay);

        field_mut(&mut app, FieldId::Start).restore("10");
        field_mut(&mut app, FieldId::InterfaceLanguage).restore("en");
        app.submit();

        assert_eq!(app.tiles.len(), 2);
        assert_eq!(app.tiles[0].value, "&start=10");
        assert_eq!(app.tiles[1].value, "&hl=en");
        assert_eq!(app.tiles[1].select_label.as_deref(), Some("English"));
        assert_eq!(relay.get_tiles().unwrap(), app.tiles);
    }

    #[test]
    fn test_submit_with_all_blank_fields_persists_empty_list() {
        let config = test_config();
        let relay = relay_with(vec![
            Tile::from_field(FieldId::FileType, "pdf", None).unwrap()
        ]);
        let mut app = App::new(&config, &relay);

        field_mut(&mut app, FieldId::FileType).reset();
        app.submit();

        assert!(app.tiles.is_empty());
        assert!(relay.get_tiles().unwrap().is_empty());
    }

    #[test]
    fn test_remove_tile_resets_field_without_persisting() {
        let config = test_config();
        let relay = relay_with(vec![
            Tile::from_field(FieldId::FileType, "pdf", None).unwrap(),
            Tile::from_field(FieldId::ResultCount, "20", None).unwrap(),
        ]);
        let mut app = App::new(&config, &relay);

        app.remove_tile("as_filetype");

        assert_eq!(app.tiles.len(), 1);
        assert_eq!(app.tiles[0].key, "num");
        let filetype = app.fields.iter().find(|f| f.id == FieldId::FileType).unwrap();
        assert_eq!(filetype.raw_value(), "");
        // The store still holds both tiles until the next apply
        assert_eq!(relay.get_tiles().unwrap().len(), 2);
    }

    #[test]
    fn test_remove_unknown_key_is_a_no_op() {
        let config = test_config();
        let relay = relay_with(vec![
            Tile::from_field(FieldId::FileType, "pdf", None).unwrap()
        ]);
        let mut app = App::new(&config, &relay);
        app.remove_tile("num");
        assert_eq!(app.tiles.len(), 1);
    }

    #[test]
    fn test_reset_all_clears_form_and_persisted_list() {
        let config = test_config();
        let relay = relay_with(vec![
            Tile::from_field(FieldId::CountryRestrict, "countryDE", Some("Germany")).unwrap(),
        ]);
        let mut app = App::new(&config, &relay);

        app.reset_all();

        assert!(app.tiles.is_empty());
        assert!(relay.get_tiles().unwrap().is_empty());
        let cr = app
            .fields
            .iter()
            .find(|f| f.id == FieldId::CountryRestrict)
            .unwrap();
        assert_eq!(cr.select_label(), Some("Any region"));
    }

    #[test]
    fn test_round_trip_restores_raw_values_and_labels() {
        let config = test_config();
        let relay = relay_with(Vec::new());
        let mut app = App::new(&config, &relay);
        field_mut(&mut app, FieldId::ExactPhrase).restore("tabby cats");
        field_mut(&mut app, FieldId::LanguageRestrict).restore("lang_de");
        app.submit();

        // A second editor session sees the same form state
        let second = App::new(&config, &relay);
        let phrase = second
            .fields
            .iter()
            .find(|f| f.id == FieldId::ExactPhrase)
            .unwrap();
        assert_eq!(phrase.raw_value(), "tabby cats");
        let lr = second
            .fields
            .iter()
            .find(|f| f.id == FieldId::LanguageRestrict)
            .unwrap();
        assert_eq!(lr.raw_value(), "lang_de");
        assert_eq!(lr.select_label(), Some("German"));
    }

    #[test]
    fn test_focus_cycles_through_fields_and_chips() {
        let config = test_config();
        let relay = relay_with(Vec::new());
        let mut app = App::new(&config, &relay);

        assert_eq!(app.focus, Focus::Field(0));
        for _ in 0..app.fields.len() {
            app.advance_focus(1);
        }
        assert_eq!(app.focus, Focus::Chips);
        app.advance_focus(1);
        assert_eq!(app.focus, Focus::Field(0));
        app.advance_focus(-1);
        assert_eq!(app.focus, Focus::Chips);
    }

    #[test]
    fn test_select_modal_commits_choice() {
        let config = test_config();
        let relay = relay_with(Vec::new());
        let mut app = App::new(&config, &relay);

        let tbs_index = app
            .fields
            .iter()
            .position(|f| f.id == FieldId::DateRange)
            .unwrap();
        app.open_select_modal(tbs_index);
        assert!(app.select_modal.is_some());

        // Two steps down: Any time -> Past hour -> Past 24 hours
        let down = KeyEvent::new(KeyCode::Down, KeyModifiers::NONE);
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        app.handle_key(down);
        app.handle_key(down);
        app.handle_key(enter);

        assert!(app.select_modal.is_none());
        let tbs = app.fields.iter().find(|f| f.id == FieldId::DateRange).unwrap();
        assert_eq!(tbs.raw_value(), "qdr:d");
    }

    #[test]
    fn test_quit_keys() {
        let config = test_config();
        let relay = relay_with(Vec::new());
        let mut app = App::new(&config, &relay);

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.handle_key(ctrl_c));
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert!(app.handle_key(esc));
    }
}
