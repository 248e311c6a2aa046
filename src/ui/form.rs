use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::fields::{self, FieldId, FieldKind, SelectSpec};

/// Editing state of one form control.
pub enum FieldState {
    Text(Input),
    Count(Input),
    Select {
        spec: &'static SelectSpec,
        index: usize,
    },
}

/// One form control plus its catalog identity.
pub struct FormField {
    pub id: FieldId,
    pub state: FieldState,
}

impl FormField {
    pub fn new(id: FieldId) -> Self {
        let state = match id.kind() {
            FieldKind::Text => FieldState::Text(Input::default()),
            FieldKind::Count => FieldState::Count(Input::default()),
            FieldKind::Select(spec) => FieldState::Select { spec, index: 0 },
        };
        Self { id, state }
    }

    pub fn is_select(&self) -> bool {
        matches!(self.state, FieldState::Select { .. })
    }

    /// The value that would enter a query fragment right now. Selectors on
    /// their default option yield the empty string.
    pub fn raw_value(&self) -> &str {
        match &self.state {
            FieldState::Text(input) | FieldState::Count(input) => input.value(),
            FieldState::Select { spec, index } => spec.options[*index].value,
        }
    }

    /// Label of the chosen option, selector fields only.
    pub fn select_label(&self) -> Option<&'static str> {
        match &self.state {
            FieldState::Select { spec, index } => Some(spec.options[*index].label),
            _ => None,
        }
    }

    pub fn select_index(&self) -> Option<usize> {
        match &self.state {
            FieldState::Select { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn set_select_index(&mut self, new_index: usize) {
        if let FieldState::Select { spec, index } = &mut self.state {
            if new_index < spec.options.len() {
                *index = new_index;
            }
        }
    }

    /// Text shown in the control.
    pub fn display_value(&self) -> &str {
        match &self.state {
            FieldState::Text(input) | FieldState::Count(input) => input.value(),
            FieldState::Select { spec, index } => spec.options[*index].label,
        }
    }

    /// Cursor column for focused text controls.
    pub fn visual_cursor(&self) -> Option<usize> {
        match &self.state {
            FieldState::Text(input) | FieldState::Count(input) => Some(input.visual_cursor()),
            FieldState::Select { .. } => None,
        }
    }

    /// Re-apply a persisted raw value to this control. Selector values that
    /// match no option are ignored and the control keeps its default.
    pub fn restore(&mut self, raw: &str) {
        match &mut self.state {
            FieldState::Text(input) => *input = Input::new(raw.to_string()),
            FieldState::Count(input) => *input = Input::new(fields::sanitize_count(raw)),
            FieldState::Select { spec, index } => {
                if let Some(position) = spec.position_of(raw) {
                    *index = position;
                }
            }
        }
    }

    /// Blank the control; selectors return to their default option.
    pub fn reset(&mut self) {
        match &mut self.state {
            FieldState::Text(input) | FieldState::Count(input) => input.reset(),
            FieldState::Select { index, .. } => *index = 0,
        }
    }

    /// Route a keystroke into a text control. Count controls are sanitized
    /// after every keystroke. Returns true when the event was consumed.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        match &mut self.state {
            FieldState::Text(input) => input.handle_event(&Event::Key(key)).is_some(),
            FieldState::Count(input) => {
                let handled = input.handle_event(&Event::Key(key)).is_some();
                if handled {
                    let sanitized = fields::sanitize_count(input.value());
                    if sanitized != input.value() {
                        *input = Input::new(sanitized);
                    }
                }
                handled
            }
            FieldState::Select { .. } => false,
        }
    }
}
