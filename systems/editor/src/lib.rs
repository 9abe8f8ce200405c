#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure editor system responsible for translating hit-surface input into cell commands.

use wflop_editor_core::{CellIndex, Command, CursorHint, EditState, Event};

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EditorInput {
    /// Cell the hit surface resolved under the pointer, if any.
    pub hovered: Option<CellIndex>,
    /// Indicates whether the primary button was pressed on this frame.
    pub click: bool,
}

impl EditorInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(hovered: Option<CellIndex>, click: bool) -> Self {
        Self { hovered, click }
    }
}

/// Editor system that turns clicks over the hit surface into toggle commands.
#[derive(Debug, Clone)]
pub struct Editor {
    edit_state: EditState,
    hovered: Option<CellIndex>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Creates a new editor system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            edit_state: EditState::Idle,
            hovered: None,
        }
    }

    /// Consumes session events and pointer input to emit editor commands.
    ///
    /// Clicks are forwarded even while an evaluation is outstanding; the
    /// session decides whether they are ignored.
    pub fn handle(&mut self, events: &[Event], input: EditorInput, out: &mut Vec<Command>) {
        self.observe(events);
        self.hovered = input.hovered;

        if input.click {
            if let Some(cell) = self.hovered {
                out.push(Command::CellClicked { cell });
            }
        }
    }

    /// Tracks edit state announcements without reading pointer input.
    pub fn observe(&mut self, events: &[Event]) {
        for event in events {
            if let Event::EditStateChanged { state } = event {
                self.edit_state = *state;
            }
        }
    }

    /// Edit state last announced by the session.
    #[must_use]
    pub const fn edit_state(&self) -> EditState {
        self.edit_state
    }

    /// Cell under the pointer after the most recent input.
    #[must_use]
    pub const fn hovered_cell(&self) -> Option<CellIndex> {
        self.hovered
    }

    /// Pointer affordance for the current state and hover position.
    #[must_use]
    pub const fn cursor_hint(&self) -> CursorHint {
        match (self.edit_state, self.hovered) {
            (EditState::Evaluating, _) => CursorHint::Wait,
            (EditState::Idle, Some(_)) => CursorHint::Pointer,
            (EditState::Idle, None) => CursorHint::Default,
        }
    }
}
