//! Per-frame wiring between the edit session, the editor system and the scene.

use anyhow::{Context, Result};
use wflop_editor_core::{
    grid::{CanvasConfig, Viewport},
    Command, EditState, Event, WakePolygon,
};
use wflop_editor_rendering::{FrameInput, Scene, SceneStatus};
use wflop_editor_system_editor::{Editor, EditorInput};
use wflop_editor_system_wake::WakeModel;
use wflop_editor_world::{apply, query, EditSession};

use crate::layout_transfer::{LayoutShare, LayoutTransferError};

/// Editing session together with the derived canvas and wake model.
#[derive(Debug)]
pub(crate) struct EditorApp {
    session: EditSession,
    canvas: CanvasConfig,
    wake_model: WakeModel,
    editor: Editor,
    wakes: Vec<WakePolygon>,
    commands: Vec<Command>,
}

impl EditorApp {
    pub(crate) fn new(session: EditSession, viewport: Viewport) -> Result<Self> {
        let problem = query::problem(&session);
        let canvas = CanvasConfig::for_problem(problem, viewport)
            .context("problem does not fit the viewport")?;
        let wake_model = WakeModel::from_problem(problem).context("invalid wake parameters")?;

        Ok(Self {
            session,
            canvas,
            wake_model,
            editor: Editor::new(),
            wakes: Vec::new(),
            commands: Vec::new(),
        })
    }

    /// Applies a command outside of frame processing.
    pub(crate) fn apply(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(&mut self.session, command, &mut events);
        self.editor.observe(&events);
        events
    }

    /// Processes one frame of input and the evaluation completions that arrived
    /// since the previous frame, returning the events produced.
    pub(crate) fn frame<I>(&mut self, input: FrameInput, completions: I) -> Vec<Event>
    where
        I: IntoIterator<Item = Command>,
    {
        let mut events = Vec::new();
        for completion in completions {
            apply(&mut self.session, completion, &mut events);
        }
        if let Some(index) = input.wind_shortcut {
            apply(
                &mut self.session,
                Command::SelectWindProfile { index },
                &mut events,
            );
        }

        self.editor.handle(
            &events,
            EditorInput::new(input.hovered, input.click),
            &mut self.commands,
        );
        let handled = events.len();
        for command in self.commands.drain(..) {
            apply(&mut self.session, command, &mut events);
        }
        self.editor.observe(&events[handled..]);

        events
    }

    /// Composes the scene for the current session state.
    pub(crate) fn scene(&mut self) -> Result<Scene> {
        let session = &self.session;
        let placement = query::placement(session);
        let wind = query::active_wind(session).copied();
        match &wind {
            Some(wind) => self
                .wake_model
                .project(placement, wind, &self.canvas, &mut self.wakes),
            None => self.wakes.clear(),
        }

        let status = SceneStatus {
            fitness: query::fitness(session),
            turbines: placement.len(),
            evaluating: query::edit_state(session) == EditState::Evaluating,
            last_failure: None,
            wind,
            wind_index: query::wind_index(session),
            wind_count: query::problem(session).wind_profiles.len(),
        }
        .with_failure(query::last_failure(session));

        Scene::compose(
            &self.canvas,
            query::layout(session),
            self.wakes.clone(),
            self.editor.hovered_cell(),
            status,
        )
        .map(|scene| scene.with_cursor(self.editor.cursor_hint()))
        .context("failed to compose scene")
    }

    /// Share string for the current layout.
    pub(crate) fn share_string(&self) -> Result<String, LayoutTransferError> {
        LayoutShare::capture(query::problem(&self.session), query::layout(&self.session)).encode()
    }

    pub(crate) fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }
}
