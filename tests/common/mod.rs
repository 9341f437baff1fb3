//! Fake editor for integration tests
//!
//! Implements both driver seams over one shared model: the input sink
//! mutates the model the way the real editor reacts to keys and clicks, and
//! the locator "sees" whatever the model currently shows. The target process
//! is a plain `sh` that sleeps; answering the quit dialog sends it SIGTERM.

#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use shape_driver::common::config::Config;
use shape_driver::common::paths::Workspace;
use shape_driver::geometry::{Point, Region};
use shape_driver::input::{Button, Chord, InputError, InputSink, Key, Modifier};
use shape_driver::locator::{LocateError, Locator, Match};
use shape_driver::Driver;

/// Where the ready anchor is drawn
pub const READY_REGION: Region = Region {
    x: 10,
    y: 20,
    width: 200,
    height: 100,
};

/// Where the shape type selector is drawn
pub const SELECTOR_REGION: Region = Region {
    x: 600,
    y: 40,
    width: 120,
    height: 24,
};

/// Where elements are drawn
pub const CANVAS_REGION: Region = Region {
    x: 0,
    y: 0,
    width: 1000,
    height: 700,
};

/// Where the valid/invalid marker of the edited field is drawn
pub const FIELD_MARKER_REGION: Region = Region {
    x: 600,
    y: 120,
    width: 16,
    height: 16,
};

/// Color dialog entries, selectable by index
pub const PALETTE: [&str; 8] = [
    "red", "green", "blue", "yellow", "cyan", "magenta", "black", "white",
];

const COLOR_BUTTON: usize = 2;
const COLOR_FIELD: usize = 3;
const LOCK_FIELD: usize = 4;
const SHAPE_TYPES: [&str; 2] = ["poi", "poly"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Canvas,
    Selector,
    Field(usize),
    Dialog,
    Viewport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub kind: String,
    pub at: Point,
    pub color: String,
    pub locked: bool,
}

/// Everything the fake editor shows
#[derive(Debug)]
pub struct Model {
    /// Bumped on every visible change
    pub revision: u64,
    pub ready: bool,
    /// Expose `revision` as frame token
    pub tokens: bool,
    /// Dialog refuses any value
    pub reject_dialog: bool,
    /// Save shortcuts do nothing
    pub read_only: bool,
    /// Answering the quit dialog signals this process
    pub pid: Option<u32>,

    pub mode: Option<String>,
    pub shape_type: Option<String>,
    pub color: String,
    pub color_valid: bool,
    pub field_verdict: Option<bool>,
    pub shapes: Vec<Shape>,
    /// Element lists before each undoable edit
    pub undo_stack: Vec<Vec<Shape>>,
    pub redo_stack: Vec<Vec<Shape>>,
    /// Index into `shapes` of the element shown in the inspector
    pub inspected: Option<usize>,
    pub saved: BTreeSet<String>,
    pub zoom: f64,
    pub center: (f64, f64),
    pub quit_dialog: bool,
    pub dialog_open: bool,
    pub dialog_rejected: bool,
    pub viewport_open: bool,
    pub clicks: Vec<Point>,
    pub keys_pressed: usize,

    focus: Focus,
    buffer: String,
    dialog_cursor: usize,
    dialog_choice: Option<usize>,
    viewport_entries: Vec<String>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            revision: 0,
            ready: true,
            tokens: true,
            reject_dialog: false,
            read_only: false,
            pid: None,
            mode: None,
            shape_type: None,
            color: "red".to_string(),
            color_valid: true,
            field_verdict: None,
            shapes: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            inspected: None,
            saved: BTreeSet::new(),
            zoom: 100.0,
            center: (0.0, 0.0),
            quit_dialog: false,
            dialog_open: false,
            dialog_rejected: false,
            viewport_open: false,
            clicks: Vec::new(),
            keys_pressed: 0,
            focus: Focus::Canvas,
            buffer: String::new(),
            dialog_cursor: 0,
            dialog_choice: None,
            viewport_entries: Vec::new(),
        }
    }
}

impl Model {
    fn changed(&mut self) {
        self.revision += 1;
    }

    /// Push the current elements onto the undo stack before an edit
    fn checkpoint(&mut self) {
        self.undo_stack.push(self.shapes.clone());
        self.redo_stack.clear();
    }

    fn in_mode(&self, mode: &str) -> bool {
        self.mode.as_deref() == Some(mode)
    }

    /// Match score of the canvas, different for every element list
    fn canvas_score(&self) -> f32 {
        let mut hasher = DefaultHasher::new();
        format!("{:?}", self.shapes).hash(&mut hasher);
        0.5 + (hasher.finish() % 10_000) as f32 / 20_000.0
    }

    fn mode_for(c: char) -> Option<&'static str> {
        match c {
            'p' => Some("shape"),
            'a' => Some("additional"),
            'm' => Some("move"),
            'i' => Some("inspect"),
            'd' => Some("delete"),
            's' => Some("select"),
            _ => None,
        }
    }

    fn press(&mut self, chord: &Chord) {
        self.keys_pressed += 1;
        let ctrl = chord.modifiers.contains(&Modifier::Ctrl);
        let shift = chord.modifiers.contains(&Modifier::Shift);
        let alt = chord.modifiers.contains(&Modifier::Alt);

        match (ctrl, shift, alt, chord.key) {
            (true, false, false, Key::Char('z')) => {
                if let Some(previous) = self.undo_stack.pop() {
                    let current = std::mem::replace(&mut self.shapes, previous);
                    self.redo_stack.push(current);
                    self.inspected = None;
                    self.changed();
                }
            }
            (true, false, false, Key::Char('y')) => {
                if let Some(next) = self.redo_stack.pop() {
                    let current = std::mem::replace(&mut self.shapes, next);
                    self.undo_stack.push(current);
                    self.inspected = None;
                    self.changed();
                }
            }
            (true, false, false, Key::Char('a')) => {
                self.buffer.clear();
                // Editing a field hides its previous verdict
                if matches!(self.focus, Focus::Field(_)) && self.field_verdict.take().is_some() {
                    self.changed();
                }
            }
            (true, false, false, Key::Char('i')) => {
                if !self.dialog_open {
                    self.viewport_open = true;
                    self.viewport_entries.clear();
                    self.buffer.clear();
                    self.focus = Focus::Viewport;
                    self.changed();
                }
            }
            (true, false, false, Key::Char('s')) => self.save("network"),
            (true, true, false, Key::Char('p')) => self.save("shapes"),
            (true, true, false, Key::Char('a')) => self.save("additionals"),
            (true, false, false, Key::Char('q')) => {
                self.quit_dialog = true;
                self.changed();
            }
            (false, false, true, Key::Char('q')) => {
                if self.quit_dialog {
                    self.quit_dialog = false;
                    if let Some(pid) = self.pid {
                        unsafe {
                            libc::kill(pid as libc::pid_t, libc::SIGTERM);
                        }
                    }
                }
            }
            (false, false, false, key) => self.plain_key(key),
            _ => {}
        }
    }

    fn plain_key(&mut self, key: Key) {
        match (self.focus, key) {
            (Focus::Canvas | Focus::Field(_), Key::Char(c)) => {
                if let Some(mode) = Self::mode_for(c) {
                    self.mode = Some(mode.to_string());
                    self.shape_type = None;
                    self.inspected = None;
                    self.focus = Focus::Canvas;
                    self.changed();
                }
            }
            (_, Key::F(12)) => {
                if !self.dialog_open {
                    self.focus = Focus::Field(0);
                }
            }
            (Focus::Field(n), Key::Tab) => self.focus = Focus::Field(n + 1),
            (Focus::Dialog, Key::Tab) => self.dialog_cursor += 1,
            (Focus::Viewport, Key::Tab) => {
                let entry = std::mem::take(&mut self.buffer);
                self.viewport_entries.push(entry);
            }
            (Focus::Viewport, Key::Enter) => {
                let parsed: Vec<f64> = self
                    .viewport_entries
                    .iter()
                    .filter_map(|e| e.parse().ok())
                    .collect();
                if let [zoom, x, y] = parsed[..] {
                    self.zoom = zoom;
                    self.center = (x, y);
                }
                self.viewport_open = false;
                self.focus = Focus::Canvas;
                self.changed();
            }
            (Focus::Field(LOCK_FIELD), Key::Space) => {
                if let (true, Some(i)) = (self.in_mode("inspect"), self.inspected) {
                    self.checkpoint();
                    self.shapes[i].locked = !self.shapes[i].locked;
                    self.changed();
                }
            }
            (Focus::Field(COLOR_BUTTON), Key::Space) => {
                if self.in_mode("shape") || (self.in_mode("inspect") && self.inspected.is_some()) {
                    self.dialog_open = true;
                    self.dialog_rejected = false;
                    self.dialog_cursor = 0;
                    self.dialog_choice = None;
                    self.focus = Focus::Dialog;
                    self.changed();
                }
            }
            (Focus::Dialog, Key::Space) => self.dialog_choice = Some(self.dialog_cursor),
            (Focus::Dialog, Key::Enter) => {
                match self.dialog_choice.and_then(|i| PALETTE.get(i)) {
                    Some(color) if !self.reject_dialog => {
                        match self.inspected.filter(|_| self.in_mode("inspect")) {
                            Some(i) => {
                                self.checkpoint();
                                self.shapes[i].color = color.to_string();
                            }
                            None => self.color = color.to_string(),
                        }
                        self.color_valid = true;
                        self.close_dialog();
                    }
                    _ => {
                        self.dialog_rejected = true;
                        self.color_valid = false;
                    }
                }
                self.changed();
            }
            (Focus::Dialog, Key::Escape) => {
                self.close_dialog();
                self.changed();
            }
            (Focus::Selector, Key::Enter) => {
                let typed = std::mem::take(&mut self.buffer);
                if SHAPE_TYPES.contains(&typed.as_str()) {
                    self.shape_type = Some(typed);
                }
                self.focus = Focus::Canvas;
                self.changed();
            }
            (Focus::Field(COLOR_FIELD), Key::Enter) => {
                let typed = std::mem::take(&mut self.buffer);
                let valid = PALETTE.contains(&typed.as_str());
                match self.inspected.filter(|_| valid && self.in_mode("inspect")) {
                    Some(i) => {
                        self.checkpoint();
                        self.shapes[i].color = typed;
                    }
                    None if valid => self.color = typed,
                    None => {}
                }
                self.color_valid = valid;
                self.field_verdict = Some(valid);
                self.changed();
            }
            _ => {}
        }
    }

    fn close_dialog(&mut self) {
        self.dialog_open = false;
        self.dialog_rejected = false;
        self.focus = Focus::Canvas;
    }

    fn save(&mut self, what: &str) {
        if self.read_only {
            return;
        }
        self.saved.insert(what.to_string());
        self.changed();
    }

    fn click(&mut self, at: Point) {
        self.clicks.push(at);
        if SELECTOR_REGION.contains(at) {
            self.focus = Focus::Selector;
            self.buffer.clear();
            return;
        }
        self.focus = Focus::Canvas;
        let under = self.shapes.iter().position(|s| s.at == at);
        if self.in_mode("inspect") {
            if self.inspected != under {
                self.inspected = under;
                self.changed();
            }
            return;
        }
        if self.in_mode("delete") {
            if let Some(i) = under {
                self.checkpoint();
                self.shapes.remove(i);
                self.changed();
            }
            return;
        }
        let creating = self.in_mode("shape") && self.color_valid;
        if let (true, Some(kind)) = (creating, self.shape_type.clone()) {
            self.checkpoint();
            self.shapes.push(Shape {
                kind,
                at,
                color: self.color.clone(),
                locked: false,
            });
            self.changed();
        }
    }

    fn drag(&mut self, from: Point, to: Point) {
        if !self.in_mode("move") {
            return;
        }
        if let Some(i) = self.shapes.iter().position(|s| s.at == from && !s.locked) {
            self.checkpoint();
            self.shapes[i].at = to;
            self.changed();
        }
    }

    fn visible(&self, key: &str) -> Option<Region> {
        let shown = |cond: bool, region: Region| cond.then_some(region);
        let status = Region::new(0, 700, 300, 20);
        match key {
            "ready" => shown(self.ready, READY_REGION),
            "shape.selector" => shown(self.mode.is_some(), SELECTOR_REGION),
            "dialog.attribute" => shown(self.dialog_open, Region::new(300, 200, 240, 180)),
            "dialog.rejected" => shown(
                self.dialog_open && self.dialog_rejected,
                Region::new(320, 340, 200, 20),
            ),
            "field.valid" => shown(self.field_verdict == Some(true), FIELD_MARKER_REGION),
            "field.invalid" => shown(self.field_verdict == Some(false), FIELD_MARKER_REGION),
            "dialog.viewport" => shown(self.viewport_open, Region::new(350, 250, 260, 140)),
            "dialog.quit" => shown(self.quit_dialog, Region::new(400, 300, 200, 100)),
            _ => {
                if let Some(mode) = key.strip_prefix("mode.") {
                    shown(self.mode.as_deref() == Some(mode), Region::new(0, 0, 24, 24))
                } else if let Some(t) = key.strip_prefix("save.") {
                    shown(self.saved.contains(t), status)
                } else if let Some(t) = key.strip_prefix("shape.") {
                    shown(self.shape_type.as_deref() == Some(t), SELECTOR_REGION)
                } else {
                    None
                }
            }
        }
    }
}

/// Handle to the fake editor; clones share one model
#[derive(Clone, Default)]
pub struct FakeEditor {
    model: Arc<Mutex<Model>>,
}

impl FakeEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> MutexGuard<'_, Model> {
        self.model.lock().unwrap()
    }

    pub fn shape_count(&self) -> usize {
        self.model().shapes.len()
    }
}

impl Locator for FakeEditor {
    fn resolve(&self, key: &str) -> Result<Match, LocateError> {
        let model = self.model();
        if key == "canvas" && model.ready {
            return Ok(Match::new(CANVAS_REGION, model.canvas_score()));
        }
        model
            .visible(key)
            .map(|region| Match::new(region, 0.99))
            .ok_or_else(|| LocateError::NotFound(key.to_string()))
    }

    fn frame_token(&self) -> Option<u64> {
        let model = self.model();
        model.tokens.then_some(model.revision)
    }
}

impl InputSink for FakeEditor {
    fn click(&mut self, at: Point, _button: Button) -> Result<(), InputError> {
        self.model().click(at);
        Ok(())
    }

    fn press(&mut self, chord: &Chord) -> Result<(), InputError> {
        self.model().press(chord);
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> Result<(), InputError> {
        let mut model = self.model();
        if matches!(model.focus, Focus::Selector | Focus::Field(_) | Focus::Viewport) {
            model.buffer.push_str(text);
        }
        Ok(())
    }

    fn drag(&mut self, from: Point, to: Point, _button: Button) -> Result<(), InputError> {
        self.model().drag(from, to);
        Ok(())
    }
}

/// Locator that keeps reporting `key` for a number of screen grabs after the
/// editor stopped showing it, like a screen grab that lags behind
pub struct Lagging {
    inner: FakeEditor,
    key: &'static str,
    grabs: Arc<AtomicUsize>,
}

impl Lagging {
    /// The returned counter is the number of stale grabs still to come
    pub fn new(inner: FakeEditor, key: &'static str) -> (Self, Arc<AtomicUsize>) {
        let grabs = Arc::new(AtomicUsize::new(0));
        let lagging = Self {
            inner,
            key,
            grabs: grabs.clone(),
        };
        (lagging, grabs)
    }
}

impl Locator for Lagging {
    fn resolve(&self, key: &str) -> Result<Match, LocateError> {
        if key == self.key {
            let stale = self
                .grabs
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if stale {
                return Ok(Match::new(FIELD_MARKER_REGION, 0.99));
            }
        }
        self.inner.resolve(key)
    }

    fn frame_token(&self) -> Option<u64> {
        self.inner.frame_token()
    }
}

/// Config whose target is `sh -c <script>`, with short timeouts
pub fn config_for(script: &str) -> Config {
    let mut config = Config::default();
    config.launch.program = "sh".into();
    config.launch.args = vec!["-c".to_string(), script.to_string(), "sh".to_string()];
    config.polling.interval_ms = 5;
    config.timeouts.launch_ms = 2_000;
    config.timeouts.match_ms = 500;
    config.timeouts.validation_ms = 300;
    config.timeouts.history_step_ms = 300;
    config.timeouts.save_ms = 300;
    config.timeouts.quit_grace_ms = 1_000;
    config.timeouts.terminate_ms = 500;
    config
}

/// Driver over a fresh fake editor whose process sleeps for a while
pub fn driver() -> (Driver<FakeEditor, FakeEditor>, FakeEditor) {
    driver_with(config_for("sleep 30"))
}

pub fn driver_with(config: Config) -> (Driver<FakeEditor, FakeEditor>, FakeEditor) {
    let editor = FakeEditor::new();
    let driver = Driver::new(config, editor.clone(), editor.clone());
    (driver, editor)
}

pub fn workspace(dir: &Path) -> Workspace {
    Workspace::new(dir)
}

/// Whether a process with this pid still exists (and is not a zombie we own)
pub fn process_exists(pid: u32) -> bool {
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}
