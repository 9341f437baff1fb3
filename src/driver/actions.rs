//! Editing actions: modes, attribute frames and dialogs, canvas input

use serde::{Deserialize, Serialize};

use super::{Anchor, Driver, Session};
use crate::common::config::ModeKind;
use crate::common::{Error, Result};
use crate::geometry::Region;
use crate::input::{Button, InputSink};
use crate::locator::{keys, Locator, Match, Outcome};

/// An attribute dialog the driver opened and has not yet confirmed
#[derive(Debug, Clone, PartialEq)]
pub struct DialogHandle {
    pub field_index: usize,
    pub region: Region,
    /// Last value entered, for error reports
    value: Option<String>,
}

/// A value to put into an open dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogValue {
    /// Move to the nth entry of a palette or list and activate it
    Selector(usize),
    /// Replace the dialog's text entry
    Text(String),
}

impl DialogValue {
    fn describe(&self) -> String {
        match self {
            Self::Selector(n) => format!("#{}", n),
            Self::Text(t) => t.clone(),
        }
    }
}

/// How the target reacted to a typed attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldEdit {
    Accepted,
    Rejected,
}

impl<L: Locator, I: InputSink> Driver<L, I> {
    /// Switch the editor into a named mode
    #[tracing::instrument(skip(self, session))]
    pub async fn enter_mode(&mut self, session: &mut Session, mode: &str) -> Result<()> {
        session.check_alive()?;

        let binding = self
            .config
            .mode(mode)
            .cloned()
            .ok_or_else(|| Error::Config(format!("Unknown mode '{}'", mode)))?;
        self.input.press(&binding.key)?;

        let key = keys::mode(mode);
        match self
            .wait_for(session, &key, self.config.timeouts.matching())
            .await?
        {
            Outcome::Ready(_) => {
                session.set_mode(mode, binding.kind);
                tracing::info!(kind = ?binding.kind, "Entered mode {}", mode);
                Ok(())
            }
            Outcome::Elapsed(waited) => Err(Error::mode_switch(mode, waited)),
        }
    }

    /// Pick the element type created by canvas clicks in the current mode
    #[tracing::instrument(skip(self, session))]
    pub async fn select_shape_type(&mut self, session: &mut Session, type_name: &str) -> Result<()> {
        session.check_alive()?;

        let selector = self.require(session, keys::SHAPE_SELECTOR).await?;
        self.input
            .click(selector.region.center(), Button::Left)?;
        self.input.press(&self.config.keys.select_all)?;
        self.input.type_text(type_name)?;
        self.input.press(&self.config.keys.commit)?;

        let key = keys::shape_type(type_name);
        match self
            .wait_for(session, &key, self.config.timeouts.matching())
            .await?
        {
            Outcome::Ready(_) => {
                session.shape_type = Some(type_name.to_string());
                tracing::info!("Selected shape type {}", type_name);
                Ok(())
            }
            Outcome::Elapsed(waited) => Err(Error::mode_switch(&key, waited)),
        }
    }

    /// Focus the mode frame and move to its `field_index`th field
    fn focus_field(&mut self, field_index: usize) -> Result<()> {
        self.input.press(&self.config.keys.focus_frame)?;
        self.input
            .press_repeated(&self.config.keys.next_field, field_index)?;
        Ok(())
    }

    /// Open the dialog behind the button at `field_index`
    #[tracing::instrument(skip(self, session))]
    pub async fn open_attribute_dialog(
        &mut self,
        session: &mut Session,
        field_index: usize,
    ) -> Result<DialogHandle> {
        session.check_alive()?;

        self.focus_field(field_index)?;
        self.input.press(&self.config.keys.toggle)?;

        let found = self.require(session, keys::ATTRIBUTE_DIALOG).await?;
        tracing::debug!(region = ?found.region, "Dialog open");
        Ok(DialogHandle {
            field_index,
            region: found.region,
            value: None,
        })
    }

    /// Enter a value into an open dialog without confirming it
    #[tracing::instrument(skip(self, session))]
    pub async fn set_dialog_value(
        &mut self,
        session: &mut Session,
        dialog: &mut DialogHandle,
        value: DialogValue,
    ) -> Result<()> {
        session.check_alive()?;
        self.require(session, keys::ATTRIBUTE_DIALOG).await?;

        match &value {
            DialogValue::Selector(n) => {
                self.input
                    .press_repeated(&self.config.keys.next_field, *n)?;
                self.input.press(&self.config.keys.toggle)?;
            }
            DialogValue::Text(text) => {
                self.input.press(&self.config.keys.select_all)?;
                self.input.type_text(text)?;
            }
        }
        dialog.value = Some(value.describe());
        Ok(())
    }

    /// Accept the dialog and wait for it to close
    ///
    /// In an inspect mode an accepted value is an edit of the inspected
    /// element. If the target flags the value as invalid the dialog is
    /// dismissed, no edit is recorded, and `ValidationRejected` is returned.
    #[tracing::instrument(skip(self, session))]
    pub async fn confirm(&mut self, session: &mut Session, dialog: DialogHandle) -> Result<()> {
        session.check_alive()?;
        self.input.press(&self.config.keys.dialog_accept)?;

        let locator = &self.locator;
        let closed = self
            .poll(self.config.timeouts.matching())
            .until(|| -> Result<Option<bool>> {
                session.check_alive()?;
                if locator.probe(keys::DIALOG_REJECTED)?.is_some() {
                    return Ok(Some(false));
                }
                if locator.probe(keys::ATTRIBUTE_DIALOG)?.is_none() {
                    return Ok(Some(true));
                }
                Ok(None)
            })
            .await?;

        match closed {
            Outcome::Ready(true) => {
                session.attributes_valid = true;
                if session.mode_kind() == ModeKind::Inspect {
                    session.history.record();
                }
                tracing::info!(field = dialog.field_index, "Dialog accepted");
                Ok(())
            }
            Outcome::Ready(false) => {
                session.attributes_valid = false;
                let value = dialog.value.unwrap_or_default();
                tracing::info!(field = dialog.field_index, %value, "Dialog value rejected");
                if let Err(e) = self.input.press(&self.config.keys.dialog_cancel) {
                    tracing::warn!("Could not dismiss rejected dialog: {}", e);
                }
                Err(Error::ValidationRejected {
                    field: dialog.field_index,
                    value,
                })
            }
            Outcome::Elapsed(waited) => Err(Error::not_ready(keys::ATTRIBUTE_DIALOG, waited)),
        }
    }

    /// Open the dialog at `field_index`, pick entry `selector`, confirm
    pub async fn change_attribute_using_dialog(
        &mut self,
        session: &mut Session,
        field_index: usize,
        selector: usize,
    ) -> Result<()> {
        let mut dialog = self.open_attribute_dialog(session, field_index).await?;
        self.set_dialog_value(session, &mut dialog, DialogValue::Selector(selector))
            .await?;
        self.confirm(session, dialog).await
    }

    /// Click at an offset from `anchor`, re-resolving it first
    ///
    /// In a create mode with a shape type selected and valid attributes the
    /// click is expected to add an element and is recorded as an edit. A
    /// click after a rejected attribute is still sent but records nothing.
    /// In a delete mode the click is an edit if the screen changes.
    #[tracing::instrument(skip(self, session))]
    pub async fn click_at(
        &mut self,
        session: &mut Session,
        anchor: &Anchor,
        dx: i32,
        dy: i32,
    ) -> Result<()> {
        session.check_alive()?;

        let found = self.resolve_anchor(session, anchor).await?;
        let at = found.region.offset(dx, dy);
        let kind = session.mode_kind();
        let before = match kind {
            ModeKind::Delete => Some(self.capture()?),
            _ => None,
        };
        self.input.click(at, Button::Left)?;

        if session.click_creates() {
            session.history.record();
            tracing::info!(?at, undo_depth = session.history.undo_depth(), "Element created");
        } else if kind == ModeKind::Create && !session.attributes_valid {
            tracing::info!(?at, "Click with rejected attributes, nothing created");
        } else if let Some(before) = before {
            let timeout = self.config.timeouts.validation();
            if self.changed_since(session, &before, timeout).await? {
                session.history.record();
                tracing::info!(?at, undo_depth = session.history.undo_depth(), "Element deleted");
            } else {
                tracing::info!(?at, "Nothing under the cursor, nothing deleted");
            }
        } else {
            tracing::debug!(?at, "Clicked");
        }
        Ok(())
    }

    /// Drag between two offsets from `anchor`
    ///
    /// In a move mode the drag is recorded as an edit when the screen changes
    /// afterwards. A driver that can observe nothing records it anyway.
    #[tracing::instrument(skip(self, session))]
    pub async fn drag(
        &mut self,
        session: &mut Session,
        anchor: &Anchor,
        from: (i32, i32),
        to: (i32, i32),
    ) -> Result<()> {
        session.check_alive()?;

        let found = self.resolve_anchor(session, anchor).await?;
        let start = found.region.offset(from.0, from.1);
        let end = found.region.offset(to.0, to.1);
        let before = self.capture()?;
        self.input.drag(start, end, Button::Left)?;

        if session.mode_kind() != ModeKind::Move {
            return Ok(());
        }
        let timeout = self.config.timeouts.validation();
        if self.changed_since(session, &before, timeout).await? {
            session.history.record();
            tracing::info!(?start, ?end, "Element moved");
        } else {
            tracing::info!(?start, ?end, "Drag left the frame unchanged, nothing moved");
        }
        Ok(())
    }

    /// Type `text` into the field at `field_index` and report the verdict
    ///
    /// `Rejected` is a normal outcome here, not an error: it is how tests
    /// probe invalid input. A verdict left over from an earlier edit is
    /// ignored until it has gone away.
    #[tracing::instrument(skip(self, session))]
    pub async fn set_field_value_directly(
        &mut self,
        session: &mut Session,
        field_index: usize,
        text: &str,
    ) -> Result<FieldEdit> {
        session.check_alive()?;

        let indicators = [
            (keys::FIELD_INVALID, FieldEdit::Rejected),
            (keys::FIELD_VALID, FieldEdit::Accepted),
        ];
        let baseline = self.baseline(&indicators)?;

        self.focus_field(field_index)?;
        self.input.press(&self.config.keys.select_all)?;
        self.input.type_text(text)?;
        self.input.press(&self.config.keys.commit)?;

        let verdict = self
            .wait_fresh(
                session,
                baseline,
                &indicators,
                self.config.timeouts.validation(),
            )
            .await?;

        let edit = match verdict {
            Outcome::Ready(edit) => edit,
            Outcome::Elapsed(waited) => return Err(Error::not_ready(keys::FIELD_VALID, waited)),
        };

        session.attributes_valid = edit == FieldEdit::Accepted;
        if edit == FieldEdit::Accepted && session.mode_kind() == ModeKind::Inspect {
            session.history.record();
        }
        tracing::info!(field = field_index, ?edit, "Field edited");
        Ok(edit)
    }

    /// Flip the checkbox at `field_index`
    ///
    /// In an inspect mode the flip applies to the inspected element and is
    /// recorded as an edit once the screen shows it. With nothing inspected
    /// the screen stays as it was and nothing is recorded.
    #[tracing::instrument(skip(self, session))]
    pub async fn modify_bool_attribute(
        &mut self,
        session: &mut Session,
        field_index: usize,
    ) -> Result<()> {
        session.check_alive()?;

        let before = match session.mode_kind() {
            ModeKind::Inspect => Some(self.capture()?),
            _ => None,
        };
        self.focus_field(field_index)?;
        self.input.press(&self.config.keys.toggle)?;

        let Some(before) = before else {
            tracing::info!(field = field_index, "Toggled attribute");
            return Ok(());
        };
        let timeout = self.config.timeouts.validation();
        if self.changed_since(session, &before, timeout).await? {
            session.history.record();
            tracing::info!(field = field_index, "Toggled attribute of inspected element");
        } else {
            tracing::info!(field = field_index, "Toggle left the frame unchanged, nothing recorded");
        }
        Ok(())
    }

    /// Set the view's zoom level and center through the viewport dialog
    ///
    /// The dialog's fields are filled in the order zoom, x, y. Viewport
    /// changes are not edits and leave the undo history alone.
    #[tracing::instrument(skip(self, session))]
    pub async fn set_zoom(&mut self, session: &mut Session, zoom: f64, x: f64, y: f64) -> Result<()> {
        session.check_alive()?;
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(Error::Config(format!(
                "Zoom must be a positive number, got {}",
                zoom
            )));
        }

        self.input.press(&self.config.keys.edit_viewport)?;
        self.require(session, keys::VIEWPORT_DIALOG).await?;

        for value in [zoom, x, y] {
            self.input.press(&self.config.keys.select_all)?;
            self.input.type_text(&value.to_string())?;
            self.input.press(&self.config.keys.next_field)?;
        }
        self.input.press(&self.config.keys.dialog_accept)?;

        match self
            .wait_gone(session, keys::VIEWPORT_DIALOG, self.config.timeouts.matching())
            .await?
        {
            Outcome::Ready(()) => {
                tracing::info!(zoom, x, y, "Viewport set");
                Ok(())
            }
            Outcome::Elapsed(waited) => Err(Error::not_ready(keys::VIEWPORT_DIALOG, waited)),
        }
    }

    /// Find `anchor` on screen again, updating the session's cached region
    async fn resolve_anchor(&self, session: &mut Session, anchor: &Anchor) -> Result<Match> {
        let found = self.require(session, &anchor.key).await?;
        if found.region != anchor.region {
            tracing::debug!(from = ?anchor.region, to = ?found.region, "Anchor moved");
        }
        if session.anchor.key == anchor.key {
            session.anchor.region = found.region;
        }
        Ok(found)
    }
}
