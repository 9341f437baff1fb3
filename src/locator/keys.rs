//! Reference keys the driver waits for
//!
//! A reference store must provide an image for each of these (plus one per
//! mode, shape type and save target the scenario uses).

/// Anchor shown once the target has finished starting
pub const READY: &str = "ready";

/// Shape/element type selector in the mode frame
pub const SHAPE_SELECTOR: &str = "shape.selector";

/// Attribute dialog (e.g. color chooser) is open
pub const ATTRIBUTE_DIALOG: &str = "dialog.attribute";

/// Attribute dialog refused its value
pub const DIALOG_REJECTED: &str = "dialog.rejected";

/// Edited text field shows a valid value
pub const FIELD_VALID: &str = "field.valid";

/// Edited text field is flagged invalid
pub const FIELD_INVALID: &str = "field.invalid";

/// Viewport dialog (zoom and center) is open
pub const VIEWPORT_DIALOG: &str = "dialog.viewport";

/// Drawing area; its match changes as elements are added, moved or removed
pub const CANVAS: &str = "canvas";

/// "Quit without saving?" confirmation
pub const QUIT_DIALOG: &str = "dialog.quit";

/// Toolbar state shown once `mode` is active
pub fn mode(mode: &str) -> String {
    format!("mode.{}", mode)
}

/// Selector state shown once `type_name` is selected
pub fn shape_type(type_name: &str) -> String {
    format!("shape.{}", type_name)
}

/// Status indicator shown once `target` has been saved
pub fn saved(target: &str) -> String {
    format!("save.{}", target)
}
