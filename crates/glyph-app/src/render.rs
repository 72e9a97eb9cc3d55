//! Plain-text rendering of dispatch instructions.
//!
//! The real widgets live in a UI layer outside this repository; the CLI
//! prints the renderer instruction instead, including the alert-marked
//! fallback for unknown component types.

use glyph_core::ComponentAction;
use glyph_dispatch::RenderInstruction;

/// Print one render instruction to stdout.
pub fn print_instruction(instruction: &RenderInstruction) {
    if instruction.fallback_alert {
        // Announced as an alert region in a real UI.
        println!(
            "[alert] No renderer for component type \"{}\"",
            instruction.display_type()
        );
    } else {
        println!("[{}]", instruction.display_type());
    }

    if !instruction.props.is_empty() {
        match serde_json::to_string_pretty(&instruction.props) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::warn!(error = %e, "Failed to format props"),
        }
    }

    for action in &instruction.actions {
        println!("  {}", format_action_line(action));
    }
}

/// One-line summary of an offered action.
fn format_action_line(action: &ComponentAction) -> String {
    match &action.target {
        Some(target) => format!("action: {} -> {}", action.kind, target),
        None => format!("action: {}", action.kind),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_core::ActionKind;

    #[test]
    fn test_format_action_with_target() {
        let action = ComponentAction::with_target(ActionKind::Approve, "REQ-1");
        assert_eq!(format_action_line(&action), "action: approve -> REQ-1");
    }

    #[test]
    fn test_format_action_without_target() {
        let action = ComponentAction::new(ActionKind::Navigate);
        assert_eq!(format_action_line(&action), "action: navigate");
    }
}
