use roster_intake::Outcome;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::callback::CallbackAction;

fn button(text: impl Into<String>, action: &CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.encode())
}

/// One button per table, then "Create new table".
pub fn table_menu(tables: &[String]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = tables
        .iter()
        .filter_map(|table| {
            let Some(action) = CallbackAction::select_table(table) else {
                tracing::debug!(table = %table, "table name too long for a menu button");
                return None;
            };
            Some(vec![button(table.clone(), &action)])
        })
        .collect();
    rows.push(vec![button("➕ Create new table", &CallbackAction::NewTable)]);
    InlineKeyboardMarkup::new(rows)
}

/// Add / skip buttons for the column asked at `step`.
pub fn column_decision(step: u32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[
        button("✅ Add column", &CallbackAction::Decide { step, accept: true }),
        button("❌ Skip", &CallbackAction::Decide { step, accept: false }),
    ]])
}

pub fn retry() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[button("🔁 Retry", &CallbackAction::Retry)]])
}

/// Keyboard to attach to the reply for `outcome`, if any.
pub fn for_outcome(outcome: &Outcome) -> Option<InlineKeyboardMarkup> {
    match outcome {
        Outcome::AskColumn { step, .. } => Some(column_decision(*step)),
        _ => None,
    }
}
