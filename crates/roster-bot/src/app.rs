use std::sync::Arc;

use roster_config::GeneralConfig;
use roster_intake::Intake;
use roster_sheets::SheetStore;

/// Shared state handed to every update handler.
pub struct App {
    pub intake: Intake,
    /// Most rows shown in one search reply.
    pub result_limit: usize,
    /// Cutoff for `/fuzzy`; `None` ranks every row.
    pub fuzzy_max_distance: Option<usize>,
}

impl App {
    #[must_use]
    pub fn new(store: Arc<dyn SheetStore>, general: &GeneralConfig) -> Self {
        Self {
            intake: Intake::new(store),
            result_limit: general.result_limit,
            fuzzy_max_distance: general.fuzzy_max_distance,
        }
    }
}
