use crate::chat::ChatEngine;
use crate::report::ReportService;
use crate::review::ReviewService;

/// Everything a request handler needs, wired once at startup and torn down
/// with the process.
pub struct AppContext {
    pub chat: ChatEngine,
    pub review: ReviewService,
    pub reports: ReportService,
}
