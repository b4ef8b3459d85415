use crate::history::HistoryRepository;
use crate::operations::Operation;
use crate::router::CommandRouter;

/// The most recent successful calculation, waiting to be saved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastResult {
    pub operation: Operation,
    pub value: f64,
}

/// Mutable state of one interactive run.
///
/// The session contains:
/// - `user`: the name recorded with every saved entry.
/// - `last_result`: what `save` will store next, if anything.
/// - `should_exit`: a flag the read loop checks to know when to terminate.
/// - `router`: arithmetic and history access.
pub struct Session {
    pub user: String,
    pub last_result: Option<LastResult>,
    pub should_exit: bool,
    pub router: CommandRouter<Box<dyn HistoryRepository>>,
}

impl Session {
    /// Start a session for `user` whose history lives in `history`.
    pub fn new(user: impl Into<String>, history: impl HistoryRepository + 'static) -> Self {
        let history: Box<dyn HistoryRepository> = Box::new(history);
        Self {
            user: user.into(),
            last_result: None,
            should_exit: false,
            router: CommandRouter::new(history),
        }
    }
}
