use crate::kernel::services::ports::SuggestionError;
use crate::kernel::suggestion::SuggestionTicket;

#[derive(Debug)]
pub enum SessionMessage {
    SuggestionReady {
        ticket: SuggestionTicket,
        outcome: Result<Option<String>, SuggestionError>,
    },
}
