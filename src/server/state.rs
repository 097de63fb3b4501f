use crate::assistant::Assistant;

#[derive(Clone)]
pub struct ServerState {
    pub(crate) assistant: Assistant,
}

impl ServerState {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }
}
