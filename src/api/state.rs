use crate::worker::Processor;

#[derive(Clone)]
pub struct AppState {
    pub processor: Processor,
    pub max_payload_bytes: usize,
}

impl AppState {
    pub fn new(processor: Processor, max_payload_bytes: usize) -> Self {
        Self {
            processor,
            max_payload_bytes,
        }
    }
}
