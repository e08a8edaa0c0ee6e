use crate::service::ParserService;

pub struct AppState {
    pub parser: ParserService,
}

impl AppState {
    pub fn new(parser: ParserService) -> Self {
        Self { parser }
    }
}
