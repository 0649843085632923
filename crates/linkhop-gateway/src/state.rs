use linkhop_shortener::{LinkService, StatsService};

#[derive(Debug, Clone)]
pub struct AppState {
    links: LinkService,
    stats: StatsService,
}

impl AppState {
    pub fn new(links: LinkService, stats: StatsService) -> Self {
        Self { links, stats }
    }

    pub fn links(&self) -> &LinkService {
        &self.links
    }

    pub fn stats(&self) -> &StatsService {
        &self.stats
    }
}
