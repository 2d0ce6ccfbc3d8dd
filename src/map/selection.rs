use crate::models::RouteEndpoint;

/// Highlighted article plus the chosen route endpoints.
///
/// The highlight belongs to one search epoch and is cleared on publish;
/// endpoints survive new searches until replaced.
///
/// The open info window is not tracked here; `OverlayRegistry` owns it.
#[derive(Debug, Default, Clone)]
pub struct SelectionState {
    highlighted: Option<usize>,
    start: Option<RouteEndpoint>,
    end: Option<RouteEndpoint>,
}

impl SelectionState {
    pub fn select(&mut self, article_index: usize) {
        self.highlighted = Some(article_index);
    }

    pub fn deselect(&mut self) {
        self.highlighted = None;
    }

    pub fn set_start(&mut self, endpoint: RouteEndpoint) {
        self.start = Some(endpoint);
    }

    pub fn set_end(&mut self, endpoint: RouteEndpoint) {
        self.end = Some(endpoint);
    }

    #[must_use]
    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    #[must_use]
    pub fn start(&self) -> Option<&RouteEndpoint> {
        self.start.as_ref()
    }

    #[must_use]
    pub fn end(&self) -> Option<&RouteEndpoint> {
        self.end.as_ref()
    }
}
