use engine::Waypoint;

/// Cyclic position in an NPC route. The index always points at a valid
/// waypoint while the route is non-empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PathCursor {
    waypoints: Vec<Waypoint>,
    index: usize,
}

impl PathCursor {
    pub(crate) fn new(waypoints: Vec<Waypoint>) -> Self {
        Self {
            waypoints,
            index: 0,
        }
    }

    pub(crate) fn current(&self) -> Option<&Waypoint> {
        self.waypoints.get(self.index)
    }

    /// Moves to the next waypoint, wrapping after the last one.
    pub(crate) fn advance(&mut self) -> Option<&Waypoint> {
        if self.waypoints.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.waypoints.len();
        self.current()
    }

    pub(crate) fn replace(&mut self, waypoints: Vec<Waypoint>) {
        self.waypoints = waypoints;
        self.index = 0;
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }
}
