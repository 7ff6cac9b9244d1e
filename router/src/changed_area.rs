use shared::shape::IntOctagon;

/// Per-layer octagon covering everything modified since the last clear.
/// Pull-tight uses it to limit its work to traces that may have become
/// loose.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedArea {
    octagons: Vec<IntOctagon>,
}

impl ChangedArea {
    pub fn new(layer_count: usize) -> Self {
        ChangedArea {
            octagons: vec![IntOctagon::EMPTY; layer_count],
        }
    }
    pub fn join(&mut self, layer: usize, octagon: &IntOctagon) {
        if layer >= self.octagons.len() {
            self.octagons.resize(layer + 1, IntOctagon::EMPTY);
        }
        self.octagons[layer] = self.octagons[layer].union(octagon);
    }
    pub fn octagon(&self, layer: usize) -> IntOctagon {
        self.octagons.get(layer).copied().unwrap_or(IntOctagon::EMPTY)
    }
    pub fn is_empty(&self) -> bool {
        self.octagons.iter().all(IntOctagon::is_empty)
    }
    pub fn intersects(&self, layer: usize, octagon: &IntOctagon) -> bool {
        self.octagon(layer).intersects(octagon)
    }
    pub fn clear(&mut self) {
        for octagon in &mut self.octagons {
            *octagon = IntOctagon::EMPTY;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::vec2::IntPoint;

    #[test]
    fn join_grows_only_the_given_layer() {
        let mut area = ChangedArea::new(2);
        assert!(area.is_empty());
        area.join(1, &IntOctagon::from_point(IntPoint::new(10, 10)));
        area.join(1, &IntOctagon::from_point(IntPoint::new(-10, 0)));
        assert!(area.octagon(0).is_empty());
        assert!(area.octagon(1).contains(IntPoint::new(0, 5)));
        assert!(area.intersects(1, &IntOctagon::from_point(IntPoint::new(0, 5))));
        area.clear();
        assert!(area.is_empty());
    }
}
