use shared::{item::ItemId, shape::IntBox, vec2::IntPoint};

const MAX_OBJECTS: usize = 4;
const MAX_DEPTH: usize = 10;

/// One shape of one item, indexed by its bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialEntry {
    pub id: ItemId,
    pub shape_index: usize,
    pub bbox: IntBox,
}

#[derive(Debug, Clone)]
pub struct QuadTreeChildren {
    top_left: Box<QuadTreeNode>,
    top_right: Box<QuadTreeNode>,
    bottom_left: Box<QuadTreeNode>,
    bottom_right: Box<QuadTreeNode>,
}

impl QuadTreeChildren {
    pub fn new(parent: &IntBox, parent_depth: usize) -> Self {
        let mid = parent.center();
        let node = |ll: IntPoint, ur: IntPoint| Box::new(QuadTreeNode::new(IntBox { ll, ur }, parent_depth + 1));
        Self {
            top_left: node(IntPoint::new(parent.ll.x, mid.y), IntPoint::new(mid.x, parent.ur.y)),
            top_right: node(mid, parent.ur),
            bottom_left: node(parent.ll, mid),
            bottom_right: node(IntPoint::new(mid.x, parent.ll.y), IntPoint::new(parent.ur.x, mid.y)),
        }
    }
    pub fn iter(&self) -> impl Iterator<Item = &QuadTreeNode> {
        [
            &*self.top_left,
            &*self.top_right,
            &*self.bottom_left,
            &*self.bottom_right,
        ]
        .into_iter()
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut QuadTreeNode> {
        [
            &mut *self.top_left,
            &mut *self.top_right,
            &mut *self.bottom_left,
            &mut *self.bottom_right,
        ]
        .into_iter()
    }
    /// Hands the entry to the first child that fully contains it.
    pub fn insert(&mut self, entry: SpatialEntry) -> Result<(), SpatialEntry> {
        for child in self.iter_mut() {
            if child.bounds.contains_box(&entry.bbox) {
                child.insert(entry);
                return Ok(());
            }
        }
        Err(entry)
    }
}

/// Region quad tree over the shapes of one layer. Entries that do not fit
/// into a child stay in the smallest node containing them; the root keeps
/// everything that lies outside the board bounds.
#[derive(Debug, Clone)]
pub struct QuadTreeNode {
    pub depth: usize,
    pub bounds: IntBox,
    pub objects: Vec<SpatialEntry>,
    pub children: Option<QuadTreeChildren>,
}

impl QuadTreeNode {
    pub fn new(bounds: IntBox, depth: usize) -> Self {
        Self {
            depth,
            bounds,
            objects: Vec::new(),
            children: None,
        }
    }

    pub fn insert(&mut self, entry: SpatialEntry) {
        let max_depth_reached = self.depth >= MAX_DEPTH || self.bounds.width() < 2 || self.bounds.height() < 2;
        let max_objects_reached = self.objects.len() >= MAX_OBJECTS;
        if let Some(children) = &mut self.children {
            if let Err(entry) = children.insert(entry) {
                self.objects.push(entry);
            }
            return;
        }
        if max_depth_reached || !max_objects_reached {
            self.objects.push(entry);
            return;
        }
        let mut children = QuadTreeChildren::new(&self.bounds, self.depth);
        // try push all the existing objects into the children
        let existing = std::mem::take(&mut self.objects);
        for object in existing.into_iter().chain(std::iter::once(entry)) {
            if let Err(object) = children.insert(object) {
                self.objects.push(object);
            }
        }
        self.children = Some(children);
    }

    /// Removes every entry of the item, returns the number removed.
    pub fn remove(&mut self, id: ItemId) -> usize {
        let before = self.objects.len();
        self.objects.retain(|entry| entry.id != id);
        let mut removed = before - self.objects.len();
        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                removed += child.remove(id);
            }
        }
        removed
    }

    /// Collects all entries whose bounding box meets `area`.
    pub fn query(&self, area: &IntBox, found: &mut Vec<SpatialEntry>) {
        found.extend(self.objects.iter().filter(|entry| entry.bbox.intersects(area)));
        if let Some(children) = &self.children {
            for child in children.iter() {
                if child.bounds.intersects(area) {
                    child.query(area, found);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len() + self.children.as_ref().map_or(0, |children| children.iter().map(QuadTreeNode::len).sum())
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, x: i64, y: i64, size: i64) -> SpatialEntry {
        SpatialEntry {
            id: ItemId(id),
            shape_index: 0,
            bbox: IntBox::new(IntPoint::new(x, y), IntPoint::new(x + size, y + size)),
        }
    }

    #[test]
    fn query_finds_entries_after_split() {
        let mut tree = QuadTreeNode::new(IntBox::new(IntPoint::new(0, 0), IntPoint::new(1000, 1000)), 0);
        for i in 0..20 {
            tree.insert(entry(i, (i as i64 % 5) * 180, (i as i64 / 5) * 180, 50));
        }
        tree.insert(entry(99, -500, -500, 10));
        assert!(tree.children.is_some());
        assert_eq!(tree.len(), 21);
        let mut found = Vec::new();
        tree.query(&IntBox::new(IntPoint::new(170, 170), IntPoint::new(240, 240)), &mut found);
        assert_eq!(found.iter().map(|e| e.id).collect::<Vec<_>>(), vec![ItemId(6)]);
        found.clear();
        tree.query(&IntBox::new(IntPoint::new(-600, -600), IntPoint::new(-400, -400)), &mut found);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn remove_drops_all_entries_of_an_item() {
        let mut tree = QuadTreeNode::new(IntBox::new(IntPoint::new(0, 0), IntPoint::new(1000, 1000)), 0);
        for i in 0..10 {
            tree.insert(entry(i % 2, i as i64 * 90, 0, 20));
        }
        assert_eq!(tree.remove(ItemId(1)), 5);
        assert_eq!(tree.len(), 5);
    }
}
