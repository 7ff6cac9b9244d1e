use serde::{Deserialize, Serialize};

/// Sorted set of net numbers an item belongs to. Items with an empty list
/// share no net with anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NetNoList(Vec<u32>);

impl NetNoList {
    pub fn new(nets: impl IntoIterator<Item = u32>) -> Self {
        let mut nets: Vec<u32> = nets.into_iter().collect();
        nets.sort_unstable();
        nets.dedup();
        NetNoList(nets)
    }
    pub fn single(net: u32) -> Self {
        NetNoList(vec![net])
    }
    pub fn empty() -> Self {
        NetNoList(Vec::new())
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn contains(&self, net: u32) -> bool {
        self.0.binary_search(&net).is_ok()
    }
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
    pub fn shares_net(&self, other: &NetNoList) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            match self.0[i].cmp(&other.0[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => return true,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shares_net_needs_a_common_number() {
        let a = NetNoList::new([4, 1, 4, 9]);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![1, 4, 9]);
        assert!(a.shares_net(&NetNoList::new([2, 9])));
        assert!(!a.shares_net(&NetNoList::new([2, 3])));
        assert!(!a.shares_net(&NetNoList::empty()));
        assert!(!NetNoList::empty().shares_net(&NetNoList::empty()));
    }
}
