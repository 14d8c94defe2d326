use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::NodeAddress;

/// Consistent hash ring with virtual points.
///
/// Each member owns `virtual_nodes` points at `crc32("{i}{member}")`. A key
/// hashes to `crc32(key)` and is served by the members owning the next points
/// clockwise. Adding or removing a member only remaps the keys adjacent to
/// its points.
///
/// Point collisions are settled in favour of the smaller address, so the
/// ring depends only on the member set, never on insertion order.
#[derive(Debug, Clone)]
pub struct HashRing {
    virtual_nodes: usize,
    points: BTreeMap<u32, NodeAddress>,
    members: BTreeSet<NodeAddress>,
}

impl HashRing {
    pub fn new(virtual_nodes: usize) -> Self {
        Self {
            virtual_nodes: virtual_nodes.max(1),
            points: BTreeMap::new(),
            members: BTreeSet::new(),
        }
    }

    pub fn with_members(
        virtual_nodes: usize,
        members: impl IntoIterator<Item = NodeAddress>,
    ) -> Self {
        let mut ring = Self::new(virtual_nodes);
        for member in members {
            ring.add(member);
        }
        ring
    }

    /// Returns `false` if `node` was already a member
    pub fn add(
        &mut self,
        node: NodeAddress,
    ) -> bool {
        if !self.members.insert(node.clone()) {
            return false;
        }
        self.place(&node);
        true
    }

    /// Returns `false` if `node` was not a member
    pub fn remove(
        &mut self,
        node: &NodeAddress,
    ) -> bool {
        if !self.members.remove(node) {
            return false;
        }
        // Rebuild so points previously lost to a collision with `node` come back.
        self.points.clear();
        let members: Vec<NodeAddress> = self.members.iter().cloned().collect();
        for member in &members {
            self.place(member);
        }
        true
    }

    pub fn contains(
        &self,
        node: &NodeAddress,
    ) -> bool {
        self.members.contains(node)
    }

    pub fn members(&self) -> impl Iterator<Item = &NodeAddress> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns up to `n` distinct members for `key`, walking clockwise from
    /// the key's position and wrapping around.
    pub fn get_n(
        &self,
        key: &str,
        n: usize,
    ) -> Vec<NodeAddress> {
        let wanted = n.min(self.members.len());
        let mut picked: Vec<NodeAddress> = Vec::with_capacity(wanted);
        if wanted == 0 {
            return picked;
        }

        let hash = crc32fast::hash(key.as_bytes());
        for node in self.points.range(hash..).chain(self.points.range(..hash)).map(|(_, node)| node) {
            if !picked.contains(node) {
                picked.push(node.clone());
                if picked.len() == wanted {
                    break;
                }
            }
        }
        picked
    }

    fn place(
        &mut self,
        node: &NodeAddress,
    ) {
        for i in 0..self.virtual_nodes {
            let point = crc32fast::hash(format!("{i}{node}").as_bytes());
            self.points
                .entry(point)
                .and_modify(|owner| {
                    if *node < *owner {
                        *owner = node.clone();
                    }
                })
                .or_insert_with(|| node.clone());
        }
    }
}
