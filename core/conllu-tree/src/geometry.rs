//! Projectivity queries over a built [`Tree`].

use std::collections::BTreeSet;

use crate::tree::Tree;

impl Tree<'_> {
    /// Heads from the parent of `id` upwards, ending with 0. Stops early on a repeat.
    pub fn ancestors(&self, id: u32) -> Vec<u32> {
        let mut ancestors = Vec::new();
        let mut pid = self.head(id);
        loop {
            if pid == 0 {
                ancestors.push(0);
                break;
            }
            if ancestors.contains(&pid) {
                break;
            }
            ancestors.push(pid);
            pid = self.head(pid);
        }
        ancestors
    }

    /// Words strictly between `id` and its head that the head does not dominate.
    pub fn gap(&self, id: u32) -> BTreeSet<u32> {
        let pid = self.head(id);
        let between = if id < pid { id + 1..pid } else { pid + 1..id };
        if between.is_empty() {
            return BTreeSet::new();
        }
        let projection = self.projection(pid);
        between.filter(|w| !projection.contains(w)).collect()
    }

    /// Words whose attachment crosses `id` without being explained by an ancestor of `id`.
    pub fn caused_nonprojectivities(&self, id: u32) -> Vec<u32> {
        let ancestors: BTreeSet<u32> = self.ancestors(id).into_iter().collect();
        let max = self.len() as u32;
        let pid = self.head(id);

        // 1. Look no further than the parent on its own side.
        let (left, right) = if pid < id {
            (pid + 1..id, id + 1..max + 1)
        } else {
            (1..id, id + 1..pid)
        };

        // 2. Skip words hanging from an ancestor, then keep those whose head
        //    lies on the far side of `id`.
        let detached = |w: &u32| !ancestors.contains(&self.head(*w));
        let mut leftcross: Vec<u32> = left
            .filter(detached)
            .filter(|w| self.head(*w) > id)
            .collect();
        let mut rightcross: Vec<u32> = right
            .filter(detached)
            .filter(|w| self.head(*w) < id)
            .collect();

        // 3. Crossings that also span the parent belong to the parent.
        if pid < id {
            rightcross.retain(|w| self.head(*w) > pid);
        } else {
            leftcross.retain(|w| self.head(*w) < pid);
        }

        leftcross.extend(rightcross);
        leftcross.sort_unstable();
        leftcross
    }
}
