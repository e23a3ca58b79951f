use std::collections::BTreeSet;

/// Selected ids plus the transient hover. Survives camera changes; ids that
/// disappear from the graph are pruned on refresh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: BTreeSet<String>,
    hovered: Option<String>,
}

impl SelectionState {
    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Replace-select, or toggle `id` when `additive`.
    pub fn select(&mut self, id: &str, additive: bool) {
        if additive {
            if !self.selected.remove(id) {
                self.selected.insert(id.to_owned());
            }
        } else {
            self.selected.clear();
            self.selected.insert(id.to_owned());
        }
    }

    /// Replace-select, or union when `additive`.
    pub fn select_many<I>(&mut self, ids: I, additive: bool)
    where
        I: IntoIterator<Item = String>,
    {
        if !additive {
            self.selected.clear();
        }
        self.selected.extend(ids);
    }

    pub fn replace<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.select_many(ids, false);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Returns whether the hovered id changed.
    pub fn set_hovered(&mut self, hovered: Option<String>) -> bool {
        if self.hovered == hovered {
            return false;
        }
        self.hovered = hovered;
        true
    }

    /// Drops ids `present` rejects. Returns how many selected ids went away.
    pub fn retain_present(&mut self, present: impl Fn(&str) -> bool) -> usize {
        let before = self.selected.len();
        self.selected.retain(|id| present(id));
        if self.hovered.as_deref().is_some_and(|id| !present(id)) {
            self.hovered = None;
        }
        before - self.selected.len()
    }
}
