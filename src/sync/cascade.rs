// Dependent-filter cascade (parent filter -> child filter)
use std::collections::VecDeque;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCascade {
    links: Vec<(&'static str, &'static str)>,
}

impl FilterCascade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(mut self, parent: &'static str, child: &'static str) -> Self {
        if !self.links.contains(&(parent, child)) {
            self.links.push((parent, child));
        }
        self
    }

    /// Mosque list: branch -> district
    pub fn mosques() -> Self {
        Self::new().link("branch_name", "district_name")
    }

    /// Worker list: branch -> mosque
    pub fn workers() -> Self {
        Self::new().link("branch_name", "mosque_name")
    }

    /// Full branch -> district -> mosque hierarchy
    pub fn hierarchy() -> Self {
        Self::new()
            .link("branch_name", "district_name")
            .link("district_name", "mosque_name")
    }

    pub fn children_of<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'static str> + 'a {
        self.links.iter().filter(move |(p, _)| *p == parent).map(|(_, c)| *c)
    }

    pub fn parent_of(&self, child: &str) -> Option<&'static str> {
        self.links.iter().find(|(_, c)| *c == child).map(|(p, _)| *p)
    }

    /// Every filter that must reset when `parent` changes, nearest first
    pub fn dependents_of(&self, parent: &str) -> Vec<&'static str> {
        let mut found: Vec<&'static str> = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::from([parent]);
        while let Some(current) = queue.pop_front() {
            for child in self.children_of(current) {
                if child != parent && !found.contains(&child) {
                    found.push(child);
                    queue.push_back(child);
                }
            }
        }
        found
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
