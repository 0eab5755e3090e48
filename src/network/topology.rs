use std::collections::BTreeMap;
use crate::{Cost, NodeAddress};

/// Latest accepted view of one originator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LsdbEntry {
    pub links: BTreeMap<NodeAddress, Cost>,
    /// `None` until a sequence number has been recorded for the originator.
    pub sequence: Option<u64>,
}

/// Result of offering an advertisement to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acceptance {
    pub accepted: bool,
    /// The accepted links differ from what was stored before.
    pub changed: bool,
}

impl Acceptance {
    pub const REJECTED: Acceptance = Acceptance { accepted: false, changed: false };
}

/// The link-state database: one entry per known originator, the local node
/// included.
#[derive(Debug, Clone)]
pub struct LinkStateDatabase {
    local: NodeAddress,
    entries: BTreeMap<NodeAddress, LsdbEntry>,
}

impl LinkStateDatabase {
    pub fn new(local: NodeAddress) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(local.clone(), LsdbEntry::default());
        Self { local, entries }
    }

    pub fn local(&self) -> &NodeAddress {
        &self.local
    }

    /// Overwrites the local entry's links. Local writes skip the sequence check.
    pub fn record_local_links(&mut self, links: BTreeMap<NodeAddress, Cost>) {
        self.entries.entry(self.local.clone()).or_default().links = links;
    }

    /// Remembers the sequence number of an advertisement we originated, so
    /// that the copy flooded back to us is recognised as stale.
    pub fn set_local_sequence(&mut self, sequence: u64) {
        self.entries.entry(self.local.clone()).or_default().sequence = Some(sequence);
    }

    /// Accepts the advertisement iff `sequence` is strictly newer than the
    /// stored one. A rejected advertisement leaves the database untouched.
    pub fn accept_advertisement(
        &mut self,
        originator: &str,
        sequence: u64,
        links: BTreeMap<NodeAddress, Cost>,
    ) -> Acceptance {
        if self
            .sequence_of(originator)
            .is_some_and(|stored| sequence <= stored)
        {
            return Acceptance::REJECTED;
        }

        let entry = self.entries.entry(originator.to_string()).or_default();
        let changed = entry.links != links;
        entry.links = links;
        entry.sequence = Some(sequence);

        Acceptance { accepted: true, changed }
    }

    pub fn get(&self, originator: &str) -> Option<&LsdbEntry> {
        self.entries.get(originator)
    }

    pub fn links_of(&self, originator: &str) -> Option<&BTreeMap<NodeAddress, Cost>> {
        self.entries.get(originator).map(|entry| &entry.links)
    }

    pub fn sequence_of(&self, originator: &str) -> Option<u64> {
        self.entries.get(originator).and_then(|entry| entry.sequence)
    }

    pub fn originators(&self) -> impl Iterator<Item = &NodeAddress> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeAddress, &LsdbEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(pairs: &[(&str, f64)]) -> BTreeMap<NodeAddress, Cost> {
        pairs.iter().map(|(n, c)| (n.to_string(), *c)).collect()
    }

    #[test]
    fn first_advertisement_is_accepted_unconditionally() {
        let mut lsdb = LinkStateDatabase::new("A".into());
        let result = lsdb.accept_advertisement("B", 0, links(&[("A", 1.0)]));

        assert_eq!(result, Acceptance { accepted: true, changed: true });
        assert_eq!(lsdb.sequence_of("B"), Some(0));
    }

    #[test]
    fn stale_and_duplicate_sequences_are_rejected_without_mutation() {
        let mut lsdb = LinkStateDatabase::new("A".into());
        lsdb.accept_advertisement("B", 5, links(&[("A", 1.0)]));

        assert_eq!(lsdb.accept_advertisement("B", 5, links(&[("C", 9.0)])), Acceptance::REJECTED);
        assert_eq!(lsdb.accept_advertisement("B", 2, links(&[])), Acceptance::REJECTED);
        assert_eq!(lsdb.links_of("B"), Some(&links(&[("A", 1.0)])));
        assert_eq!(lsdb.sequence_of("B"), Some(5));
    }

    #[test]
    fn newer_sequence_with_same_links_is_accepted_but_unchanged() {
        let mut lsdb = LinkStateDatabase::new("A".into());
        lsdb.accept_advertisement("B", 1, links(&[("A", 1.0), ("D", 1.0)]));
        let result = lsdb.accept_advertisement("B", 2, links(&[("D", 1.0), ("A", 1.0)]));

        assert_eq!(result, Acceptance { accepted: true, changed: false });
        assert_eq!(lsdb.sequence_of("B"), Some(2));
    }

    #[test]
    fn advertisement_replaces_rather_than_merges() {
        let mut lsdb = LinkStateDatabase::new("A".into());
        lsdb.accept_advertisement("B", 1, links(&[("A", 1.0), ("D", 1.0)]));
        lsdb.accept_advertisement("B", 2, links(&[("A", 1.0)]));

        assert_eq!(lsdb.links_of("B"), Some(&links(&[("A", 1.0)])));
    }

    #[test]
    fn own_echo_is_stale_after_local_sequence_is_set() {
        let mut lsdb = LinkStateDatabase::new("A".into());
        lsdb.record_local_links(links(&[("B", 1.0)]));
        lsdb.set_local_sequence(3);

        let result = lsdb.accept_advertisement("A", 3, links(&[]));
        assert!(!result.accepted);
        assert_eq!(lsdb.links_of("A"), Some(&links(&[("B", 1.0)])));
    }
}
