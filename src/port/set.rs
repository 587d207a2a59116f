//! Snapshots of the serial ports visible to the OS.

use std::collections::BTreeSet;
use std::fmt;

/// The set of port identifiers observed by one enumeration.
///
/// Identifiers are opaque strings (`COM3`, `/dev/ttyACM0`, ...). Iteration is
/// sorted so that comparisons between two snapshots are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSet {
    ports: BTreeSet<String>,
}

impl PortSet {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct ports in the snapshot.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn contains(&self, port: &str) -> bool {
        self.ports.contains(port)
    }

    /// Ports present in exactly one of the two snapshots, sorted.
    pub fn symmetric_difference<'a>(&'a self, other: &'a PortSet) -> impl Iterator<Item = &'a str> {
        self.ports
            .symmetric_difference(&other.ports)
            .map(String::as_str)
    }

    /// Return the first port that appears in only one of the two snapshots.
    ///
    /// A port that vanished and a port that appeared are both candidates; when
    /// several exist the lexicographically smallest is returned. `None` means
    /// the snapshots are identical.
    pub fn differ(&self, other: &PortSet) -> Option<String> {
        // BTreeSet's symmetric difference yields in ascending order.
        self.symmetric_difference(other).next().map(str::to_owned)
    }
}

impl<S: Into<String>> FromIterator<S> for PortSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ports: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Consumes the snapshot in sorted order.
impl IntoIterator for PortSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.ports.into_iter()
    }
}

impl fmt::Display for PortSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, port) in self.ports.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{port}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(ports: &[&str]) -> PortSet {
        ports.iter().copied().collect()
    }

    #[test]
    fn test_identical_snapshots_do_not_differ() {
        let a = set(&["COM3", "COM4"]);
        assert_eq!(a.differ(&a.clone()), None);
        assert_eq!(PortSet::new().differ(&PortSet::new()), None);
    }

    #[test]
    fn test_vanished_port_is_found_both_ways() {
        let before = set(&["COM3", "COM4"]);
        let after = set(&["COM4"]);
        assert_eq!(before.differ(&after).as_deref(), Some("COM3"));
        assert_eq!(after.differ(&before).as_deref(), Some("COM3"));
    }

    #[test]
    fn test_new_port_is_found() {
        let before = set(&["/dev/ttyS0"]);
        let after = set(&["/dev/ttyS0", "/dev/ttyACM1"]);
        assert_eq!(after.differ(&before).as_deref(), Some("/dev/ttyACM1"));
    }

    #[test]
    fn test_multiple_candidates_pick_smallest() {
        let before = set(&["COM3", "COM4", "COM9"]);
        let after = set(&["COM4"]);
        assert_eq!(before.differ(&after).as_deref(), Some("COM3"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let ports = set(&["COM3", "COM3", "COM4"]);
        assert_eq!(ports.len(), 2);
        assert_eq!(ports.to_string(), "[COM3, COM4]");
    }

    #[test]
    fn test_consumes_in_sorted_order() {
        let ports: Vec<String> = set(&["ttyUSB0", "COM9", "COM10"]).into_iter().collect();
        assert_eq!(ports, vec!["COM10", "COM9", "ttyUSB0"]);
    }

    proptest! {
        #[test]
        fn prop_differ_with_self_is_none(ports in prop::collection::btree_set("[A-Z]{3}[0-9]{1,2}", 0..8)) {
            let a: PortSet = ports.into_iter().collect();
            prop_assert_eq!(a.differ(&a), None);
        }

        #[test]
        fn prop_single_removal_is_symmetric(
            ports in prop::collection::btree_set("[a-z]{4}[0-9]", 1..8),
            pick in any::<prop::sample::Index>(),
        ) {
            let all: Vec<String> = ports.iter().cloned().collect();
            let removed = pick.get(&all).clone();
            let a: PortSet = all.iter().cloned().collect();
            let b: PortSet = all.iter().filter(|p| **p != removed).cloned().collect();

            prop_assert_eq!(a.differ(&b), Some(removed.clone()));
            prop_assert_eq!(b.differ(&a), Some(removed));
        }

        #[test]
        fn prop_multiple_removals_yield_one_of_them(
            ports in prop::collection::btree_set("tty[0-9]{1,3}", 2..10),
            keep in 0usize..8,
        ) {
            let all: Vec<String> = ports.into_iter().collect();
            let keep = keep.min(all.len() - 2);
            let a: PortSet = all.iter().cloned().collect();
            let b: PortSet = all[..keep].iter().cloned().collect();

            let found = a.differ(&b);
            prop_assert!(found.is_some());
            let found = found.unwrap_or_default();
            prop_assert!(all[keep..].contains(&found));
        }
    }
}
