use crate::algorithm::AlgorithmEntry;

/// The single shared policy for "does this card have enough memory".
/// Keeps only entries whose footprint fits in `memory_bytes`, preserving
/// declaration order. Every backend filters through this function; none
/// reimplements the comparison.
pub fn filter_insufficient_memory(
    memory_bytes: u64,
    entries: Vec<AlgorithmEntry>,
) -> Vec<AlgorithmEntry> {
    entries
        .into_iter()
        .filter(|entry| entry.min_memory_bytes <= memory_bytes)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{AlgorithmEntry, AlgorithmKind, AlgorithmTag};

    const GIB: u64 = 1 << 30;

    fn catalog() -> Vec<AlgorithmEntry> {
        vec![
            AlgorithmEntry::single(AlgorithmTag::ZHash),
            AlgorithmEntry::single(AlgorithmTag::GrinCuckatoo31),
            AlgorithmEntry::single(AlgorithmTag::Lyra2Rev3),
            AlgorithmEntry::single(AlgorithmTag::DaggerHashimoto),
        ]
    }

    fn kinds(entries: &[AlgorithmEntry]) -> Vec<AlgorithmKind> {
        entries.iter().map(|entry| entry.kind).collect()
    }

    #[test]
    fn keeps_fitting_entries_in_declaration_order() {
        let filtered = filter_insufficient_memory(4 * GIB, catalog());
        assert_eq!(
            kinds(&filtered),
            vec![
                AlgorithmKind::Single(AlgorithmTag::ZHash),
                AlgorithmKind::Single(AlgorithmTag::Lyra2Rev3),
                AlgorithmKind::Single(AlgorithmTag::DaggerHashimoto),
            ]
        );
    }

    #[test]
    fn zero_memory_keeps_only_zero_footprint_entries() {
        let filtered = filter_insufficient_memory(0, catalog());
        assert_eq!(
            kinds(&filtered),
            vec![AlgorithmKind::Single(AlgorithmTag::Lyra2Rev3)]
        );
    }

    #[test]
    fn shrinking_memory_never_grows_the_result() {
        let sizes = [16 * GIB, 8 * GIB, 6 * GIB, 4 * GIB, 2 * GIB, 1 * GIB, 0];
        let mut previous: Option<Vec<AlgorithmKind>> = None;

        for size in sizes {
            let current = kinds(&filter_insufficient_memory(size, catalog()));
            if let Some(previous) = &previous {
                assert!(
                    current.iter().all(|kind| previous.contains(kind)),
                    "result for {size} bytes is not a subset of the larger budget"
                );
            }
            previous = Some(current);
        }
    }
}
