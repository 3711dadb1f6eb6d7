use crate::domain::model::{LuId, TrainingId};
use crate::domain::ports::LinkStore;
use crate::domain::view::{BlockLus, LevelMap, LuCourses};
use crate::utils::error::Result;

/// Sort order of an LU, `0` when none is recorded.
pub fn sort_key<S: LinkStore + ?Sized>(store: &S, training_id: TrainingId, lu_id: LuId) -> Result<i64> {
    Ok(store.sort_order(training_id, lu_id)?.unwrap_or(0))
}

/// Stable ascending sort of `items` by the sort order of the LU each one names.
///
/// Each order is fetched once, not once per comparison.
pub fn sort_by_order<S, T, F>(
    store: &S,
    training_id: TrainingId,
    items: Vec<T>,
    lu_of: F,
) -> Result<Vec<T>>
where
    S: LinkStore + ?Sized,
    F: Fn(&T) -> LuId,
{
    let mut keyed = items
        .into_iter()
        .map(|item| Ok((sort_key(store, training_id, lu_of(&item))?, item)))
        .collect::<Result<Vec<_>>>()?;

    keyed.sort_by_key(|(key, _)| *key);
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}

/// Orders a semester level map: LUs for one level, LUs inside each block then
/// the blocks themselves for two levels.
pub fn order_siblings<S: LinkStore + ?Sized>(
    store: &S,
    training_id: TrainingId,
    levels: LevelMap,
) -> Result<LevelMap> {
    match levels {
        LevelMap::OneLevel(lus) => {
            let ordered = sort_by_order(store, training_id, lus, |lu: &LuCourses| lu.lu_id)?;
            Ok(LevelMap::OneLevel(ordered))
        }
        LevelMap::TwoLevel(blocks) => {
            let mut inner_sorted = Vec::with_capacity(blocks.len());
            for block in blocks {
                let lus = sort_by_order(store, training_id, block.lus, |lu: &LuCourses| lu.lu_id)?;
                inner_sorted.push(BlockLus {
                    block_id: block.block_id,
                    lus,
                });
            }

            let ordered =
                sort_by_order(store, training_id, inner_sorted, |b: &BlockLus| b.block_id)?;
            Ok(LevelMap::TwoLevel(ordered))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::snapshot::{Snapshot, SnapshotStore};

    fn lus(ids: &[LuId]) -> Vec<LuCourses> {
        ids.iter()
            .map(|&lu_id| LuCourses {
                lu_id,
                courses: vec![lu_id * 100],
            })
            .collect()
    }

    fn ids(map: &LevelMap) -> Vec<LuId> {
        match map {
            LevelMap::OneLevel(lus) => lus.iter().map(|l| l.lu_id).collect(),
            LevelMap::TwoLevel(blocks) => blocks.iter().map(|b| b.block_id).collect(),
        }
    }

    #[test]
    fn test_one_level_sorted_ascending() {
        let store = SnapshotStore::new(
            Snapshot::default()
                .sort_order(1, 10, 3)
                .sort_order(1, 11, 1)
                .sort_order(1, 12, 2),
        );

        let ordered = order_siblings(&store, 1, LevelMap::OneLevel(lus(&[10, 11, 12]))).unwrap();
        assert_eq!(ids(&ordered), vec![11, 12, 10]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let store = SnapshotStore::new(
            Snapshot::default()
                .sort_order(1, 10, 5)
                .sort_order(1, 11, 5)
                .sort_order(1, 12, 1)
                .sort_order(1, 13, 5),
        );

        let ordered =
            order_siblings(&store, 1, LevelMap::OneLevel(lus(&[10, 11, 12, 13]))).unwrap();
        assert_eq!(ids(&ordered), vec![12, 10, 11, 13]);
    }

    #[test]
    fn test_missing_order_defaults_to_zero() {
        let store = SnapshotStore::new(Snapshot::default().sort_order(1, 10, 2).sort_order(1, 11, -1));

        let ordered = order_siblings(&store, 1, LevelMap::OneLevel(lus(&[10, 12, 11]))).unwrap();
        // 12 has no order and lands between -1 and 2
        assert_eq!(ids(&ordered), vec![11, 12, 10]);
    }

    #[test]
    fn test_two_level_sorts_inner_then_outer() {
        let store = SnapshotStore::new(
            Snapshot::default()
                .sort_order(1, 1, 2)
                .sort_order(1, 2, 1)
                .sort_order(1, 10, 9)
                .sort_order(1, 11, 3),
        );

        let map = LevelMap::TwoLevel(vec![
            BlockLus {
                block_id: 1,
                lus: lus(&[10, 11]),
            },
            BlockLus {
                block_id: 2,
                lus: lus(&[20]),
            },
        ]);

        let ordered = order_siblings(&store, 1, map).unwrap();
        assert_eq!(ids(&ordered), vec![2, 1]);
        match ordered {
            LevelMap::TwoLevel(blocks) => {
                let inner: Vec<LuId> = blocks[1].lus.iter().map(|l| l.lu_id).collect();
                assert_eq!(inner, vec![11, 10]);
                assert_eq!(blocks[1].lus[0].courses, vec![1100]);
            }
            LevelMap::OneLevel(_) => panic!("granularity changed"),
        }
    }

    #[test]
    fn test_orders_are_scoped_to_training() {
        let store = SnapshotStore::new(Snapshot::default().sort_order(2, 10, 9));
        let ordered = sort_by_order(&store, 1, vec![10, 11], |id: &LuId| *id).unwrap();
        assert_eq!(ordered, vec![10, 11]);
    }
}
