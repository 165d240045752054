//! Wholesaler hierarchy helpers
//!
//! The db layer fetches flat rows (with depth from a recursive CTE); these
//! functions assemble trees and validate re-parenting.

use std::collections::{BTreeMap, HashMap, HashSet};

use shared::error::{AppError, ErrorCode};
use shared::models::{WholesaleNode, WholesaleWithLevel};

/// Assemble nested trees from flat rows.
///
/// A row whose parent is absent from `rows` becomes a root. Siblings are
/// ordered by name, then id. Rows unreachable from any root (a corrupt
/// cycle) are left out.
pub fn build_forest(rows: &[WholesaleWithLevel]) -> Vec<WholesaleNode> {
    let ids: HashSet<i64> = rows.iter().map(|r| r.id).collect();
    let mut by_parent: HashMap<Option<i64>, Vec<&WholesaleWithLevel>> = HashMap::new();
    for row in rows {
        let parent = row.parent_id.filter(|p| ids.contains(p));
        by_parent.entry(parent).or_default().push(row);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    }

    let mut visited = HashSet::new();
    by_parent
        .get(&None)
        .map(|roots| {
            roots
                .iter()
                .filter_map(|row| build_node(row, &by_parent, &mut visited))
                .collect()
        })
        .unwrap_or_default()
}

fn build_node(
    row: &WholesaleWithLevel,
    by_parent: &HashMap<Option<i64>, Vec<&WholesaleWithLevel>>,
    visited: &mut HashSet<i64>,
) -> Option<WholesaleNode> {
    if !visited.insert(row.id) {
        return None;
    }
    let children = by_parent
        .get(&Some(row.id))
        .map(|kids| {
            kids.iter()
                .filter_map(|kid| build_node(kid, by_parent, visited))
                .collect()
        })
        .unwrap_or_default();
    Some(WholesaleNode {
        id: row.id,
        name: row.name.clone(),
        phone_number: row.phone_number.clone(),
        is_active: row.is_active,
        level: row.level,
        children,
    })
}

/// Group rows by depth
pub fn group_by_level(rows: Vec<WholesaleWithLevel>) -> BTreeMap<i32, Vec<WholesaleWithLevel>> {
    let mut levels: BTreeMap<i32, Vec<WholesaleWithLevel>> = BTreeMap::new();
    for row in rows {
        levels.entry(row.level).or_default().push(row);
    }
    levels
}

/// Reject a parent assignment that would make `id` its own ancestor.
///
/// `parent_lineage` is the new parent followed by all of its ancestors.
pub fn check_parent(id: i64, parent_lineage: &[i64]) -> Result<(), AppError> {
    if parent_lineage.contains(&id) {
        return Err(AppError::new(ErrorCode::WholesaleHierarchyCycle)
            .with_detail("wholesale_id", id)
            .with_detail("parent_id", parent_lineage.first().copied().unwrap_or(id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, name: &str, parent_id: Option<i64>, level: i32) -> WholesaleWithLevel {
        WholesaleWithLevel {
            id,
            name: name.to_string(),
            phone_number: format!("62800{id}"),
            address: None,
            pic: None,
            city: None,
            parent_id,
            is_active: true,
            created_at: 0,
            updated_at: 0,
            level,
        }
    }

    #[test]
    fn test_build_forest_nests_children() {
        let rows = vec![
            row(1, "Pusat", None, 0),
            row(2, "Cabang B", Some(1), 1),
            row(3, "Cabang A", Some(1), 1),
            row(4, "Agen", Some(3), 2),
            row(5, "Lain", None, 0),
        ];
        let forest = build_forest(&rows);
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].name, "Lain");
        let pusat = &forest[1];
        assert_eq!(pusat.children.len(), 2);
        assert_eq!(pusat.children[0].name, "Cabang A");
        assert_eq!(pusat.children[0].children[0].id, 4);
        assert!(pusat.children[1].children.is_empty());
    }

    #[test]
    fn test_subtree_parent_outside_set_is_root() {
        // Descendants of node 1, without node 1 itself
        let rows = vec![row(2, "B", Some(1), 1), row(3, "C", Some(2), 2)];
        let forest = build_forest(&rows);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, 2);
        assert_eq!(forest[0].children[0].id, 3);
    }

    #[test]
    fn test_cycle_rows_are_skipped() {
        let rows = vec![row(1, "A", Some(2), 0), row(2, "B", Some(1), 1)];
        assert!(build_forest(&rows).is_empty());
    }

    #[test]
    fn test_group_by_level() {
        let rows = vec![
            row(1, "A", None, 0),
            row(2, "B", Some(1), 1),
            row(3, "C", Some(1), 1),
        ];
        let levels = group_by_level(rows);
        assert_eq!(levels[&0].len(), 1);
        assert_eq!(levels[&1].len(), 2);
    }

    #[test]
    fn test_check_parent() {
        assert!(check_parent(5, &[3, 1]).is_ok());
        assert!(check_parent(5, &[]).is_ok());
        assert_eq!(
            check_parent(5, &[5]).unwrap_err().code,
            ErrorCode::WholesaleHierarchyCycle
        );
        assert_eq!(
            check_parent(1, &[4, 3, 1]).unwrap_err().code,
            ErrorCode::WholesaleHierarchyCycle
        );
    }
}
