//! Pointer targeting: which node a hover or click actually addresses, given
//! the current selection.

use crate::path::{common_prefix_len, is_ancestor, Path};

/// Hover-target resolution, used for both hover highlight and single click.
///
/// - nothing selected: the top-level ancestor of `hovered`
/// - `hovered` is the selection, a direct child of it, or an ancestor of it:
///   `hovered` itself
/// - otherwise: the node on the way to `hovered` one level below the
///   deepest common ancestor
pub fn resolve_hover_target(selected: Option<&[usize]>, hovered: &[usize]) -> Path {
    let Some(sel) = selected else {
        return hovered[..hovered.len().min(1)].to_vec();
    };
    let direct_child = hovered.len() == sel.len() + 1 && hovered.starts_with(sel);
    if hovered == sel || direct_child || is_ancestor(hovered, sel) {
        return hovered.to_vec();
    }
    let d = common_prefix_len(sel, hovered);
    hovered[..(d + 1).min(hovered.len())].to_vec()
}

/// Where a double click on `clicked` moves the selection. `None` is a no-op.
///
/// The target is never more than one level deeper than the selection, and
/// when heading to a shallower node it only climbs one level at a time.
pub fn resolve_double_click_target(selected: Option<&[usize]>, clicked: &[usize]) -> Option<Path> {
    let Some(sel) = selected else {
        return Some(resolve_hover_target(None, clicked));
    };
    if clicked == sel {
        return None;
    }

    let target = if clicked.starts_with(sel) {
        clicked[..sel.len() + 1].to_vec()
    } else {
        let want = (sel.len() + 1).min(clicked.len());
        if want + 1 >= sel.len() {
            clicked[..want].to_vec()
        } else {
            sel[..sel.len() - 1].to_vec()
        }
    };

    if target.as_slice() == sel {
        None
    } else {
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hover_examples() {
        let sel: &[usize] = &[0, 1];
        assert_eq!(resolve_hover_target(Some(sel), &[0, 1, 2]), vec![0, 1, 2]);
        assert_eq!(resolve_hover_target(Some(sel), &[1, 0]), vec![1]);
        assert_eq!(resolve_hover_target(Some(sel), &[0]), vec![0]);
        assert_eq!(resolve_hover_target(Some(sel), &[0, 1]), vec![0, 1]);
        // grandchild of the selection resolves to the child on the way
        assert_eq!(resolve_hover_target(Some(sel), &[0, 1, 2, 3]), vec![0, 1, 2]);
        // cousin resolves to the sibling branch below the common ancestor
        assert_eq!(resolve_hover_target(Some(sel), &[0, 2, 4]), vec![0, 2]);
    }

    #[test]
    fn hover_without_selection_targets_top_level() {
        assert_eq!(resolve_hover_target(None, &[3, 1, 4]), vec![3]);
        assert_eq!(resolve_hover_target(None, &[2]), vec![2]);
        assert_eq!(resolve_hover_target(None, &[]), Vec::<usize>::new());
    }

    #[test]
    fn double_click_moves_one_level() {
        assert_eq!(resolve_double_click_target(Some(&[0][..]), &[0, 3, 1, 2]), Some(vec![0, 3]));
        assert_eq!(resolve_double_click_target(Some(&[0, 3][..]), &[0, 3, 1, 2]), Some(vec![0, 3, 1]));
        assert_eq!(resolve_double_click_target(Some(&[0, 1][..]), &[0, 2, 5]), Some(vec![0, 2, 5]));
        assert_eq!(resolve_double_click_target(Some(&[0, 1, 2, 3][..]), &[0]), Some(vec![0, 1, 2]));
        assert_eq!(resolve_double_click_target(Some(&[0, 1][..]), &[1]), Some(vec![1]));
    }

    #[test]
    fn double_click_no_ops_and_first_pick() {
        assert_eq!(resolve_double_click_target(Some(&[0, 1][..]), &[0, 1]), None);
        assert_eq!(resolve_double_click_target(None, &[2, 0, 1]), Some(vec![2]));
    }
}
