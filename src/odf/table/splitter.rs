//! Copy-on-write splitting of a shared run.
//!
//! Splitting offset `k` of a run with repeat count `n` leaves the run table
//! with up to three runs where there was one:
//!
//! ```text
//!   before:  [ start .. start+n )                 one element, repeat n
//!   after:   [ start .. start+k )                 original element, repeat k
//!            [ start+k ]                          new element, repeat 1
//!            [ start+k+1 .. start+n )             new element, repeat n-k-1
//! ```
//!
//! Leading and trailing parts are omitted when empty. Every new element is a
//! deep copy of the shared one, so all positions keep their content. Only the
//! references that already exist past `k` are rebound, which bounds the work
//! by what callers have touched rather than by `n`.

use super::axis::{Axis, write_repeat};
use super::run::{RunId, RunTable};
use crate::common::Result;
use crate::odf::dom::Dom;

/// Outcome of [`split`]: the updated table and the run now owning the
/// requested position on its own.
#[derive(Debug)]
pub struct Split {
    pub runs: RunTable,
    pub target: RunId,
}

/// Materialize `offset` of `run` as an individual run.
///
/// A run that is already individual comes back unchanged and no element is
/// created.
pub fn split<A: Axis>(mut runs: RunTable, dom: &mut Dom, run: RunId, offset: u32) -> Result<Split> {
    let shared = runs.run(run).clone();
    if shared.is_individual() {
        return Ok(Split { runs, target: run });
    }
    debug_assert!(offset < shared.repeat, "offset {} outside run of {}", offset, shared.repeat);

    let trailing = shared.repeat - offset - 1;
    // The target itself must be referenced before it can be rebound
    runs.extend_references(shared.start + offset);
    let referenced = runs.run(run).referenced;

    tracing::trace!(
        axis = A::NAME,
        start = shared.start,
        offset,
        repeat = shared.repeat,
        "splitting run"
    );

    let target = if offset > 0 {
        let copy = dom.deep_clone(shared.node);
        dom.insert_after(copy, shared.node)?;
        write_repeat::<A>(dom, shared.node, offset)?;
        write_repeat::<A>(dom, copy, 1)?;

        let leading = runs.run_mut(run);
        leading.repeat = offset;
        leading.referenced = leading.referenced.min(offset);

        let target = runs.insert_after(run, copy, shared.start + offset, 1);
        runs.rebind(shared.start + offset, target, 0);
        runs.run_mut(target).referenced = 1;
        target
    } else {
        write_repeat::<A>(dom, shared.node, 1)?;
        let only = runs.run_mut(run);
        only.repeat = 1;
        only.referenced = 1;
        run
    };

    if trailing > 0 {
        let target_node = runs.run(target).node;
        let copy = dom.deep_clone(target_node);
        dom.insert_after(copy, target_node)?;
        write_repeat::<A>(dom, copy, trailing)?;

        let tail_start = shared.start + offset + 1;
        let tail = runs.insert_after(target, copy, tail_start, trailing);
        let touched = referenced.saturating_sub(offset + 1);
        for k in 0..touched {
            runs.rebind(tail_start + k, tail, k);
        }
        runs.run_mut(tail).referenced = touched;
    }

    Ok(Split { runs, target })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odf::table::axis::{COLUMNS_REPEATED, CellAxis, TABLE_CELL};

    fn row_with(repeats: &[u32]) -> (Dom, RunTable) {
        let mut dom = Dom::with_root("table:table-row");
        let row = dom.root().unwrap();
        let mut runs = RunTable::new();
        for &repeat in repeats {
            let cell = dom.create_element(TABLE_CELL);
            write_repeat::<CellAxis>(&mut dom, cell, repeat).unwrap();
            dom.append_child(row, cell);
            runs.push(cell, repeat);
        }
        (dom, runs)
    }

    fn shape(runs: &RunTable) -> Vec<(u32, u32)> {
        runs.iter().map(|r| (r.start, r.repeat)).collect()
    }

    fn dom_repeats(dom: &Dom) -> Vec<Option<String>> {
        let row = dom.root().unwrap();
        dom.children(row)
            .map(|c| dom.attribute(c, COLUMNS_REPEATED).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_split_middle() {
        let (mut dom, runs) = row_with(&[5]);
        let id = runs.ids()[0];
        let Split { runs, target } = split::<CellAxis>(runs, &mut dom, id, 2).unwrap();
        assert_eq!(shape(&runs), vec![(0, 2), (2, 1), (3, 2)]);
        assert_eq!(runs.run(target).start, 2);
        assert_eq!(
            dom_repeats(&dom),
            vec![Some("2".to_string()), None, Some("2".to_string())]
        );
        assert_eq!(runs.covered(), 5);
    }

    #[test]
    fn test_split_first_and_last() {
        let (mut dom, runs) = row_with(&[4]);
        let id = runs.ids()[0];
        let Split { runs, target } = split::<CellAxis>(runs, &mut dom, id, 0).unwrap();
        assert_eq!(target, id);
        assert_eq!(shape(&runs), vec![(0, 1), (1, 3)]);

        let last = runs.ids()[1];
        let Split { runs, target } = split::<CellAxis>(runs, &mut dom, last, 2).unwrap();
        assert_eq!(shape(&runs), vec![(0, 1), (1, 2), (3, 1)]);
        assert_eq!(runs.run(target).start, 3);
        assert_eq!(dom.children(dom.root().unwrap()).count(), 3);
    }

    #[test]
    fn test_split_individual_is_noop() {
        let (mut dom, runs) = row_with(&[1, 3]);
        let before = dom.len();
        let id = runs.ids()[0];
        let Split { runs, target } = split::<CellAxis>(runs, &mut dom, id, 0).unwrap();
        assert_eq!(target, id);
        assert_eq!(dom.len(), before);
        assert_eq!(shape(&runs), vec![(0, 1), (1, 3)]);
    }

    #[test]
    fn test_split_rebinds_touched_trailing_references() {
        let (mut dom, mut runs) = row_with(&[10]);
        runs.extend_references(6);
        let id = runs.ids()[0];
        let Split { runs, target } = split::<CellAxis>(runs, &mut dom, id, 3).unwrap();

        for index in 0..=6 {
            let run = runs.resolve(index);
            assert!(run.contains(index), "index {index} bound to wrong run");
        }
        assert_eq!(runs.reference(3).unwrap().run, target);
        let tail = runs.reference(4).unwrap();
        assert_eq!((tail.offset, runs.reference(6).unwrap().offset), (0, 2));
        // untouched trailing positions stay unreferenced
        assert!(runs.reference(7).is_none());
        assert_eq!(runs.run(tail.run).referenced, 3);
    }

    #[test]
    fn test_split_copies_content() {
        let (mut dom, runs) = row_with(&[3]);
        let cell = runs.run(runs.ids()[0]).node;
        dom.set_attribute(cell, "table:style-name", "ce1");
        let id = runs.ids()[0];
        let Split { runs, .. } = split::<CellAxis>(runs, &mut dom, id, 1).unwrap();
        for run in runs.iter() {
            assert_eq!(dom.attribute(run.node, "table:style-name"), Some("ce1"));
        }
    }
}
