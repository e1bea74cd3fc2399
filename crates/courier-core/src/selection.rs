//! Opt-in / opt-out selection over a set of ids.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A selection expressed either as the chosen ids or as the ids left out.
///
/// `Excludes` can describe "everything" without knowing the full set, so
/// counting needs the caller to supply the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ids", rename_all = "snake_case")]
pub enum SelectionState<T: Ord> {
  Includes(BTreeSet<T>),
  Excludes(BTreeSet<T>),
}

impl<T: Ord + Clone> SelectionState<T> {
  pub fn empty() -> Self { Self::Includes(BTreeSet::new()) }

  pub fn select_all() -> Self { Self::Excludes(BTreeSet::new()) }

  pub fn contains(&self, id: &T) -> bool {
    match self {
      Self::Includes(ids) => ids.contains(id),
      Self::Excludes(ids) => !ids.contains(id),
    }
  }

  pub fn count(&self, total: usize) -> usize {
    match self {
      Self::Includes(ids) => ids.len(),
      Self::Excludes(ids) => total.saturating_sub(ids.len()),
    }
  }

  pub fn is_not_empty(&self, total: usize) -> bool { self.count(total) > 0 }

  /// The stored ids: chosen ones for `Includes`, left-out ones for `Excludes`.
  pub fn selected(&self) -> &BTreeSet<T> {
    match self {
      Self::Includes(ids) | Self::Excludes(ids) => ids,
    }
  }

  pub fn is_exclusionary(&self) -> bool { matches!(self, Self::Excludes(_)) }

  /// Flip membership of `id`, keeping the current variant.
  pub fn toggle(&self, id: T) -> Self {
    let selecting = !self.contains(&id);
    match self {
      Self::Includes(ids) => Self::Includes(with_toggled(ids, id, selecting)),
      Self::Excludes(ids) => Self::Excludes(with_toggled(ids, id, !selecting)),
    }
  }
}

fn with_toggled<T: Ord + Clone>(ids: &BTreeSet<T>, id: T, insert: bool) -> BTreeSet<T> {
  let mut next = ids.clone();
  if insert {
    next.insert(id);
  } else {
    next.remove(&id);
  }
  next
}
