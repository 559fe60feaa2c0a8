//! Pagination primitives shared by the store traits and the services.

use serde::{Deserialize, Serialize};

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
  pub number: u32,
  pub size:   u32,
}

impl Page {
  /// Builds a page, clamping `number` and `size` to at least 1.
  pub fn new(number: u32, size: u32) -> Self {
    Self { number: number.max(1), size: size.max(1) }
  }

  /// The first `size` items.
  pub fn first(size: u32) -> Self { Self::new(1, size) }

  /// A single page holding everything.
  pub fn all() -> Self { Self::new(1, u32::MAX) }

  pub fn offset(&self) -> u64 {
    u64::from(self.number - 1) * u64::from(self.size)
  }

  pub fn limit(&self) -> u64 { u64::from(self.size) }
}

/// One page of a listing plus the total across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginated<T> {
  pub items:       Vec<T>,
  pub total_count: u64,
  pub page:        u32,
  pub per_page:    u32,
}

impl<T> Paginated<T> {
  pub fn empty(page: Page) -> Self {
    Self { items: Vec::new(), total_count: 0, page: page.number, per_page: page.size }
  }

  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
    Paginated {
      items:       self.items.into_iter().map(f).collect(),
      total_count: self.total_count,
      page:        self.page,
      per_page:    self.per_page,
    }
  }
}

/// The first few items of a set plus the size of the whole set, as embedded
/// in a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview<T> {
  pub count: u64,
  pub items: Vec<T>,
}

impl<T> Default for Preview<T> {
  fn default() -> Self { Self { count: 0, items: Vec::new() } }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn offsets_are_one_based() {
    assert_eq!(Page::new(1, 15).offset(), 0);
    assert_eq!(Page::new(3, 15).offset(), 30);
  }

  #[test]
  fn zero_values_are_clamped() {
    let p = Page::new(0, 0);
    assert_eq!(p.number, 1);
    assert_eq!(p.size, 1);
  }

  #[test]
  fn all_does_not_overflow() {
    assert_eq!(Page::all().offset(), 0);
    assert_eq!(Page::all().limit(), u64::from(u32::MAX));
  }
}
