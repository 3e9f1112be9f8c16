//! Locale-aware string collation.
//!
//! Listing order over the wire is locale collation, not byte order, and
//! ordering assertions are only stable if both sides of the comparison go
//! through the same comparator. The gateway sorts its listings with a
//! [`Collation`] and the scenarios sort their expected values with one
//! built from the same tag.

use crate::errors::{Error, Result};
use icu::collator::{Collator, CollatorOptions, Strength};
use icu::locid::Locale;
use std::{cmp::Ordering, sync::Arc};

/// A reusable collator for one BCP-47 locale tag.
#[derive(Clone)]
pub struct Collation {
    tag: String,
    collator: Arc<Collator>,
}

impl Collation {
    /// Build a collator for `tag` (for example `en` or `de-AT`).
    pub fn new(tag: &str) -> Result<Self> {
        let locale: Locale = tag.parse().map_err(|_| Error::Locale(tag.to_string()))?;
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Tertiary);
        let collator = Collator::try_new(&locale.into(), options)
            .map_err(|_| Error::Locale(tag.to_string()))?;
        Ok(Self {
            tag: tag.to_string(),
            collator: Arc::new(collator),
        })
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.collator.compare(a, b)
    }

    /// Sort strings in place in collation order.
    pub fn sort<S: AsRef<str>>(&self, items: &mut [S]) {
        items.sort_by(|a, b| self.compare(a.as_ref(), b.as_ref()));
    }

    /// Collation-sorted copy of `items`.
    pub fn sorted<S: AsRef<str>>(&self, items: &[S]) -> Vec<String> {
        let mut out: Vec<String> = items.iter().map(|s| s.as_ref().to_string()).collect();
        self.sort(&mut out);
        out
    }
}

impl std::fmt::Debug for Collation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collation").field("tag", &self.tag).finish()
    }
}
