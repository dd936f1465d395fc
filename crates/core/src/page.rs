use crate::error::{Result, StorageError};

/// One-based page window over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: usize,
    size: usize,
}

impl Page {
    pub fn new(number: usize, size: usize) -> Result<Self> {
        if number == 0 {
            return Err(StorageError::InvalidPage {
                page: 0,
                size: i64::try_from(size).unwrap_or(i64::MAX),
            });
        }
        Ok(Self { number, size })
    }

    /// A single page holding the whole listing.
    pub const fn all() -> Self {
        Self {
            number: 1,
            size: usize::MAX,
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn offset(&self) -> usize {
        (self.number - 1).saturating_mul(self.size)
    }

    /// The part of `items` this page covers, clipped to its length.
    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = start.saturating_add(self.size).min(items.len());
        &items[start..end]
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::all()
    }
}

impl TryFrom<(i64, i64)> for Page {
    type Error = StorageError;

    fn try_from((page, size): (i64, i64)) -> Result<Self> {
        let invalid = || StorageError::InvalidPage { page, size };
        if page <= 0 || size < 0 {
            return Err(invalid());
        }
        let number = usize::try_from(page).map_err(|_| invalid())?;
        let size = usize::try_from(size).map_err(|_| invalid())?;
        Self::new(number, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn rejects_invalid_pages() {
        assert!(Page::new(0, 1).is_err());
        assert!(Page::try_from((0, 1)).is_err());
        assert!(Page::try_from((1, -1)).is_err());
        assert!(Page::try_from((-3, 10)).is_err());
        assert!(Page::try_from((1, 0)).is_ok());
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(Page::new(1, 10).unwrap().offset(), 0);
        assert_eq!(Page::new(3, 10).unwrap().offset(), 20);
        assert_eq!(Page::all().offset(), 0);
    }

    // min(s, max(0, n - (p - 1) * s))
    #[rstest]
    #[case(5, 1, 2, 2)]
    #[case(5, 3, 2, 1)]
    #[case(5, 4, 2, 0)]
    #[case(5, 1, 10, 5)]
    #[case(5, 1, 0, 0)]
    #[case(0, 1, 10, 0)]
    #[case(5, 100, 100, 0)]
    fn window_length(
        #[case] n: usize,
        #[case] page: usize,
        #[case] size: usize,
        #[case] expected: usize,
    ) {
        let items: Vec<usize> = (0..n).collect();
        assert_eq!(Page::new(page, size).unwrap().window(&items).len(), expected);
    }

    #[test]
    fn consecutive_pages_cover_listing_once() {
        let items: Vec<usize> = (0..7).collect();
        let mut seen = Vec::new();
        for number in 1..=4 {
            seen.extend_from_slice(Page::new(number, 2).unwrap().window(&items));
        }
        assert_eq!(seen, items);
    }

    #[test]
    fn all_covers_everything() {
        let items = [1, 2, 3];
        assert_eq!(Page::all().window(&items), &items);
        assert_eq!(Page::default(), Page::all());
    }
}
