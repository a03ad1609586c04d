/// Number of posts on every feed page.
pub const PAGE_SIZE: u64 = 10;

/// A page number as the client sent it, before it is resolved against the
/// number of pages that actually exist.
///
/// Resolution never fails: a missing or non-numeric value is the first page,
/// anything below 1 clamps to the first page and anything past the end
/// clamps to the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageRequest(Option<i64>);

impl PageRequest {
    pub fn first() -> Self {
        Self(Some(1))
    }

    pub fn number(number: i64) -> Self {
        Self(Some(number))
    }

    /// Parses the raw `page` query parameter.
    pub fn parse(raw: Option<&str>) -> Self {
        Self(raw.and_then(|value| value.trim().parse::<i64>().ok()))
    }

    /// Resolves to a 1-based page number in `1..=num_pages`.
    pub fn resolve(self, num_pages: u64) -> u64 {
        let last = num_pages.max(1);
        match self.0 {
            Some(number) if number > 1 => (number as u64).min(last),
            _ => 1,
        }
    }
}

/// Number of pages needed for `total` items. An empty listing still has
/// one (empty) page.
pub fn num_pages(total: u64, per_page: u64) -> u64 {
    if total == 0 {
        1
    } else {
        total.div_ceil(per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_parameter() {
        assert_eq!(PageRequest::parse(None), PageRequest::default());
        assert_eq!(PageRequest::parse(Some("3")), PageRequest::number(3));
        assert_eq!(PageRequest::parse(Some(" 2 ")), PageRequest::number(2));
        assert_eq!(PageRequest::parse(Some("abc")), PageRequest::default());
        assert_eq!(PageRequest::parse(Some("")), PageRequest::default());
    }

    #[test]
    fn test_resolve_clamps_to_valid_range() {
        assert_eq!(PageRequest::default().resolve(5), 1);
        assert_eq!(PageRequest::number(0).resolve(5), 1);
        assert_eq!(PageRequest::number(-7).resolve(5), 1);
        assert_eq!(PageRequest::number(3).resolve(5), 3);
        assert_eq!(PageRequest::number(99).resolve(5), 5);
        assert_eq!(PageRequest::number(4).resolve(0), 1);
    }

    #[test]
    fn test_num_pages() {
        assert_eq!(num_pages(0, PAGE_SIZE), 1);
        assert_eq!(num_pages(1, PAGE_SIZE), 1);
        assert_eq!(num_pages(10, PAGE_SIZE), 1);
        assert_eq!(num_pages(11, PAGE_SIZE), 2);
        assert_eq!(num_pages(25, PAGE_SIZE), 3);
    }
}
