use std::collections::BTreeSet;

/// A resolved set of 1-based page numbers: strictly ascending, no duplicates,
/// every entry within the page count it was resolved against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSet {
    pages: Vec<u32>,
}

impl PageSet {
    pub fn as_slice(&self) -> &[u32] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl<'a> IntoIterator for &'a PageSet {
    type Item = u32;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, u32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter().copied()
    }
}

/// A single comma-separated token of a page range expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Page(i64),
    Range(i64, i64),
}

impl Token {
    /// Parse a token like "5" or " 1 - 3 ". Each side of the first `-` is
    /// read by [`leading_integer`], so "2abc" is page 2 and "1-3-5" is the
    /// range 1 to 3. Returns `None` when a side has no leading digits.
    fn parse(s: &str) -> Option<Self> {
        match s.split_once('-') {
            Some((start, end)) => {
                let start = leading_integer(start)?;
                let end = leading_integer(end)?;
                Some(Token::Range(start, end))
            }
            None => leading_integer(s).map(Token::Page),
        }
    }

    /// The inclusive page bounds this token selects, if it lies entirely
    /// within `1..=total_pages`. Reversed ranges select nothing.
    fn bounds(self, total_pages: u32) -> Option<(u32, u32)> {
        let (start, end) = match self {
            Token::Page(n) => (n, n),
            Token::Range(start, end) => (start, end),
        };
        if start < 1 || end > i64::from(total_pages) || start > end {
            return None;
        }
        // both fit: 1 <= start <= end <= total_pages
        Some((start as u32, end as u32))
    }
}

/// Read the integer at the start of `s`, ignoring whatever follows it:
/// "2abc" is 2 and "3.5" is 3. Surrounding whitespace and a sign are allowed.
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // saturates: anything that long is past every page count
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

/// Resolve a page range expression like "1-3,5,7-9" against a document with
/// `total_pages` pages.
///
/// Tokens that do not parse, fall outside the document, or describe a
/// reversed range are dropped rather than rejected, so "1-1000" against a
/// ten page document selects nothing instead of failing. An empty result is
/// for the caller to reject.
pub fn resolve(expression: &str, total_pages: u32) -> PageSet {
    let mut pages = BTreeSet::new();
    for (start, end) in expression
        .split(',')
        .filter_map(Token::parse)
        .filter_map(|token| token.bounds(total_pages))
    {
        pages.extend(start..=end);
    }

    PageSet {
        pages: pages.into_iter().collect(),
    }
}
