//! Iterable helpers

/// Split items into pages of `count`, keeping order.
///
/// ```
/// use cogbot::utils::iterables::paginate;
///
/// assert_eq!(paginate([1, 2, 3, 4, 5], 2), vec![vec![1, 2], vec![3, 4], vec![5]]);
/// ```
pub fn paginate<I: IntoIterator>(items: I, count: usize) -> Vec<Vec<I::Item>> {
    let count = count.max(1);
    let mut pages = Vec::new();
    let mut page = Vec::with_capacity(count);

    for item in items {
        if page.len() == count {
            pages.push(std::mem::replace(&mut page, Vec::with_capacity(count)));
        }
        page.push(item);
    }

    if !page.is_empty() {
        pages.push(page);
    }
    pages
}

/// Split text into chunks of at most `max` characters (platform message limits)
pub fn slice_text(text: &str, max: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_groups_in_order() {
        let loaded = vec!["a", "b", "c", "d", "e"];
        assert_eq!(paginate(loaded, 3), vec![vec!["a", "b", "c"], vec!["d", "e"]]);
    }

    #[test]
    fn test_paginate_empty() {
        let empty: Vec<u8> = Vec::new();
        assert!(paginate(empty, 3).is_empty());
    }

    #[test]
    fn test_slice_text_respects_char_boundaries() {
        assert_eq!(slice_text("héllo", 2), vec!["hé", "ll", "o"]);
        assert!(slice_text("", 10).is_empty());
    }
}
