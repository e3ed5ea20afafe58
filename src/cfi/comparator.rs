//! CFI ordering
//!
//! Orders CFI strings in reading order without a full grammar parse: the
//! numeric steps of the path (and of a range's start) are compared one by
//! one, indirections sort before element steps at the same depth, and
//! character offsets break ties. Strings without any recognizable step fall
//! back to plain string order.

use std::cmp::Ordering;

use super::types::Cfi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Indirection,
    Step(u64),
    Offset(u64),
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        use Token::*;
        match (self, other) {
            (Indirection, Indirection) => Ordering::Equal,
            (Indirection, _) => Ordering::Less,
            (_, Indirection) => Ordering::Greater,
            (Step(a), Step(b)) | (Offset(a), Offset(b)) => a.cmp(b),
            // A character offset locates a point before any child step
            (Offset(_), Step(_)) => Ordering::Less,
            (Step(_), Offset(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Split a CFI into ordering tokens.
///
/// For a range CFI (`epubcfi(parent,start,end)`) only the parent and start
/// paths are considered.
fn tokenize(cfi: &str) -> Vec<Token> {
    let body = cfi
        .strip_prefix("epubcfi(")
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(cfi);
    // parent,start[,end]
    let relevant: String = body.splitn(3, ',').take(2).collect::<Vec<_>>().join("");

    let mut tokens = Vec::new();
    let mut chars = relevant.chars().peekable();
    let mut bracket_depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            _ if bracket_depth > 0 => {}
            '!' => tokens.push(Token::Indirection),
            '/' | ':' => {
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(d);
                    chars.next();
                }
                if let Ok(n) = digits.parse() {
                    tokens.push(if c == '/' { Token::Step(n) } else { Token::Offset(n) });
                }
            }
            _ => {}
        }
    }

    tokens
}

/// Compare two CFI strings in reading order
pub fn compare_cfi_strings(a: &str, b: &str) -> Ordering {
    let ta = tokenize(a);
    let tb = tokenize(b);
    if ta.is_empty() || tb.is_empty() {
        return a.cmp(b);
    }

    for (x, y) in ta.iter().zip(tb.iter()) {
        let cmp = x.cmp(y);
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    // Deeper paths come after their ancestors
    ta.len().cmp(&tb.len()).then_with(|| a.cmp(b))
}

/// Compare two CFIs in reading order
pub fn compare(a: &Cfi, b: &Cfi) -> Ordering {
    compare_cfi_strings(a.as_str(), b.as_str())
}

/// Determine if CFI `a` comes before CFI `b` in reading order
pub fn is_before(a: &Cfi, b: &Cfi) -> bool {
    compare(a, b) == Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfi(s: &str) -> Cfi {
        Cfi::new(s).unwrap()
    }

    #[test]
    fn test_ordering_same_chapter() {
        let a = cfi("epubcfi(/6/4!/4/2/1:10)");
        let b = cfi("epubcfi(/6/4!/4/2/1:20)");
        assert!(is_before(&a, &b));
        assert!(!is_before(&b, &a));
    }

    #[test]
    fn test_ordering_different_chapters() {
        assert_eq!(
            compare_cfi_strings("epubcfi(/6/4!/4/2)", "epubcfi(/6/6!/4/2)"),
            Ordering::Less
        );
    }

    #[test]
    fn test_ordering_numeric_not_lexical() {
        // "10" sorts before "4" lexically
        assert_eq!(
            compare_cfi_strings("epubcfi(/6/4!/4/2)", "epubcfi(/6/10!/4/2)"),
            Ordering::Less
        );
    }

    #[test]
    fn test_ordering_nested_depth() {
        assert_eq!(
            compare_cfi_strings("epubcfi(/6/4!/4/2)", "epubcfi(/6/4!/4/2/1)"),
            Ordering::Less
        );
    }

    #[test]
    fn test_id_assertions_ignored() {
        assert_eq!(
            compare_cfi_strings("epubcfi(/6/4[chap01]!/4/2)", "epubcfi(/6/4[x]!/4/4)"),
            Ordering::Less
        );
    }

    #[test]
    fn test_range_uses_start() {
        let a = "epubcfi(/6/4!/4/2,/1:5,/1:90)";
        let b = "epubcfi(/6/4!/4/2,/1:10,/1:12)";
        assert_eq!(compare_cfi_strings(a, b), Ordering::Less);
    }

    #[test]
    fn test_sort_cfis() {
        let mut cfis = vec![
            cfi("epubcfi(/6/8!/4/2/1:50)"),
            cfi("epubcfi(/6/4!/4/2/1:10)"),
            cfi("epubcfi(/6/6!/4/2/1:30)"),
            cfi("epubcfi(/6/4!/4/2/1:5)"),
        ];
        cfis.sort_by(compare);

        assert_eq!(cfis[0].as_str(), "epubcfi(/6/4!/4/2/1:5)");
        assert_eq!(cfis[1].as_str(), "epubcfi(/6/4!/4/2/1:10)");
        assert_eq!(cfis[2].as_str(), "epubcfi(/6/6!/4/2/1:30)");
        assert_eq!(cfis[3].as_str(), "epubcfi(/6/8!/4/2/1:50)");
    }

    #[test]
    fn test_opaque_strings_fall_back_to_string_order() {
        assert_eq!(compare_cfi_strings("epubcfi-42", "epubcfi-7"), Ordering::Less);
    }
}
