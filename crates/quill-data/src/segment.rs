//! Paragraph packing: turning a book's paragraphs into bounded segments.

/// Split a book's text into paragraphs on blank lines.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Greedily pack consecutive paragraphs into segments of roughly
/// `symbol_limit` characters.
///
/// Each segment takes paragraphs in order until the accumulated character
/// count reaches the limit; a segment always holds at least one paragraph,
/// so a single oversized paragraph becomes its own segment rather than
/// being split.
pub fn pack_paragraphs(paragraphs: &[String], symbol_limit: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut i = 0usize;
    while i < paragraphs.len() {
        let mut sample: Vec<&str> = Vec::new();
        let mut symbols = 0usize;
        while symbols < symbol_limit && i < paragraphs.len() {
            sample.push(&paragraphs[i]);
            symbols += paragraphs[i].chars().count();
            i += 1;
        }
        segments.push(sample.join("\n"));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn paras(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn splits_on_blank_lines() {
        let text = "first para\n\nsecond para\n\n\n\nthird";
        assert_eq!(
            split_paragraphs(text),
            vec!["first para", "second para", "third"]
        );
    }

    #[test]
    fn packs_until_the_limit_is_reached() {
        let paragraphs = paras(&["aaaa", "bbbb", "cccc"]);
        // 4 chars per paragraph, limit 8: first segment takes two
        // paragraphs (4 < 8, then 8 is no longer < 8).
        let segments = pack_paragraphs(&paragraphs, 8);
        assert_eq!(segments, vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn oversized_paragraph_stands_alone() {
        let paragraphs = paras(&["0123456789", "a"]);
        let segments = pack_paragraphs(&paragraphs, 4);
        assert_eq!(segments, vec!["0123456789", "a"]);
    }

    #[rstest]
    #[case(1)]
    #[case(10)]
    #[case(1000)]
    fn no_paragraph_is_lost(#[case] limit: usize) {
        let paragraphs = paras(&["one", "two", "three", "four"]);
        let segments = pack_paragraphs(&paragraphs, limit);
        let rejoined: Vec<&str> = segments
            .iter()
            .flat_map(|s| s.split('\n'))
            .collect();
        assert_eq!(rejoined, vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn empty_input_gives_no_segments() {
        assert!(pack_paragraphs(&[], 100).is_empty());
    }
}
