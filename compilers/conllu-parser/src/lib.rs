pub mod level1;
pub mod metadata;
pub mod segmenter;
pub mod structure;

pub use metadata::{classify, Comment};
pub use segmenter::{Segmenter, SentenceUnit};
pub use structure::{check_id_sequence, check_token_ranges};

use std::io::BufRead;

/// Primary entry point: line source -> sentence units.
pub fn sentences<R: BufRead>(reader: R) -> Segmenter<R> {
    Segmenter::new(reader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_feed_structure_checks() {
        let input = "# sent_id = a\n1-2\tdu\t_\t_\t_\t_\t_\t_\t_\t_\n1\tde\tde\tADP\t_\t_\t2\tcase\t_\t_\n2\tle\tle\tDET\t_\t_\t0\troot\t_\t_\n\n\
                     # sent_id = b\n1\tx\tx\tX\t_\t_\t0\troot\t_\t_\n3\ty\ty\tX\t_\t_\t1\tdep\t_\t_\n\n";
        let mut segmenter = sentences(input.as_bytes());
        let first = segmenter.next().unwrap().unwrap();
        let second = segmenter.next().unwrap().unwrap();
        assert!(segmenter.next().is_none());
        assert!(segmenter.take_findings().is_empty());

        let (ok, findings) = check_id_sequence(&first.rows);
        assert!(ok && findings.is_empty());
        assert!(check_token_ranges(&first.rows).is_empty());

        let (ok, findings) = check_id_sequence(&second.rows);
        assert!(!ok);
        assert_eq!(findings[0].test_id, "word-id-sequence");
        assert_eq!(second.stamp().sentence_id.as_deref(), Some("b"));
    }
}
