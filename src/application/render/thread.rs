//! Segment accumulator for length-constrained destinations.

use super::types::ValidationFailure;

/// Hard per-post limit, counted in characters.
pub const SEGMENT_LIMIT: usize = 280;

#[derive(Debug)]
pub struct ThreadSplitter {
    destination: &'static str,
    limit: usize,
    current: String,
    segments: Vec<String>,
}

impl ThreadSplitter {
    pub fn new(destination: &'static str, limit: usize) -> Self {
        Self {
            destination,
            limit,
            current: String::new(),
            segments: Vec::new(),
        }
    }

    pub fn push_str(&mut self, text: &str) {
        self.current.push_str(text);
    }

    /// Zero-based index of the segment currently being written.
    pub fn current_index(&self) -> usize {
        self.segments.len()
    }

    /// Trim and validate the open segment, then start a new one.
    pub fn close_segment(&mut self) -> Result<(), ValidationFailure> {
        let segment = self.current.trim().to_string();
        let length = segment.chars().count();
        if length > self.limit {
            return Err(ValidationFailure::new(
                self.destination,
                format!(
                    "segment {} is {length}/{} characters",
                    self.segments.len() + 1,
                    self.limit
                ),
            ));
        }

        self.segments.push(segment);
        self.current.clear();
        Ok(())
    }

    /// Close the trailing segment and return every segment in order.
    pub fn finish(mut self) -> Result<Vec<String>, ValidationFailure> {
        self.close_segment()?;
        Ok(self.segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dividers_split_into_n_plus_one_segments() {
        let mut splitter = ThreadSplitter::new("social", SEGMENT_LIMIT);
        splitter.push_str("first ");
        splitter.close_segment().expect("first");
        splitter.push_str(" second");
        splitter.close_segment().expect("second");
        assert_eq!(splitter.current_index(), 2);
        splitter.push_str("third\n\n");

        let segments = splitter.finish().expect("segments");
        assert_eq!(segments, ["first", "second", "third"]);
    }

    #[test]
    fn overlong_segment_fails_with_counts() {
        let mut splitter = ThreadSplitter::new("social", SEGMENT_LIMIT);
        splitter.push_str(&"x".repeat(300));

        let failure = splitter.finish().expect_err("too long");
        assert_eq!(failure.adapter, "social");
        assert!(failure.message.contains("300/280"), "{}", failure.message);
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let mut splitter = ThreadSplitter::new("social", 4);
        splitter.push_str("ééé€");
        assert!(splitter.finish().is_ok());
    }

    #[test]
    fn exactly_at_limit_is_accepted() {
        let mut splitter = ThreadSplitter::new("social", SEGMENT_LIMIT);
        splitter.push_str(&"y".repeat(SEGMENT_LIMIT));
        assert_eq!(splitter.finish().expect("segments")[0].len(), SEGMENT_LIMIT);
    }
}
