//! Command tag generation.

/// Generates sequential tags `A0000`, `A0001`, ... for one session.
///
/// A session is owned by a single task, so a plain counter is enough.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    prefix: char,
    counter: u32,
}

impl TagGenerator {
    /// Creates a generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { prefix, counter: 0 }
    }

    /// Returns the next tag.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> String {
        let tag = format!("{}{:04}", self.prefix, self.counter);
        self.counter = self.counter.wrapping_add(1);
        tag
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_tags() {
        let mut tags = TagGenerator::default();
        assert_eq!(tags.next(), "A0000");
        assert_eq!(tags.next(), "A0001");
        assert_eq!(tags.next(), "A0002");
    }

    #[test]
    fn custom_prefix_and_width() {
        let mut tags = TagGenerator::new('M');
        for _ in 0..10_000 {
            tags.next();
        }
        assert_eq!(tags.next(), "M10000");
    }
}
