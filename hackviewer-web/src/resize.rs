/// Filters resize notifications down to real size changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportReactor {
    last: Option<(u32, u32)>,
}

impl ViewportReactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a size that has already been applied.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            last: Some((width, height)),
        }
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.last
    }

    /// Returns the size to apply, or `None` when it is unchanged or has a
    /// zero dimension.
    pub fn observe(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        if width == 0 || height == 0 || self.last == Some((width, height)) {
            return None;
        }
        self.last = Some((width, height));
        self.last
    }
}

/// Width over height, for a size known to be non-zero.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    width as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_then_repeat() {
        let mut reactor = ViewportReactor::with_size(800, 600);
        assert_eq!(reactor.observe(1024, 512), Some((1024, 512)));
        assert_eq!(reactor.observe(1024, 512), None);
        assert_eq!(reactor.size(), Some((1024, 512)));
    }

    #[test]
    fn test_zero_size_ignored() {
        let mut reactor = ViewportReactor::new();
        assert_eq!(reactor.observe(0, 600), None);
        assert_eq!(reactor.observe(800, 0), None);
        assert_eq!(reactor.size(), None);
        assert_eq!(reactor.observe(800, 600), Some((800, 600)));
    }

    #[test]
    fn test_aspect_ratio() {
        assert_eq!(aspect_ratio(1024, 512), 2.0);
        assert_eq!(aspect_ratio(10, 0), 10.0);
    }
}
