/// How close to the end of the loaded items the lightbox starts asking for
/// the next page.
pub const PREFETCH_WINDOW: usize = 6;

/// Full-screen viewer position over the pager's items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lightbox {
    index: Option<usize>,
}

impl Lightbox {
    pub fn current(&self) -> Option<usize> {
        self.index
    }

    pub fn is_open(&self) -> bool {
        self.index.is_some()
    }

    /// Opens at `index`, clamped to the loaded range. No-op without items.
    pub fn open(&mut self, index: usize, len: usize) {
        self.index = (len > 0).then(|| index.min(len - 1));
    }

    pub fn close(&mut self) {
        self.index = None;
    }

    pub fn next(&mut self, len: usize) -> Option<usize> {
        if let Some(i) = self.index {
            self.index = Some((i + 1).min(len.saturating_sub(1)));
        }
        self.index
    }

    pub fn prev(&mut self) -> Option<usize> {
        if let Some(i) = self.index {
            self.index = Some(i.saturating_sub(1));
        }
        self.index
    }

    /// True when the viewer is near the end and another page could be
    /// requested right now.
    pub fn wants_more(&self, len: usize, has_more: bool, loading: bool) -> bool {
        match self.index {
            Some(i) => has_more && !loading && i + PREFETCH_WINDOW > len,
            None => false,
        }
    }
}
