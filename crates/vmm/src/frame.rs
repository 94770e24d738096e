use crate::page::PageKey;
use crate::typedef::FrameId;

/// One physical frame slot.
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    index: FrameId,
    occupant: Option<PageKey>,
}

impl Frame {
    pub(crate) fn new(index: FrameId) -> Self {
        Self {
            index,
            occupant: None,
        }
    }

    pub(crate) fn index(&self) -> FrameId {
        self.index
    }

    pub(crate) fn occupant(&self) -> Option<PageKey> {
        self.occupant
    }

    pub(crate) fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    pub(crate) fn occupy(&mut self, key: PageKey) {
        assert!(
            self.occupant.is_none(),
            "frame {} is already held by {:?}",
            self.index,
            self.occupant
        );
        self.occupant = Some(key);
    }

    pub(crate) fn release(&mut self) -> Option<PageKey> {
        self.occupant.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupy_and_release() {
        let mut frame = Frame::new(2);
        assert!(frame.is_free());
        frame.occupy(PageKey::new(1, 5));
        assert_eq!(frame.occupant(), Some(PageKey::new(1, 5)));
        assert_eq!(frame.release(), Some(PageKey::new(1, 5)));
        assert!(frame.is_free());
        assert_eq!(frame.index(), 2);
    }

    #[test]
    #[should_panic]
    fn test_double_occupy_panics() {
        let mut frame = Frame::new(0);
        frame.occupy(PageKey::new(1, 0));
        frame.occupy(PageKey::new(2, 0));
    }
}
