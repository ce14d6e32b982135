// ABOUTME: The single open grant/reject detail form
// ABOUTME: Opening another filing's form discards the previous one

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Grant,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenForm {
    pub filing_id: i64,
    pub kind: FormKind,
}

#[derive(Debug, Default)]
pub struct FormSlot {
    open: Option<OpenForm>,
}

impl FormSlot {
    pub fn current(&self) -> Option<OpenForm> {
        self.open
    }

    pub fn is_open_for(&self, filing_id: i64, kind: FormKind) -> bool {
        self.open == Some(OpenForm { filing_id, kind })
    }

    /// Opens the form, returning whatever different form it replaced
    pub fn open(&mut self, filing_id: i64, kind: FormKind) -> Option<OpenForm> {
        let next = OpenForm { filing_id, kind };
        let previous = self.open.replace(next).filter(|prev| *prev != next);
        if let Some(prev) = previous {
            warn!(
                discarded_filing = prev.filing_id,
                filing_id, "Discarding unsaved {:?} form", prev.kind
            );
        }
        previous
    }

    pub fn close(&mut self) {
        self.open = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_second_filing_discards_first() {
        let mut slot = FormSlot::default();
        assert_eq!(slot.open(1, FormKind::Grant), None);
        assert!(slot.is_open_for(1, FormKind::Grant));

        let discarded = slot.open(2, FormKind::Reject);
        assert_eq!(
            discarded,
            Some(OpenForm {
                filing_id: 1,
                kind: FormKind::Grant
            })
        );
        assert!(!slot.is_open_for(1, FormKind::Grant));
        assert!(slot.is_open_for(2, FormKind::Reject));
    }

    #[test]
    fn test_reopening_same_form_discards_nothing() {
        let mut slot = FormSlot::default();
        slot.open(3, FormKind::Grant);
        assert_eq!(slot.open(3, FormKind::Grant), None);
        slot.close();
        assert_eq!(slot.current(), None);
    }
}
