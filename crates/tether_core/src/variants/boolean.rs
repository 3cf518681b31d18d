//! Predicates and toggling for boolean properties

use crate::error::Result;
use crate::property::{Property, SetOptions};

impl Property<bool> {
    pub fn is_true(&self) -> bool {
        self.value()
    }

    pub fn is_false(&self) -> bool {
        !self.value()
    }

    /// Flip the value, returning the new one
    pub fn toggle(&self, notify: bool) -> Result<bool> {
        let next = !self.value();
        self.set_with(next, SetOptions { notify, ..SetOptions::default() })
    }
}

impl Property<Option<bool>> {
    /// False when absent
    pub fn is_true(&self) -> bool {
        self.value() == Some(true)
    }

    /// False when absent
    pub fn is_false(&self) -> bool {
        self.value() == Some(false)
    }

    pub fn is_null(&self) -> bool {
        self.value().is_none()
    }

    /// Flip the value; an absent value counts as `false`
    pub fn toggle(&self, notify: bool) -> Result<bool> {
        let next = !self.value().unwrap_or(false);
        self.set_with(Some(next), SetOptions { notify, ..SetOptions::default() })?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Property, ViewModel};

    #[test]
    fn test_toggle_notifies() {
        let vm = ViewModel::new();
        let enabled = vm.property("enabled", false);
        let mut rx = vm.subscribe_changes().unwrap();

        assert!(enabled.toggle(true).unwrap());
        assert!(enabled.is_true());
        let batch = rx.try_recv().unwrap();
        assert_eq!(batch[0].next::<bool>(), Some(&true));

        assert!(!enabled.toggle(false).unwrap());
        assert!(enabled.is_false());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_nullable_predicates() {
        let accepted = Property::new(None::<bool>);
        assert!(!accepted.is_true());
        assert!(!accepted.is_false());
        assert!(accepted.is_null());

        // Silent toggle works on an unbound property
        assert!(accepted.toggle(false).unwrap());
        assert_eq!(accepted.value(), Some(true));
        assert!(accepted.toggle(true).is_err());
    }
}
