//! Error storage with change notification.
//!
//! Errors are kept in two independent namespaces. Internal errors are
//! recomputed on every change notification; user errors come from explicit
//! validation calls and survive internal re-validation of other properties.

use std::collections::{BTreeMap, BTreeSet};

use crate::notify::{Channel, ErrorsChanged};
use crate::outcome::ErrorPayload;

/// Which of the two error maps an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorNamespace {
    /// Errors raised by explicit, caller-invoked validation.
    User,
    /// Errors raised automatically by change-triggered validation.
    Internal,
}

impl ErrorNamespace {
    /// Whether this is the change-triggered namespace.
    pub fn is_internal(self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Property name to ordered error lists, for both namespaces.
///
/// A property present in either map always has at least one error.
#[derive(Debug)]
pub struct ErrorStore {
    user: BTreeMap<String, Vec<ErrorPayload>>,
    internal: BTreeMap<String, Vec<ErrorPayload>>,
    errors_changed: Channel<ErrorsChanged>,
}

impl ErrorStore {
    /// Creates an empty store publishing to `errors_changed`.
    pub fn new(errors_changed: Channel<ErrorsChanged>) -> Self {
        Self {
            user: BTreeMap::new(),
            internal: BTreeMap::new(),
            errors_changed,
        }
    }

    fn map_mut(&mut self, namespace: ErrorNamespace) -> &mut BTreeMap<String, Vec<ErrorPayload>> {
        match namespace {
            ErrorNamespace::User => &mut self.user,
            ErrorNamespace::Internal => &mut self.internal,
        }
    }

    /// Stores `errors` for `property`.
    ///
    /// Errors are inserted at the front so the latest failure comes first.
    /// Warnings are appended behind existing errors instead.
    pub fn add_errors(
        &mut self,
        property: &str,
        errors: Vec<ErrorPayload>,
        namespace: ErrorNamespace,
        warning: bool,
    ) {
        if errors.is_empty() {
            return;
        }

        log::debug!(
            "Adding {} {:?} {} for '{}'",
            errors.len(),
            namespace,
            if warning { "warning(s)" } else { "error(s)" },
            property
        );

        let list = self.map_mut(namespace).entry(property.to_string()).or_default();
        for error in errors {
            if warning {
                list.push(error);
            } else {
                list.insert(0, error);
            }
        }

        self.raise_errors_changed(property);
    }

    /// Removes the internal errors of `property`, and its user errors too
    /// unless `internal_only` is set.
    ///
    /// Returns whether anything was removed.
    pub fn clear(&mut self, property: &str, internal_only: bool) -> bool {
        let mut removed = self.internal.remove(property).is_some();
        if !internal_only {
            removed |= self.user.remove(property).is_some();
        }

        if removed {
            log::trace!("Cleared errors for '{}' (internal only: {})", property, internal_only);
            self.raise_errors_changed(property);
        }
        removed
    }

    /// Applies [`clear`](Self::clear) to every property with errors.
    pub fn clear_all(&mut self, internal_only: bool) -> bool {
        let mut removed = false;
        for property in self.property_names() {
            removed |= self.clear(&property, internal_only);
        }
        removed
    }

    /// Errors for `property`, internal first, or for every property when
    /// `property` is `None` or empty.
    pub fn errors(&self, property: Option<&str>) -> Vec<ErrorPayload> {
        match property {
            None | Some("") => self
                .property_names()
                .iter()
                .flat_map(|name| self.property_errors(name))
                .collect(),
            Some(name) => self.property_errors(name).collect(),
        }
    }

    fn property_errors(&self, property: &str) -> impl Iterator<Item = ErrorPayload> {
        let internal = self.internal.get(property).into_iter().flatten();
        let user = self.user.get(property).into_iter().flatten();
        internal.chain(user).cloned()
    }

    /// Errors stored in one namespace only.
    pub fn namespace_errors(&self, property: &str, namespace: ErrorNamespace) -> &[ErrorPayload] {
        let map = match namespace {
            ErrorNamespace::User => &self.user,
            ErrorNamespace::Internal => &self.internal,
        };
        map.get(property).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether any property carries an error in either namespace.
    pub fn has_errors(&self) -> bool {
        !self.user.is_empty() || !self.internal.is_empty()
    }

    /// Whether `property` carries an error in either namespace.
    pub fn property_has_errors(&self, property: &str) -> bool {
        self.user.contains_key(property) || self.internal.contains_key(property)
    }

    /// Names with errors in either namespace, sorted.
    pub fn property_names(&self) -> Vec<String> {
        self.user
            .keys()
            .chain(self.internal.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Total number of stored errors across both namespaces.
    pub fn error_count(&self) -> usize {
        self.user.values().chain(self.internal.values()).map(Vec::len).sum()
    }

    fn raise_errors_changed(&self, property: &str) {
        self.errors_changed.publish(&ErrorsChanged {
            property: property.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn store_with_log() -> (ErrorStore, Rc<RefCell<Vec<String>>>) {
        let channel = Channel::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        channel.subscribe(move |e: &ErrorsChanged| sink.borrow_mut().push(e.property.clone()));
        (ErrorStore::new(channel), log)
    }

    fn payloads(items: &[&str]) -> Vec<ErrorPayload> {
        items.iter().map(|s| ErrorPayload::from(*s)).collect()
    }

    #[test]
    fn test_errors_are_front_inserted() {
        let (mut store, _) = store_with_log();
        store.add_errors("p", payloads(&["e1", "e2"]), ErrorNamespace::User, false);
        store.add_errors("p", payloads(&["e3"]), ErrorNamespace::User, false);
        assert_eq!(store.errors(Some("p")), payloads(&["e3", "e2", "e1"]));
    }

    #[test]
    fn test_warnings_are_appended() {
        let (mut store, _) = store_with_log();
        store.add_errors("p", payloads(&["e1"]), ErrorNamespace::User, false);
        store.add_errors("p", payloads(&["w1", "w2"]), ErrorNamespace::User, true);
        store.add_errors("p", payloads(&["e2"]), ErrorNamespace::User, false);
        assert_eq!(store.errors(Some("p")), payloads(&["e2", "e1", "w1", "w2"]));
    }

    #[test]
    fn test_empty_add_is_silent() {
        let (mut store, log) = store_with_log();
        store.add_errors("p", Vec::new(), ErrorNamespace::Internal, false);
        assert!(!store.has_errors());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_internal_clear_keeps_user_errors() {
        let (mut store, _) = store_with_log();
        store.add_errors("p", payloads(&["user"]), ErrorNamespace::User, false);
        store.add_errors("p", payloads(&["auto"]), ErrorNamespace::Internal, false);

        assert!(store.clear("p", true));
        assert_eq!(store.errors(Some("p")), payloads(&["user"]));
        assert!(store.has_errors());

        assert!(store.clear("p", false));
        assert!(!store.has_errors());
        assert!(!store.property_has_errors("p"));
    }

    #[test]
    fn test_clear_notifies_only_on_removal() {
        let (mut store, log) = store_with_log();
        assert!(!store.clear("p", false));
        assert!(log.borrow().is_empty());

        store.add_errors("p", payloads(&["e"]), ErrorNamespace::Internal, false);
        assert!(store.clear("p", false));
        assert_eq!(*log.borrow(), vec!["p".to_string(), "p".to_string()]);
    }

    #[test]
    fn test_errors_for_all_properties() {
        let (mut store, _) = store_with_log();
        store.add_errors("b", payloads(&["b-user"]), ErrorNamespace::User, false);
        store.add_errors("a", payloads(&["a-user"]), ErrorNamespace::User, false);
        store.add_errors("a", payloads(&["a-auto"]), ErrorNamespace::Internal, false);

        let all = payloads(&["a-auto", "a-user", "b-user"]);
        assert_eq!(store.errors(None), all);
        assert_eq!(store.errors(Some("")), all);
        assert_eq!(store.error_count(), 3);
        assert!(store.errors(Some("missing")).is_empty());
    }

    #[test]
    fn test_clear_all_internal() {
        let (mut store, _) = store_with_log();
        store.add_errors("a", payloads(&["auto"]), ErrorNamespace::Internal, false);
        store.add_errors("b", payloads(&["user"]), ErrorNamespace::User, false);

        assert!(store.clear_all(true));
        assert_eq!(store.property_names(), vec!["b".to_string()]);
        assert!(!store.clear_all(true));
        assert!(store.clear_all(false));
        assert!(!store.has_errors());
    }
}
