//! In-memory configuration store.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::cell::RefCell;
use rill_core::Value;
use rill_reactive::{ConfigStore, Disposable, ObservableExt, Subject};

/// Key/value configuration with per-key change notifications.
#[derive(Default)]
pub struct MemoryConfig {
    values: RefCell<BTreeMap<String, Value>>,
    watchers: RefCell<BTreeMap<String, Subject<Value>>>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an initial value without notifying.
    pub fn with(self, key: &str, value: impl Into<Value>) -> Self {
        self.values.borrow_mut().insert(key.to_string(), value.into());
        self
    }

    /// Sets a value, notifying watchers of `key` if it changed.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let previous = self
            .values
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        if previous.as_ref() != Some(&value) {
            self.notify(key, &value);
        }
    }

    /// Removes a value, notifying watchers with `Value::Null`.
    pub fn unset(&self, key: &str) {
        let previous = self.values.borrow_mut().remove(key);
        if previous.is_some() {
            self.notify(key, &Value::Null);
        }
    }

    /// Returns the number of change callbacks registered for `key`.
    pub fn watcher_count(&self, key: &str) -> usize {
        self.watchers
            .borrow()
            .get(key)
            .map_or(0, Subject::observer_count)
    }

    fn notify(&self, key: &str, value: &Value) {
        let watchers = self.watchers.borrow().get(key).cloned();
        if let Some(watchers) = watchers {
            watchers.next(value);
        }
    }
}

impl ConfigStore for MemoryConfig {
    fn get(&self, key: &str) -> Value {
        self.values.borrow().get(key).cloned().unwrap_or(Value::Null)
    }

    fn on_did_change(&self, key: &str, callback: Box<dyn Fn(&Value)>) -> Disposable {
        let watchers = self
            .watchers
            .borrow_mut()
            .entry(key.to_string())
            .or_default()
            .clone();
        watchers.subscribe(move |value| callback(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn test_set_notifies_only_on_change() {
        let config = MemoryConfig::new().with("theme", "dark");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let handle = config.on_did_change(
            "theme",
            Box::new(move |v: &Value| seen_clone.borrow_mut().push(v.clone())),
        );

        config.set("theme", "dark");
        config.set("theme", "light");
        config.set("other", true);
        config.unset("theme");

        assert_eq!(*seen.borrow(), vec![Value::from("light"), Value::Null]);
        assert_eq!(config.get("theme"), Value::Null);

        handle.dispose();
        assert_eq!(config.watcher_count("theme"), 0);
    }
}
