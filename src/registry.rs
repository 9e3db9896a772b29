//! Name → actor handle directory.

use crate::actor::ActorHandle;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Thread-safe directory of named actors. Cloning yields another handle to the same directory.
#[derive(Debug, Clone, Default)]
pub struct Registry {
  inner: Arc<RwLock<HashMap<String, Arc<dyn ActorHandle>>>>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, name: &str) -> Option<Arc<dyn ActorHandle>> {
    self.inner.read().get(name).cloned()
  }

  /// Registers `handle` under `name`, returning the handle it replaced.
  pub fn set(&self, name: impl Into<String>, handle: Arc<dyn ActorHandle>) -> Option<Arc<dyn ActorHandle>> {
    let name = name.into();
    tracing::debug!(%name, address = %handle.address(), "Registered actor");
    self.inner.write().insert(name, handle)
  }

  pub fn delete(&self, name: &str) -> Option<Arc<dyn ActorHandle>> {
    let removed = self.inner.write().remove(name);
    if removed.is_some() {
      tracing::debug!(%name, "Unregistered actor");
    }
    removed
  }

  /// Registered names, sorted.
  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.inner.read().keys().cloned().collect();
    names.sort();
    names
  }

  pub fn clear(&self) {
    self.inner.write().clear();
  }

  pub fn len(&self) -> usize {
    self.inner.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.read().is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Result;
  use crate::runtime::Address;
  use std::time::Duration;

  #[derive(Debug)]
  struct Stub(Address);

  impl ActorHandle for Stub {
    fn address(&self) -> Address {
      self.0
    }
    fn terminate(&self) -> Result<()> {
      Ok(())
    }
    fn join(&self, _timeout: Option<Duration>) -> Result<()> {
      Ok(())
    }
    fn kill(&self) -> Result<()> {
      Ok(())
    }
  }

  #[test]
  fn set_get_delete_clear() {
    let registry = Registry::new();
    let first: Arc<dyn ActorHandle> = Arc::new(Stub(Address::next()));
    let second: Arc<dyn ActorHandle> = Arc::new(Stub(Address::next()));

    assert!(registry.set("b", first.clone()).is_none());
    assert!(registry.set("a", second.clone()).is_none());
    assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(registry.get("b").unwrap().address(), first.address());

    let replaced = registry.set("b", second.clone()).unwrap();
    assert_eq!(replaced.address(), first.address());

    assert!(registry.delete("a").is_some());
    assert!(registry.delete("a").is_none());
    assert!(registry.get("a").is_none());

    registry.clear();
    assert!(registry.is_empty());
  }
}
