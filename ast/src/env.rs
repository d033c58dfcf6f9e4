use crate::error::{Error, Result};
use std::{cell::RefCell, collections::BTreeMap, fmt::Display, rc::Rc};

/// address of a cell in a [Store]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location(pub usize);

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Frame {
    bindings: Vec<(String, Location)>,
    parent: Option<Environment>,
}

impl Frame {
    fn get(&self, name: &str) -> Option<Location> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, location)| *location)
    }
}

/// Name to location mapping with parent-chain lookup.
///
/// Cloning an [Environment] clones the handle, not the frames: closures hold
/// the handle of the environment they were created in and see every binding
/// later added through it.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    frame: Rc<RefCell<Frame>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// child frame whose lookups fall back to `self`
    pub fn extend(&self) -> Self {
        Self {
            frame: Rc::new(RefCell::new(Frame {
                bindings: vec![],
                parent: Some(self.clone()),
            })),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Location> {
        let frame = self.frame.borrow();
        let found = frame
            .get(name)
            .or_else(|| frame.parent.as_ref().and_then(|parent| parent.lookup(name)));
        found
    }

    /// every location `name` is bound to, newest first
    pub fn lookup_all(&self, name: &str) -> Vec<Location> {
        let frame = self.frame.borrow();
        let mut found = frame.get(name).into_iter().collect::<Vec<_>>();
        if let Some(parent) = &frame.parent {
            found.extend(parent.lookup_all(name));
        }
        found
    }

    /// whether the handle's own frame binds `name`
    pub fn contains(&self, name: &str) -> bool {
        self.frame.borrow().get(name).is_some()
    }

    /// Binds `name` through this handle. Names stay unique per frame: if the
    /// current frame already binds `name`, it is pushed behind a fresh frame
    /// holding the new binding, so the old location is shadowed, not lost.
    pub fn bind(&self, name: &str, location: Location) {
        let mut frame = self.frame.borrow_mut();
        if frame.get(name).is_some() {
            let shadowed = std::mem::take(&mut *frame);
            frame.parent = Some(Self {
                frame: Rc::new(RefCell::new(shadowed)),
            });
        }
        frame.bindings.push((name.to_string(), location));
    }

    /// removes `name` from the handle's own frame, parents are untouched
    pub fn unbind(&self, name: &str) {
        self.frame
            .borrow_mut()
            .bindings
            .retain(|(bound, _)| bound != name);
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let frame = self.frame.borrow();
        for (name, location) in &frame.bindings {
            writeln!(f, "  {} = {}", name, location)?;
        }
        if let Some(parent) = &frame.parent {
            writeln!(f, "parent:\n{}", parent)?;
        }
        Ok(())
    }
}

/// Location to payload mapping of one run.
///
/// The allocator lives in the store, so independent runs never share
/// location numbering. Writes consume the store and hand back the extended
/// one; every location is written at most once.
#[derive(Debug, Clone)]
pub struct Store<T> {
    cells: BTreeMap<Location, T>,
    next: usize,
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Store<T> {
    pub fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
            next: 0,
        }
    }

    pub fn allocate(&mut self) -> Location {
        let location = Location(self.next);
        self.next += 1;
        log::trace!("allocate {}", location);
        location
    }

    pub fn read(&self, location: Location) -> Result<&T> {
        self.cells
            .get(&location)
            .ok_or_else(|| Error::Internal(format!("store location {} is empty", location)))
    }

    pub fn write(mut self, location: Location, payload: T) -> Result<Self> {
        if location.0 >= self.next {
            return Err(Error::Internal(format!(
                "store location {} was never allocated",
                location
            )));
        }
        if self.cells.contains_key(&location) {
            return Err(Error::Internal(format!(
                "store location {} is already written",
                location
            )));
        }
        self.cells.insert(location, payload);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Location, &T)> {
        self.cells.iter()
    }
}

impl<T: Display> Display for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (location, payload) in &self.cells {
            writeln!(f, "{} = {}", location, payload)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Environment, Location, Store};
    use crate::error::ErrorKind;
    use anyhow::Result;

    #[test]
    fn child_inherits_parent_bindings() {
        let env = Environment::new();
        env.bind("a", Location(0));
        let child = env.extend();
        child.bind("b", Location(1));
        assert_eq!(child.lookup("a"), Some(Location(0)));
        assert_eq!(child.lookup("b"), Some(Location(1)));
        assert_eq!(env.lookup("b"), None);
    }

    #[test]
    fn shadowing_keeps_old_location() {
        let env = Environment::new();
        env.bind("a", Location(0));
        env.bind("a", Location(1));
        assert_eq!(env.lookup("a"), Some(Location(1)));
        assert_eq!(env.lookup_all("a"), vec![Location(1), Location(0)]);
    }

    #[test]
    fn captured_handle_sees_later_bindings() {
        let env = Environment::new();
        let captured = env.clone();
        env.bind("f", Location(4));
        assert_eq!(captured.lookup("f"), Some(Location(4)));
    }

    #[test]
    fn unbind_only_touches_own_frame() {
        let env = Environment::new();
        env.bind("x", Location(0));
        let child = env.extend();
        child.bind("x", Location(1));
        child.unbind("x");
        assert!(!child.contains("x"));
        assert_eq!(child.lookup("x"), Some(Location(0)));
    }

    #[test]
    fn store_locations_are_write_once() -> Result<()> {
        let mut store = Store::new();
        let a = store.allocate();
        let b = store.allocate();
        assert_ne!(a, b);
        let store = store.write(a, 1)?.write(b, 2)?;
        assert_eq!(*store.read(a)?, 1);
        let err = store.write(a, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        Ok(())
    }

    #[test]
    fn stores_do_not_share_allocators() {
        let mut first = Store::<()>::new();
        first.allocate();
        first.allocate();
        let mut second = Store::<()>::new();
        assert_eq!(second.allocate(), Location(0));
    }

    #[test]
    fn unallocated_write_fails() {
        let err = Store::new().write(Location(9), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
