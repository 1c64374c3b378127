use std::{
    cell::{Cell, Ref, RefCell},
    fmt,
    rc::Rc,
};

/// Shared target a deferred parse writes its result into
///
/// Slots are cheap handles: cloning one yields another handle to the same
/// value. A slot starts out holding `T::default()` (or the value given to
/// [`Slot::with_value`]) and is marked assigned once a parse stores into it.
pub struct Slot<T> {
    inner: Rc<SlotInner<T>>,
}

struct SlotInner<T> {
    value: RefCell<T>,
    assigned: Cell<bool>,
}

impl<T: Default> Slot<T> {
    pub fn new() -> Self {
        Self::with_value(T::default())
    }

    /// Move the value out, leaving `T::default()` behind
    pub fn take(&self) -> T {
        self.inner.value.take()
    }
}

impl<T> Slot<T> {
    pub fn with_value(value: T) -> Self {
        Self {
            inner: Rc::new(SlotInner {
                value: RefCell::new(value),
                assigned: Cell::new(false),
            }),
        }
    }

    /// Clone the current value
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value
    pub fn borrow(&self) -> Ref<'_, T> {
        self.inner.value.borrow()
    }

    /// Whether a parse has stored a value into this slot
    pub fn is_assigned(&self) -> bool {
        self.inner.assigned.get()
    }

    /// Store a value, marking the slot assigned, and return the previous one
    pub fn replace(&self, value: T) -> T {
        self.inner.assigned.set(true);
        self.inner.value.replace(value)
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("value", &*self.inner.value.borrow())
            .field("assigned", &self.inner.assigned.get())
            .finish()
    }
}
