//! Fixed-capacity, append-only task registry.
//!
//! Slots are handed out in registration order and are never reused. A
//! killed task keeps its slot (and its identifier) forever, so a registry
//! of capacity `N` accepts exactly `N` registrations over its lifetime.

use super::{TaskDefinition, TaskFlags, TaskId, Tcb};
use crate::error::{Error, RegistrationError};

pub(crate) struct Registry<const N: usize> {
    slots: [Option<Tcb>; N],
    len: usize,
    next_id: u32,
}

impl<const N: usize> Registry<N> {
    pub(crate) const fn new() -> Self {
        Registry {
            slots: [None; N],
            len: 0,
            next_id: 0,
        }
    }

    /// Append a new task control block.
    pub(crate) fn register(&mut self, def: TaskDefinition) -> Result<TaskId, RegistrationError> {
        if def.period() == 0 {
            return Err(RegistrationError::InvalidDefinition("period must be at least one tick"));
        }
        if self.len >= N {
            return Err(RegistrationError::Full { capacity: N });
        }

        let id = TaskId::new(self.next_id);
        self.slots[self.len] = Some(Tcb::new(id, def));
        self.len += 1;
        self.next_id += 1;
        Ok(id)
    }

    /// Mark a task as dead. It keeps running if it is mid-execution.
    pub(crate) fn kill(&mut self, id: TaskId) -> Result<usize, Error> {
        let index = self.position(id).ok_or(Error::KillNotFound(id))?;
        if let Some(tcb) = self.slots[index].as_mut() {
            tcb.flags.remove(TaskFlags::ALIVE);
        }
        Ok(index)
    }

    pub(crate) fn position(&self, id: TaskId) -> Option<usize> {
        self.iter().position(|tcb| tcb.id == id)
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Tcb> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Tcb> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    pub(crate) fn find(&self, id: TaskId) -> Option<&Tcb> {
        self.iter().find(|tcb| tcb.id == id)
    }

    /// Registered tasks in registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tcb> + '_ {
        self.slots[..self.len].iter().flatten()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}
