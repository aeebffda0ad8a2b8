//! Node selection events.
//!
//! A surface owns the sending half and reports which node id was picked; the
//! host owns the receiving half and the [`Selection`] state, and decides what
//! to do with the resolved service.

use std::collections::HashSet;
use std::sync::mpsc;

use tracing::debug;

use crate::compose::{ConfigModel, ServiceDescriptor};
use crate::error::{Error, Result};
use crate::graph::Graph;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    Selected(String),
    Cleared,
}

#[derive(Debug, Clone)]
pub struct SelectionSender(mpsc::Sender<SelectionEvent>);

#[derive(Debug)]
pub struct SelectionReceiver(mpsc::Receiver<SelectionEvent>);

pub fn selection_channel() -> (SelectionSender, SelectionReceiver) {
    let (tx, rx) = mpsc::channel();
    (SelectionSender(tx), SelectionReceiver(rx))
}

impl SelectionSender {
    /// Returns `false` once the host has dropped its receiver.
    pub fn send(&self, event: SelectionEvent) -> bool {
        self.0.send(event).is_ok()
    }
}

impl SelectionReceiver {
    /// Events queued so far, without blocking.
    pub fn drain(&self) -> Vec<SelectionEvent> {
        self.0.try_iter().collect()
    }
}

/// Surface-side event source: knows which node ids are currently drawn and
/// where to report picks.
#[derive(Debug, Default)]
pub struct NodeSelector {
    events: Option<SelectionSender>,
    known: HashSet<String>,
}

impl NodeSelector {
    pub fn attach(&mut self, events: SelectionSender) {
        self.events = Some(events);
    }

    /// Remember the node ids of the graph just drawn.
    pub fn track(&mut self, graph: &Graph) {
        self.known = graph.nodes.iter().map(|n| n.id.clone()).collect();
    }

    pub fn select(&self, id: &str) -> Result<()> {
        if !self.known.contains(id) {
            return Err(Error::Selection(id.to_string()));
        }
        self.emit(SelectionEvent::Selected(id.to_string()));
        Ok(())
    }

    pub fn clear(&self) {
        self.emit(SelectionEvent::Cleared);
    }

    fn emit(&self, event: SelectionEvent) {
        if let Some(events) = &self.events {
            if !events.send(event) {
                debug!("selection receiver dropped");
            }
        }
    }
}

/// Host-side selection state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    current: Option<String>,
}

impl Selection {
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Apply one event and resolve the result against `config`.
    ///
    /// An id that is not in `config` (for example after the config changed
    /// under a stale surface) clears the selection.
    pub fn apply<'a>(
        &mut self,
        event: SelectionEvent,
        config: &'a ConfigModel,
    ) -> Option<&'a ServiceDescriptor> {
        self.current = match event {
            SelectionEvent::Selected(id) if config.contains_key(&id) => Some(id),
            SelectionEvent::Selected(_) | SelectionEvent::Cleared => None,
        };
        self.resolve(config)
    }

    pub fn resolve<'a>(&self, config: &'a ConfigModel) -> Option<&'a ServiceDescriptor> {
        config.get(self.current.as_deref()?)
    }
}
