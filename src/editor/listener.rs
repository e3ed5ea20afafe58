//! Single-shot selection-change listener
//!
//! Each text selection arms one listener. The next `selectionchange` fires
//! it once and disarms it. Arming again replaces the previous listener, so
//! rapid reselection never stacks listeners.

#[derive(Debug, Default)]
pub struct SelectionListener {
    armed: Option<u64>,
    generation: u64,
}

impl SelectionListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a listener for a new selection, replacing any armed one
    pub fn arm(&mut self) -> u64 {
        self.generation += 1;
        if let Some(previous) = self.armed.replace(self.generation) {
            tracing::debug!("Selection listener {} replaced by {}", previous, self.generation);
        }
        self.generation
    }

    /// Deliver a selection change; true if an armed listener fired
    pub fn fire(&mut self) -> bool {
        self.armed.take().is_some()
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Generation of the armed listener
    pub fn armed(&self) -> Option<u64> {
        self.armed
    }
}
