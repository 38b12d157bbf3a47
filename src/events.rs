//! Renderer lifecycle events and their relay.
//!
//! A renderer raises [`DriverEvent`]s while it works: frame begin/end around
//! every render, FPS updates, and render failures. The [`EventRelay`] owned by
//! the [`RenderDriver`](crate::render::driver::RenderDriver) hands each event
//! to every registered listener exactly once, synchronously, on the thread
//! that emitted it. Events raised while nobody listens are dropped.
//!
//! Renderers that produce events on their own threads (an FPS timer, for
//! instance) send them through a [`DriverEventSender`] instead. Those events
//! queue up until the UI thread calls [`EventRelay::pump`], which is how they
//! get marshaled back onto the host's UI thread.

use crate::geometry::PixelSize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Payload of frame begin/end notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderParameter {
    /// Monotonic frame counter of the renderer
    pub frame_id: u64,
    /// Renderer time at which the frame was started
    pub time_ms: i64,
    /// Physical size of the surface the frame is rendered into
    pub size: PixelSize,
}

#[derive(Debug, Clone)]
pub enum DriverEvent {
    /// Frames-per-second estimate changed
    FpsChanged { fps: u32 },
    /// A frame is about to be rendered
    FrameBegin(RenderParameter),
    /// A frame has been rendered
    FrameEnd(RenderParameter),
    /// Rendering failed. `timeout` is set when the renderer gave up because a frame took too long.
    RenderFailed { error: Arc<anyhow::Error>, timeout: bool },
}

impl DriverEvent {
    pub fn render_failed(error: anyhow::Error, timeout: bool) -> Self {
        DriverEvent::RenderFailed { error: Arc::new(error), timeout }
    }

    pub fn kind(&self) -> DriverEventKind {
        match self {
            DriverEvent::FpsChanged { .. } => DriverEventKind::FpsChanged,
            DriverEvent::FrameBegin(_) => DriverEventKind::FrameBegin,
            DriverEvent::FrameEnd(_) => DriverEventKind::FrameEnd,
            DriverEvent::RenderFailed { .. } => DriverEventKind::RenderFailed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverEventKind {
    FpsChanged,
    FrameBegin,
    FrameEnd,
    RenderFailed,
}

impl fmt::Display for DriverEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverEventKind::FpsChanged => write!(f, "FpsChanged"),
            DriverEventKind::FrameBegin => write!(f, "FrameBegin"),
            DriverEventKind::FrameEnd => write!(f, "FrameEnd"),
            DriverEventKind::RenderFailed => write!(f, "RenderFailed"),
        }
    }
}

/// Handle returned by subscriptions, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&DriverEvent)>;

/// Thread-safe sender for events raised off the UI thread.
#[derive(Debug, Clone)]
pub struct DriverEventSender {
    tx: mpsc::UnboundedSender<DriverEvent>,
}

impl DriverEventSender {
    /// Queues an event. Returns `false` once the relay is gone.
    pub fn send(&self, event: DriverEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Listener registry for driver lifecycle events.
pub struct EventRelay {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
    tx: mpsc::UnboundedSender<DriverEvent>,
    rx: mpsc::UnboundedReceiver<DriverEvent>,
}

impl Default for EventRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRelay")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventRelay {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { listeners: Vec::new(), next_id: 0, tx, rx }
    }

    /// Registers a listener for every event kind.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&DriverEvent) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn on_fps_changed<F: FnMut(u32) + 'static>(&mut self, mut f: F) -> ListenerId {
        self.subscribe(move |ev| {
            if let DriverEvent::FpsChanged { fps } = ev {
                f(*fps)
            }
        })
    }

    pub fn on_frame_begin<F: FnMut(&RenderParameter) + 'static>(&mut self, mut f: F) -> ListenerId {
        self.subscribe(move |ev| {
            if let DriverEvent::FrameBegin(p) = ev {
                f(p)
            }
        })
    }

    pub fn on_frame_end<F: FnMut(&RenderParameter) + 'static>(&mut self, mut f: F) -> ListenerId {
        self.subscribe(move |ev| {
            if let DriverEvent::FrameEnd(p) = ev {
                f(p)
            }
        })
    }

    pub fn on_render_failed<F: FnMut(&anyhow::Error, bool) + 'static>(&mut self, mut f: F) -> ListenerId {
        self.subscribe(move |ev| {
            if let DriverEvent::RenderFailed { error, timeout } = ev {
                f(error, *timeout)
            }
        })
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Sender for events raised on other threads.
    pub fn sender(&self) -> DriverEventSender {
        DriverEventSender { tx: self.tx.clone() }
    }

    /// Delivers `event` to every listener, in registration order.
    pub fn emit(&mut self, event: DriverEvent) {
        if self.listeners.is_empty() {
            log::trace!("dropping {} event, no listeners", event.kind());
            return;
        }

        if let DriverEvent::RenderFailed { error, timeout } = &event {
            log::debug!("relaying render failure (timeout: {timeout}): {error:#}");
        }

        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    /// Delivers all events queued through [`DriverEventSender`]s. Returns how
    /// many were taken off the queue.
    pub fn pump(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.emit(event);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn param(frame_id: u64) -> RenderParameter {
        RenderParameter { frame_id, time_ms: 0, size: PixelSize::new(4, 4) }
    }

    #[test]
    fn typed_listeners_only_see_their_kind() {
        let mut relay = EventRelay::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = seen.clone();
        relay.on_frame_begin(move |p| s.borrow_mut().push(format!("begin {}", p.frame_id)));
        let s = seen.clone();
        relay.on_frame_end(move |p| s.borrow_mut().push(format!("end {}", p.frame_id)));
        let s = seen.clone();
        relay.on_fps_changed(move |fps| s.borrow_mut().push(format!("fps {fps}")));
        let s = seen.clone();
        relay.on_render_failed(move |e, t| s.borrow_mut().push(format!("failed {e} {t}")));

        relay.emit(DriverEvent::FrameBegin(param(1)));
        relay.emit(DriverEvent::FrameEnd(param(1)));
        relay.emit(DriverEvent::FpsChanged { fps: 30 });
        relay.emit(DriverEvent::render_failed(anyhow::anyhow!("boom"), true));

        assert_eq!(*seen.borrow(), vec!["begin 1", "end 1", "fps 30", "failed boom true"]);
    }

    #[test]
    fn each_listener_receives_event_once() {
        let mut relay = EventRelay::new();
        let count = Rc::new(RefCell::new(0));
        for _ in 0..3 {
            let c = count.clone();
            relay.subscribe(move |_| *c.borrow_mut() += 1);
        }

        relay.emit(DriverEvent::FpsChanged { fps: 60 });
        assert_eq!(*count.borrow(), 3);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut relay = EventRelay::new();
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        let id = relay.subscribe(move |_| *c.borrow_mut() += 1);

        assert!(relay.unsubscribe(id));
        assert!(!relay.unsubscribe(id));
        relay.emit(DriverEvent::FpsChanged { fps: 1 });
        assert_eq!(*count.borrow(), 0);
        assert_eq!(relay.listener_count(), 0);
    }

    #[test]
    fn events_from_other_threads_wait_for_pump() {
        let mut relay = EventRelay::new();
        let fps = Rc::new(RefCell::new(Vec::new()));
        let f = fps.clone();
        relay.on_fps_changed(move |v| f.borrow_mut().push(v));

        let sender = relay.sender();
        std::thread::spawn(move || {
            assert!(sender.send(DriverEvent::FpsChanged { fps: 24 }));
            assert!(sender.send(DriverEvent::FpsChanged { fps: 25 }));
        })
        .join()
        .unwrap();

        assert!(fps.borrow().is_empty());
        assert_eq!(relay.pump(), 2);
        assert_eq!(*fps.borrow(), vec![24, 25]);
        assert_eq!(relay.pump(), 0);
    }

    #[test]
    fn events_without_listeners_are_dropped() {
        let mut relay = EventRelay::new();
        relay.emit(DriverEvent::FrameBegin(param(7)));
        relay.sender().send(DriverEvent::FpsChanged { fps: 2 });
        assert_eq!(relay.pump(), 1);
    }
}
