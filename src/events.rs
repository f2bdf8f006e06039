use std::fmt;

use crate::enums::ImageEventType;

/// Notification sent to image listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageEvent {
    pub event_type: ImageEventType,
    /// Frame the event is about.
    pub frame_index: usize,
}

pub type ListenerId = usize;

type Callback = Box<dyn FnMut(&ImageEvent) + Send>;

/// Listeners registered on one image, per event type.
#[derive(Default)]
pub struct EventListeners {
    next_id: ListenerId,
    listeners: Vec<(ListenerId, ImageEventType, Callback)>,
}

impl EventListeners {
    pub fn add(
        &mut self,
        event_type: ImageEventType,
        callback: impl FnMut(&ImageEvent) + Send + 'static,
    ) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, event_type, Box::new(callback)));
        id
    }

    /// Removes a listener, returns whether it was registered.
    pub fn remove(&mut self, event_type: ImageEventType, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners
            .retain(|(listener_id, listener_type, _)| !(*listener_id == id && *listener_type == event_type));
        self.listeners.len() != before
    }

    pub fn fire(&mut self, event: &ImageEvent) {
        for (_, event_type, callback) in self.listeners.iter_mut() {
            if *event_type == event.event_type {
                callback(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;

    #[test]
    fn fire_reaches_registered_listeners_only() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = EventListeners::default();
        let sink = Arc::clone(&received);
        let id = listeners.add(ImageEventType::AppendFrame, move |event| {
            sink.lock().unwrap().push(event.frame_index)
        });

        let event = ImageEvent {
            event_type: ImageEventType::AppendFrame,
            frame_index: 2,
        };
        listeners.fire(&event);
        assert!(listeners.remove(ImageEventType::AppendFrame, id));
        assert!(!listeners.remove(ImageEventType::AppendFrame, id));
        listeners.fire(&event);

        assert_eq!(*received.lock().unwrap(), vec![2]);
        assert!(listeners.is_empty());
    }
}
