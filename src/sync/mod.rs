use std::{
    fmt,
    sync::Mutex,
    time::{Duration, Instant},
};

use crate::types::control::RawControl;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StaleInputError {
    /// `None` when nothing was ever written
    pub age: Option<Duration>,
}

impl fmt::Display for StaleInputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.age {
            Some(age) => write!(f, "Last pilot command is {} ms old", age.as_millis()),
            None => write!(f, "No pilot command received"),
        }
    }
}

impl std::error::Error for StaleInputError {}

#[derive(Copy, Clone, Default)]
struct Entry<T> {
    timestamp: Option<Instant>,
    data: T,
}

impl<T: Copy> Entry<T> {
    fn read_within(&self, now: Instant, max_age: Duration) -> Result<T, StaleInputError> {
        let timestamp = self.timestamp.ok_or(StaleInputError { age: None })?;
        let age = now.saturating_duration_since(timestamp);
        if age > max_age {
            return Err(StaleInputError { age: Some(age) });
        }
        Ok(self.data)
    }
}

/// Single slot holding the latest value together with its receipt time.
///
/// Readers and writers only copy under the lock, no I/O happens while it is held.
#[derive(Default)]
pub struct Slot<T> {
    entry: Mutex<Entry<T>>,
}

impl<T: Copy> Slot<T> {
    fn entry(&self) -> Entry<T> {
        *self.entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self, data: T, now: Instant) {
        let mut entry = self.entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *entry = Entry { timestamp: Some(now), data };
    }

    /// Skips the update instead of waiting when the slot is busy
    pub fn try_write(&self, data: T, now: Instant) -> bool {
        match self.entry.try_lock() {
            Ok(mut entry) => {
                *entry = Entry { timestamp: Some(now), data };
                true
            }
            Err(_) => false,
        }
    }

    pub fn read(&self) -> T {
        self.entry().data
    }

    pub fn read_within(&self, now: Instant, max_age: Duration) -> Result<T, StaleInputError> {
        self.entry().read_within(now, max_age)
    }

    pub fn is_fresh(&self, now: Instant, max_age: Duration) -> bool {
        self.read_within(now, max_age).is_ok()
    }
}

pub type ControlSlot = Slot<RawControl>;

mod test {
    #[test]
    fn test_never_written() {
        use std::time::{Duration, Instant};

        use super::{ControlSlot, StaleInputError};

        let slot = ControlSlot::default();
        let result = slot.read_within(Instant::now(), Duration::from_millis(500));
        assert_eq!(Err(StaleInputError { age: None }), result);
    }

    #[test]
    fn test_read_within() {
        use std::time::{Duration, Instant};

        use super::{Slot, StaleInputError};

        let slot: Slot<u8> = Slot::default();
        let t0 = Instant::now();
        slot.write(7, t0);
        let window = Duration::from_millis(500);
        assert_eq!(Ok(7), slot.read_within(t0 + Duration::from_millis(500), window));
        let age = Some(Duration::from_millis(501));
        let expected = Err(StaleInputError { age });
        assert_eq!(expected, slot.read_within(t0 + Duration::from_millis(501), window));

        assert!(slot.try_write(8, t0 + Duration::from_secs(1)));
        assert!(slot.is_fresh(t0 + Duration::from_millis(1200), window));
        assert_eq!(8, slot.read());
    }

    #[test]
    fn test_concurrent_snapshot() {
        use std::{sync::Arc, thread, time::Instant};

        use super::Slot;

        let slot: Arc<Slot<(u32, u32)>> = Arc::new(Slot::default());
        let writer = {
            let slot = slot.clone();
            thread::spawn(move || {
                for i in 0..10_000u32 {
                    slot.write((i, i), Instant::now());
                }
            })
        };
        for _ in 0..10_000 {
            let (a, b) = slot.read();
            assert_eq!(a, b);
        }
        writer.join().unwrap();
    }
}
