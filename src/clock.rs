use std::time::Instant;

/// Monotonic elapsed-time source. Starts on the first read.
#[derive(Debug, Default)]
pub struct Clock {
    start: Option<Instant>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the first call
    pub fn elapsed_time(&mut self) -> f64 {
        let start = *self.start.get_or_insert_with(Instant::now);
        start.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn starts_on_first_read() {
        let mut clock = Clock::new();
        assert!(clock.start.is_none());
        thread::sleep(Duration::from_millis(20));
        let first = clock.elapsed_time();
        assert!(clock.start.is_some());
        assert!(first < 0.02);
    }

    #[test]
    fn never_goes_backwards() {
        let mut clock = Clock::new();
        let mut last = clock.elapsed_time();
        for _ in 0..100 {
            let now = clock.elapsed_time();
            assert!(now >= last);
            last = now;
        }
    }
}
