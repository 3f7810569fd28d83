use std::thread;
use std::time::Duration;

/// Blocking wait used for the settle time after a command.
pub trait Delay {
    fn delay(&mut self, duration: Duration);
}

impl<D: Delay + ?Sized> Delay for &mut D {
    fn delay(&mut self, duration: Duration) {
        (**self).delay(duration)
    }
}

/// Sleeps the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}
