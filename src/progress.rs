//! Terminal progress for the `import` command.
//!
//! The executor only says "in flight" and "done". While the batch call is
//! outstanding a background ticker eases the bar toward 95%; the bar reaches
//! 100% only once the executor reports `Done`.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};

use crate::executor::{ImportProgress, ProgressSink};

const TICK: Duration = Duration::from_millis(120);
const CEILING: u64 = 95;

pub struct CosmeticProgress {
    bar: ProgressBar,
    stop: Arc<AtomicBool>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl CosmeticProgress {
    pub fn new(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new(100);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {pos:>3}%")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(message.into());
        Self {
            bar,
            stop: Arc::new(AtomicBool::new(false)),
            ticker: Mutex::new(None),
        }
    }

    /// Next cosmetic position: closes a tenth of the remaining gap, never
    /// decreasing and never passing the ceiling.
    pub fn eased(position: u64) -> u64 {
        if position >= CEILING {
            return CEILING.max(position);
        }
        (position + (CEILING - position).div_ceil(10)).min(CEILING)
    }

    fn start(&self) {
        self.stop.store(false, Ordering::Release);
        let bar = self.bar.clone();
        let stop = Arc::clone(&self.stop);
        let handle = thread::spawn(move || {
            while !stop.load(Ordering::Acquire) {
                bar.set_position(Self::eased(bar.position()));
                thread::sleep(TICK);
            }
        });
        if let Ok(mut slot) = self.ticker.lock() {
            *slot = Some(handle);
        }
    }

    fn finish(&self) {
        self.stop.store(true, Ordering::Release);
        if let Ok(mut slot) = self.ticker.lock()
            && let Some(handle) = slot.take()
        {
            let _ = handle.join();
        }
        self.bar.set_position(100);
        self.bar.finish();
    }
}

impl ProgressSink for CosmeticProgress {
    fn report(&self, progress: ImportProgress) {
        match progress {
            ImportProgress::InFlight => self.start(),
            ImportProgress::Done => self.finish(),
        }
    }
}

impl Drop for CosmeticProgress {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}
