use log::warn;
use serde::{Deserialize, Serialize};

/// Where the warm-up counter currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Step size only, before the first mass-matrix window.
    InitialBuffer,
    /// Step size and mass-matrix accumulation.
    Window,
    /// Step size only, after the last window.
    TerminalBuffer,
    /// Warm-up over, nothing adapts any more.
    Frozen,
}

/// Three-phase warm-up schedule with doubling mass-matrix windows.
///
/// A pure function of the iteration counter. For `n_adapts = 1000` and the
/// default 75 / 25 / 50 buffers the window ends fall on
/// ```text
/// 99, 149, 249, 449, 949
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSchedule {
    n: usize,
    n_adapts: usize,
    init_buffer: usize,
    term_buffer: usize,
    window_size: usize,
    next_window: usize,
}

impl WindowSchedule {
    pub fn new(
        n_adapts: usize,
        init_buffer: usize,
        term_buffer: usize,
        window_size: usize,
    ) -> Self {
        if n_adapts < 20 {
            warn!("no mass matrix estimation for n_adapts < 20 (got {n_adapts})");
            // one buffer spanning the whole warm-up, no window ever ends
            return WindowSchedule {
                n: 0,
                n_adapts,
                init_buffer: n_adapts,
                term_buffer: 0,
                window_size: 0,
                next_window: n_adapts,
            };
        }
        let (init_buffer, term_buffer, window_size) =
            if init_buffer + window_size + term_buffer > n_adapts {
                let init = (0.15 * n_adapts as f64) as usize;
                let term = (0.1 * n_adapts as f64) as usize;
                let window = n_adapts - (init + term);
                warn!(
                    "{n_adapts} warm-up iterations are too few for buffers {init_buffer}/{window_size}/{term_buffer}, \
                     using {init}/{window}/{term} instead"
                );
                (init, term, window)
            } else {
                (init_buffer, term_buffer, window_size)
            };
        WindowSchedule {
            n: 0,
            n_adapts,
            init_buffer,
            term_buffer,
            window_size,
            next_window: (init_buffer + window_size).saturating_sub(1),
        }
    }

    /// Advance the counter by one iteration. Returns `false` once frozen.
    pub fn advance(&mut self) -> bool {
        if self.n < self.n_adapts {
            self.n += 1;
            true
        } else {
            false
        }
    }

    pub fn iteration(&self) -> usize {
        self.n
    }

    pub fn n_adapts(&self) -> usize {
        self.n_adapts
    }

    pub fn next_window(&self) -> usize {
        self.next_window
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn is_final(&self) -> bool {
        self.n == self.n_adapts
    }

    /// Mass-matrix samples are accumulated only here.
    pub fn in_adaptation(&self) -> bool {
        self.n >= self.init_buffer
            && self.n < self.n_adapts.saturating_sub(self.term_buffer)
            && self.n != self.n_adapts
    }

    pub fn is_window_end(&self) -> bool {
        self.n == self.next_window && self.n != self.n_adapts
    }

    fn last_window_end(&self) -> usize {
        self.n_adapts.saturating_sub(self.term_buffer + 1)
    }

    /// Double the window and place its end, clamping onto the last boundary
    /// before the terminal buffer when the following window would not fit.
    pub fn compute_next_window(&mut self) {
        if self.next_window == self.last_window_end() {
            return;
        }
        self.window_size *= 2;
        self.next_window = self.n + self.window_size;
        if self.next_window != self.last_window_end() {
            let next_boundary = self.next_window + 2 * self.window_size;
            if next_boundary >= self.n_adapts.saturating_sub(self.term_buffer) {
                self.next_window = self.last_window_end();
            }
        }
    }

    pub fn phase(&self) -> Phase {
        if self.n >= self.n_adapts {
            Phase::Frozen
        } else if self.n < self.init_buffer {
            Phase::InitialBuffer
        } else if self.n < self.n_adapts.saturating_sub(self.term_buffer) {
            Phase::Window
        } else {
            Phase::TerminalBuffer
        }
    }
}
