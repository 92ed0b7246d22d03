//! Scroll scheduler
//!
//! One tick advances every active segment by one column: the segment's
//! frame contents shift left, the renderer supplies the column entering on
//! the right, and the whole segment is staged on the display. A single
//! refresh then pushes all touched columns to the hardware.

use core::ops::Range;

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::font::Font;
use crate::message::Mailbox;
use crate::render::ScrollRenderer;
use crate::traits::{DisplayDriver, DisplayError};

/// A run of display columns scrolling its own message
pub struct ScrollSegment<'a, M: RawMutex> {
    /// Display columns covered by this segment
    pub columns: Range<u16>,
    /// Column source
    pub renderer: ScrollRenderer,
    /// Where new messages for this segment arrive
    pub mailbox: &'a Mailbox<M>,
    /// Inactive segments are frozen
    pub active: bool,
}

impl<'a, M: RawMutex> ScrollSegment<'a, M> {
    /// Create an active segment
    pub fn new(columns: Range<u16>, renderer: ScrollRenderer, mailbox: &'a Mailbox<M>) -> Self {
        Self {
            columns,
            renderer,
            mailbox,
            active: true,
        }
    }
}

/// Fixed-interval column scheduler owning the display frame buffer
pub struct ScrollScheduler<const COLUMNS: usize> {
    frame: [u8; COLUMNS],
    interval_ms: u32,
    next_due_ms: Option<u64>,
    ticks: u32,
}

impl<const COLUMNS: usize> ScrollScheduler<COLUMNS> {
    /// Create a scheduler ticking every `interval_ms`
    pub const fn new(interval_ms: u32) -> Self {
        Self {
            frame: [0; COLUMNS],
            interval_ms,
            next_due_ms: None,
            ticks: 0,
        }
    }

    /// Check whether a tick is due at `now_ms`, consuming it if so
    ///
    /// A late check runs one tick and re-anchors the schedule to `now_ms`
    /// instead of bursting through the missed ticks.
    pub fn due(&mut self, now_ms: u64) -> bool {
        let interval = self.interval_ms as u64;
        match self.next_due_ms {
            None => {
                self.next_due_ms = Some(now_ms + interval);
                true
            }
            Some(due) if now_ms >= due => {
                let next = due + interval;
                self.next_due_ms = Some(if now_ms >= next { now_ms + interval } else { next });
                true
            }
            Some(_) => false,
        }
    }

    /// Advance every active segment by one column and refresh once
    pub fn tick<M, F, D>(
        &mut self,
        segments: &mut [ScrollSegment<'_, M>],
        font: &F,
        driver: &mut D,
    ) -> Result<(), DisplayError>
    where
        M: RawMutex,
        F: Font,
        D: DisplayDriver,
    {
        let mut dirty: Option<Range<u16>> = None;

        for segment in segments.iter_mut().filter(|s| s.active) {
            let start = segment.columns.start as usize;
            let end = (segment.columns.end as usize).min(COLUMNS);
            if start >= end {
                continue;
            }

            let column = segment.renderer.next_column(segment.mailbox, font);
            self.frame.copy_within(start + 1..end, start);
            self.frame[end - 1] = column;

            for index in start..end {
                driver.set_column(index as u16, self.frame[index])?;
            }

            let touched = start as u16..end as u16;
            dirty = Some(match dirty {
                Some(r) => r.start.min(touched.start)..r.end.max(touched.end),
                None => touched,
            });
        }

        if let Some(range) = dirty {
            driver.refresh(range)?;
        }
        self.ticks = self.ticks.wrapping_add(1);
        Ok(())
    }

    /// Blank the frame and every column the display has
    pub fn clear<D: DisplayDriver>(&mut self, driver: &mut D) -> Result<(), DisplayError> {
        self.frame = [0; COLUMNS];
        let columns = driver.columns().min(COLUMNS as u16);
        for index in 0..columns {
            driver.set_column(index, 0)?;
        }
        driver.refresh(0..columns)
    }

    /// Current frame contents
    pub fn frame(&self) -> &[u8; COLUMNS] {
        &self.frame
    }

    /// When the next tick falls due; `None` before the first tick
    pub fn next_due_ms(&self) -> Option<u64> {
        self.next_due_ms
    }

    /// Ticks performed (wraps)
    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}
