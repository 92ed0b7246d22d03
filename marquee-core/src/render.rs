//! Scroll renderer
//!
//! Pull-based column generator. Each call to
//! [`ScrollRenderer::next_column`] yields exactly one pixel column, walking
//! the current message glyph by glyph, inserting inter-character spacing and
//! a wider end-of-message gap, and looping back to the start indefinitely.
//!
//! The state machine itself is the pure [`advance`] function; the renderer
//! only adds the message swap at the pass boundary.
//!
//! ```text
//!   Idle ──► NextChar ──► ShowChar ──► ShowSpace ──┐
//!    ▲          │  ▲                               │
//!    └── end ───┘  └───────────────────────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::font::{Font, Glyph};
use crate::message::{Mailbox, Message};

/// Default blank columns between characters
pub const DEFAULT_CHAR_SPACING: u8 = 1;

/// Spacing parameters for a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RenderConfig {
    char_spacing: u8,
    end_gap: u8,
}

impl RenderConfig {
    /// Create a config
    ///
    /// `end_gap` is raised to at least one column so that every pass,
    /// including one over an empty message, produces output.
    pub const fn new(char_spacing: u8, end_gap: u8) -> Self {
        Self {
            char_spacing,
            end_gap: if end_gap == 0 { 1 } else { end_gap },
        }
    }

    /// Config with the end gap sized to half of a display `columns` wide
    pub fn for_display(columns: u16, char_spacing: u8) -> Self {
        let half = (columns / 2).min(u8::MAX as u16) as u8;
        Self::new(char_spacing, half)
    }

    /// Blank columns between characters
    pub fn char_spacing(&self) -> u8 {
        self.char_spacing
    }

    /// Blank columns after the last character
    pub fn end_gap(&self) -> u8 {
        self.end_gap
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        // Four 8x8 modules
        Self::for_display(32, DEFAULT_CHAR_SPACING)
    }
}

/// Render cursor
///
/// `pos` is always the index of the next character to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderState {
    /// Between passes; the message may be swapped here and only here
    Idle,
    /// Load the glyph at `pos`, or finish the pass
    NextChar { pos: usize },
    /// Emitting column `col` of `glyph`
    ShowChar { pos: usize, glyph: Glyph, col: u8 },
    /// Emitting blank columns, `remaining` still to go (never zero)
    ShowSpace { pos: usize, remaining: u8 },
}

/// Step the state machine once
///
/// Returns the next state and the column emitted by this step, if any.
/// `Idle` and `NextChar` never emit; `ShowChar` and `ShowSpace` always do.
pub fn advance<F: Font>(
    state: RenderState,
    message: &Message,
    font: &F,
    config: &RenderConfig,
) -> (RenderState, Option<u8>) {
    match state {
        RenderState::Idle => {
            if message.is_empty() {
                (space_then_next(0, config.end_gap), None)
            } else {
                (RenderState::NextChar { pos: 0 }, None)
            }
        }
        RenderState::NextChar { pos } => match message.get(pos) {
            None => (RenderState::Idle, None),
            Some(ch) => {
                let glyph = font.glyph(ch);
                let next = pos + 1;
                if glyph.width() == 0 {
                    (space_then_next(next, gap_after(next, message, config)), None)
                } else {
                    (
                        RenderState::ShowChar {
                            pos: next,
                            glyph,
                            col: 0,
                        },
                        None,
                    )
                }
            }
        },
        RenderState::ShowChar { pos, glyph, col } => {
            let column = glyph.column(col);
            let col = col + 1;
            let next = if col >= glyph.width() {
                space_then_next(pos, gap_after(pos, message, config))
            } else {
                RenderState::ShowChar { pos, glyph, col }
            };
            (next, Some(column))
        }
        RenderState::ShowSpace { pos, remaining } => {
            (space_then_next(pos, remaining.saturating_sub(1)), Some(0))
        }
    }
}

/// Gap following the character that ends just before `pos`
fn gap_after(pos: usize, message: &Message, config: &RenderConfig) -> u8 {
    if pos < message.len() {
        config.char_spacing
    } else {
        config.end_gap
    }
}

fn space_then_next(pos: usize, columns: u8) -> RenderState {
    if columns == 0 {
        RenderState::NextChar { pos }
    } else {
        RenderState::ShowSpace {
            pos,
            remaining: columns,
        }
    }
}

/// Column generator for one scrolling segment
#[derive(Debug, Clone)]
pub struct ScrollRenderer {
    current: Message,
    state: RenderState,
    config: RenderConfig,
    passes: u32,
}

impl ScrollRenderer {
    /// Create a renderer with an empty message
    pub const fn new(config: RenderConfig) -> Self {
        Self {
            current: Message::new(),
            state: RenderState::Idle,
            config,
            passes: 0,
        }
    }

    /// Produce the next pixel column
    ///
    /// When a pass begins, a pending message in `mailbox` replaces the
    /// current one. Never blocks and never allocates.
    pub fn next_column<M: RawMutex, F: Font>(&mut self, mailbox: &Mailbox<M>, font: &F) -> u8 {
        loop {
            if matches!(self.state, RenderState::Idle) {
                if let Some(message) = mailbox.take() {
                    self.current = message;
                }
                self.passes = self.passes.wrapping_add(1);
            }

            let (next, column) = advance(self.state, &self.current, font, &self.config);
            self.state = next;
            if let Some(column) = column {
                return column;
            }
        }
    }

    /// Abandon the current pass; the next column starts a new one
    pub fn restart(&mut self) {
        self.state = RenderState::Idle;
    }

    /// Message being rendered
    pub fn current(&self) -> &Message {
        &self.current
    }

    /// Cursor state
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Number of passes started (wraps)
    pub fn passes(&self) -> u32 {
        self.passes
    }
}
