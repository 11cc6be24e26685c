use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::tty::IsTty;
use crossterm::{cursor, execute, queue};
use std::io::{self, Write};

use crate::error::AppError;
use crate::panel::PanelLayout;

const PANEL_FOREGROUND: Color = Color::Rgb {
    r: 235,
    g: 235,
    b: 235,
};
const PANEL_BACKGROUND: Color = Color::Rgb {
    r: 31,
    g: 31,
    b: 31,
};

/// Puts the terminal in raw mode on the alternate screen with mouse capture.
/// Dropping the guard restores it, also when unwinding from a panic.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> Result<Self, AppError> {
        let mut stdout = io::stdout();
        if !stdout.is_tty() {
            return Err(AppError::NotATerminal);
        }
        terminal::enable_raw_mode()?;
        // From here on the guard restores the terminal, even if the rest fails
        let guard = TerminalGuard { _private: () };
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            io::stdout(),
            ResetColor,
            DisableMouseCapture,
            LeaveAlternateScreen,
            cursor::Show
        );
        let _ = terminal::disable_raw_mode();
    }
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb { r, g, b }
}

/// Draws images into the terminal with one `▀` per cell: the foreground is the upper
/// pixel and the background the lower one.
pub struct Presenter<W: Write> {
    out: W,
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W) -> Self {
        Presenter { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Writes a `width` x `height` pixel image (row-major) and an optional panel on top
    pub fn present(
        &mut self,
        image: &[[u8; 3]],
        width: usize,
        height: usize,
        panel: Option<(&PanelLayout, &[String])>,
    ) -> io::Result<()> {
        let black = [0, 0, 0];
        let pixel = |x: usize, y: usize| -> [u8; 3] {
            if y < height {
                image.get(y * width + x).copied().unwrap_or(black)
            } else {
                black
            }
        };

        for row in 0..height.div_ceil(2) {
            queue!(self.out, cursor::MoveTo(0, row as u16))?;
            let (mut last_top, mut last_bottom) = (None, None);
            for x in 0..width {
                let top = pixel(x, row * 2);
                let bottom = pixel(x, row * 2 + 1);
                if last_top != Some(top) {
                    queue!(self.out, SetForegroundColor(rgb(top)))?;
                    last_top = Some(top);
                }
                if last_bottom != Some(bottom) {
                    queue!(self.out, SetBackgroundColor(rgb(bottom)))?;
                    last_bottom = Some(bottom);
                }
                queue!(self.out, Print('▀'))?;
            }
        }

        if let Some((layout, lines)) = panel {
            queue!(
                self.out,
                SetForegroundColor(PANEL_FOREGROUND),
                SetBackgroundColor(PANEL_BACKGROUND)
            )?;
            for (i, line) in lines.iter().enumerate() {
                let text: String = line.chars().take(layout.width as usize).collect();
                queue!(
                    self.out,
                    cursor::MoveTo(layout.left, layout.top + i as u16),
                    Print(text)
                )?;
            }
        }

        queue!(self.out, ResetColor)?;
        self.out.flush()
    }
}
