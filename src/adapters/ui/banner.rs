//! Neon ASCII banner with a vertical gradient (FOOTY IQ).

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// Pitch green (#1db954).
const PITCH_GREEN: (u8, u8, u8) = (0x1d, 0xb9, 0x54);
/// Chalk white (#f4f4f4).
const CHALK_WHITE: (u8, u8, u8) = (0xf4, 0xf4, 0xf4);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let r = (f64::from(a.0) * (1.0 - t) + f64::from(b.0) * t).round() as u8;
    let g = (f64::from(a.1) * (1.0 - t) + f64::from(b.1) * t).round() as u8;
    let bl = (f64::from(a.2) * (1.0 - t) + f64::from(b.2) * t).round() as u8;
    (r, g, bl)
}

/// Render `text` with the bundled standard FIGlet font, or plain text if that fails.
fn render(text: &str) -> String {
    FIGfont::standard()
        .ok()
        .and_then(|font| font.convert(text).map(|figure| figure.to_string()))
        .unwrap_or_else(|| text.to_string())
}

/// Prints the welcome banner with a gradient from pitch green to chalk white, then the version.
pub fn print_welcome() {
    let mut out = stdout();
    let art = render("FOOTY IQ");
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let (r, g, b) = lerp_rgb(PITCH_GREEN, CHALK_WHITE, t);
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let version = env!("CARGO_PKG_VERSION");
    let _ = out.execute(SetForegroundColor(Color::Rgb {
        r: PITCH_GREEN.0,
        g: PITCH_GREEN.1,
        b: PITCH_GREEN.2,
    }));
    let _ = out.execute(Print(format!("quiz-session v{}\r\n", version)));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp_rgb(PITCH_GREEN, CHALK_WHITE, 0.0), PITCH_GREEN);
        assert_eq!(lerp_rgb(PITCH_GREEN, CHALK_WHITE, 1.0), CHALK_WHITE);
    }

    #[test]
    fn render_produces_multiline_art() {
        assert!(render("IQ").lines().count() > 1);
    }
}
