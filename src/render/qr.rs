use qrcode::{Color, EcLevel, QrCode};

use crate::Result;

/// Module matrix of one QR code.
pub struct QrMatrix {
    width: usize,
    modules: Vec<Color>,
}

/// Encodes `data` at the highest error-correction level, matching what the
/// e-paper cards have always used.
pub fn qr_matrix(data: &str) -> Result<QrMatrix> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::H)?;

    Ok(QrMatrix {
        width: code.width(),
        modules: code.to_colors(),
    })
}

impl QrMatrix {
    pub fn width(&self) -> usize {
        self.width
    }

    fn is_dark(&self, x: usize, y: usize) -> bool {
        self.modules[y * self.width + x] == Color::Dark
    }

    /// Appends the dark modules as SVG rects, right-aligned against
    /// `plot_width` like the original card layout.
    pub fn append_svg_rects(&self, box_size: f64, border: f64, plot_width: f64, out: &mut String) {
        let offset_x = plot_width - (self.width as f64 + 2.0 * border) * box_size;

        for y in 0..self.width {
            for x in 0..self.width {
                if !self.is_dark(x, y) {
                    continue;
                }

                out.push_str(&format!(
                    "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{box_size}\" height=\"{box_size}\" fill=\"#000\"/>",
                    border * box_size + x as f64 * box_size + offset_x,
                    border * box_size + y as f64 * box_size,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_a_url() {
        let matrix = qr_matrix("https://jisho.org/search/読む").unwrap();

        assert!(matrix.width() >= 21);
        // Finder pattern corner module is always dark.
        assert!(matrix.is_dark(0, 0));
    }

    #[test]
    fn emits_right_aligned_rects() {
        let matrix = qr_matrix("x").unwrap();
        let mut svg = String::new();
        matrix.append_svg_rects(3.0, 0.0, 760.0, &mut svg);

        assert!(svg.contains("<rect"));
        assert!(svg.contains("fill=\"#000\""));
    }
}
