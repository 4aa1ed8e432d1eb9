//! Generate before/after samples from a synthetic profile picture.
//!
//! Usage:
//!   cargo run -p textredact --example generate_samples [output_dir]
//!
//! Output defaults to `target/samples/`.

use std::path::PathBuf;

use image::{Rgb, RgbImage};
use textredact::{Detection, NormalizedBox, OutputFormat, Redactor};

/// Face-ish blob on a gradient with a striped "phone number" banner below it.
fn synthetic_avatar(width: u32, height: u32) -> RgbImage {
    let (cx, cy, r) = (width as f64 / 2.0, height as f64 * 0.4, width as f64 * 0.2);
    RgbImage::from_fn(width, height, |x, y| {
        let (fx, fy) = (x as f64, y as f64);
        let in_banner = fy > height as f64 * 0.75 && fy < height as f64 * 0.85;
        if in_banner && fx > width as f64 * 0.15 && fx < width as f64 * 0.85 {
            if (x / 3) % 2 == 0 {
                Rgb([15, 15, 15])
            } else {
                Rgb([245, 245, 245])
            }
        } else if (fx - cx).powi(2) + (fy - cy).powi(2) < r * r {
            Rgb([224, 172, 105])
        } else {
            Rgb([60, (y * 200 / height) as u8, 180])
        }
    })
}

fn main() {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("target/samples"));
    std::fs::create_dir_all(&output_dir).expect("failed to create output directory");

    let avatar = synthetic_avatar(320, 320);
    let original = textredact::codec::encode_image(&avatar, OutputFormat::Png, 95).unwrap();
    std::fs::write(output_dir.join("avatar.png"), &original).unwrap();

    let detections = [
        Detection::new("call", NormalizedBox::new(0.15, 0.75, 0.2, 0.1)),
        Detection::new("555", NormalizedBox::new(0.4, 0.75, 0.15, 0.1)),
        Detection::new("0100", NormalizedBox::new(0.6, 0.75, 0.25, 0.1)),
    ];

    for format in [OutputFormat::Png, OutputFormat::Jpeg, OutputFormat::Webp] {
        let result = Redactor::new(original.clone())
            .unwrap()
            .format(format)
            .redact(&detections)
            .unwrap();

        let filename = format!("avatar_redacted.{}", format.extension());
        std::fs::write(output_dir.join(&filename), &result.data).unwrap();
        println!(
            "  {filename} ({width}x{height}, {size} bytes, texts: {texts:?})",
            width = result.width,
            height = result.height,
            size = result.data.len(),
            texts = result.detected_texts,
        );
    }

    println!("Output written to {}", output_dir.display());
}
