//! Downloadable artifacts for a planned city

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::BTreeMap;

use crate::models::TourPlan;

/// `{ "<city>": <plan> }`, pretty-printed
pub fn json_document(plan: &TourPlan) -> Result<String> {
    let document: BTreeMap<&str, &TourPlan> = BTreeMap::from([(plan.city.as_str(), plan)]);
    serde_json::to_string_pretty(&document)
        .with_context(|| format!("Failed to serialize itinerary for {}", plan.city))
}

pub fn json_data_uri(plan: &TourPlan) -> Result<String> {
    let document = json_document(plan)?;
    Ok(data_uri("application/json", document.as_bytes()))
}

pub fn json_file_name(city: &str) -> String {
    format!("{}_itinerary.json", file_stem(city))
}

pub fn pdf_file_name(city: &str) -> String {
    format!("{}_itinerary.pdf", file_stem(city))
}

pub fn html_file_name(city: &str) -> String {
    format!("{}_itinerary.html", file_stem(city))
}

/// City name usable as a single path component
fn file_stem(city: &str) -> String {
    let stem: String = city
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim_start_matches('.');
    if stem.is_empty() {
        "city".to_string()
    } else {
        stem.to_string()
    }
}

fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Whether this build can produce PDFs
pub const PDF_AVAILABLE: bool = cfg!(feature = "pdf");

/// PDF data URI, or `None` when PDF support is compiled out or rendering fails
pub fn pdf_data_uri(plan: &TourPlan) -> Option<String> {
    #[cfg(feature = "pdf")]
    {
        match pdf::pdf_bytes(plan) {
            Ok(bytes) => Some(data_uri("application/pdf", &bytes)),
            Err(e) => {
                tracing::warn!("PDF export for {} failed: {:#}", plan.city, e);
                None
            }
        }
    }
    #[cfg(not(feature = "pdf"))]
    {
        let _ = plan;
        None
    }
}

#[cfg(feature = "pdf")]
pub use pdf::pdf_bytes;

#[cfg(feature = "pdf")]
mod pdf {
    use anyhow::{Context, Result};
    use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Pt};

    use crate::models::TourPlan;

    // US letter, in points
    const PAGE_WIDTH: f32 = 612.0;
    const PAGE_HEIGHT: f32 = 792.0;

    /// Writes lines top-down at fixed point offsets
    struct Cursor<'a> {
        layer: &'a PdfLayerReference,
        y: f32,
    }

    impl Cursor<'_> {
        fn line(&mut self, text: &str, size: f32, x: f32, font: &IndirectFontRef, advance: f32) {
            // Overflow is clipped
            if self.y > 0.0 {
                self.layer
                    .use_text(text, size, Mm::from(Pt(x)), Mm::from(Pt(self.y)), font);
            }
            self.y -= advance;
        }

        fn skip(&mut self, points: f32) {
            self.y -= points;
        }
    }

    /// Single-page itinerary summary
    pub fn pdf_bytes(plan: &TourPlan) -> Result<Vec<u8>> {
        let title = format!("Foodie Tour Itinerary: {}", plan.city);
        let (doc, page, layer) = PdfDocument::new(
            title.as_str(),
            Mm::from(Pt(PAGE_WIDTH)),
            Mm::from(Pt(PAGE_HEIGHT)),
            "Layer 1",
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .context("Failed to load Helvetica")?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .context("Failed to load Helvetica-Bold")?;

        let layer = doc.get_page(page).get_layer(layer);
        let mut cursor = Cursor {
            layer: &layer,
            y: PAGE_HEIGHT - 40.0,
        };

        cursor.line(&title, 16.0, 40.0, &bold, 30.0);
        let weather = plan.weather();
        cursor.line(
            &format!("Weather: {}, {}", weather.condition, weather.format_temperature()),
            12.0,
            40.0,
            &regular,
            20.0,
        );
        cursor.line(
            &format!("Dining Recommendation: {}", plan.dining),
            12.0,
            40.0,
            &regular,
            30.0,
        );

        cursor.line("Iconic Dishes:", 14.0, 40.0, &bold, 20.0);
        for dish in &plan.dishes {
            cursor.line(&format!("- {dish}"), 12.0, 60.0, &regular, 15.0);
        }
        cursor.skip(10.0);

        cursor.line("Top Restaurants:", 14.0, 40.0, &bold, 20.0);
        for (dish, restaurants) in plan.restaurants.iter() {
            cursor.line(&format!("{dish}:"), 12.0, 60.0, &regular, 15.0);
            for restaurant in restaurants {
                cursor.line(&format!("- {restaurant}"), 12.0, 80.0, &regular, 15.0);
            }
            cursor.skip(5.0);
        }
        cursor.skip(10.0);

        cursor.line("Full Itinerary:", 14.0, 40.0, &bold, 20.0);
        for text in plan.itinerary.lines() {
            cursor.line(text, 12.0, 60.0, &regular, 14.0);
        }

        doc.save_to_bytes().context("Failed to write PDF")
    }
}
